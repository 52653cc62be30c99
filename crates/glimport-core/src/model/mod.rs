// ── Domain model ──

pub mod condition;
pub(crate) mod fieldpath;
pub mod identity;
pub mod resource;

pub use condition::{Condition, ConditionStatus};
pub use fieldpath::FieldError;
pub use identity::{Addressing, AddressingError, ExternalName, RemoteEntity};
pub use resource::{
    DesiredResource, EXTERNAL_NAME_ANNOTATION, GroupKind, MANAGED_EXTERNAL_NAME_ANNOTATION,
    ObservedResource, ResourceName, Unstructured,
};
