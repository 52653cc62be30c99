//! External-name resolution for GitLab resources in Crossplane compositions.
//!
//! When provider-gitlab fails to create a project or group because the path
//! is already taken, this crate finds the existing entity and writes its id
//! to `crossplane.io/external-name` on the desired resource, so the provider
//! adopts it instead of retrying the create.
//!
//! - **[`ResourcePairs`]**: observed and desired composed resources for one
//!   pass, paired by composition-local name.
//! - **[`KindHandler`]**: per-kind rules. Where the remote address lives in
//!   the resource, and when the observed state says "already exists".
//! - **[`ProjectImporter`] / [`GroupImporter`]**: paginated lookup of a
//!   `(parent, path)` pair through [`glimport_api::GitLabClient`].
//! - **[`Reconciler`]**: drives one pass and reports a terminal
//!   [`Outcome`] per pair.
//! - **[`function`]**: the request/response envelope around a pass.

pub mod convert;
pub mod error;
pub mod function;
pub mod handler;
pub mod importer;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use function::{Input, RunRequest, RunResponse, Severity, run, run_with_report};
pub use handler::{ExistenceMatcher, GroupHandler, KindHandler, ProjectHandler};
pub use importer::{GroupImporter, ProjectImporter};
pub use reconcile::{ImportMarkers, Outcome, PassReport, Reconciler, ResourceReport, SkipReason};
pub use registry::{Registry, ResourceKind};
pub use store::{ResourcePairs, Side};

pub use model::{
    Addressing, Condition, ConditionStatus, DesiredResource, EXTERNAL_NAME_ANNOTATION,
    ExternalName, GroupKind, MANAGED_EXTERNAL_NAME_ANNOTATION, ObservedResource, RemoteEntity,
    ResourceName,
};
