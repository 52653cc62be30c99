// ── Per-kind resolution rules ──
//
// A handler knows where a kind keeps its remote address and how to tell
// from the observed state that the remote entity already exists.

use tracing::trace;

use crate::error::CoreError;
use crate::model::{Addressing, AddressingError, DesiredResource, ObservedResource};
use crate::registry::ResourceKind;

/// Path segment of the resource, relative to its parent.
pub const PATH_FIELD: &str = "spec.forProvider.path";

/// Condition the provider flips to `False` when creation was rejected.
pub const SYNCED_CONDITION: &str = "Synced";

/// Substring GitLab puts in the error when a path is in use.
pub const DEFAULT_TAKEN_MARKER: &str = "has already been taken";

// ── ExistenceMatcher ─────────────────────────────────────────────────

/// Substring predicate over a `Synced` condition message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistenceMatcher {
    markers: Vec<String>,
}

impl ExistenceMatcher {
    /// Empty marker strings are dropped; they would match everything.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let markers = markers
            .into_iter()
            .map(Into::into)
            .filter(|m: &String| !m.is_empty())
            .collect();
        Self { markers }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn matches(&self, message: &str) -> bool {
        self.markers.iter().any(|m| message.contains(m.as_str()))
    }
}

impl Default for ExistenceMatcher {
    fn default() -> Self {
        Self::new([DEFAULT_TAKEN_MARKER])
    }
}

// ── KindHandler ──────────────────────────────────────────────────────

pub trait KindHandler: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Dotted path of the integer parent id.
    fn parent_field(&self) -> &'static str;

    /// Read `(parent id, path)` from the desired resource.
    fn extract_addressing(&self, desired: &DesiredResource) -> Result<Addressing, CoreError> {
        let kind = self.kind();
        let extraction = |field: &str, reason: String| CoreError::Extraction {
            kind,
            field: field.to_owned(),
            reason,
        };

        let parent_field = self.parent_field();
        let parent_id = desired
            .get_integer(parent_field)
            .map_err(|e| extraction(parent_field, e.to_string()))?;
        let path = desired
            .get_string(PATH_FIELD)
            .map_err(|e| extraction(PATH_FIELD, e.to_string()))?;

        Addressing::new(parent_id, path).map_err(|e| match e {
            AddressingError::NegativeParent(_) => extraction(parent_field, e.to_string()),
            AddressingError::EmptyPath => extraction(PATH_FIELD, e.to_string()),
        })
    }

    /// `(Synced message, exists)`. Exists only when `Synced` is `False` and
    /// its message carries one of the matcher's markers.
    fn already_exists(
        &self,
        observed: &ObservedResource,
        matcher: &ExistenceMatcher,
    ) -> (String, bool) {
        let synced = observed.condition(SYNCED_CONDITION);
        let exists = synced.is_false() && matcher.matches(&synced.message);
        trace!(
            kind = %self.kind(),
            status = %synced.status,
            exists,
            "checked {SYNCED_CONDITION} condition"
        );
        (synced.message, exists)
    }
}

/// `projects.gitlab.crossplane.io/Project`: parent is `namespaceId`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectHandler;

impl KindHandler for ProjectHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Project
    }

    fn parent_field(&self) -> &'static str {
        "spec.forProvider.namespaceId"
    }
}

/// `groups.gitlab.crossplane.io/Group`: parent is `parentId`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupHandler;

impl KindHandler for GroupHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Group
    }

    fn parent_field(&self) -> &'static str {
        "spec.forProvider.parentId"
    }
}
