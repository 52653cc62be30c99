// ── Reconciliation driver ──
//
// One pass over the observed/desired pairs. Each pair ends in exactly one
// terminal outcome; a failing pair never stops the pass.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use glimport_api::GitLabClient;

use crate::error::CoreError;
use crate::handler::ExistenceMatcher;
use crate::model::{
    DesiredResource, ExternalName, GroupKind, MANAGED_EXTERNAL_NAME_ANNOTATION, ObservedResource,
    RemoteEntity, ResourceName,
};
use crate::registry::{Registry, ResourceKind};
use crate::store::{ResourcePairs, Side};

/// Field holding the provider's management policies.
pub const MANAGEMENT_POLICIES_FIELD: &str = "spec.managementPolicies";

/// Policies applied to imported resources when the input names none.
pub const DEFAULT_MANAGEMENT_POLICIES: &[&str] = &["Observe"];

// ── Outcomes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SkipReason {
    /// Group/kind is not in the registry.
    UnsupportedKind(GroupKind),
    /// Not (yet) known to exist remotely. Carries the `Synced` message.
    InTransition { message: String },
}

#[derive(Debug, Clone)]
pub enum Outcome {
    CopiedFromObserved(ExternalName),
    CopiedFromDesired(ExternalName),
    ResolvedRemotely(RemoteEntity),
    Skipped(SkipReason),
    Failed(CoreError),
}

impl Outcome {
    /// Whether the desired resource belongs in the pass output.
    pub fn changes_desired(&self) -> bool {
        matches!(
            self,
            Self::CopiedFromObserved(_) | Self::CopiedFromDesired(_) | Self::ResolvedRemotely(_)
        )
    }

    /// Resulting external-name, for outcomes that have one.
    pub fn external_name(&self) -> Option<ExternalName> {
        match self {
            Self::CopiedFromObserved(name) | Self::CopiedFromDesired(name) => Some(name.clone()),
            Self::ResolvedRemotely(entity) => Some(entity.external_name()),
            Self::Skipped(_) | Self::Failed(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CopiedFromObserved(_) => "copied-from-observed",
            Self::CopiedFromDesired(_) => "copied-from-desired",
            Self::ResolvedRemotely(_) => "resolved",
            Self::Skipped(SkipReason::UnsupportedKind(_)) => "unsupported",
            Self::Skipped(SkipReason::InTransition { .. }) => "in-transition",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceReport {
    pub name: ResourceName,
    pub kind: Option<ResourceKind>,
    pub outcome: Outcome,
}

/// Everything one pass decided.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Per-pair outcomes, in desired order.
    pub resources: Vec<ResourceReport>,
    /// Desired resources to merge into the response.
    pub changed: IndexMap<ResourceName, DesiredResource>,
    /// Names present on one side only.
    pub unpaired: Vec<(ResourceName, Side)>,
}

impl PassReport {
    pub fn failures(&self) -> impl Iterator<Item = (&ResourceName, &CoreError)> {
        self.resources.iter().filter_map(|r| match &r.outcome {
            Outcome::Failed(err) => Some((&r.name, err)),
            _ => None,
        })
    }

    pub fn outcome(&self, name: &ResourceName) -> Option<&Outcome> {
        self.resources
            .iter()
            .find(|r| &r.name == name)
            .map(|r| &r.outcome)
    }
}

// ── Import markers ───────────────────────────────────────────────────

/// Writes that flag a desired resource as linked to an existing entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMarkers {
    management_policies: Vec<String>,
}

impl ImportMarkers {
    pub fn new(management_policies: Vec<String>) -> Self {
        Self {
            management_policies,
        }
    }

    pub fn management_policies(&self) -> &[String] {
        &self.management_policies
    }

    pub fn apply(&self, desired: &mut DesiredResource) -> Result<(), CoreError> {
        desired.set_annotation(MANAGED_EXTERNAL_NAME_ANNOTATION, "true")?;
        let policies = self
            .management_policies
            .iter()
            .cloned()
            .map(Value::String)
            .collect();
        desired.set_value(MANAGEMENT_POLICIES_FIELD, Value::Array(policies))
    }
}

// ── Reconciler ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Remote {
    Online(GitLabClient),
    Offline { reason: String },
}

/// Drives a pass. Holds the injected client and the pass-independent
/// settings; no per-resource state survives a pass.
#[derive(Debug, Clone)]
pub struct Reconciler {
    remote: Remote,
    registry: Registry,
    matcher: ExistenceMatcher,
    management_policies: Vec<String>,
}

impl Reconciler {
    pub fn new(client: GitLabClient) -> Self {
        Self::with_remote(Remote::Online(client))
    }

    /// A reconciler without credentials. Copy paths still work; remote
    /// lookups fail with `ClientUnavailable`.
    pub fn offline(reason: impl Into<String>) -> Self {
        Self::with_remote(Remote::Offline {
            reason: reason.into(),
        })
    }

    fn with_remote(remote: Remote) -> Self {
        Self {
            remote,
            registry: Registry::gitlab(),
            matcher: ExistenceMatcher::default(),
            management_policies: DEFAULT_MANAGEMENT_POLICIES
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: ExistenceMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Fallback policies for imports whose input lists none.
    #[must_use]
    pub fn with_management_policies(mut self, policies: Vec<String>) -> Self {
        self.management_policies = policies;
        self
    }

    pub fn client(&self) -> Option<&GitLabClient> {
        match &self.remote {
            Remote::Online(client) => Some(client),
            Remote::Offline { .. } => None,
        }
    }

    /// Markers for this pass: the requested policies, or the fallback.
    pub fn import_markers(&self, requested: &[String]) -> ImportMarkers {
        if requested.is_empty() {
            ImportMarkers::new(self.management_policies.clone())
        } else {
            ImportMarkers::new(requested.to_vec())
        }
    }

    // ── Pass ─────────────────────────────────────────────────────────

    pub async fn reconcile(&self, pairs: &mut ResourcePairs, markers: &ImportMarkers) -> PassReport {
        let mut report = PassReport {
            unpaired: pairs
                .unpaired()
                .into_iter()
                .map(|(name, side)| (name.clone(), side))
                .collect(),
            ..PassReport::default()
        };
        for (name, side) in &report.unpaired {
            info!(resource = %name, %side, "resource is not paired, skipping");
        }

        for (name, observed, desired) in pairs.pairs_mut() {
            let kind = self.registry.lookup(observed.group_kind());
            let outcome = match kind {
                None => Outcome::Skipped(SkipReason::UnsupportedKind(
                    observed.group_kind().clone(),
                )),
                Some(kind) => self.reconcile_pair(kind, observed, desired, markers).await,
            };

            match &outcome {
                Outcome::Failed(err) => {
                    warn!(resource = %name, kind = ?kind, error = %err, "external-name not resolved");
                }
                Outcome::Skipped(SkipReason::UnsupportedKind(gk)) => {
                    debug!(resource = %name, group_kind = %gk, "kind not handled");
                }
                other => {
                    let external_name = other.external_name();
                    info!(
                        resource = %name,
                        kind = ?kind,
                        outcome = other.label(),
                        external_name = external_name.as_ref().map(ExternalName::as_str),
                        "reconciled"
                    );
                }
            }

            if outcome.changes_desired() {
                report.changed.insert(name.clone(), desired.clone());
            }
            report.resources.push(ResourceReport {
                name: name.clone(),
                kind,
                outcome,
            });
        }

        report
    }

    async fn reconcile_pair(
        &self,
        kind: ResourceKind,
        observed: &ObservedResource,
        desired: &mut DesiredResource,
        markers: &ImportMarkers,
    ) -> Outcome {
        // Writes go to a copy and are committed together.
        let mut staged = desired.clone();

        let outcome = if let Some(name) = observed.external_name() {
            match Self::copy_from_observed(name, observed, &mut staged, markers) {
                Ok(name) => Outcome::CopiedFromObserved(name),
                Err(err) => Outcome::Failed(err),
            }
        } else if let Some(name) = desired.external_name() {
            match ExternalName::new(name) {
                Ok(name) => Outcome::CopiedFromDesired(name),
                Err(err) => Outcome::Failed(err),
            }
        } else {
            let handler = kind.handler();
            let (message, exists) = handler.already_exists(observed, &self.matcher);
            if exists {
                match self.import(kind, &mut staged, markers).await {
                    Ok(entity) => Outcome::ResolvedRemotely(entity),
                    Err(err) => Outcome::Failed(err),
                }
            } else {
                Outcome::Skipped(SkipReason::InTransition { message })
            }
        };

        if outcome.changes_desired() {
            *desired = staged;
        }
        outcome
    }

    fn copy_from_observed(
        name: &str,
        observed: &ObservedResource,
        staged: &mut DesiredResource,
        markers: &ImportMarkers,
    ) -> Result<ExternalName, CoreError> {
        let name = ExternalName::new(name)?;
        staged.set_external_name(&name)?;

        let imported = match observed.bool_annotation(MANAGED_EXTERNAL_NAME_ANNOTATION) {
            Ok(flag) => flag.unwrap_or(false),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable import marker");
                false
            }
        };
        if imported {
            markers.apply(staged)?;
        }
        Ok(name)
    }

    async fn import(
        &self,
        kind: ResourceKind,
        staged: &mut DesiredResource,
        markers: &ImportMarkers,
    ) -> Result<RemoteEntity, CoreError> {
        let addressing = kind.handler().extract_addressing(staged)?;
        let client = match &self.remote {
            Remote::Online(client) => client,
            Remote::Offline { reason } => {
                return Err(CoreError::ClientUnavailable {
                    reason: reason.clone(),
                });
            }
        };

        debug!(%kind, %addressing, "looking up existing remote entity");
        let entity = kind.resolve(client, &addressing).await?;
        staged.set_external_name(&entity.external_name())?;
        markers.apply(staged)?;
        Ok(entity)
    }
}
