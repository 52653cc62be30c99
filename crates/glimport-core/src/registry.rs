// ── Supported kinds ──
//
// Maps an observed object's API group + kind onto the closed set of kinds
// this engine can resolve. Versions are ignored.

use indexmap::IndexMap;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use glimport_api::GitLabClient;

use crate::error::CoreError;
use crate::handler::{GroupHandler, KindHandler, ProjectHandler};
use crate::importer::{GroupImporter, ProjectImporter};
use crate::model::{Addressing, GroupKind, RemoteEntity};

pub const PROJECTS_GROUP: &str = "projects.gitlab.crossplane.io";
pub const GROUPS_GROUP: &str = "groups.gitlab.crossplane.io";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ResourceKind {
    Project,
    Group,
}

impl ResourceKind {
    pub fn handler(self) -> &'static dyn KindHandler {
        match self {
            Self::Project => &ProjectHandler,
            Self::Group => &GroupHandler,
        }
    }

    /// Group/kind this variant is registered under by default.
    pub fn group_kind(self) -> GroupKind {
        match self {
            Self::Project => GroupKind::new(PROJECTS_GROUP, "Project"),
            Self::Group => GroupKind::new(GROUPS_GROUP, "Group"),
        }
    }

    /// Look the entity up remotely with the kind's importer.
    pub async fn resolve(
        self,
        client: &GitLabClient,
        addressing: &Addressing,
    ) -> Result<RemoteEntity, CoreError> {
        match self {
            Self::Project => ProjectImporter::resolve(client, addressing).await,
            Self::Group => GroupImporter::resolve(client, addressing).await,
        }
    }
}

/// Group/kind → variant table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<GroupKind, ResourceKind>,
}

impl Registry {
    /// Projects and groups of provider-gitlab.
    pub fn gitlab() -> Self {
        let mut registry = Self::default();
        for kind in ResourceKind::iter() {
            registry.register(kind.group_kind(), kind);
        }
        registry
    }

    /// Add or replace an entry.
    pub fn register(&mut self, group_kind: GroupKind, kind: ResourceKind) -> &mut Self {
        self.entries.insert(group_kind, kind);
        self
    }

    pub fn lookup(&self, group_kind: &GroupKind) -> Option<ResourceKind> {
        self.entries.get(group_kind).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKind, ResourceKind)> {
        self.entries.iter().map(|(gk, kind)| (gk, *kind))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn gitlab_registry_knows_both_kinds() {
        let registry = Registry::gitlab();
        assert_eq!(
            registry.lookup(&GroupKind::new(PROJECTS_GROUP, "Project")),
            Some(ResourceKind::Project)
        );
        assert_eq!(
            registry.lookup(&GroupKind::new(GROUPS_GROUP, "Group")),
            Some(ResourceKind::Group)
        );
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn kind_must_match_its_group() {
        let registry = Registry::gitlab();
        assert_eq!(registry.lookup(&GroupKind::new(GROUPS_GROUP, "Project")), None);
        assert_eq!(registry.lookup(&GroupKind::new("", "ConfigMap")), None);
    }

    #[test]
    fn register_adds_aliases() {
        let mut registry = Registry::gitlab();
        registry.register(
            GroupKind::new("gitlab.example.org", "Repo"),
            ResourceKind::Project,
        );
        assert_eq!(
            registry.lookup(&GroupKind::new("gitlab.example.org", "Repo")),
            Some(ResourceKind::Project)
        );
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("group".parse::<ResourceKind>().unwrap(), ResourceKind::Group);
        assert_eq!(ResourceKind::Project.to_string(), "Project");
        assert_eq!(ResourceKind::Group.handler().kind(), ResourceKind::Group);
    }
}
