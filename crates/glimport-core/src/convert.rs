// ── API-to-domain type conversions ──

use glimport_api::{Group, Project};

use crate::model::RemoteEntity;

impl From<Project> for RemoteEntity {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            path: p.path,
            parent_id: p.namespace.map(|ns| ns.id),
        }
    }
}

impl From<Group> for RemoteEntity {
    fn from(g: Group) -> Self {
        Self {
            id: g.id,
            path: g.path,
            parent_id: g.parent_id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn project_parent_is_namespace() {
        let p: Project = serde_json::from_value(json!({
            "id": 7,
            "path": "demo",
            "namespace": { "id": 100, "path": "acme" }
        }))
        .unwrap();
        let e = RemoteEntity::from(p);
        assert_eq!((e.id, e.path.as_str(), e.parent_id), (7, "demo", Some(100)));
    }

    #[test]
    fn top_level_group_has_no_parent() {
        let g: Group = serde_json::from_value(json!({ "id": 3, "path": "acme" })).unwrap();
        assert_eq!(RemoteEntity::from(g).parent_id, None);
    }
}
