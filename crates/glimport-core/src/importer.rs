// ── Remote lookup by (parent, path) ──
//
// Walks the paginated listing under the parent and picks the first entry
// whose path matches exactly. Pages are pulled on demand, so a match on
// page one costs one request.

use std::pin::pin;

use futures_util::{Stream, TryStreamExt};
use tracing::debug;

use glimport_api::GitLabClient;

use crate::error::CoreError;
use crate::model::{Addressing, RemoteEntity};
use crate::registry::ResourceKind;

/// Resolves projects through `GET /groups/:id/projects`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectImporter;

impl ProjectImporter {
    pub async fn resolve(
        client: &GitLabClient,
        addressing: &Addressing,
    ) -> Result<RemoteEntity, CoreError> {
        let listing = client.list_group_projects(addressing.parent_id(), "");
        find_by_path(ResourceKind::Project, listing, addressing).await
    }

    /// `path_with_namespace` of a project, e.g. `acme/platform/demo`.
    pub async fn full_path(client: &GitLabClient, project_id: i64) -> Result<String, CoreError> {
        let project = client.get_project(project_id).await?;
        Ok(project.path_with_namespace)
    }
}

/// Resolves groups through `GET /groups/:id/subgroups`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupImporter;

impl GroupImporter {
    pub async fn resolve(
        client: &GitLabClient,
        addressing: &Addressing,
    ) -> Result<RemoteEntity, CoreError> {
        let listing = client.list_subgroups(addressing.parent_id());
        find_by_path(ResourceKind::Group, listing, addressing).await
    }
}

async fn find_by_path<S, T>(
    kind: ResourceKind,
    listing: S,
    addressing: &Addressing,
) -> Result<RemoteEntity, CoreError>
where
    S: Stream<Item = Result<T, glimport_api::Error>>,
    T: Into<RemoteEntity>,
{
    let mut listing = pin!(listing);
    let mut inspected = 0_usize;

    while let Some(item) = listing.try_next().await? {
        inspected += 1;
        let entity: RemoteEntity = item.into();
        if entity.path == addressing.path() {
            debug!(
                %kind,
                parent_id = addressing.parent_id(),
                path = addressing.path(),
                id = entity.id,
                inspected,
                "matched remote entity"
            );
            return Ok(entity);
        }
    }

    debug!(%kind, %addressing, inspected, "no remote entity matched");
    Err(CoreError::NotFound {
        kind,
        parent_id: addressing.parent_id(),
        path: addressing.path().to_owned(),
        inspected,
    })
}
