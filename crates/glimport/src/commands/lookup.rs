//! `glimport lookup`: resolve a project or group directly.

use serde::Serialize;

use glimport_api::GitLabClient;
use glimport_core::{Addressing, GroupImporter, ProjectImporter, RemoteEntity, ResourceKind};

use crate::cli::{GlobalOpts, LookupArgs, LookupCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Resolved {
    kind: ResourceKind,
    id: i64,
    path: String,
    parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_path: Option<String>,
}

impl Resolved {
    fn new(kind: ResourceKind, entity: RemoteEntity, full_path: Option<String>) -> Self {
        Self {
            kind,
            id: entity.id,
            path: entity.path,
            parent_id: entity.parent_id,
            full_path,
        }
    }

    fn detail(&self) -> String {
        let mut fields = vec![
            ("kind", self.kind.to_string()),
            ("external-name", self.id.to_string()),
            ("path", self.path.clone()),
        ];
        if let Some(parent) = self.parent_id {
            fields.push(("parent", parent.to_string()));
        }
        if let Some(ref full_path) = self.full_path {
            fields.push(("full path", full_path.clone()));
        }
        output::render_detail(&fields)
    }
}

pub async fn handle(args: LookupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let client = config::build_client(global, &cfg, None)?;

    let rendered = match args.command {
        LookupCommand::Project { namespace_id, path } => {
            let addressing = addressing(namespace_id, path)?;
            let entity = ProjectImporter::resolve(&client, &addressing).await?;
            let full_path = ProjectImporter::full_path(&client, entity.id).await?;
            render(global, &Resolved::new(ResourceKind::Project, entity, Some(full_path)))?
        }
        LookupCommand::Group { parent_id, path } => {
            let addressing = addressing(parent_id, path)?;
            let entity = GroupImporter::resolve(&client, &addressing).await?;
            render(global, &Resolved::new(ResourceKind::Group, entity, None))?
        }
        LookupCommand::FullPath { project_id } => full_path(global, &client, project_id).await?,
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn addressing(parent_id: i64, path: String) -> Result<Addressing, CliError> {
    Addressing::new(parent_id, path).map_err(|e| CliError::Validation {
        field: "lookup".into(),
        reason: e.to_string(),
    })
}

fn render(global: &GlobalOpts, resolved: &Resolved) -> Result<String, CliError> {
    output::render_single(global.output, resolved, Resolved::detail, |r| r.id.to_string())
}

async fn full_path(
    global: &GlobalOpts,
    client: &GitLabClient,
    project_id: i64,
) -> Result<String, CliError> {
    #[derive(Serialize)]
    struct FullPath {
        id: i64,
        full_path: String,
    }

    let full_path = ProjectImporter::full_path(client, project_id).await?;
    output::render_single(
        global.output,
        &FullPath {
            id: project_id,
            full_path,
        },
        |p| p.full_path.clone(),
        |p| p.full_path.clone(),
    )
}
