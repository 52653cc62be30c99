//! `glimport run`: one pass over a function request document.

use std::io::Read;

use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use glimport_core::{
    Outcome, PassReport, ResourceReport, RunRequest, RunResponse, Severity, SkipReason,
};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Row type ─────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Resource")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Outcome")]
    outcome: &'static str,
    #[tabled(rename = "External name")]
    external_name: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&ResourceReport> for OutcomeRow {
    fn from(r: &ResourceReport) -> Self {
        let detail = match &r.outcome {
            Outcome::Failed(err) => err.to_string(),
            Outcome::Skipped(SkipReason::UnsupportedKind(gk)) => gk.to_string(),
            Outcome::Skipped(SkipReason::InTransition { message }) => message.clone(),
            Outcome::ResolvedRemotely(entity) => entity.path.clone(),
            Outcome::CopiedFromObserved(_) | Outcome::CopiedFromDesired(_) => String::new(),
        };
        Self {
            name: r.name.to_string(),
            kind: r.kind.map(|k| k.to_string()).unwrap_or_default(),
            outcome: r.outcome.label(),
            external_name: r
                .outcome
                .external_name()
                .map(|n| n.to_string())
                .unwrap_or_default(),
            detail,
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let raw = read_request(&args.request)?;
    let request = parse_request(&raw)?;

    // Only the base URL matters here; a broken input becomes a Fatal result.
    let input_base_url = request
        .input()
        .ok()
        .and_then(|input| input.base_url().map(String::from));

    let cfg = config::load(global)?;
    let reconciler = config::build_reconciler(global, &cfg, input_base_url.as_deref());
    let (response, report) = glimport_core::run_with_report(&reconciler, &request).await;

    let rendered = render(global.output, &response, report.as_ref())?;
    output::print_output(&rendered, global.quiet);

    let fatal = response
        .results
        .iter()
        .filter(|r| r.severity == Severity::Fatal)
        .count();
    if fatal > 0 {
        return Err(CliError::FatalResult { count: fatal });
    }
    Ok(())
}

fn read_request(source: &str) -> Result<String, CliError> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        debug!(path = source, "reading request");
        Ok(std::fs::read_to_string(source)?)
    }
}

/// JSON first; YAML otherwise.
fn parse_request(raw: &str) -> Result<RunRequest, CliError> {
    match serde_json::from_str(raw) {
        Ok(request) => Ok(request),
        Err(json_err) => serde_yaml::from_str(raw).map_err(|yaml_err| {
            debug!(%json_err, "request is not JSON");
            CliError::InvalidRequest {
                message: yaml_err.to_string(),
            }
        }),
    }
}

/// Structured formats print the response document; table and plain
/// summarize the pass.
fn render(
    format: OutputFormat,
    response: &RunResponse,
    report: Option<&PassReport>,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_structured(format, response)
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let rows: Vec<OutcomeRow> = report
                .map(|r| r.resources.iter().map(OutcomeRow::from).collect())
                .unwrap_or_default();
            let mut out = if rows.is_empty() {
                String::new()
            } else {
                output::render_list(format, &rows, OutcomeRow::clone, |row| {
                    format!("{}\t{}\t{}", row.name, row.outcome, row.external_name)
                })?
            };
            for result in &response.results {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!("{:?}: {}", result.severity, result.message));
            }
            Ok(out)
        }
    }
}
