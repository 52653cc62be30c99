// ── Composition function envelope ──
//
// JSON rendition of the composition-function request/response documents.
// Field names follow the protobuf JSON mapping so a captured request can
// be fed in unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::info;

use crate::error::CoreError;
use crate::model::{ConditionStatus, ResourceName};
use crate::reconcile::{PassReport, Reconciler};
use crate::store::ResourcePairs;

/// How long the caller may cache a response.
pub const DEFAULT_TTL: &str = "60s";

/// Condition reporting whether the function itself ran cleanly.
pub const FUNCTION_SUCCESS_CONDITION: &str = "FunctionSuccess";

// ── Request ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub meta: RequestMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default)]
    pub observed: State,
    #[serde(default)]
    pub desired: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default)]
    pub tag: String,
}

/// Composite plus composed resources, keyed by composition-local name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<ResourceEntry>,
    #[serde(default)]
    pub resources: IndexMap<ResourceName, ResourceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    #[serde(default)]
    pub resource: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub connection_details: IndexMap<String, String>,
}

/// Function input (`template.fn.crossplane.io/v1beta1`, `Input`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, rename = "baseURL", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub management_policies: Vec<String>,
}

impl Input {
    /// Base URL override, ignoring empty strings.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|url| !url.is_empty())
    }
}

impl RunRequest {
    /// Typed input. A request without input reads as the default input.
    pub fn input(&self) -> Result<Input, CoreError> {
        match &self.input {
            None | Some(Value::Null) => Ok(Input::default()),
            Some(raw) => {
                serde_json::from_value(raw.clone()).map_err(|e| CoreError::InvalidRequest {
                    message: format!("cannot read function input: {e}"),
                })
            }
        }
    }

    /// Build the pair store from the composed resources.
    pub fn resource_pairs(&self) -> Result<ResourcePairs, CoreError> {
        let entries = |state: &State| {
            state
                .resources
                .iter()
                .map(|(name, entry)| (name.clone(), entry.resource.clone()))
                .collect::<Vec<_>>()
        };
        ResourcePairs::from_request(entries(&self.observed), entries(&self.desired))
    }
}

// ── Response ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    pub meta: ResponseMeta,
    #[serde(default)]
    pub desired: State,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FunctionResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ResponseCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub tag: String,
    pub ttl: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "SEVERITY_FATAL")]
    Fatal,
    #[serde(rename = "SEVERITY_WARNING")]
    Warning,
    #[serde(rename = "SEVERITY_NORMAL")]
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    #[serde(rename = "TARGET_COMPOSITE")]
    Composite,
    #[serde(rename = "TARGET_COMPOSITE_AND_CLAIM")]
    CompositeAndClaim,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCondition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(
        serialize_with = "serialize_status",
        deserialize_with = "deserialize_status"
    )]
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

fn serialize_status<S: Serializer>(status: &ConditionStatus, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(match status {
        ConditionStatus::True => "STATUS_CONDITION_TRUE",
        ConditionStatus::False => "STATUS_CONDITION_FALSE",
        ConditionStatus::Unknown => "STATUS_CONDITION_UNKNOWN",
    })
}

fn deserialize_status<'de, D: Deserializer<'de>>(d: D) -> Result<ConditionStatus, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(match raw.as_str() {
        "STATUS_CONDITION_TRUE" => ConditionStatus::True,
        "STATUS_CONDITION_FALSE" => ConditionStatus::False,
        _ => ConditionStatus::Unknown,
    })
}

impl RunResponse {
    /// Start a response that echoes the request's tag, desired state and context.
    pub fn to(request: &RunRequest) -> Self {
        Self {
            meta: ResponseMeta {
                tag: request.meta.tag.clone(),
                ttl: DEFAULT_TTL.to_owned(),
            },
            desired: request.desired.clone(),
            results: Vec::new(),
            conditions: Vec::new(),
            context: request.context.clone(),
        }
    }

    pub fn fatal(&mut self, message: impl Into<String>) -> &mut FunctionResult {
        self.push_result(Severity::Fatal, message.into())
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &mut FunctionResult {
        self.push_result(Severity::Warning, message.into())
    }

    fn push_result(&mut self, severity: Severity, message: String) -> &mut FunctionResult {
        self.results.push(FunctionResult {
            severity,
            message,
            target: None,
        });
        let last = self.results.len() - 1;
        &mut self.results[last]
    }

    pub fn set_condition(
        &mut self,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: Option<String>,
    ) {
        self.conditions.retain(|c| c.type_ != type_);
        self.conditions.push(ResponseCondition {
            type_: type_.to_owned(),
            status,
            reason: reason.to_owned(),
            message,
            target: Some(Target::CompositeAndClaim),
        });
    }

    pub fn has_fatal(&self) -> bool {
        self.results.iter().any(|r| r.severity == Severity::Fatal)
    }

    /// Merge changed desired resources over the echoed desired state.
    pub fn merge_desired(&mut self, report: &PassReport) {
        for (name, desired) in &report.changed {
            self.desired
                .resources
                .entry(name.clone())
                .or_default()
                .resource = desired.as_value().clone();
        }
    }
}

impl FunctionResult {
    pub fn target_composite_and_claim(&mut self) -> &mut Self {
        self.target = Some(Target::CompositeAndClaim);
        self
    }
}

// ── Run ──────────────────────────────────────────────────────────────

/// Handle one request end to end.
pub async fn run(reconciler: &Reconciler, request: &RunRequest) -> RunResponse {
    run_with_report(reconciler, request).await.0
}

/// Like [`run`], also returning the pass report when a pass happened.
pub async fn run_with_report(
    reconciler: &Reconciler,
    request: &RunRequest,
) -> (RunResponse, Option<PassReport>) {
    info!(tag = %request.meta.tag, "running function");
    let mut rsp = RunResponse::to(request);

    let input = match request.input() {
        Ok(input) => input,
        Err(err) => {
            rsp.set_condition(
                FUNCTION_SUCCESS_CONDITION,
                ConditionStatus::False,
                "InternalError",
                Some("Something went wrong.".into()),
            );
            rsp.warning("something went wrong")
                .target_composite_and_claim();
            rsp.fatal(err.to_string());
            return (rsp, None);
        }
    };

    let mut pairs = match request.resource_pairs() {
        Ok(pairs) => pairs,
        Err(err) => {
            rsp.fatal(format!(
                "cannot extract observed and desired composed resources: {err}"
            ));
            return (rsp, None);
        }
    };

    if request.observed.resources.is_empty() {
        info!("no observed resources found");
        return (rsp, None);
    }
    if request.desired.resources.is_empty() {
        info!("no desired resources found");
        return (rsp, None);
    }

    let markers = reconciler.import_markers(&input.management_policies);
    let report = reconciler.reconcile(&mut pairs, &markers).await;

    for (name, err) in report.failures() {
        rsp.warning(format!("{name}: external-name lookup failed: {err}"))
            .target_composite_and_claim();
    }
    rsp.merge_desired(&report);
    rsp.set_condition(
        FUNCTION_SUCCESS_CONDITION,
        ConditionStatus::True,
        "Success",
        None,
    );

    (rsp, Some(report))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures_util::FutureExt::now_or_never(f).unwrap()
    }

    #[test]
    fn input_reads_base_url_and_policies() {
        let request: RunRequest = serde_json::from_value(json!({
            "input": {
                "apiVersion": "template.fn.crossplane.io/v1beta1",
                "kind": "Input",
                "baseURL": "https://gitlab.example.com",
                "managementPolicies": ["Observe", "LateInitialize"]
            }
        }))
        .unwrap();
        let input = request.input().unwrap();
        assert_eq!(input.base_url(), Some("https://gitlab.example.com"));
        assert_eq!(input.management_policies, ["Observe", "LateInitialize"]);
    }

    #[test]
    fn empty_base_url_reads_as_unset() {
        let input = Input {
            base_url: Some(String::new()),
            ..Input::default()
        };
        assert_eq!(input.base_url(), None);
    }

    #[test]
    fn bad_input_is_fatal() {
        let request: RunRequest = serde_json::from_value(json!({
            "meta": { "tag": "t1" },
            "input": { "managementPolicies": "Observe" }
        }))
        .unwrap();
        let rsp = block_on(run(&Reconciler::offline("x"), &request));

        assert!(rsp.has_fatal());
        assert_eq!(rsp.meta.tag, "t1");
        assert_eq!(rsp.conditions[0].status, ConditionStatus::False);
        assert_eq!(rsp.conditions[0].reason, "InternalError");
    }

    #[test]
    fn empty_observed_returns_early() {
        let request: RunRequest = serde_json::from_value(json!({
            "desired": { "resources": { "a": { "resource": {
                "apiVersion": "v1", "kind": "ConfigMap"
            } } } }
        }))
        .unwrap();
        let rsp = block_on(run(&Reconciler::offline("x"), &request));

        assert!(rsp.results.is_empty());
        assert!(rsp.conditions.is_empty());
        assert_eq!(rsp.desired, request.desired);
    }

    #[test]
    fn response_serializes_protobuf_names() {
        let mut rsp = RunResponse::to(&RunRequest::default());
        rsp.fatal("boom").target_composite_and_claim();
        rsp.set_condition(FUNCTION_SUCCESS_CONDITION, ConditionStatus::True, "Success", None);

        let value = serde_json::to_value(&rsp).unwrap();
        assert_eq!(value["meta"]["ttl"], "60s");
        assert_eq!(value["results"][0]["severity"], "SEVERITY_FATAL");
        assert_eq!(value["results"][0]["target"], "TARGET_COMPOSITE_AND_CLAIM");
        assert_eq!(value["conditions"][0]["status"], "STATUS_CONDITION_TRUE");

        let back: RunResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, rsp);
    }

    #[test]
    fn set_condition_replaces_same_type() {
        let mut rsp = RunResponse::default();
        rsp.set_condition("FunctionSuccess", ConditionStatus::False, "InternalError", None);
        rsp.set_condition("FunctionSuccess", ConditionStatus::True, "Success", None);
        assert_eq!(rsp.conditions.len(), 1);
        assert_eq!(rsp.conditions[0].status, ConditionStatus::True);
    }
}
