// ── Unstructured composed resources ──
//
// Observed and desired resources are arbitrary Kubernetes-style objects.
// Only a handful of fields are interpreted; everything else passes through
// untouched so the response can echo the object back.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::condition::Condition;
use super::fieldpath::{self, FieldError};
use super::identity::ExternalName;
use crate::error::CoreError;

/// Annotation holding the remote identifier of a managed resource.
pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";

/// Annotation flagging a resource as linked to a pre-existing remote entity.
pub const MANAGED_EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/managed-external-name";

// ── ResourceName ─────────────────────────────────────────────────────

/// Composition-local name of a composed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── GroupKind ────────────────────────────────────────────────────────

/// API group and kind, version stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }

    /// `projects.gitlab.crossplane.io/v1alpha1` + `Project`. Core types
    /// (`v1`) have an empty group.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        let group = api_version
            .rsplit_once('/')
            .map_or("", |(group, _version)| group);
        Self::new(group, kind)
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

// ── Unstructured ─────────────────────────────────────────────────────

/// Read access shared by observed and desired resources.
#[derive(Debug, Clone, PartialEq)]
pub struct Unstructured {
    value: Value,
    group_kind: GroupKind,
}

impl Unstructured {
    /// Accept any JSON object carrying string `apiVersion` and `kind`.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let Some(object) = value.as_object() else {
            return Err(CoreError::InvalidRequest {
                message: "resource is not an object".into(),
            });
        };
        let api_version = required_str(object, "apiVersion")?;
        let kind = required_str(object, "kind")?;
        let group_kind = GroupKind::from_api_version(api_version, kind);
        Ok(Self { value, group_kind })
    }

    pub fn group_kind(&self) -> &GroupKind {
        &self.group_kind
    }

    pub fn annotations(&self) -> Option<&Map<String, Value>> {
        fieldpath::get(&self.value, "metadata.annotations").and_then(Value::as_object)
    }

    /// String annotation value. Non-string values read as absent.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations()?.get(key)?.as_str()
    }

    /// Previously resolved external-name. Empty values read as absent.
    pub fn external_name(&self) -> Option<&str> {
        self.annotation(EXTERNAL_NAME_ANNOTATION)
            .filter(|name| !name.is_empty())
    }

    /// Boolean annotation. `Ok(None)` when absent.
    pub fn bool_annotation(&self, key: &str) -> Result<Option<bool>, CoreError> {
        let Some(raw) = self.annotation(key) else {
            return Ok(None);
        };
        parse_bool(raw)
            .map(Some)
            .ok_or_else(|| CoreError::Annotation {
                message: format!("{key}: {raw:?} is not a boolean"),
            })
    }

    /// Named status condition, or an `Unknown` placeholder.
    pub fn condition(&self, type_: &str) -> Condition {
        fieldpath::get(&self.value, "status.conditions")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Condition::from_value)
            .find(|c| c.type_ == type_)
            .unwrap_or_else(|| Condition::unknown(type_))
    }

    pub fn get_integer(&self, path: &str) -> Result<i64, FieldError> {
        fieldpath::get_integer(&self.value, path)
    }

    pub fn get_string(&self, path: &str) -> Result<&str, FieldError> {
        fieldpath::get_string(&self.value, path)
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, CoreError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::InvalidRequest {
            message: format!("resource has no string {key}"),
        })
}

/// Accepts `true`/`false`, `t`/`f` and `1`/`0`, case-insensitively.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

// ── ObservedResource ─────────────────────────────────────────────────

/// Immutable snapshot of a resource as the provider last reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedResource(Unstructured);

impl ObservedResource {
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        Unstructured::from_value(value).map(Self)
    }
}

impl std::ops::Deref for ObservedResource {
    type Target = Unstructured;

    fn deref(&self) -> &Unstructured {
        &self.0
    }
}

// ── DesiredResource ──────────────────────────────────────────────────

/// Mutable resource the pass may annotate. Every write is idempotent.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredResource(Unstructured);

impl DesiredResource {
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        Unstructured::from_value(value).map(Self)
    }

    pub fn set_annotation(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let annotations = self.annotations_mut()?;
        annotations.insert(key.to_owned(), Value::String(value.to_owned()));
        Ok(())
    }

    pub fn set_external_name(&mut self, name: &ExternalName) -> Result<(), CoreError> {
        self.set_annotation(EXTERNAL_NAME_ANNOTATION, name.as_str())
    }

    /// Write an arbitrary field by dotted path.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), CoreError> {
        fieldpath::set(&mut self.0.value, path, value).map_err(|e| CoreError::Annotation {
            message: e.to_string(),
        })
    }

    fn annotations_mut(&mut self) -> Result<&mut Map<String, Value>, CoreError> {
        let unwritable = |what: &str| CoreError::Annotation {
            message: format!("cannot write annotations: {what} is not an object"),
        };

        let root = self
            .0
            .value
            .as_object_mut()
            .ok_or_else(|| unwritable("resource"))?;
        let metadata = root
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| unwritable("metadata"))?;
        let annotations = metadata
            .entry("annotations")
            .or_insert_with(|| Value::Object(Map::new()));
        // Kubernetes serializes an empty annotation map as null.
        if annotations.is_null() {
            *annotations = Value::Object(Map::new());
        }
        annotations
            .as_object_mut()
            .ok_or_else(|| unwritable("metadata.annotations"))
    }
}

impl std::ops::Deref for DesiredResource {
    type Target = Unstructured;

    fn deref(&self) -> &Unstructured {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::ConditionStatus;

    fn project(extra: Value) -> Value {
        let mut base = json!({
            "apiVersion": "projects.gitlab.crossplane.io/v1alpha1",
            "kind": "Project",
            "metadata": { "name": "demo" }
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    #[test]
    fn group_kind_strips_version() {
        let gk = GroupKind::from_api_version("groups.gitlab.crossplane.io/v1alpha1", "Group");
        assert_eq!(gk, GroupKind::new("groups.gitlab.crossplane.io", "Group"));
        assert_eq!(gk.to_string(), "Group.groups.gitlab.crossplane.io");
        assert_eq!(GroupKind::from_api_version("v1", "ConfigMap").to_string(), "ConfigMap");
    }

    #[test]
    fn rejects_non_objects_and_missing_kind() {
        assert!(matches!(
            Unstructured::from_value(json!("nope")),
            Err(CoreError::InvalidRequest { .. })
        ));
        assert!(matches!(
            Unstructured::from_value(json!({ "apiVersion": "v1" })),
            Err(CoreError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn empty_external_name_reads_as_absent() {
        let r = ObservedResource::from_value(project(json!({
            "metadata": { "annotations": { "crossplane.io/external-name": "" } }
        })))
        .unwrap();
        assert_eq!(r.external_name(), None);
    }

    #[test]
    fn bool_annotation_spellings() {
        let r = ObservedResource::from_value(project(json!({
            "metadata": { "annotations": { "a": "TRUE", "b": "0", "c": "yes" } }
        })))
        .unwrap();
        assert_eq!(r.bool_annotation("a").unwrap(), Some(true));
        assert_eq!(r.bool_annotation("b").unwrap(), Some(false));
        assert_eq!(r.bool_annotation("missing").unwrap(), None);
        assert!(matches!(
            r.bool_annotation("c"),
            Err(CoreError::Annotation { .. })
        ));
    }

    #[test]
    fn missing_condition_is_unknown() {
        let r = ObservedResource::from_value(project(json!({
            "status": { "conditions": [{ "type": "Ready", "status": "True" }] }
        })))
        .unwrap();
        let synced = r.condition("Synced");
        assert_eq!(synced.status, ConditionStatus::Unknown);
        assert!(synced.message.is_empty());
        assert_eq!(r.condition("Ready").status, ConditionStatus::True);
    }

    #[test]
    fn set_annotation_creates_metadata() {
        let mut d = DesiredResource::from_value(json!({
            "apiVersion": "projects.gitlab.crossplane.io/v1alpha1",
            "kind": "Project"
        }))
        .unwrap();
        d.set_external_name(&ExternalName::from(42)).unwrap();
        assert_eq!(d.external_name(), Some("42"));
    }

    #[test]
    fn set_annotation_replaces_null_map() {
        let mut d = DesiredResource::from_value(project(json!({
            "metadata": { "annotations": null }
        })))
        .unwrap();
        d.set_annotation("k", "v").unwrap();
        assert_eq!(d.annotation("k"), Some("v"));
    }

    #[test]
    fn writes_are_idempotent() {
        let mut d = DesiredResource::from_value(project(json!({}))).unwrap();
        d.set_value("spec.managementPolicies", json!(["Observe"])).unwrap();
        let once = d.clone();
        d.set_value("spec.managementPolicies", json!(["Observe"])).unwrap();
        assert_eq!(d, once);
    }
}
