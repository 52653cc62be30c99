// ── Remote identity types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CoreError;

/// Where a resource lives remotely: the parent namespace/group id and the
/// resource's own path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Addressing {
    parent_id: i64,
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressingError {
    #[error("parent id {0} is negative")]
    NegativeParent(i64),

    #[error("path is empty")]
    EmptyPath,
}

impl Addressing {
    pub fn new(parent_id: i64, path: impl Into<String>) -> Result<Self, AddressingError> {
        let path = path.into();
        if parent_id < 0 {
            return Err(AddressingError::NegativeParent(parent_id));
        }
        if path.is_empty() {
            return Err(AddressingError::EmptyPath);
        }
        Ok(Self { parent_id, path })
    }

    pub fn parent_id(&self) -> i64 {
        self.parent_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Addressing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent_id, self.path)
    }
}

/// Stable remote identifier written to `crossplane.io/external-name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalName(String);

impl ExternalName {
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::Annotation {
                message: "external-name must not be empty".into(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ExternalName {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for ExternalName {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, CoreError> {
        Self::new(s)
    }
}

impl From<ExternalName> for String {
    fn from(name: ExternalName) -> Self {
        name.0
    }
}

impl fmt::Display for ExternalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A project or group as listed by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEntity {
    pub id: i64,
    pub path: String,
    pub parent_id: Option<i64>,
}

impl RemoteEntity {
    pub fn external_name(&self) -> ExternalName {
        ExternalName::from(self.id)
    }
}
