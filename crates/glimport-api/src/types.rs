//! GitLab REST API response types (`/api/v4`).
//!
//! Only the fields the importer needs are modeled; GitLab returns many
//! more. Field names match GitLab's snake_case JSON directly.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

// ── Pagination ───────────────────────────────────────────────────────

/// Pagination metadata read from GitLab's `X-*` response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    /// `X-Page`; falls back to the requested page number.
    pub current_page: u32,
    /// `X-Total-Pages`. GitLab omits it for collections over 10,000 rows.
    pub total_pages: Option<u32>,
    /// `X-Next-Page`; empty on the last page.
    pub next_page: Option<u32>,
    /// `X-Per-Page`.
    pub per_page: Option<u32>,
    /// `X-Total`.
    pub total: Option<u64>,
}

impl PageInfo {
    /// Parse page headers. Missing or malformed headers read as absent.
    pub fn from_headers(headers: &HeaderMap, requested_page: u32) -> Self {
        Self {
            current_page: header_num(headers, "x-page").unwrap_or(requested_page),
            total_pages: header_num(headers, "x-total-pages"),
            next_page: header_num(headers, "x-next-page"),
            per_page: header_num(headers, "x-per-page"),
            total: header_num(headers, "x-total"),
        }
    }

    /// Whether this is the final page of the listing.
    ///
    /// Uses `current >= total` when the total is known and the absence of a
    /// next page otherwise.
    pub fn is_last(&self) -> bool {
        match self.total_pages {
            Some(total) => self.current_page >= total,
            None => self.next_page.is_none(),
        }
    }

    /// Page number to request next.
    pub fn following(&self) -> u32 {
        self.next_page
            .unwrap_or_else(|| self.current_page.saturating_add(1))
    }
}

fn header_num<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

// ── Namespaces ───────────────────────────────────────────────────────

/// Namespace a project lives in, embedded in project responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub path: String,
    /// `group` or `user`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

// ── Projects ─────────────────────────────────────────────────────────

/// Project, from `GET /groups/:id/projects` and `GET /projects/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub path_with_namespace: String,
    #[serde(default)]
    pub namespace: Option<Namespace>,
    #[serde(default)]
    pub web_url: Option<String>,
}

// ── Groups ───────────────────────────────────────────────────────────

/// Group, from `GET /groups/:id/subgroups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub web_url: Option<String>,
}
