// Hand-crafted async HTTP client for the GitLab REST API (v4).
//
// Base path: /api/v4/
// Auth: PRIVATE-TOKEN header

use futures_util::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{Group, Page, PageInfo, Project};

/// Page size for every list endpoint.
pub const PER_PAGE: u32 = 10;

// ── Error response shape from the GitLab API ─────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the GitLab REST API.
///
/// Holds no per-call state: list endpoints return independent streams
/// that carry their own page cursor, so one client can serve any number
/// of lookups.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GitLabClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an access token and transport config.
    ///
    /// Injects `PRIVATE-TOKEN` as a default header on every request.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token_value =
            HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        token_value.set_sensitive(true);
        headers.insert("PRIVATE-TOKEN", token_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Build the API root: `https://host[/prefix]/api/v4/`.
    ///
    /// Accepts the instance root (`https://gitlab.com`) or a URL that
    /// already points at the API root.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api/v4") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/v4/"));
        }

        Ok(url)
    }

    /// The resolved API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"groups/7/subgroups"`) onto the API root.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let resp = Self::check_status(resp).await?;
        Self::decode(resp).await
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        page: u32,
    ) -> Result<Page<T>, Error> {
        let url = self.url(path)?;
        debug!("GET {url} page={page} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        let info = PageInfo::from_headers(resp.headers(), page);
        let items: Vec<T> = Self::decode(resp).await?;
        trace!(
            page = info.current_page,
            total_pages = ?info.total_pages,
            received = items.len(),
            "page fetched"
        );

        Ok(Page { items, info })
    }

    // ── Response handling ────────────────────────────────────────────

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(Self::parse_error(resp).await)
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(resp: reqwest::Response) -> Error {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidToken;
        }

        let url = resp.url().to_string();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let raw = resp.text().await.unwrap_or_default();

        // GitLab uses `{"message": "..."}`, `{"message": {field: [..]}}`
        // or `{"error": "..."}` depending on the endpoint.
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| match (err.message, err.error) {
                (Some(serde_json::Value::String(m)), _) => Some(m),
                (Some(other), _) => Some(other.to_string()),
                (None, Some(e)) => Some(e),
                (None, None) => None,
            })
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
            url,
            request_id,
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Lazily walk every page of a list endpoint, yielding items in
    /// server order.
    ///
    /// A page is only requested once the consumer has drained the
    /// previous one, so dropping the stream early skips the remaining
    /// requests. The first error ends the stream, and so does a next page
    /// that does not move forward.
    pub fn paginate<T>(
        &self,
        path: String,
        params: Vec<(&'static str, String)>,
    ) -> impl Stream<Item = Result<T, Error>> + Send + '_
    where
        T: DeserializeOwned + Send + 'static,
    {
        async_stream::try_stream! {
            let mut page: u32 = 1;
            loop {
                let batch: Page<T> = self.get_page(&path, &params, page).await?;
                let received = batch.items.len();
                let info = batch.info;

                for item in batch.items {
                    yield item;
                }

                let next = info.following();
                if info.is_last() || received == 0 || next <= page {
                    break;
                }
                page = next;
            }
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Groups ───────────────────────────────────────────────────────

    /// Every subgroup of `group_id`, across all pages.
    pub fn list_subgroups(
        &self,
        group_id: i64,
    ) -> impl Stream<Item = Result<Group, Error>> + Send + '_ {
        self.paginate(
            format!("groups/{group_id}/subgroups"),
            vec![("all_available", "true".to_owned())],
        )
    }

    // ── Projects ─────────────────────────────────────────────────────

    /// Every project directly under `group_id`, across all pages.
    ///
    /// `search` narrows the listing server-side; an empty term lists all.
    pub fn list_group_projects(
        &self,
        group_id: i64,
        search: &str,
    ) -> impl Stream<Item = Result<Project, Error>> + Send + '_ {
        let mut params = Vec::new();
        if !search.is_empty() {
            params.push(("search", search.to_owned()));
        }
        self.paginate(format!("groups/{group_id}/projects"), params)
    }

    pub async fn get_project(&self, project_id: i64) -> Result<Project, Error> {
        self.get(&format!("projects/{project_id}")).await
    }
}
