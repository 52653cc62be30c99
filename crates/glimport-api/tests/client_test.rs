#![allow(clippy::unwrap_used)]
// Integration tests for `GitLabClient` using wiremock.

use futures_util::TryStreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use glimport_api::{Error, GitLabClient, Group, Project, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GitLabClient) {
    let server = MockServer::start().await;
    let client = GitLabClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn page(body: serde_json::Value, current: u32, total: u32) -> ResponseTemplate {
    let next = if current < total {
        (current + 1).to_string()
    } else {
        String::new()
    };
    ResponseTemplate::new(200)
        .set_body_json(body)
        .insert_header("x-page", current.to_string().as_str())
        .insert_header("x-total-pages", total.to_string().as_str())
        .insert_header("x-next-page", next.as_str())
        .insert_header("x-per-page", "10")
}

fn groups(ids: std::ops::Range<i64>) -> serde_json::Value {
    json!(
        ids.map(|id| json!({ "id": id, "name": format!("g{id}"), "path": format!("g{id}"), "parent_id": 100 }))
            .collect::<Vec<_>>()
    )
}

// ── Subgroups ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_subgroups_walks_all_pages() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/100/subgroups"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "10"))
        .and(query_param("all_available", "true"))
        .respond_with(page(groups(1..11), 1, 2))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/100/subgroups"))
        .and(query_param("page", "2"))
        .respond_with(page(groups(11..14), 2, 2))
        .expect(1)
        .mount(&server)
        .await;

    let all: Vec<Group> = client.list_subgroups(100).try_collect().await.unwrap();

    assert_eq!(all.len(), 13);
    assert_eq!(all[0].id, 1);
    assert_eq!(all[12].path, "g13");
    assert_eq!(all[12].parent_id, Some(100));
}

#[tokio::test]
async fn test_list_subgroups_stops_without_total_pages_header() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/5/subgroups"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(groups(1..3))
                .insert_header("x-page", "1")
                .insert_header("x-next-page", ""),
        )
        .expect(1)
        .mount(&server)
        .await;

    let all: Vec<Group> = client.list_subgroups(5).try_collect().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_next_page_that_does_not_advance_ends_stream() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/5/subgroups"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(groups(1..3))
                .insert_header("x-page", "1")
                .insert_header("x-next-page", "1"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let all: Vec<Group> = client.list_subgroups(5).try_collect().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_dropping_stream_skips_remaining_pages() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/100/subgroups"))
        .and(query_param("page", "1"))
        .respond_with(page(groups(1..11), 1, 3))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/100/subgroups"))
        .and(query_param("page", "2"))
        .respond_with(page(groups(11..21), 2, 3))
        .expect(0)
        .mount(&server)
        .await;

    let stream = client.list_subgroups(100);
    futures_util::pin_mut!(stream);
    let first = stream.try_next().await.unwrap().unwrap();
    assert_eq!(first.id, 1);
}

// ── Projects ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_group_projects_with_search() {
    let (server, client) = setup().await;

    let body = json!([{
        "id": 7,
        "name": "Demo",
        "path": "demo",
        "path_with_namespace": "acme/demo",
        "namespace": { "id": 100, "name": "acme", "path": "acme", "kind": "group", "full_path": "acme" }
    }]);

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/100/projects"))
        .and(query_param("search", "demo"))
        .and(query_param("page", "1"))
        .respond_with(page(body, 1, 1))
        .mount(&server)
        .await;

    let projects: Vec<Project> = client
        .list_group_projects(100, "demo")
        .try_collect()
        .await
        .unwrap();

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, 7);
    assert_eq!(projects[0].path_with_namespace, "acme/demo");
    assert_eq!(projects[0].namespace.as_ref().map(|n| n.id), Some(100));
}

#[tokio::test]
async fn test_get_project() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Demo",
            "path": "demo",
            "path_with_namespace": "acme/platform/demo",
            "web_url": "https://gitlab.example.com/acme/platform/demo"
        })))
        .mount(&server)
        .await;

    let project = client.get_project(7).await.unwrap();

    assert_eq!(project.path, "demo");
    assert_eq!(project.path_with_namespace, "acme/platform/demo");
    assert!(project.namespace.is_none());
}

#[tokio::test]
async fn test_token_header_is_sent() {
    let server = MockServer::start().await;
    let token: secrecy::SecretString = "glpat-test".to_string().into();
    let client =
        GitLabClient::from_token(&server.uri(), &token, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/1"))
        .and(header("PRIVATE-TOKEN", "glpat-test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "path": "p" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.get_project(1).await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "401 Unauthorized" })))
        .mount(&server)
        .await;

    let result = client.get_project(1).await;
    assert!(
        matches!(result, Err(Error::InvalidToken)),
        "expected InvalidToken, got: {result:?}"
    );
}

#[tokio::test]
async fn test_api_error_carries_metadata() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/404/subgroups"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "message": "404 Group Not Found" }))
                .insert_header("x-request-id", "req-123"),
        )
        .mount(&server)
        .await;

    let result: Result<Vec<Group>, Error> = client.list_subgroups(404).try_collect().await;

    match result {
        Err(err @ Error::Api { .. }) => {
            assert!(err.is_not_found());
            assert_eq!(err.status(), Some(404));
            assert_eq!(err.request_id(), Some("req-123"));
            assert!(err.to_string().contains("404 Group Not Found"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_on_second_page_ends_stream() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/100/projects"))
        .and(query_param("page", "1"))
        .respond_with(page(json!([{ "id": 1, "path": "a" }]), 1, 2))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/100/projects"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result: Result<Vec<Project>, Error> =
        client.list_group_projects(100, "").try_collect().await;

    match result {
        Err(err) => {
            assert!(err.is_transient());
            assert_eq!(err.status(), Some(502));
        }
        Ok(items) => panic!("expected error, got {} items", items.len()),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.get_project(3).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
