#![allow(clippy::unwrap_used)]
// Integration tests for `ResourceClient` using wiremock.

use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopdesk_api::{
    ApiClient, Error, FilePart, MultipartPayload, QueryParams, ResourceClient, ResourceId,
    SortOrder, TransportConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Brand {
    id: ResourceId,
    name: String,
    is_active: bool,
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ResourceClient<Brand>) {
    let server = MockServer::start().await;
    let api = ApiClient::from_reqwest(&format!("{}/api", server.uri()), reqwest::Client::new())
        .unwrap();
    (server, api.resource("brands"))
}

fn brand_json(id: u32, name: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "isActive": true })
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sends_paging_sort_and_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brands"))
        .and(query_param("search", "apple"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "5"))
        .and(query_param("_sort", "name"))
        .and(query_param("_order", "asc"))
        .and(query_param("isActive", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [brand_json(6, "Apple")],
            "meta": { "total": 6, "page": 2, "pageSize": 5, "totalPages": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = QueryParams::new(5)
        .with_page(2)
        .with_search("apple")
        .with_sort("name", SortOrder::Asc)
        .with_filter("isActive", "true");
    let page = client.list(&params).await.unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].id.as_str(), "6");
    assert_eq!(page.meta.total_pages, 2);
}

#[tokio::test]
async fn test_get_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brands/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brand_json(7, "Samsung")))
        .mount(&server)
        .await;

    let brand = client.get("7").await.unwrap();
    assert_eq!(brand.name, "Samsung");
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brands/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "gone" })))
        .mount(&server)
        .await;

    let err = client.get("404").await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got: {err:?}");
}

#[tokio::test]
async fn test_options_with_parent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brands/options"))
        .and(query_param("parentId", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "label": "Apple" },
            { "id": "b2", "label": "Nokia" }
        ])))
        .mount(&server)
        .await;

    let options = client.options(Some("3")).await.unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].id.as_str(), "1");
    assert_eq!(options[1].label, "Nokia");
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_json() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/brands"))
        .and(body_json(json!({ "name": "Xiaomi" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(brand_json(9, "Xiaomi")))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create(&json!({ "name": "Xiaomi" })).await.unwrap();
    assert_eq!(created.id.as_str(), "9");
}

#[tokio::test]
async fn test_update_patches_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/brands/9"))
        .and(body_json(json!({ "isActive": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "name": "Xiaomi", "isActive": false
        })))
        .mount(&server)
        .await;

    let updated = client.update("9", &json!({ "isActive": false })).await.unwrap();
    assert!(!updated.is_active);
}

#[tokio::test]
async fn test_delete_expects_no_content() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/brands/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete("9").await.unwrap();
}

#[tokio::test]
async fn test_bulk_update_sends_ids_and_data() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/brands"))
        .and(body_json(json!({ "ids": ["1", "2"], "data": { "isActive": true } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .bulk_update(&["1".into(), "2".into()], &json!({ "isActive": true }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bulk_delete_sends_ids() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/brands"))
        .and(body_json(json!({ "ids": ["4", "5"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.bulk_delete(&["4".into(), "5".into()]).await.unwrap();
}

#[tokio::test]
async fn test_multipart_create_carries_file() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/brands"))
        .respond_with(ResponseTemplate::new(201).set_body_json(brand_json(10, "Oppo")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = MultipartPayload::from_serialize(&json!({ "name": "Oppo", "note": null }))
        .unwrap()
        .file("logo", FilePart::new("logo.png", vec![1, 2, 3]).with_mime("image/png"));
    client.create_multipart(payload).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"name\""));
    assert!(body.contains("filename=\"logo.png\""));
    assert!(!body.contains("name=\"note\""));
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_message_is_surfaced() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/brands"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "name is required",
            "code": "validation"
        })))
        .mount(&server)
        .await;

    let err = client.create(&json!({})).await.unwrap_err();
    match err {
        Error::Api { status, message, code } => {
            assert_eq!(status, 422);
            assert_eq!(message, "name is required");
            assert_eq!(code.as_deref(), Some("validation"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body_becomes_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brands/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let err = client.get("1").await.unwrap_err();
    assert!(
        matches!(&err, Error::Api { status: 500, message, .. } if message == "database offline"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brands/1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "token expired" })))
        .mount(&server)
        .await;

    let err = client.get("1").await.unwrap_err();
    assert!(
        matches!(&err, Error::Unauthorized { message } if message == "token expired"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brands/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.get("1").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_network() {
    let api = ApiClient::from_reqwest("http://127.0.0.1:9", reqwest::Client::new()).unwrap();
    let client: ResourceClient<Brand> = api.resource("brands");
    let err = client.get("1").await.unwrap_err();
    assert!(err.is_network(), "expected network error, got: {err:?}");
}

// ── Transport ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/brands/1"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brand_json(1, "Apple")))
        .expect(1)
        .mount(&server)
        .await;

    let transport = TransportConfig::default().with_token("t0ken".to_owned().into());
    let api = ApiClient::new(&server.uri(), &transport).unwrap();
    let client: ResourceClient<Brand> = api.resource("brands");
    client.get("1").await.unwrap();
}
