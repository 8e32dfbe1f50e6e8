use loreforge_client::api::{ApiClient, TableQuery};
use loreforge_client::config::BackendConfig;
use loreforge_client::error::DataError;
use loreforge_types::Story;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer) -> ApiClient {
    ApiClient::new_service(BackendConfig::test(server.uri()), "service-key".into()).unwrap()
}

fn story_json(slug: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "7f8a1c1e-0000-4000-8000-000000000001",
        "title": "A Queda",
        "slug": slug,
        "status": "published"
    })
}

// --- Row reads ---

#[tokio::test]
async fn get_rows_deserializes_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([story_json("a-queda")])),
        )
        .mount(&server)
        .await;

    let api = setup(&server);
    let rows: Vec<Story> = api
        .get_rows("stories", TableQuery::new().select("*"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].slug, "a-queda");
}

#[tokio::test]
async fn counted_reads_parse_content_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .and(header("Prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/42")
                .set_body_json(serde_json::json!([story_json("a-queda")])),
        )
        .mount(&server)
        .await;

    let api = setup(&server);
    let (rows, count): (Vec<Story>, Option<u64>) = api
        .get_rows_counted("stories", TableQuery::new().select("*"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(count, Some(42));
}

#[tokio::test]
async fn single_row_miss_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result: Result<Story, _> = api
        .get_row("stories", TableQuery::new().eq("slug", "missing"))
        .await;
    assert!(matches!(result, Err(DataError::NotFound(_))));
}

#[tokio::test]
async fn filters_become_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .and(query_param("status", "eq.published"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server);
    let rows: Vec<Story> = api
        .get_rows(
            "stories",
            TableQuery::new()
                .select("*")
                .eq("status", "published")
                .order("created_at", false)
                .limit(20),
        )
        .await
        .unwrap();
    assert!(rows.is_empty());
}

// --- Writes ---

#[tokio::test]
async fn insert_returns_stored_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/stories"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({"title": "A Queda"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!([story_json("a-queda")])),
        )
        .mount(&server)
        .await;

    let api = setup(&server);
    let stored: Story = api
        .insert_row(
            "stories",
            &serde_json::json!({"title": "A Queda", "slug": "a-queda"}),
        )
        .await
        .unwrap();
    assert_eq!(stored.slug, "a-queda");
}

#[tokio::test]
async fn update_with_no_match_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/stories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result: Result<Story, _> = api
        .update_row(
            "stories",
            TableQuery::new().eq("id", "x"),
            &serde_json::json!({"title": "Novo"}),
        )
        .await;
    assert!(matches!(result, Err(DataError::NotFound(_))));
}

// --- Error taxonomy ---

#[tokio::test]
async fn unauthorized_maps_to_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result: Result<Vec<Story>, _> = api.get_rows("stories", TableQuery::new()).await;
    assert!(matches!(result, Err(DataError::Unauthenticated)));
}

#[tokio::test]
async fn row_level_security_denial_maps_to_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/stories"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "42501",
            "message": "permission denied for table stories"
        })))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result: Result<Story, _> = api
        .update_row("stories", TableQuery::new(), &serde_json::json!({}))
        .await;
    assert!(matches!(result, Err(DataError::PermissionDenied(_))));
}

#[tokio::test]
async fn unique_violation_maps_to_duplicate_slug() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/stories"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"stories_slug_key\""
        })))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result: Result<Story, _> = api
        .insert_row("stories", &serde_json::json!({"slug": "a-queda"}))
        .await;
    assert!(matches!(result, Err(DataError::DuplicateSlug(_))));
}

#[tokio::test]
async fn backend_not_found_code_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .respond_with(ResponseTemplate::new(406).set_body_json(serde_json::json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result: Result<Vec<Story>, _> = api.get_rows("stories", TableQuery::new()).await;
    assert!(matches!(result, Err(DataError::NotFound(_))));
}

#[tokio::test]
async fn server_errors_surface_as_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result: Result<Vec<Story>, _> = api.get_rows("stories", TableQuery::new()).await;
    assert!(matches!(result, Err(DataError::Api(_))));
}

// --- Token sourcing ---

#[tokio::test]
async fn service_client_sends_service_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stories"))
        .and(header("Authorization", "Bearer service-key"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server);
    let _: Vec<Story> = api.get_rows("stories", TableQuery::new()).await.unwrap();
}
