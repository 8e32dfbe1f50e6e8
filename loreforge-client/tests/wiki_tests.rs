use loreforge_client::api::ApiClient;
use loreforge_client::config::BackendConfig;
use loreforge_client::error::DataError;
use loreforge_client::queries::wiki;
use loreforge_types::{EntityListParams, WikiEntityType};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer) -> ApiClient {
    ApiClient::new_service(BackendConfig::test(server.uri()), "service-key".into()).unwrap()
}

const LYRA_ID: &str = "7f8a1c1e-0000-4000-8000-0000000000b1";

fn entity_json(id: &str, name: &str, slug: &str, entity_type: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "slug": slug,
        "entity_type": entity_type
    })
}

// --- Listing and search ---

#[tokio::test]
async fn search_is_a_case_insensitive_substring_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wiki_entities"))
        .and(query_param("name", "ilike.*lyr*"))
        .and(query_param("order", "name.asc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/1")
                .set_body_json(serde_json::json!([entity_json(
                    LYRA_ID, "Lyra", "lyra", "character"
                )])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server);
    let page = wiki::get_wiki_entities(
        &api,
        EntityListParams {
            search: Some("lyr".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.entities.len(), 1);
    assert_eq!(page.count, Some(1));
}

#[tokio::test]
async fn empty_search_string_does_not_constrain_the_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wiki_entities"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/1")
                .set_body_json(serde_json::json!([entity_json(
                    LYRA_ID, "Lyra", "lyra", "character"
                )])),
        )
        .mount(&server)
        .await;

    let api = setup(&server);
    let page = wiki::get_wiki_entities(
        &api,
        EntityListParams {
            search: Some(String::new()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    // No ilike param was sent; the mock above has no ilike matcher and
    // would reject a request carrying one only via expectation below.
    assert_eq!(page.entities.len(), 1);

    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !r.url.query().unwrap_or("").contains("ilike")));
}

// --- Relations ---

#[tokio::test]
async fn relations_union_both_directions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wiki_entities"))
        .and(query_param("slug", "eq.lyra"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            entity_json(LYRA_ID, "Lyra", "lyra", "character")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/entity_relations"))
        .and(query_param("entity_a_id", format!("eq.{LYRA_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "relation_type": "ally",
            "entity_b": entity_json(
                "7f8a1c1e-0000-4000-8000-0000000000b2", "Kael", "kael", "character"
            )
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/entity_relations"))
        .and(query_param("entity_b_id", format!("eq.{LYRA_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "relation_type": "member",
            "description": "founding member",
            "entity_a": entity_json(
                "7f8a1c1e-0000-4000-8000-0000000000b3", "A Ordem", "a-ordem", "organization"
            )
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/entity_story_relations"))
        .and(query_param("entity_id", format!("eq.{LYRA_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "relation_type": "protagonist",
            "story": {
                "id": "7f8a1c1e-0000-4000-8000-000000000001",
                "title": "A Queda do Império",
                "slug": "a-queda"
            }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server);
    let full = wiki::get_wiki_entity_with_relations(&api, "lyra")
        .await
        .unwrap();

    assert_eq!(full.entity.name, "Lyra");
    assert_eq!(full.related_entities.len(), 2);
    let names: Vec<&str> = full
        .related_entities
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert!(names.contains(&"Kael"));
    assert!(names.contains(&"A Ordem"));
    assert_eq!(full.stories.len(), 1);
    assert_eq!(full.stories[0].slug, "a-queda");
    assert_eq!(full.stories[0].relation_type.as_deref(), Some("protagonist"));
}

#[tokio::test]
async fn entity_with_no_relations_resolves_with_empty_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wiki_entities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            entity_json(LYRA_ID, "Lyra", "lyra", "character")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/entity_relations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/entity_story_relations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let api = setup(&server);
    let full = wiki::get_wiki_entity_with_relations(&api, "lyra")
        .await
        .unwrap();
    assert!(full.related_entities.is_empty());
    assert!(full.stories.is_empty());
}

// --- Counts ---

#[tokio::test]
async fn counts_tally_every_type_including_zeroes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wiki_entities"))
        .and(query_param("select", "entity_type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"entity_type": "character"},
            {"entity_type": "character"},
            {"entity_type": "location"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server);
    let counts = wiki::get_entity_counts(&api).await.unwrap();

    assert_eq!(counts.len(), WikiEntityType::ALL.len());
    assert_eq!(counts[&WikiEntityType::Character], 2);
    assert_eq!(counts[&WikiEntityType::Location], 1);
    assert_eq!(counts[&WikiEntityType::Organization], 0);
}

// --- Detail ---

#[tokio::test]
async fn missing_entity_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/wiki_entities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let api = setup(&server);
    let result = wiki::get_wiki_entity_by_slug(&api, "nao-existe").await;
    assert!(matches!(result, Err(DataError::NotFound(_))));
}
