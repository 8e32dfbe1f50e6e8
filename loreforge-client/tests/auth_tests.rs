use loreforge_client::auth::{AuthClient, AuthEvent, Session};
use loreforge_client::config::BackendConfig;
use loreforge_client::error::DataError;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer) -> Arc<AuthClient> {
    Arc::new(AuthClient::new(BackendConfig::test(server.uri())).unwrap())
}

fn token_response(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "user": {
            "id": "7f8a1c1e-0000-4000-8000-0000000000aa",
            "email": "lyra@loreforge.app"
        }
    })
}

fn session(access: &str, refresh: &str) -> Session {
    serde_json::from_value(token_response(access, refresh)).unwrap()
}

// --- Sign-in / sign-out ---

#[tokio::test]
async fn not_authenticated_initially() {
    let server = MockServer::start().await;
    let auth = setup(&server);
    assert!(!auth.is_authenticated().await);
    assert_eq!(auth.access_token().await, None);
}

#[tokio::test]
async fn sign_in_stores_session_and_emits_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(serde_json::json!({"email": "lyra@loreforge.app"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("at-1", "rt-1")))
        .mount(&server)
        .await;

    let auth = setup(&server);
    let mut events = auth.subscribe();

    let session = auth.sign_in("lyra@loreforge.app", "hunter2").await.unwrap();
    assert_eq!(session.access_token, "at-1");
    assert!(auth.is_authenticated().await);
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn);
}

#[tokio::test]
async fn sign_in_bad_credentials_is_auth_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let auth = setup(&server);
    let result = auth.sign_in("lyra@loreforge.app", "wrong").await;
    assert!(matches!(result, Err(DataError::AuthFailed(_))));
    assert!(!auth.is_authenticated().await);
}

#[tokio::test]
async fn sign_out_clears_local_state_even_if_revocation_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let auth = setup(&server);
    auth.set_session(session("at-1", "rt-1")).await;
    let mut events = auth.subscribe();

    auth.sign_out().await.unwrap();
    assert!(!auth.is_authenticated().await);
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
}

// --- Refresh ---

#[tokio::test]
async fn refresh_rotates_tokens_and_emits_refresh_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(serde_json::json!({"refresh_token": "rt-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("at-2", "rt-2")))
        .mount(&server)
        .await;

    let auth = setup(&server);
    auth.set_session(session("at-1", "rt-1")).await;
    let mut events = auth.subscribe();

    let token = auth.refresh_session().await.unwrap();
    assert_eq!(token, "at-2");
    assert_eq!(auth.access_token().await, Some("at-2".to_string()));
    assert_eq!(events.recv().await.unwrap(), AuthEvent::TokenRefreshed);
}

#[tokio::test]
async fn concurrent_refreshes_perform_one_http_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response("at-2", "rt-2"))
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = setup(&server);
    auth.set_session(session("at-1", "rt-1")).await;

    let (a, b, c) = tokio::join!(
        auth.refresh_session(),
        auth.refresh_session(),
        auth.refresh_session(),
    );
    assert_eq!(a.unwrap(), "at-2");
    assert_eq!(b.unwrap(), "at-2");
    assert_eq!(c.unwrap(), "at-2");
}

#[tokio::test]
async fn expired_refresh_token_drops_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error_description": "Invalid Refresh Token"
        })))
        .mount(&server)
        .await;

    let auth = setup(&server);
    auth.set_session(session("at-old", "rt-old")).await;
    let mut events = auth.subscribe();

    let result = auth.refresh_session().await;
    assert!(matches!(result, Err(DataError::AuthFailed(_))));
    assert!(!auth.is_authenticated().await);
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
}

#[tokio::test]
async fn refresh_without_session_is_unauthenticated() {
    let server = MockServer::start().await;
    let auth = setup(&server);
    let result = auth.refresh_session().await;
    assert!(matches!(result, Err(DataError::Unauthenticated)));
}

// --- User fetch ---

#[tokio::test]
async fn get_user_requires_a_session() {
    let server = MockServer::start().await;
    let auth = setup(&server);
    let result = auth.get_user().await;
    assert!(matches!(result, Err(DataError::Unauthenticated)));
}

#[tokio::test]
async fn get_user_returns_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "7f8a1c1e-0000-4000-8000-0000000000aa",
            "email": "lyra@loreforge.app"
        })))
        .mount(&server)
        .await;

    let auth = setup(&server);
    auth.set_session(session("at-1", "rt-1")).await;

    let user = auth.get_user().await.unwrap();
    assert_eq!(user.email.as_deref(), Some("lyra@loreforge.app"));
}
