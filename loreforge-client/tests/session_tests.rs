use loreforge_client::api::ApiClient;
use loreforge_client::auth::{AuthClient, Session};
use loreforge_client::config::BackendConfig;
use loreforge_client::session::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "7f8a1c1e-0000-4000-8000-0000000000aa";

fn session_json(access: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "refresh_token": "rt-1",
        "user": { "id": USER_ID, "email": "lyra@loreforge.app" }
    })
}

async fn setup(server: &MockServer, signed_in: bool) -> (SessionStore, Arc<AuthClient>) {
    let config = BackendConfig::test(server.uri());
    let auth = Arc::new(AuthClient::new(config.clone()).unwrap());
    if signed_in {
        let session: Session = serde_json::from_value(session_json("at-1")).unwrap();
        auth.set_session(session).await;
    }
    let api = Arc::new(ApiClient::new_browser(config, auth.clone()).unwrap());
    (SessionStore::new(api, auth.clone()), auth)
}

fn user_mock() -> Mock {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": USER_ID,
            "email": "lyra@loreforge.app"
        })))
}

fn profile_mock(is_admin: bool) -> Mock {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": USER_ID,
            "username": "lyra",
            "is_admin": is_admin
        }])))
}

// --- Initialization ---

#[tokio::test]
async fn init_resolves_the_signed_in_identity() {
    let server = MockServer::start().await;
    user_mock().mount(&server).await;
    profile_mock(true).mount(&server).await;

    let (store, _auth) = setup(&server, true).await;
    assert!(store.current().is_loading);

    store.init().await;

    let state = store.current();
    assert!(!state.is_loading);
    assert_eq!(
        state.user.as_ref().and_then(|u| u.email.as_deref()),
        Some("lyra@loreforge.app")
    );
    assert_eq!(
        state.profile.as_ref().and_then(|p| p.username.as_deref()),
        Some("lyra")
    );
    assert!(state.is_admin);
}

#[tokio::test]
async fn concurrent_inits_resolve_the_session_once() {
    let server = MockServer::start().await;
    user_mock().expect(1).mount(&server).await;
    profile_mock(false).expect(1).mount(&server).await;

    let (store, _auth) = setup(&server, true).await;
    let a = store.clone();
    let b = store.clone();
    tokio::join!(a.init(), b.init(), store.init());

    assert!(store.current().user.is_some());
}

#[tokio::test]
async fn init_without_a_session_resolves_signed_out() {
    let server = MockServer::start().await;
    // No mocks: nothing may be fetched for an anonymous visitor.
    let (store, _auth) = setup(&server, false).await;
    store.init().await;

    let state = store.current();
    assert!(!state.is_loading);
    assert!(state.user.is_none());
    assert!(!state.is_admin);
}

#[tokio::test]
async fn expired_token_resolves_signed_out_instead_of_erroring() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "msg": "JWT expired"
        })))
        .mount(&server)
        .await;

    let (store, _auth) = setup(&server, true).await;
    store.init().await;

    let state = store.current();
    assert!(!state.is_loading);
    assert!(state.user.is_none());
}

#[tokio::test]
async fn missing_profile_row_still_resolves_the_user() {
    let server = MockServer::start().await;
    user_mock().mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let (store, _auth) = setup(&server, true).await;
    store.init().await;

    let state = store.current();
    assert!(state.user.is_some());
    assert!(state.profile.is_none());
    assert!(!state.is_admin);
}

// --- Event handling ---

#[tokio::test]
async fn sign_out_is_seen_by_every_watcher() {
    let server = MockServer::start().await;
    user_mock().mount(&server).await;
    profile_mock(false).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (store, _auth) = setup(&server, true).await;
    store.init().await;
    let mut watcher_a = store.subscribe();
    let mut watcher_b = store.subscribe();
    watcher_a.mark_unchanged();
    watcher_b.mark_unchanged();

    store.sign_out().await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), watcher_a.changed())
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(Duration::from_secs(1), watcher_b.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(watcher_a.borrow().user.is_none());
    assert!(store.current().user.is_none());
}

#[tokio::test]
async fn sign_in_after_init_loads_the_new_identity() {
    let server = MockServer::start().await;
    user_mock().mount(&server).await;
    profile_mock(true).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("at-1")))
        .mount(&server)
        .await;

    let (store, _auth) = setup(&server, false).await;
    store.init().await;
    assert!(store.current().user.is_none());

    let mut watcher = store.subscribe();
    watcher.mark_unchanged();
    store.sign_in("lyra@loreforge.app", "hunter2").await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), watcher.changed())
        .await
        .unwrap()
        .unwrap();
    let state = store.current();
    assert!(state.user.is_some());
    assert!(state.is_admin);
}

#[tokio::test]
async fn token_refresh_does_not_ripple_a_state_change() {
    let server = MockServer::start().await;
    user_mock().mount(&server).await;
    profile_mock(false).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("at-2")))
        .mount(&server)
        .await;

    let (store, auth) = setup(&server, true).await;
    store.init().await;
    let mut watcher = store.subscribe();
    watcher.mark_unchanged();

    auth.refresh_session().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!watcher.has_changed().unwrap());
    assert!(store.current().user.is_some());
}
