//! HTTP client for the backend's credential API.
//!
//! Owns the session tokens, serializes token refresh so concurrent 401s
//! perform a single refresh, and broadcasts session-change events to
//! subscribers. Pure token refreshes emit their own event kind so that
//! consumers which only care about identity changes can ignore them.

use crate::config::BackendConfig;
use crate::error::{DataError, DataResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// The authenticated identity, as returned by the credential API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

/// An active session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Optional profile fields attached at sign-up.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SignUpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Session-change notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    /// A token rotation with no identity change. Carries no state
    /// relevant to the UI.
    TokenRefreshed,
    UserUpdated,
}

struct AuthState {
    session: Option<Session>,
    /// Bumped on every successful refresh; used to detect that a
    /// concurrent refresh already rotated the tokens.
    refresh_generation: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

#[derive(Deserialize)]
struct AuthErrorBody {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
}

/// HTTP client for the backend credential API.
pub struct AuthClient {
    client: Client,
    config: BackendConfig,
    state: Arc<RwLock<AuthState>>,
    /// Serializes refresh operations. Without this, concurrent 401s all
    /// read the same old refresh token; the server rotates on the first
    /// call and the rest fail.
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(config: BackendConfig) -> DataResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DataError::Config(format!("failed to build HTTP client: {e}")))?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            client,
            config,
            state: Arc::new(RwLock::new(AuthState {
                session: None,
                refresh_generation: 0,
            })),
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
            events,
        })
    }

    /// Subscribes to session-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Current access token, if a session is active.
    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Current signed-in user, from local session state.
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.session.is_some()
    }

    /// Restores a previously persisted session without a network call.
    pub async fn set_session(&self, session: Session) {
        self.state.write().await.session = Some(session);
        let _ = self.events.send(AuthEvent::SignedIn);
    }

    // ── Credential operations ──

    pub async fn sign_in(&self, email: &str, password: &str) -> DataResult<Session> {
        let url = format!(
            "{}/auth/v1/token?grant_type=password",
            self.config.base_url
        );
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let resp = check_auth(resp).await?;
        let tokens: TokenResponse = resp.json().await?;
        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            user: tokens.user,
        };

        self.state.write().await.session = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn);
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Option<SignUpMetadata>,
    ) -> DataResult<AuthUser> {
        let url = format!("{}/auth/v1/signup", self.config.base_url);
        let mut body = serde_json::json!({ "email": email, "password": password });
        if let Some(metadata) = metadata {
            body["data"] = serde_json::to_value(metadata)?;
        }

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await?;

        let resp = check_auth(resp).await?;
        Ok(resp.json().await?)
    }

    /// Revokes the session server-side and clears local tokens.
    pub async fn sign_out(&self) -> DataResult<()> {
        let token = self.access_token().await;

        // Clear local state first so consumers observe the sign-out even
        // if the revocation request fails.
        self.state.write().await.session = None;
        let _ = self.events.send(AuthEvent::SignedOut);

        if let Some(token) = token {
            let url = format!("{}/auth/v1/logout", self.config.base_url);
            let resp = self
                .client
                .post(&url)
                .header("apikey", &self.config.anon_key)
                .bearer_auth(&token)
                .send()
                .await?;
            if !resp.status().is_success() {
                warn!("server-side session revocation failed: {}", resp.status());
            }
        }
        Ok(())
    }

    /// Fetches the current user from the credential API.
    pub async fn get_user(&self) -> DataResult<AuthUser> {
        let token = self
            .access_token()
            .await
            .ok_or(DataError::Unauthenticated)?;

        let url = format!("{}/auth/v1/user", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        let resp = check_auth(resp).await?;
        Ok(resp.json().await?)
    }

    /// Rotates the session tokens. Concurrent callers perform one HTTP
    /// refresh between them.
    pub async fn refresh_session(&self) -> DataResult<String> {
        let pre_gen = self.state.read().await.refresh_generation;

        let _guard = self.refresh_lock.lock().await;

        // If the generation advanced while we waited, a concurrent
        // refresh already succeeded. Use its token.
        {
            let state = self.state.read().await;
            if state.refresh_generation > pre_gen {
                return state
                    .session
                    .as_ref()
                    .map(|s| s.access_token.clone())
                    .ok_or(DataError::Unauthenticated);
            }
        }

        let refresh_token = {
            let state = self.state.read().await;
            state
                .session
                .as_ref()
                .map(|s| s.refresh_token.clone())
                .ok_or(DataError::Unauthenticated)?
        };

        let url = format!(
            "{}/auth/v1/token?grant_type=refresh_token",
            self.config.base_url
        );
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::FORBIDDEN
        {
            // Refresh token expired or revoked — drop the stale session.
            self.state.write().await.session = None;
            let _ = self.events.send(AuthEvent::SignedOut);
            return Err(DataError::AuthFailed(
                "token refresh failed: session expired".to_string(),
            ));
        }

        let resp = check_auth(resp).await?;
        let tokens: TokenResponse = resp.json().await?;
        debug!("session tokens rotated for user {}", tokens.user.id);

        let access_token = tokens.access_token.clone();
        {
            let mut state = self.state.write().await;
            state.session = Some(Session {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expires_at: tokens.expires_at,
                user: tokens.user,
            });
            state.refresh_generation += 1;
        }
        let _ = self.events.send(AuthEvent::TokenRefreshed);

        Ok(access_token)
    }
}

async fn check_auth(resp: reqwest::Response) -> DataResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body: AuthErrorBody = resp.json().await.unwrap_or(AuthErrorBody { message: None });
    let message = body.message.unwrap_or_else(|| status.to_string());

    Err(if status == reqwest::StatusCode::UNAUTHORIZED {
        DataError::Unauthenticated
    } else if status.is_client_error() {
        DataError::AuthFailed(message)
    } else {
        DataError::Api(format!("{status}: {message}"))
    })
}
