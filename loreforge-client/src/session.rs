//! Singleton session store.
//!
//! One process-wide view of "who is signed in": the auth user, their
//! profile row, and the derived admin flag. Consumers watch the state
//! rather than polling; the store listens to auth events and reloads
//! itself when identity changes. Pure token rotations are deliberately
//! ignored so they never ripple a state change through the UI.

use crate::api::ApiClient;
use crate::auth::{AuthClient, AuthEvent, AuthUser, Session, SignUpMetadata};
use crate::error::{DataError, DataResult};
use crate::queries::profiles;
use loreforge_types::Profile;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, OnceCell};
use tracing::{debug, warn};

/// Snapshot of the signed-in identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
    pub is_admin: bool,
    /// True until the first session resolution completes.
    pub is_loading: bool,
}

impl SessionState {
    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    fn signed_out() -> Self {
        Self::default()
    }
}

/// Process-wide session store. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct SessionStore {
    api: Arc<ApiClient>,
    auth: Arc<AuthClient>,
    state: watch::Sender<SessionState>,
    init: Arc<OnceCell<()>>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>, auth: Arc<AuthClient>) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self {
            api,
            auth,
            state,
            init: Arc::new(OnceCell::new()),
        }
    }

    /// Subscribes to session-state changes. The receiver immediately
    /// holds the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current snapshot.
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Resolves the session once and starts the auth-event listener.
    ///
    /// Safe to call from every consumer; concurrent and repeated calls
    /// perform the initialization exactly once.
    pub async fn init(&self) {
        let store = self.clone();
        self.init
            .get_or_init(|| async move {
                store.spawn_event_listener();
                store.reload().await;
            })
            .await;
    }

    /// Re-resolves the session from the credential API.
    ///
    /// A failed user fetch resolves to the signed-out state rather than
    /// an error: an expired token on startup is an ordinary condition,
    /// not a fault.
    async fn reload(&self) {
        if !self.auth.is_authenticated().await {
            self.publish(SessionState::signed_out());
            return;
        }

        let user = match self.auth.get_user().await {
            Ok(user) => user,
            Err(e) => {
                debug!("session resolution found no valid user: {e}");
                self.publish(SessionState::signed_out());
                return;
            }
        };

        let profile = match profiles::get_profile(&self.api, user.id).await {
            Ok(profile) => Some(profile),
            Err(DataError::NotFound(_)) => None,
            Err(e) => {
                warn!("profile load failed for {}: {e}", user.id);
                None
            }
        };

        let is_admin = profile
            .as_ref()
            .and_then(|p| p.is_admin)
            .unwrap_or(false);

        self.publish(SessionState {
            user: Some(user),
            profile,
            is_admin,
            is_loading: false,
        });
    }

    fn publish(&self, next: SessionState) {
        // Identical snapshots are swallowed so watchers only wake on
        // real changes.
        self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    fn spawn_event_listener(&self) {
        let store = self.clone();
        let mut events = self.auth.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedOut) => store.publish(SessionState::signed_out()),
                    Ok(AuthEvent::SignedIn) | Ok(AuthEvent::UserUpdated) => store.reload().await,
                    // Token rotation carries no identity change.
                    Ok(AuthEvent::TokenRefreshed) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("session listener lagged, skipped {skipped} auth events");
                        store.reload().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // ── Credential operations, delegated ──

    pub async fn sign_in(&self, email: &str, password: &str) -> DataResult<Session> {
        self.auth.sign_in(email, password).await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Option<SignUpMetadata>,
    ) -> DataResult<AuthUser> {
        self.auth.sign_up(email, password, metadata).await
    }

    pub async fn sign_out(&self) -> DataResult<()> {
        self.auth.sign_out().await
    }
}
