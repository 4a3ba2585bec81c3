//! Session manager.
//!
//! [`SessionManager`] owns the bearer token and the current-user record.
//! The state is read by every authenticated request and written only by
//! login, logout and restore, so it sits behind an async `RwLock`.
//!
//! The token is persisted through a [`TokenStore`] on login and removed
//! on logout. [`SessionManager::restore`] reloads it on start-up; if the
//! backend no longer accepts it, the session is logged out.

use std::sync::Arc;

use doors_core::models::{Credentials, Registration, User};
use tokio::sync::RwLock;

use crate::api::DoorsApi;
use crate::error::ClientError;
use crate::token_store::TokenStore;

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// Shared session handle. Wrap in an `Arc` to share with the poller.
pub struct SessionManager {
    api: Arc<DoorsApi>,
    store: Arc<dyn TokenStore>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(api: Arc<DoorsApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// The data access layer this session authenticates against.
    pub fn api(&self) -> &DoorsApi {
        &self.api
    }

    /// Log in with email/password.
    ///
    /// Obtains a token, loads the matching user, then persists the token.
    /// Any failure leaves the session empty.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ClientError> {
        let token = self.api.login(credentials).await?.access_token;
        let user = self.api.current_user(&token).await?;
        self.store.save(&token).await?;

        tracing::info!(user_id = %user.id, "Logged in");
        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user = Some(user.clone());
        Ok(user)
    }

    /// Create an account without logging in.
    pub async fn register(&self, registration: &Registration) -> Result<User, ClientError> {
        self.api.register(registration).await
    }

    /// Create an account, then log in with the same email and password.
    pub async fn register_and_login(
        &self,
        registration: &Registration,
    ) -> Result<User, ClientError> {
        self.register(registration).await?;
        let credentials = Credentials {
            username: registration.email.clone(),
            password: registration.password.clone(),
        };
        self.login(&credentials).await
    }

    /// Clear the in-memory session and the persisted token.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let had_user = {
            let mut state = self.state.write().await;
            state.token = None;
            state.user.take().is_some()
        };
        self.store.clear().await?;
        if had_user {
            tracing::info!("Logged out");
        }
        Ok(())
    }

    /// Reload the persisted token and the user it belongs to.
    ///
    /// Returns `Ok(None)` when no token is stored, or when the backend
    /// rejects the stored token (the session is then logged out). Other
    /// failures are returned and the stored token is kept.
    pub async fn restore(&self) -> Result<Option<User>, ClientError> {
        let Some(token) = self.store.load().await? else {
            tracing::debug!("No stored session");
            return Ok(None);
        };

        match self.api.current_user(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Session restored");
                let mut state = self.state.write().await;
                state.token = Some(token);
                state.user = Some(user.clone());
                Ok(Some(user))
            }
            Err(e) if e.is_auth_failure() => {
                tracing::warn!(error = %e, "Stored session rejected, logging out");
                self.logout().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    /// The current token, or [`ClientError::NotAuthenticated`].
    pub async fn require_token(&self) -> Result<String, ClientError> {
        self.token().await.ok_or(ClientError::NotAuthenticated)
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.token.is_some()
    }
}
