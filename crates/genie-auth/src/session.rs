use crate::AuthError;
use genie_api::{ApiClient, ApiError, MailApi};
use genie_core::Email;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// Query pair appended by the backend after a successful OAuth callback.
pub const AUTH_MARKER: (&str, &str) = ("auth", "success");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Whether the backend session cookie is usable.
///
/// Starts `Unknown`; a probe or the redirect marker settles it, logout tears it down.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    marker_consumed: Arc<AtomicBool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state().await == SessionState::Authenticated
    }

    pub fn login_url(&self, api: &ApiClient) -> Result<Url, AuthError> {
        Ok(api.google_login_url()?)
    }

    /// Authenticates from a redirect carrying `auth=success` and returns the
    /// URL with the marker removed. The marker is honoured once per session.
    pub async fn consume_redirect(&self, url: &Url) -> Option<Url> {
        if !url.query_pairs().any(|(key, value)| is_marker(&key, &value)) {
            return None;
        }
        if self.marker_consumed.swap(true, Ordering::SeqCst) {
            tracing::debug!("auth redirect marker already consumed");
            return None;
        }

        let remaining: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, value)| !is_marker(key, value))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut cleaned = url.clone();
        if remaining.is_empty() {
            cleaned.set_query(None);
        } else {
            cleaned.query_pairs_mut().clear().extend_pairs(remaining);
        }

        self.transition(SessionState::Authenticated).await;
        Some(cleaned)
    }

    /// Checks the session by fetching the inbox.
    ///
    /// `Ok(None)` means the backend has no logged-in user. The fetched emails are
    /// returned on success so the caller can seed the mailbox without a second request.
    pub async fn probe(&self, api: &dyn MailApi) -> Result<Option<Vec<Email>>, AuthError> {
        match api.fetch_inbox().await {
            Ok(emails) => {
                self.transition(SessionState::Authenticated).await;
                Ok(Some(emails))
            }
            Err(err) if err.is_auth_failure() => {
                self.transition(SessionState::Unauthenticated).await;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Feeds any API failure through the session so an expired login is noticed.
    pub async fn observe(&self, err: &ApiError) {
        if err.is_auth_failure() {
            self.transition(SessionState::Unauthenticated).await;
        }
    }

    /// Ends the session locally whatever the backend says. Returns whether the
    /// backend acknowledged the logout.
    pub async fn logout(&self, api: &dyn MailApi) -> bool {
        let acknowledged = match api.logout().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "backend logout failed; clearing session locally");
                false
            }
        };
        self.marker_consumed.store(false, Ordering::SeqCst);
        self.transition(SessionState::Unauthenticated).await;
        acknowledged
    }

    async fn transition(&self, next: SessionState) {
        let mut state = self.state.write().await;
        if *state != next {
            tracing::info!(from = ?*state, to = ?next, "session state changed");
            *state = next;
        }
    }
}

fn is_marker(key: &str, value: &str) -> bool {
    key == AUTH_MARKER.0 && value == AUTH_MARKER.1
}
