use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use iva_core::conversation::ConversationLog;
use iva_core::types::{Credentials, Identity, Registration, View};

use crate::error::{AuthError, NetworkError, RegError};
use crate::recorder::RecorderController;
use crate::state::SharedState;
use crate::traits::Backend;

/// Where a successful registration left the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// Back on the login form, ready for the new account.
    ShowingLogin,
    /// A login finished while the request was in flight; that session is kept.
    AlreadySignedIn,
}

/// Owns the authentication lifecycle: login, registration, logout and the
/// switch between the two logged-out forms.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn Backend>,
    state: SharedState,
    recorder: RecorderController,
    auth_timeout: Duration,
}

impl SessionStore {
    pub(crate) fn new(
        backend: Arc<dyn Backend>,
        state: SharedState,
        recorder: RecorderController,
        auth_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            state,
            recorder,
            auth_timeout,
        }
    }

    pub fn view(&self) -> View {
        self.state.lock().session.view()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.lock().session.identity().cloned()
    }

    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Identity, AuthError> {
        let attempt = {
            let mut s = self.state.lock();
            if s.session.is_authenticated() {
                return Err(AuthError::AlreadyAuthenticated);
            }
            s.login_attempt += 1;
            s.login_attempt
        };

        let creds = Credentials::new(email, password);
        log::info!("login attempt #{attempt} for {}", creds.email);

        let pending = self.state.begin();
        let res = bounded(self.auth_timeout, self.backend.login(&creds))
            .await
            .unwrap_or(Err(AuthError::Network(NetworkError::Timeout)));

        pending.settle(|s, _| {
            // Only the most recent attempt may decide the view.
            if s.login_attempt != attempt || s.session.is_authenticated() {
                log::debug!("ignoring result of superseded login attempt #{attempt}");
                return Err(AuthError::Superseded);
            }
            match res {
                Ok(identity) => {
                    s.log = ConversationLog::new();
                    s.session.authenticate(identity.clone());
                    log::info!("signed in as {}", identity.email);
                    Ok(identity)
                }
                Err(e) => {
                    log::warn!("login failed: {e}");
                    Err(e)
                }
            }
        })
    }

    pub async fn register(&self, reg: Registration) -> Result<Registered, RegError> {
        if self.state.lock().session.is_authenticated() {
            return Err(RegError::AlreadyAuthenticated);
        }

        log::info!("registering {}", reg.email);
        let pending = self.state.begin();
        let res = bounded(self.auth_timeout, self.backend.register(&reg))
            .await
            .unwrap_or(Err(RegError::Network(NetworkError::Timeout)));

        pending.settle(|s, _| match res {
            Ok(()) if s.session.is_authenticated() => {
                log::info!("registration accepted for {} while signed in", reg.email);
                Ok(Registered::AlreadySignedIn)
            }
            Ok(()) => {
                // No automatic sign-in: the user logs in with the new account.
                s.session.show_login();
                log::info!("registration accepted for {}", reg.email);
                Ok(Registered::ShowingLogin)
            }
            Err(e) => {
                log::warn!("registration failed: {e}");
                Err(e)
            }
        })
    }

    /// Sign out and tear down everything tied to the session.
    pub fn logout(&self) {
        let previous = {
            let mut s = self.state.lock();
            s.generation += 1;
            s.pending = 0;
            s.log = ConversationLog::new();
            s.session.sign_out()
        };
        self.recorder.abort();

        if let Some(identity) = previous {
            log::info!("signed out {}", identity.email);
        }
    }

    pub fn show_register(&self) -> bool {
        self.state.lock().session.show_register()
    }

    pub fn show_login(&self) -> bool {
        self.state.lock().session.show_login()
    }
}

pub(crate) async fn bounded<T>(limit: Duration, fut: impl Future<Output = T>) -> Option<T> {
    tokio::time::timeout(limit, fut).await.ok()
}
