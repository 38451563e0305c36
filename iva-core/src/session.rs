use crate::types::{AccessToken, Identity, View};

/// Who is signed in and which top-level screen is active.
///
/// `view == View::Authenticated` holds exactly when an identity is present.
/// Fields are private so every transition goes through a method that keeps
/// both halves in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    view: View,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            identity: None,
            view: View::Login,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.identity.as_ref().map(|i| &i.token)
    }

    pub fn authenticate(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.view = View::Authenticated;
    }

    /// Drop the identity and return to the login form. Returns the previous
    /// identity, if any.
    pub fn sign_out(&mut self) -> Option<Identity> {
        self.view = View::Login;
        self.identity.take()
    }

    /// Switch to the registration form. Ignored while signed in.
    pub fn show_register(&mut self) -> bool {
        if self.is_authenticated() {
            return false;
        }
        self.view = View::Register;
        true
    }

    /// Switch to the login form. Ignored while signed in.
    pub fn show_login(&mut self) -> bool {
        if self.is_authenticated() {
            return false;
        }
        self.view = View::Login;
        true
    }
}
