use std::io::{self, Write};

use doors_client::SessionManager;
use doors_core::models::{Credentials, Registration, User};

use super::ViewState;

/// Login / registration outcome, and the `whoami` summary.
#[derive(Debug, Default)]
pub struct AuthView {
    pub state: ViewState<User>,
}

impl AuthView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn login(&mut self, session: &SessionManager, email: &str, password: &str) {
        let credentials = Credentials {
            username: email.trim().to_string(),
            password: password.to_string(),
        };
        self.state = ViewState::from_result(session.login(&credentials).await);
    }

    /// Register, then log straight in with the same credentials.
    pub async fn register(
        &mut self,
        session: &SessionManager,
        name: &str,
        email: &str,
        password: &str,
    ) {
        let registration = Registration {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.state = ViewState::from_result(session.register_and_login(&registration).await);
    }

    /// Show whoever the session currently holds.
    pub async fn current(&mut self, session: &SessionManager) {
        self.state = match session.current_user().await {
            Some(user) => ViewState::Loaded(user),
            None => ViewState::Failed("not logged in".into()),
        };
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        self.state.render_with(out, |out, user| {
            writeln!(out, "Logged in as {} <{}>", user.name, user.email)
        })
    }
}
