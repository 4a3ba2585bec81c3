//! Text views.
//!
//! Each view owns a [`ViewState`] for the data it displays, loads it
//! through the [`SessionManager`](doors_client::SessionManager) and renders
//! to any [`Write`] sink. Rendering takes the current time explicitly so
//! relative ages are deterministic under test.

use std::io::{self, Write};

use doors_client::ClientError;

pub mod auth;
pub mod door_detail;
pub mod door_list;
pub mod map;
pub mod notifications;
pub mod submit;

pub use auth::AuthView;
pub use door_detail::DoorDetailView;
pub use door_list::DoorListView;
pub use map::MapView;
pub use notifications::NotificationsView;
pub use submit::SubmitView;

/// Local state of a view.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState<T> {
    #[default]
    Loading,
    Loaded(T),
    /// Holds the toast text shown to the user.
    Failed(String),
}

impl<T> ViewState<T> {
    /// Convert a request outcome. The full error is logged; only the
    /// generic [`ClientError::user_message`] is kept for display.
    pub fn from_result(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(value) => ViewState::Loaded(value),
            Err(e) => {
                tracing::error!(error = %e, status = ?e.status(), "View request failed");
                ViewState::Failed(e.user_message())
            }
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Render `Loading` and `Failed` uniformly and hand `Loaded` to `body`.
    pub fn render_with<W: Write>(
        &self,
        out: &mut W,
        body: impl FnOnce(&mut W, &T) -> io::Result<()>,
    ) -> io::Result<()> {
        match self {
            ViewState::Loading => writeln!(out, "Loading..."),
            ViewState::Failed(message) => render_toast(out, message),
            ViewState::Loaded(value) => body(out, value),
        }
    }
}

/// One-line failure notice.
pub fn render_toast(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "error: {message}")
}
