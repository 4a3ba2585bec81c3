//! Wiring between configuration, session, router and views.

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use doors_client::{ClientError, DoorsApi, FileTokenStore, SessionManager};

use crate::config::ClientConfig;
use crate::router::{self, Resolution, Route};
use crate::views::{DoorDetailView, DoorListView, MapView, NotificationsView, ViewState};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The failure was already rendered as a toast.
    #[error("{0}")]
    Reported(String),

    #[error("no such page: {0}")]
    NotFound(String),
}

pub struct App {
    config: ClientConfig,
    session: Arc<SessionManager>,
}

impl App {
    /// Build the HTTP client and a file-backed session from `config`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = DoorsApi::new(config.api_url.as_str(), config.request_timeout())?;
        let store = FileTokenStore::new(config.token_path.clone());
        let session = SessionManager::new(Arc::new(api), Arc::new(store));
        Ok(Self::with_session(config, Arc::new(session)))
    }

    pub fn with_session(config: ClientConfig, session: Arc<SessionManager>) -> Self {
        Self { config, session }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Load the persisted session unless one is already active.
    ///
    /// A rejected token logs the session out and yields `false`; an
    /// unreachable backend is an error.
    pub async fn restore(&self) -> Result<bool, ClientError> {
        if self.session.is_authenticated().await {
            return Ok(true);
        }
        Ok(self.session.restore().await?.is_some())
    }

    /// Check that `route` may be shown with the current session.
    pub async fn enter(&self, route: &Route) -> anyhow::Result<()> {
        let authenticated = self.restore().await?;
        match router::resolve(&route.to_string(), authenticated) {
            Resolution::View(_) => Ok(()),
            Resolution::Redirect(Route::Login) => Err(ClientError::NotAuthenticated.into()),
            Resolution::Redirect(target) => {
                tracing::debug!(from = %route, to = %target, "Route redirected");
                Ok(())
            }
            Resolution::NotFound(path) => Err(AppError::NotFound(path).into()),
        }
    }

    /// Resolve a path and render whatever it leads to.
    pub async fn navigate(&self, path: &str, out: &mut impl Write) -> anyhow::Result<()> {
        let authenticated = self.restore().await?;
        match router::resolve(path, authenticated) {
            Resolution::View(route) => self.show(&route, out).await,
            Resolution::Redirect(Route::Login) => {
                writeln!(out, "{path} requires a session. Log in with `doors login`.")?;
                Err(AppError::Reported("redirected to /login".into()).into())
            }
            Resolution::Redirect(target) => {
                tracing::info!(from = path, to = %target, "Redirecting");
                self.show(&target, out).await
            }
            Resolution::NotFound(path) => Err(AppError::NotFound(path).into()),
        }
    }

    /// Render the view behind an already-resolved route.
    pub async fn show(&self, route: &Route, out: &mut impl Write) -> anyhow::Result<()> {
        let now = Utc::now();
        match route {
            Route::Home => {
                let mut view = DoorListView::new(None);
                view.load(&self.session).await;
                view.render(out, now)?;
                ensure_loaded(&view.state)
            }
            Route::Doors { category } => {
                let mut view = DoorListView::new(*category);
                view.load(&self.session).await;
                view.render(out, now)?;
                ensure_loaded(&view.state)
            }
            Route::DoorDetail(id) => {
                let mut view = DoorDetailView::new(*id);
                view.load(&self.session).await;
                view.render(out, now)?;
                ensure_loaded(&view.state)
            }
            Route::Notifications => {
                let mut view = NotificationsView::new();
                view.load(&self.session).await;
                view.render(out, now)?;
                ensure_loaded(&view.state)
            }
            Route::Map => {
                let mut view = MapView::default();
                view.load(&self.session).await;
                view.render(out)?;
                ensure_loaded(&view.state)
            }
            Route::Submit => {
                writeln!(
                    out,
                    "Submit a door with `doors submit --title .. --description .. \
                     --category A|B --latitude .. --longitude .. --image PATH`."
                )?;
                Ok(())
            }
            Route::Login => {
                writeln!(out, "Log in with `doors login --email EMAIL`.")?;
                Ok(())
            }
            Route::Register => {
                writeln!(out, "Create an account with `doors register --name NAME --email EMAIL`.")?;
                Ok(())
            }
        }
    }
}

/// Turn a failed view into an error for the exit status. The toast has
/// already been written.
pub fn ensure_loaded<T>(state: &ViewState<T>) -> anyhow::Result<()> {
    match state.failure() {
        Some(message) => Err(AppError::Reported(message.to_string()).into()),
        None => Ok(()),
    }
}
