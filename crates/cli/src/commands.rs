//! Command-line surface of the `doors` binary.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use doors_client::{NotificationInbox, NotificationPoller, PollEvent};
use doors_core::form::SubmissionForm;
use doors_core::models::Category;
use doors_core::validation::ImageUpload;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app::{ensure_loaded, App, AppError};
use crate::router::Route;
use crate::views::notifications::render_notification;
use crate::views::{render_toast, AuthView, DoorDetailView, MapView, NotificationsView, SubmitView};

#[derive(Debug, Parser)]
#[command(name = "doors", version, about = "Discover, map and discuss doors")]
pub struct Cli {
    /// Backend base URL (overrides DOORS_API_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and log in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOORS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DOORS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// List doors.
    Doors {
        /// Only show doors of this category (A or B).
        #[arg(long)]
        category: Option<Category>,
    },
    /// Show one door with its comments.
    Door { id: Uuid },
    /// Comment on a door.
    Comment { door_id: Uuid, text: String },
    /// Submit a new door with a photo.
    Submit(SubmitArgs),
    /// List notifications.
    Notifications {
        /// Mark this notification as read first.
        #[arg(long, value_name = "ID")]
        mark_read: Option<Uuid>,
    },
    /// Poll for notifications until interrupted.
    Watch,
    /// List map markers.
    Map {
        /// Print a GeoJSON FeatureCollection instead.
        #[arg(long)]
        geojson: bool,
    },
    /// Render the view behind a path such as `/doors?category=A`.
    Open { path: String },
    /// Check that the backend answers.
    Ping,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub category: Category,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,
    #[arg(long)]
    pub place_name: Option<String>,
    #[arg(long)]
    pub history: Option<String>,
    /// JPEG, PNG or WebP file.
    #[arg(long, value_name = "PATH")]
    pub image: PathBuf,
}

impl SubmitArgs {
    /// Fill a fresh submission form. The form starts on its first step.
    pub fn into_form(self, image: ImageUpload) -> SubmissionForm {
        let mut form = SubmissionForm::new();
        form.title = self.title;
        form.description = self.description;
        form.category = Some(self.category);
        form.latitude = Some(self.latitude);
        form.longitude = Some(self.longitude);
        form.place_name = self.place_name;
        form.history = self.history;
        form.image = Some(image);
        form
    }
}

/// Execute one command, writing views to stdout.
pub async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    let mut out = io::stdout();
    dispatch(app, command, &mut out).await
}

async fn dispatch(app: &App, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    let session = app.session();
    match command {
        Command::Ping => {
            let message = session.api().ping().await?;
            writeln!(out, "{} says: {message}", session.api().base_url())?;
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let mut view = AuthView::new();
            view.register(session, &name, &email, &password).await;
            view.render(out)?;
            ensure_loaded(&view.state)?;
        }
        Command::Login { email, password } => {
            let mut view = AuthView::new();
            view.login(session, &email, &password).await;
            view.render(out)?;
            ensure_loaded(&view.state)?;
        }
        Command::Logout => {
            session.logout().await?;
            writeln!(out, "Logged out.")?;
        }
        Command::Whoami => {
            app.restore().await?;
            let mut view = AuthView::new();
            view.current(session).await;
            view.render(out)?;
            ensure_loaded(&view.state)?;
        }
        Command::Doors { category } => {
            app.navigate(&Route::Doors { category }.to_string(), out).await?;
        }
        Command::Door { id } => {
            app.navigate(&Route::DoorDetail(id).to_string(), out).await?;
        }
        Command::Comment { door_id, text } => {
            app.enter(&Route::DoorDetail(door_id)).await?;
            let mut view = DoorDetailView::new(door_id);
            view.load(session).await;
            if view.state.failure().is_some() {
                view.render(out, Utc::now())?;
                return ensure_loaded(&view.state);
            }
            match view.add_comment(session, &text).await {
                Ok(_) => view.render(out, Utc::now())?,
                Err(e) => {
                    tracing::error!(error = %e, %door_id, "Comment failed");
                    render_toast(out, &e.user_message())?;
                    return Err(AppError::Reported(e.user_message()).into());
                }
            }
        }
        Command::Submit(args) => submit(app, args, out).await?,
        Command::Notifications { mark_read } => {
            app.enter(&Route::Notifications).await?;
            let mut view = NotificationsView::new();
            if let Some(id) = mark_read {
                view.mark_read(session, id).await?;
                writeln!(out, "Marked {id} as read.")?;
            }
            view.load(session).await;
            view.render(out, Utc::now())?;
            ensure_loaded(&view.state)?;
        }
        Command::Watch => watch(app, out).await?,
        Command::Map { geojson } => {
            app.enter(&Route::Map).await?;
            let mut view = MapView::default();
            view.load(session).await;
            if geojson {
                view.render_geojson(out)?;
            } else {
                view.render(out)?;
            }
            ensure_loaded(&view.state)?;
        }
        Command::Open { path } => app.navigate(&path, out).await?,
    }
    Ok(())
}

async fn submit(app: &App, args: SubmitArgs, out: &mut impl Write) -> anyhow::Result<()> {
    app.enter(&Route::Submit).await?;

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read image {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let image = ImageUpload::from_bytes(file_name, bytes)?;

    let mut view = SubmitView::new(args.into_form(image));
    view.advance_to_review()?;
    view.render_review(out)?;
    view.submit(app.session()).await;
    view.render(out)?;
    ensure_loaded(&view.state)
}

/// Print fresh notifications as they arrive until Ctrl-C or session expiry.
async fn watch(app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    app.enter(&Route::Notifications).await?;

    let session = Arc::clone(app.session());
    let poller = Arc::new(NotificationPoller::new(
        Arc::clone(&session),
        app.config().poll_interval(),
    ));
    let mut events = poller.subscribe();
    let handle = Arc::clone(&poller).spawn(CancellationToken::new());
    let mut inbox = NotificationInbox::new();

    writeln!(
        out,
        "Watching notifications every {}s. Press Ctrl-C to stop.",
        app.config().poll_interval_secs
    )?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            event = events.recv() => match event {
                Ok(PollEvent::Snapshot { notifications, unread }) => {
                    let fresh = inbox.update(notifications);
                    if !fresh.is_empty() {
                        tracing::info!(fresh = fresh.len(), unread, "New notifications");
                    }
                    let now = Utc::now();
                    for notification in &fresh {
                        render_notification(out, notification, now)?;
                    }
                    out.flush()?;
                }
                Ok(PollEvent::Failed { message }) => {
                    render_toast(out, &message)?;
                }
                Ok(PollEvent::SessionExpired) => {
                    session.logout().await?;
                    writeln!(out, "Session expired. Log in again with `doors login`.")?;
                    break Err(AppError::Reported("session expired".into()).into());
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification events dropped");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    handle.shutdown().await;
    outcome
}
