//! Periodic notification polling.
//!
//! [`NotificationPoller`] fetches the notification list on a fixed
//! interval and broadcasts each result as a [`PollEvent`]. There is no
//! backpressure and no deduplication beyond the backend's read flags;
//! [`NotificationInbox`] is available to callers that want to know which
//! entries are new since the previous poll.
//!
//! The loop runs until its [`CancellationToken`] is cancelled, or until
//! the backend rejects the session token.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use doors_core::models::Notification;
use doors_core::types::EntityId;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::session::SessionManager;

/// Interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Broadcast channel capacity for poll events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How long [`PollerHandle::shutdown`] waits for the task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single poll.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// The full notification list, newest first.
    Snapshot {
        notifications: Vec<Notification>,
        unread: usize,
    },
    /// The poll failed; the loop keeps running.
    Failed { message: String },
    /// The backend rejected the token; the loop has stopped.
    SessionExpired,
}

pub struct NotificationPoller {
    session: Arc<SessionManager>,
    interval: Duration,
    event_tx: broadcast::Sender<PollEvent>,
}

/// Running poller task. Dropping the handle does not stop the task;
/// call [`shutdown`](Self::shutdown).
pub struct PollerHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl NotificationPoller {
    pub fn new(session: Arc<SessionManager>, interval: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session,
            interval,
            event_tx,
        }
    }

    /// Subscribe to poll events. Subscribe before [`spawn`](Self::spawn)
    /// to receive the first (immediate) poll.
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.event_tx.subscribe()
    }

    /// Fetch notifications once with the session's current token.
    pub async fn poll_once(&self) -> Result<Vec<Notification>, ClientError> {
        let token = self.session.require_token().await?;
        self.session.api().list_notifications(&token).await
    }

    /// Run the polling loop on the current task.
    ///
    /// The first poll happens immediately, then every `interval`.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "Notification poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification poller cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.poll_and_publish().await {
                        break;
                    }
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on a background task.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> PollerHandle {
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            self.run(task_cancel).await;
        });
        PollerHandle { cancel, task }
    }

    // ---- private helpers ----

    /// Returns `false` when the loop should stop.
    async fn poll_and_publish(&self) -> bool {
        match self.poll_once().await {
            Ok(notifications) => {
                let unread = notifications.iter().filter(|n| !n.is_read).count();
                tracing::debug!(total = notifications.len(), unread, "Polled notifications");
                let _ = self.event_tx.send(PollEvent::Snapshot {
                    notifications,
                    unread,
                });
                true
            }
            Err(e) if e.is_auth_failure() => {
                tracing::warn!(error = %e, "Session rejected while polling, stopping poller");
                let _ = self.event_tx.send(PollEvent::SessionExpired);
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Notification poll failed");
                let _ = self.event_tx.send(PollEvent::Failed {
                    message: e.user_message(),
                });
                true
            }
        }
    }
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the poller and wait briefly for the task to exit. A task
    /// that outlives the timeout is aborted.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let abort = self.task.abort_handle();
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.task).await.is_err() {
            tracing::warn!("Notification poller did not stop in time, aborting");
            abort.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationInbox
// ---------------------------------------------------------------------------

/// Last known notification list plus the ids it contains.
#[derive(Debug, Default)]
pub struct NotificationInbox {
    seen: HashSet<EntityId>,
    latest: Vec<Notification>,
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a new snapshot and return the entries that
    /// were not present in the previous snapshot, in snapshot order.
    pub fn update(&mut self, notifications: Vec<Notification>) -> Vec<Notification> {
        let fresh: Vec<Notification> = notifications
            .iter()
            .filter(|n| !self.seen.contains(&n.id))
            .cloned()
            .collect();
        self.seen = notifications.iter().map(|n| n.id).collect();
        self.latest = notifications;
        fresh
    }

    pub fn latest(&self) -> &[Notification] {
        &self.latest
    }

    pub fn unread_count(&self) -> usize {
        self.latest.iter().filter(|n| !n.is_read).count()
    }

    /// Flip the local read flag after a successful read-marking call.
    /// Returns `false` if the id is unknown.
    pub fn mark_read(&mut self, id: EntityId) -> bool {
        match self.latest.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                true
            }
            None => false,
        }
    }
}
