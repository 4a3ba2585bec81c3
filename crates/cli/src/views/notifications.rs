use std::io::{self, Write};

use doors_client::{ClientError, SessionManager};
use doors_core::format;
use doors_core::models::Notification;
use doors_core::types::{EntityId, Timestamp};

use super::ViewState;

#[derive(Debug, Default)]
pub struct NotificationsView {
    pub state: ViewState<Vec<Notification>>,
}

impl NotificationsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, session: &SessionManager) {
        self.state = ViewState::from_result(fetch(session).await);
    }

    /// Mark one notification as read on the backend, then locally.
    pub async fn mark_read(
        &mut self,
        session: &SessionManager,
        id: EntityId,
    ) -> Result<(), ClientError> {
        let token = session.require_token().await?;
        session.api().mark_notification_read(&token, id).await?;
        if let ViewState::Loaded(list) = &mut self.state {
            if let Some(n) = list.iter_mut().find(|n| n.id == id) {
                n.is_read = true;
            }
        }
        Ok(())
    }

    pub fn unread(&self) -> usize {
        self.state
            .loaded()
            .map_or(0, |list| list.iter().filter(|n| !n.is_read).count())
    }

    pub fn render(&self, out: &mut impl Write, now: Timestamp) -> io::Result<()> {
        self.state.render_with(out, |out, list| {
            writeln!(out, "Notifications ({} unread)", self.unread())?;
            if list.is_empty() {
                return writeln!(out, "Nothing new.");
            }
            for notification in list {
                render_notification(out, notification, now)?;
            }
            Ok(())
        })
    }
}

async fn fetch(session: &SessionManager) -> Result<Vec<Notification>, ClientError> {
    let token = session.require_token().await?;
    session.api().list_notifications(&token).await
}

/// One notification line; unread entries are starred. Shared with `watch`.
pub fn render_notification(
    out: &mut impl Write,
    notification: &Notification,
    now: Timestamp,
) -> io::Result<()> {
    let marker = if notification.is_read { ' ' } else { '*' };
    writeln!(
        out,
        "{marker} {} - {} ({})",
        notification.title,
        notification.message,
        format::relative_age(notification.created_at, now)
    )?;
    writeln!(out, "    id {}  door {}", notification.id, notification.door_id)
}
