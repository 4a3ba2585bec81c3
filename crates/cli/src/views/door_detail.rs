use std::io::{self, Write};

use doors_client::{ClientError, SessionManager};
use doors_core::format;
use doors_core::models::{Comment, Door, NewComment};
use doors_core::thread::CommentThread;
use doors_core::types::{EntityId, Timestamp};

use super::ViewState;

/// One door with its metadata and comment thread.
#[derive(Debug)]
pub struct DoorDetailView {
    door_id: EntityId,
    pub state: ViewState<Door>,
    pub thread: CommentThread,
}

impl DoorDetailView {
    pub fn new(door_id: EntityId) -> Self {
        Self {
            door_id,
            state: ViewState::Loading,
            thread: CommentThread::new(door_id),
        }
    }

    pub fn door_id(&self) -> EntityId {
        self.door_id
    }

    /// Fetch the door and its comments concurrently.
    pub async fn load(&mut self, session: &SessionManager) {
        let result = self.fetch(session).await.map(|(door, comments)| {
            self.thread.replace_all(comments);
            door
        });
        self.state = ViewState::from_result(result);
    }

    async fn fetch(&self, session: &SessionManager) -> Result<(Door, Vec<Comment>), ClientError> {
        let token = session.require_token().await?;
        let api = session.api();
        tokio::try_join!(
            api.get_door(&token, self.door_id),
            api.list_comments(&token, self.door_id),
        )
    }

    /// Post a comment and append it to the visible thread.
    pub async fn add_comment(
        &mut self,
        session: &SessionManager,
        text: &str,
    ) -> Result<Comment, ClientError> {
        let token = session.require_token().await?;
        let new_comment = NewComment {
            door_id: self.door_id,
            text: text.trim().to_string(),
        };
        let created = session.api().create_comment(&token, &new_comment).await?;
        if !self.thread.append(created.clone())? {
            tracing::debug!(comment_id = %created.id, "Comment already in thread");
        }
        Ok(created)
    }

    pub fn render(&self, out: &mut impl Write, now: Timestamp) -> io::Result<()> {
        self.state.render_with(out, |out, door| {
            writeln!(out, "{} [{}]", door.title, door.category)?;
            writeln!(out, "{}", door.description)?;
            writeln!(
                out,
                "Place: {}",
                door.place_name.as_deref().unwrap_or("Unknown place")
            )?;
            writeln!(out, "Location: {}", format::coordinates(&door.location))?;
            writeln!(
                out,
                "Submitted by {}, {}",
                door.user_name,
                format::relative_age(door.created_at, now)
            )?;
            writeln!(out, "Image: {}", image_label(&door.image_url))?;
            if let Some(history) = door.history.as_deref().filter(|h| !h.trim().is_empty()) {
                writeln!(out, "History:")?;
                for line in history.lines() {
                    writeln!(out, "  {line}")?;
                }
            }
            self.render_comments(out, now)
        })
    }

    fn render_comments(&self, out: &mut impl Write, now: Timestamp) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "Comments ({})", self.thread.len())?;
        if self.thread.is_empty() {
            return writeln!(out, "  No comments yet.");
        }
        for comment in self.thread.comments() {
            writeln!(
                out,
                "  {} ({}): {}",
                comment.user_name,
                format::relative_age(comment.created_at, now),
                comment.text
            )?;
        }
        Ok(())
    }
}

/// Data URIs carry the whole image; show only their media type.
fn image_label(url: &str) -> String {
    match url.strip_prefix("data:") {
        Some(rest) => {
            let media_type = rest.split([';', ',']).next().unwrap_or_default();
            format!("embedded {media_type}")
        }
        None => url.to_string(),
    }
}
