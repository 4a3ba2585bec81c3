//! Comment thread for a single door.

use crate::error::CoreError;
use crate::models::Comment;
use crate::types::EntityId;

/// Comments of one door in display order.
///
/// The server list is taken as-is on load; locally submitted comments are
/// appended at the end. Existing entries are never reordered.
#[derive(Debug, Clone)]
pub struct CommentThread {
    door_id: EntityId,
    comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new(door_id: EntityId) -> Self {
        Self {
            door_id,
            comments: Vec::new(),
        }
    }

    pub fn door_id(&self) -> EntityId {
        self.door_id
    }

    /// Reload from a server listing, preserving server order.
    ///
    /// Comments belonging to other doors are dropped.
    pub fn replace_all(&mut self, comments: Vec<Comment>) {
        let door_id = self.door_id;
        self.comments = comments.into_iter().filter(|c| c.door_id == door_id).collect();
    }

    /// Append a newly created comment.
    ///
    /// Returns `Ok(false)` if a comment with the same id is already
    /// present (e.g. a reload raced the submission).
    pub fn append(&mut self, comment: Comment) -> Result<bool, CoreError> {
        if comment.door_id != self.door_id {
            return Err(CoreError::Validation(format!(
                "comment {} belongs to door {}, not {}",
                comment.id, comment.door_id, self.door_id
            )));
        }
        if self.comments.iter().any(|c| c.id == comment.id) {
            return Ok(false);
        }
        self.comments.push(comment);
        Ok(true)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}
