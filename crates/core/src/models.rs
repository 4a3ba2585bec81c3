//! Records exchanged with the door discovery backend.
//!
//! Response types mirror the JSON the backend returns. Request DTOs carry
//! [`validator`] rules matching the backend's own rejections so that bad
//! input fails before a round trip.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{timestamp, EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Two-valued importance tag attached to a door by its submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
}

impl Category {
    /// Wire representation (`"A"` or `"B"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::A => "A",
            Category::B => "B",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    /// Accepts `A`/`B` in either case, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Category::A),
            "B" | "b" => Ok(Category::B),
            other => Err(CoreError::Validation(format!(
                "Category must be either 'A' or 'B', got '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// An authenticated account, as returned by `/api/users/me` and
/// `/api/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(with = "timestamp")]
    pub created_at: Timestamp,
}

/// A user-submitted record describing a photographed location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    pub category: Category,
    pub location: Location,
    pub user_id: EntityId,
    /// Display name of the submitter at submission time.
    pub user_name: String,
    /// Data URI (`data:image/jpeg;base64,...`) or plain URL.
    pub image_url: String,
    #[serde(with = "timestamp")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub door_id: EntityId,
    pub user_id: EntityId,
    /// Author display name.
    pub user_name: String,
    pub text: String,
    #[serde(with = "timestamp")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,
    pub door_id: EntityId,
    pub user_id: EntityId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(with = "timestamp")]
    pub created_at: Timestamp,
}

/// Response body of `POST /api/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /api/register`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Form fields of `POST /api/token`. `username` carries the email address.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Body of `POST /api/comments`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewComment {
    pub door_id: EntityId,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub text: String,
}

/// Text fields of a door submission. Sent as multipart form fields
/// together with an [`ImageUpload`](crate::validation::ImageUpload).
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewDoor {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub title: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub description: String,
    pub place_name: Option<String>,
    pub history: Option<String>,
    pub category: Category,
    #[validate(custom(function = "crate::validation::latitude"))]
    pub latitude: f64,
    #[validate(custom(function = "crate::validation::longitude"))]
    pub longitude: f64,
}

impl NewDoor {
    /// Multipart text fields in submission order.
    ///
    /// Optional fields are omitted entirely when absent or blank, so the
    /// backend stores them as null rather than an empty string.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.trim().to_string()),
            ("description", self.description.trim().to_string()),
            ("category", self.category.as_str().to_string()),
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
        ];
        for (name, value) in [("place_name", &self.place_name), ("history", &self.history)] {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                fields.push((name, v.to_string()));
            }
        }
        fields
    }
}
