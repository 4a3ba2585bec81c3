//! REST API client for the door discovery backend.
//!
//! [`DoorsApi`] wraps every endpoint the client consumes. Each method is a
//! single round trip with no retry; authenticated methods take the bearer
//! token explicitly so the client itself stays stateless.

use std::time::Duration;

use doors_core::models::{
    AccessToken, Category, Comment, Credentials, Door, NewComment, NewDoor, Notification,
    Registration, User,
};
use doors_core::types::EntityId;
use doors_core::validation::{self, ImageUpload};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::ClientError;

/// HTTP client for one backend deployment.
#[derive(Debug, Clone)]
pub struct DoorsApi {
    client: reqwest::Client,
    base_url: Url,
}

/// Body of `GET /api/`.
#[derive(Debug, Deserialize)]
struct RootMessage {
    message: String,
}

impl DoorsApi {
    /// Create a client for the backend at `base_url`
    /// (e.g. `http://localhost:8001`), with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, Url::parse(base_url)?))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, mut base_url: Url) -> Self {
        // `Url::join` replaces the last path segment unless the base ends
        // with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check the backend is reachable. Returns its banner message.
    pub async fn ping(&self) -> Result<String, ClientError> {
        let response = self.client.get(self.endpoint("api/")?).send().await?;
        let root: RootMessage = Self::parse_response(response).await?;
        Ok(root.message)
    }

    // ---- auth ----

    /// Exchange email/password for a bearer token.
    ///
    /// Sends `POST /api/token` as `application/x-www-form-urlencoded`.
    pub async fn login(&self, credentials: &Credentials) -> Result<AccessToken, ClientError> {
        validation::validate(credentials)?;
        tracing::debug!(username = %credentials.username, "Requesting access token");

        let response = self
            .client
            .post(self.endpoint("api/token")?)
            .form(credentials)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<User, ClientError> {
        validation::validate(registration)?;

        let response = self
            .client
            .post(self.endpoint("api/register")?)
            .json(registration)
            .send()
            .await?;

        let user: User = Self::parse_response(response).await?;
        tracing::info!(user_id = %user.id, "Registered new account");
        Ok(user)
    }

    /// Fetch the account the token belongs to.
    pub async fn current_user(&self, token: &str) -> Result<User, ClientError> {
        let response = self
            .client
            .get(self.endpoint("api/users/me")?)
            .bearer_auth(token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- doors ----

    /// List doors, optionally restricted to one category.
    pub async fn list_doors(
        &self,
        token: &str,
        category: Option<Category>,
    ) -> Result<Vec<Door>, ClientError> {
        let mut request = self
            .client
            .get(self.endpoint("api/doors")?)
            .bearer_auth(token);
        if let Some(category) = category {
            request = request.query(&[("category", category.as_str())]);
        }

        let doors: Vec<Door> = Self::parse_response(request.send().await?).await?;
        tracing::debug!(count = doors.len(), category = ?category, "Fetched doors");
        Ok(doors)
    }

    pub async fn get_door(&self, token: &str, door_id: EntityId) -> Result<Door, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&format!("api/doors/{door_id}"))?)
            .bearer_auth(token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit a new door as `multipart/form-data`: the text fields of
    /// [`NewDoor::form_fields`] plus the image as the `image` file part.
    pub async fn create_door(
        &self,
        token: &str,
        door: &NewDoor,
        image: &ImageUpload,
    ) -> Result<Door, ClientError> {
        validation::validate(door)?;

        let mut form = Form::new();
        for (name, value) in door.form_fields() {
            form = form.text(name, value);
        }
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.content_type)?;
        form = form.part("image", part);

        let response = self
            .client
            .post(self.endpoint("api/doors")?)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let created: Door = Self::parse_response(response).await?;
        tracing::info!(
            door_id = %created.id,
            category = %created.category,
            image_bytes = image.bytes.len(),
            "Door submitted",
        );
        Ok(created)
    }

    // ---- comments ----

    pub async fn list_comments(
        &self,
        token: &str,
        door_id: EntityId,
    ) -> Result<Vec<Comment>, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&format!("api/comments/{door_id}"))?)
            .bearer_auth(token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    pub async fn create_comment(
        &self,
        token: &str,
        comment: &NewComment,
    ) -> Result<Comment, ClientError> {
        validation::validate(comment)?;

        let response = self
            .client
            .post(self.endpoint("api/comments")?)
            .bearer_auth(token)
            .json(comment)
            .send()
            .await?;

        let created: Comment = Self::parse_response(response).await?;
        tracing::info!(door_id = %created.door_id, comment_id = %created.id, "Comment posted");
        Ok(created)
    }

    // ---- notifications ----

    /// Newest first, at most 100 (server-side limit).
    pub async fn list_notifications(&self, token: &str) -> Result<Vec<Notification>, ClientError> {
        let response = self
            .client
            .get(self.endpoint("api/notifications")?)
            .bearer_auth(token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    pub async fn mark_notification_read(
        &self,
        token: &str,
        notification_id: EntityId,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint(&format!("api/notifications/{notification_id}/read"))?)
            .bearer_auth(token)
            .send()
            .await?;

        Self::check_status(response).await?;
        tracing::debug!(notification_id = %notification_id, "Notification marked read");
        Ok(())
    }

    // ---- private helpers ----

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Ensure the response has a success status code. On failure, returns
    /// [`ClientError::Unauthorized`] for 401/403 and [`ClientError::Api`]
    /// otherwise, carrying the backend's `detail` message.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let detail = extract_detail(&body);
        tracing::warn!(status = status.as_u16(), detail = %detail, "Backend returned an error");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized {
                status: status.as_u16(),
                detail,
            });
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend reports errors as `{"detail": "..."}`; request validation
/// failures use `{"detail": [{"msg": "...", ...}, ...]}`. Anything else
/// is returned verbatim.
fn extract_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    match value.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                body.trim().to_string()
            } else {
                msgs.join("; ")
            }
        }
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail":"Door not found"}"#),
            "Door not found"
        );
    }

    #[test]
    fn detail_validation_list() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"field required"}]}"#;
        assert_eq!(
            extract_detail(body),
            "value is not a valid email address; field required"
        );
    }

    #[test]
    fn detail_falls_back_to_raw_body() {
        assert_eq!(extract_detail("Internal Server Error\n"), "Internal Server Error");
        assert_eq!(extract_detail(r#"{"error":"x"}"#), r#"{"error":"x"}"#);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let api = DoorsApi::with_client(
            reqwest::Client::new(),
            Url::parse("http://example.com/prefix").unwrap(),
        );
        assert_eq!(api.base_url().as_str(), "http://example.com/prefix/");
        assert_eq!(
            api.endpoint("api/doors").unwrap().as_str(),
            "http://example.com/prefix/api/doors"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(DoorsApi::new("not a url", Duration::from_secs(5)).is_err());
    }
}
