//! In-process stub of the door discovery backend.
//!
//! Implements the REST surface the client consumes with the same status
//! codes and `{"detail": ...}` error bodies as the real service, backed
//! by in-memory state that tests can seed and inspect.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use doors_client::{DoorsApi, SessionManager, TokenStore};
use doors_core::models::{Category, Comment, Door, Location, Notification, User};

/// Smallest valid PNG: 1x1 transparent pixel.
pub const TINY_PNG: &[u8] = include_bytes!("../../../core/testdata/pixel.png");

pub const TEST_PASSWORD: &str = "password123";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
pub struct BackendState {
    /// email -> (user, password)
    pub users: HashMap<String, (User, String)>,
    /// token -> email
    pub tokens: HashMap<String, String>,
    pub doors: Vec<Door>,
    pub comments: Vec<Comment>,
    pub notifications: Vec<Notification>,
    pub last_upload: Option<UploadRecord>,
    /// `METHOD path` of every request received.
    pub requests: Vec<String>,
}

type Shared = Arc<Mutex<BackendState>>;
type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, detail: &str) -> ApiError {
    (status, Json(json!({ "detail": detail })))
}

fn record(state: &Shared, line: String) {
    state.lock().unwrap().requests.push(line);
}

fn authorize(state: &Shared, headers: &HeaderMap) -> Result<User, ApiError> {
    let unauthorized = || error(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let st = state.lock().unwrap();
    let email = st.tokens.get(token).ok_or_else(unauthorized)?;
    st.users
        .get(email)
        .map(|(u, _)| u.clone())
        .ok_or_else(unauthorized)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET /api/".into());
    Json(json!({ "message": "Door Discovery API" }))
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

async fn register(
    State(state): State<Shared>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<User>, ApiError> {
    record(&state, "POST /api/register".into());
    let mut st = state.lock().unwrap();
    if st.users.contains_key(&body.email) {
        return Err(error(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let user = User {
        id: Uuid::new_v4(),
        name: body.name,
        email: body.email.clone(),
        created_at: Utc::now(),
    };
    st.users.insert(body.email, (user.clone(), body.password));
    Ok(Json(user))
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn token(
    State(state): State<Shared>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Value>, ApiError> {
    record(&state, "POST /api/token".into());
    let mut st = state.lock().unwrap();
    let valid = st
        .users
        .get(&form.username)
        .is_some_and(|(_, pw)| *pw == form.password);
    if !valid {
        return Err(error(StatusCode::UNAUTHORIZED, "Incorrect email or password"));
    }
    let token = format!("token-{}", Uuid::new_v4());
    st.tokens.insert(token.clone(), form.username);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<User>, ApiError> {
    record(&state, "GET /api/users/me".into());
    authorize(&state, &headers).map(Json)
}

#[derive(Deserialize)]
struct DoorQuery {
    category: Option<String>,
}

async fn list_doors(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<DoorQuery>,
) -> Result<Json<Vec<Door>>, ApiError> {
    record(&state, "GET /api/doors".into());
    authorize(&state, &headers)?;
    let st = state.lock().unwrap();
    let doors = st
        .doors
        .iter()
        .filter(|d| query.category.as_deref().map_or(true, |c| d.category.as_str() == c))
        .cloned()
        .collect();
    Ok(Json(doors))
}

async fn get_door(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(door_id): Path<Uuid>,
) -> Result<Json<Door>, ApiError> {
    record(&state, format!("GET /api/doors/{door_id}"));
    authorize(&state, &headers)?;
    let st = state.lock().unwrap();
    st.doors
        .iter()
        .find(|d| d.id == door_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Door not found"))
}

async fn create_door(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Door>, ApiError> {
    record(&state, "POST /api/doors".into());
    let user = authorize(&state, &headers)?;

    let mut upload = UploadRecord {
        fields: HashMap::new(),
        file_name: None,
        content_type: None,
        size: 0,
    };
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            upload.file_name = field.file_name().map(str::to_string);
            upload.content_type = field.content_type().map(str::to_string);
            upload.size = field.bytes().await.unwrap().len();
        } else {
            let value = field.text().await.unwrap();
            upload.fields.insert(name, value);
        }
    }

    let category = match upload.fields.get("category").map(String::as_str) {
        Some("A") => Category::A,
        Some("B") => Category::B,
        _ => {
            return Err(error(
                StatusCode::BAD_REQUEST,
                "Category must be either 'A' or 'B'",
            ))
        }
    };
    if upload.size == 0 {
        return Err(error(StatusCode::BAD_REQUEST, "Invalid image: empty file"));
    }
    let coord = |key: &str| -> f64 {
        upload
            .fields
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    };

    let door = Door {
        id: Uuid::new_v4(),
        title: upload.fields.get("title").cloned().unwrap_or_default(),
        description: upload.fields.get("description").cloned().unwrap_or_default(),
        place_name: upload.fields.get("place_name").cloned(),
        history: upload.fields.get("history").cloned(),
        category,
        location: Location {
            latitude: coord("latitude"),
            longitude: coord("longitude"),
        },
        user_id: user.id,
        user_name: user.name.clone(),
        image_url: "data:image/jpeg;base64,c3R1Yg==".into(),
        created_at: Utc::now(),
    };

    let mut st = state.lock().unwrap();
    // Every other user is notified about the new door.
    let recipients: Vec<_> = st
        .users
        .values()
        .map(|(u, _)| u.id)
        .filter(|id| *id != user.id)
        .collect();
    for recipient in recipients {
        st.notifications.push(Notification {
            id: Uuid::new_v4(),
            door_id: door.id,
            user_id: recipient,
            title: format!("New {} Door Discovered!", door.category),
            message: format!("{} discovered a door: {}", user.name, door.title),
            is_read: false,
            created_at: Utc::now(),
        });
    }
    st.doors.push(door.clone());
    st.last_upload = Some(upload);
    Ok(Json(door))
}

async fn list_comments(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(door_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    record(&state, format!("GET /api/comments/{door_id}"));
    authorize(&state, &headers)?;
    let st = state.lock().unwrap();
    Ok(Json(
        st.comments
            .iter()
            .filter(|c| c.door_id == door_id)
            .cloned()
            .collect(),
    ))
}

#[derive(Deserialize)]
struct CommentBody {
    door_id: Uuid,
    text: String,
}

async fn create_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CommentBody>,
) -> Result<Json<Comment>, ApiError> {
    record(&state, "POST /api/comments".into());
    let user = authorize(&state, &headers)?;
    let mut st = state.lock().unwrap();
    if !st.doors.iter().any(|d| d.id == body.door_id) {
        return Err(error(StatusCode::NOT_FOUND, "Door not found"));
    }
    let comment = Comment {
        id: Uuid::new_v4(),
        door_id: body.door_id,
        user_id: user.id,
        user_name: user.name,
        text: body.text,
        created_at: Utc::now(),
    };
    st.comments.push(comment.clone());
    Ok(Json(comment))
}

async fn list_notifications(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, ApiError> {
    record(&state, "GET /api/notifications".into());
    let user = authorize(&state, &headers)?;
    let st = state.lock().unwrap();
    let mut list: Vec<_> = st
        .notifications
        .iter()
        .filter(|n| n.user_id == user.id)
        .cloned()
        .collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list.truncate(100);
    Ok(Json(list))
}

async fn mark_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    record(&state, format!("POST /api/notifications/{id}/read"));
    let user = authorize(&state, &headers)?;
    let mut st = state.lock().unwrap();
    match st
        .notifications
        .iter_mut()
        .find(|n| n.id == id && n.user_id == user.id)
    {
        Some(n) => {
            n.is_read = true;
            Ok(Json(json!({ "success": true })))
        }
        None => Err(error(StatusCode::NOT_FOUND, "Notification not found")),
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/", get(root))
        .route("/api/register", post(register))
        .route("/api/token", post(token))
        .route("/api/users/me", get(me))
        .route("/api/doors", get(list_doors).post(create_door))
        .route("/api/doors/{door_id}", get(get_door))
        .route("/api/comments", post(create_comment))
        .route("/api/comments/{door_id}", get(list_comments))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}/read", post(mark_read))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// StubBackend
// ---------------------------------------------------------------------------

pub struct StubBackend {
    pub base_url: String,
    pub state: Shared,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the stub on an ephemeral localhost port.
pub async fn spawn_backend() -> StubBackend {
    let state: Shared = Arc::new(Mutex::new(BackendState::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::clone(&state));
    let task = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    StubBackend {
        base_url: format!("http://{addr}"),
        state,
        task,
    }
}

/// A base URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

impl StubBackend {
    pub fn api(&self) -> Arc<DoorsApi> {
        Arc::new(DoorsApi::new(&self.base_url, Duration::from_secs(5)).unwrap())
    }

    pub fn session(&self, store: Arc<dyn TokenStore>) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(self.api(), store))
    }

    /// Session whose HTTP client keeps no idle connections, so no request
    /// reaches the stub once it has been dropped.
    pub fn unpooled_session(&self, store: Arc<dyn TokenStore>) -> Arc<SessionManager> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let api = DoorsApi::with_client(client, url::Url::parse(&self.base_url).unwrap());
        Arc::new(SessionManager::new(Arc::new(api), store))
    }

    pub fn seed_user(&self, name: &str, email: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .users
            .insert(email.into(), (user.clone(), TEST_PASSWORD.into()));
        user
    }

    /// Issue a token for an already seeded user without going through login.
    pub fn issue_token(&self, email: &str) -> String {
        let token = format!("token-{}", Uuid::new_v4());
        self.state
            .lock()
            .unwrap()
            .tokens
            .insert(token.clone(), email.into());
        token
    }

    pub fn revoke_all_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    pub fn seed_door(&self, owner: &User, title: &str, category: Category) -> Door {
        let door = Door {
            id: Uuid::new_v4(),
            title: title.into(),
            description: format!("{title} description"),
            place_name: None,
            history: None,
            category,
            location: Location {
                latitude: 51.5,
                longitude: -0.12,
            },
            user_id: owner.id,
            user_name: owner.name.clone(),
            image_url: "data:image/jpeg;base64,c3R1Yg==".into(),
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().doors.push(door.clone());
        door
    }

    pub fn seed_comment(&self, door: &Door, author: &User, text: &str) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4(),
            door_id: door.id,
            user_id: author.id,
            user_name: author.name.clone(),
            text: text.into(),
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().comments.push(comment.clone());
        comment
    }

    pub fn seed_notification(&self, recipient: &User, door: &Door, is_read: bool) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            door_id: door.id,
            user_id: recipient.id,
            title: format!("New {} Door Discovered!", door.category),
            message: format!("{} discovered a door: {}", door.user_name, door.title),
            is_read,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .notifications
            .push(notification.clone());
        notification
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}
