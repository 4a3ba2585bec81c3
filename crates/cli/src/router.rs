//! Path-based routing between views.
//!
//! Paths mirror the web front end (`/doors/<id>`, `/map`, ...). Every
//! route except `/login` and `/register` requires a session; resolving a
//! protected route without one yields a redirect to `/login`, and the
//! auth routes redirect home once logged in.

use std::fmt;

use doors_core::models::Category;
use doors_core::types::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Doors { category: Option<Category> },
    DoorDetail(EntityId),
    Submit,
    Notifications,
    Map,
}

/// Outcome of resolving a path against the current session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    View(Route),
    Redirect(Route),
    NotFound(String),
}

impl Route {
    /// Parse a path with optional query string. Trailing slashes are
    /// ignored. Returns `None` for unknown paths or malformed parameters.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (path, query) = match raw.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (raw, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["doors"] => {
                let category = match query.and_then(|q| query_param(q, "category")) {
                    Some(value) if !value.is_empty() => Some(value.parse().ok()?),
                    _ => None,
                };
                Some(Route::Doors { category })
            }
            ["doors", id] => id.parse().ok().map(Route::DoorDetail),
            ["submit"] => Some(Route::Submit),
            ["notifications"] => Some(Route::Notifications),
            ["map"] => Some(Route::Map),
            _ => None,
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Login => f.write_str("/login"),
            Route::Register => f.write_str("/register"),
            Route::Doors { category: None } => f.write_str("/doors"),
            Route::Doors {
                category: Some(category),
            } => write!(f, "/doors?category={category}"),
            Route::DoorDetail(id) => write!(f, "/doors/{id}"),
            Route::Submit => f.write_str("/submit"),
            Route::Notifications => f.write_str("/notifications"),
            Route::Map => f.write_str("/map"),
        }
    }
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Resolve `path` for a session that is (or is not) authenticated.
pub fn resolve(path: &str, authenticated: bool) -> Resolution {
    let Some(route) = Route::parse(path) else {
        return Resolution::NotFound(path.to_string());
    };

    if route.is_protected() && !authenticated {
        tracing::debug!(path, "Protected route without session, redirecting to login");
        return Resolution::Redirect(Route::Login);
    }
    if !route.is_protected() && authenticated {
        return Resolution::Redirect(Route::Home);
    }
    Resolution::View(route)
}
