//! Door discovery REST client library.
//!
//! Provides the typed data access layer over the backend's HTTP API,
//! the session manager holding the bearer token and current user,
//! pluggable token persistence, and a cancellable notification poller.

pub mod api;
pub mod error;
pub mod poller;
pub mod session;
pub mod token_store;

pub use api::DoorsApi;
pub use error::ClientError;
pub use poller::{NotificationInbox, NotificationPoller, PollEvent, PollerHandle};
pub use session::SessionManager;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
