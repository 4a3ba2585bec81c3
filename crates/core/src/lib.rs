//! Shared domain types for the door discovery client.
//!
//! Holds the plain records exchanged with the backend, request DTOs with
//! their validation rules, and the client-side models that sit between
//! the data access layer and the views: the map marker layer, the
//! multi-step submission form, and the append-only comment thread.

pub mod error;
pub mod format;
pub mod form;
pub mod map;
pub mod models;
pub mod thread;
pub mod types;
pub mod validation;
