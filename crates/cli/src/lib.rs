//! Terminal front end for the door discovery service.
//!
//! [`router`] maps URL-like paths to [`views`]; [`commands`] exposes them
//! as subcommands of the `doors` binary.

pub mod app;
pub mod commands;
pub mod config;
pub mod router;
pub mod views;
