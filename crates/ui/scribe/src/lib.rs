//! Terminal front end for `form_engine`.
//!
//! The binary wires a [`form_engine::FormRuntime`] to either the HTTP
//! service in [`services::http`] or the in-memory demo service and drives
//! it from a ratatui event loop.

pub mod action;
pub mod cli;
pub mod components;
pub mod config;
pub mod errors;
pub mod scribe;
pub mod services;
pub mod tui;
