//! Command surface
//!
//! Everything the board, deal forms and analytics screens call. Each command
//! takes the shared [`AppState`](crate::state::AppState) and returns a
//! [`Result`](crate::error::Result) whose error serializes to an
//! `ErrorResponse` for the UI host.

pub mod deals;
pub mod pipeline;
pub mod settings;
