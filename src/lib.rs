//! Inquiro API - account lifecycle and session authentication
//!
//! Two parallel account kinds (users and mentors) share one lifecycle:
//! register with an emailed invitation, activate through the link, then
//! log in to a server-side session carried by a cookie.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Accounts, roles, credential hashing, invitation tokens
//! - **services**: Account lifecycle use cases
//! - **infra**: Database, Redis sessions, outbound mail
//! - **api**: HTTP handlers, session middleware, and routes
//! - **types**: Response envelopes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Drop expired invitations
//! cargo run -- invitations purge
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Account, AccountKind, Password};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
