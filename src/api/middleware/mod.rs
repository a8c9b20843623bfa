//! API middleware.

mod auth;
mod session;

pub use auth::{load_principal, KindParam, Principal};
pub use session::session_layer;
