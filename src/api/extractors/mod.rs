//! Custom extractors.

mod session;
mod validated_json;

pub use session::{CookieAction, Session};
pub use validated_json::ValidatedJson;
