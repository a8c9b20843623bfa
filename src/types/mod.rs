//! Shared response types.

mod response;

pub use response::{Accepted, ApiResponse, Created};
