//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod invitation;
pub mod mentor;
pub mod role;
pub mod user;
