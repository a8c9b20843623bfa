//! Repository layer - Data access abstraction
//!
//! One generic account repository serves both account tables; roles and
//! invitation maintenance have their own small stores.

mod account_repository;
mod account_table;
pub(crate) mod entities;
mod invitation_repository;
mod role_repository;

pub use account_repository::{AccountRepository, AccountStore};
pub use account_table::{AccountTable, MentorTable, UserTable};
pub use invitation_repository::InvitationStore;
pub use role_repository::{RoleRepository, RoleStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use account_repository::MockAccountRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use role_repository::MockRoleRepository;
