//! Infrastructure layer - External systems integration
//!
//! - PostgreSQL connection, migrations and repositories
//! - Redis-backed session storage
//! - Outbound mail
//! - Unit of Work for transaction management

pub mod cache;
pub mod db;
pub mod health;
pub mod mailer;
pub mod repositories;
pub mod session;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use health::DependencyProbe;
pub use mailer::{EmailTemplate, LogMailer, Mailer, ResendMailer};
pub use repositories::{
    AccountRepository, AccountStore, AccountTable, InvitationStore, MentorTable, RoleRepository,
    RoleStore, UserTable,
};
pub use session::{RedisSessionStore, SessionStore};
pub use unit_of_work::{Persistence, TransactionContext, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockAccountRepository, MockRoleRepository};
#[cfg(any(test, feature = "test-utils"))]
pub use session::MockSessionStore;
