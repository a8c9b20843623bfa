//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.

mod account_service;
pub mod container;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use account_service::{AccountLifecycle, AccountService, Invited, LifecycleSettings};

#[cfg(any(test, feature = "test-utils"))]
pub use account_service::MockAccountService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
