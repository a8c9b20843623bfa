//! Domain layer - Core business entities and logic
//!
//! Accounts, roles, credential hashing and invitation tokens. Nothing here
//! touches storage or HTTP.

pub mod account;
pub mod password;
pub mod role;
pub mod token;

pub use account::{
    Account, AccountKind, AccountResponse, MentorProfile, NewAccount, Registration, SessionKeys,
};
pub use password::{HashCost, Password};
pub use role::Role;
pub use token::{IssuedToken, NewInvitation};
