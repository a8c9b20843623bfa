//! Role reference data.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Immutable role record looked up by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "user")]
    pub name: String,
    /// Ordinal used for authorization comparisons
    #[schema(example = 1)]
    pub level: i32,
    pub description: String,
}

impl Role {
    /// Check if this role reaches the given level
    pub fn at_least(&self, level: i32) -> bool {
        self.level >= level
    }
}
