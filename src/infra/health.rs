//! Connectivity probes for the health endpoint.

use async_trait::async_trait;

use super::{Cache, Database};

/// A backing service the API cannot work without.
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// Key used in the health report
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), String>;
}

#[async_trait]
impl DependencyProbe for Database {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn ping(&self) -> Result<(), String> {
        Database::ping(self).await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl DependencyProbe for Cache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), String> {
        Cache::ping(self).await.map_err(|e| e.to_string())
    }
}
