//! Invitations command - expired invitation cleanup.
//!
//! Expired invitations are already unusable; purging only reclaims rows.
//!
//! ```bash
//! inquiro-api invitations purge
//! ```

use chrono::Utc;

use crate::cli::args::{InvitationsAction, InvitationsArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Database, InvitationStore};

/// Execute the invitations command
pub async fn execute(args: InvitationsArgs, config: Config) -> AppResult<()> {
    match args.action {
        InvitationsAction::Purge => purge(&config).await,
    }
}

async fn purge(config: &Config) -> AppResult<()> {
    let db = Database::connect_without_migrations(config).await?;
    let store = InvitationStore::new(db.get_connection(), config.query_timeout);

    let removed = store.purge_expired(Utc::now()).await?;
    tracing::info!(removed, "Expired invitations purged");
    println!("Removed {} expired invitation(s)", removed);

    Ok(())
}
