use crate::errors::MigrationError;
use crate::models::ClientProfileRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Result of a profile insert that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The user already has a profile (unique constraint). Expected on re-runs.
    AlreadyExists,
    /// The backend accepted the request but returned no row.
    NoDataReturned,
}

/// Destination for migrated profiles.
#[async_trait]
pub trait ProfileSink: Send + Sync {
    /// Looks up the account id registered under `email`.
    async fn find_user_id(&self, email: &str) -> Result<Option<Uuid>, MigrationError>;

    /// Inserts a profile row. Duplicate-key rejections are reported as
    /// [`InsertOutcome::AlreadyExists`], never as an error.
    async fn insert_profile(&self, row: &ClientProfileRow)
        -> Result<InsertOutcome, MigrationError>;
}
