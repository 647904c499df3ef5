//! Migration driver: reads the legacy export and pushes client profiles to a sink.
//!
//! Records are processed strictly one after another:
//! extract → look up user → transform → insert.

use crate::errors::{MigrationError, ResultExt};
use crate::extraction::extract_with_report;
use crate::models::{LegacyUserRow, MigrationStats};
use crate::sink::{InsertOutcome, ProfileSink};
use crate::transform::transform_client_profile;
use std::io::Read;
use std::path::Path;

/// When the driver stops reading rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Stop after the first record that reaches the user lookup.
    SingleRecord,
    /// Process every row, optionally capping how many records reach the user lookup.
    Batch { limit: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    pub mode: RunMode,
    /// Look users up and build rows without inserting anything.
    pub dry_run: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::SingleRecord,
            dry_run: false,
        }
    }
}

/// What happened to a single legacy record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The row could not be read from the export.
    InvalidRow,
    /// No company name, nothing to migrate.
    NoClientData,
    UserNotFound,
    LookupFailed,
    Inserted,
    AlreadyExists,
    InsertFailed,
    DryRun,
}

impl RecordOutcome {
    /// Whether the record got as far as the user lookup.
    pub fn attempted(&self) -> bool {
        !matches!(self, RecordOutcome::InvalidRow | RecordOutcome::NoClientData)
    }
}

pub struct Migrator<'a> {
    sink: &'a dyn ProfileSink,
    options: MigrationOptions,
    stats: MigrationStats,
    attempted: usize,
}

impl<'a> Migrator<'a> {
    pub fn new(sink: &'a dyn ProfileSink, options: MigrationOptions) -> Self {
        Self {
            sink,
            options,
            stats: MigrationStats::default(),
            attempted: 0,
        }
    }

    pub fn stats(&self) -> &MigrationStats {
        &self.stats
    }

    pub fn into_stats(self) -> MigrationStats {
        self.stats
    }

    /// Migrates the export at `path`.
    pub async fn run_csv_path(&mut self, path: &Path) -> Result<(), MigrationError> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("CSV file not found: {}", path.display()))?;

        tracing::info!("Migrating client profiles from: {}", path.display());
        self.run_reader(file).await
    }

    /// Migrates an export read from `reader`. The first line must hold the column headers.
    pub async fn run_reader<R: Read>(&mut self, reader: R) -> Result<(), MigrationError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        // A missing header row means the file is unusable, not just one bad record
        csv_reader.headers().map_err(MigrationError::Csv)?;

        for record in csv_reader.deserialize::<LegacyUserRow>() {
            // Checked before the row is touched so a cap of 0 attempts nothing
            if self.should_stop() {
                tracing::info!(
                    "Stopping after {} attempted record(s) ({:?})",
                    self.attempted,
                    self.options.mode
                );
                break;
            }

            let outcome = match record {
                Ok(row) => self.process_record(&row).await,
                Err(e) => {
                    self.stats.total_records += 1;
                    let message = format!("Unreadable CSV row {}: {}", self.stats.total_records, e);
                    tracing::warn!("{}", message);
                    self.stats.errors.push(message);
                    RecordOutcome::InvalidRow
                }
            };

            if outcome.attempted() {
                self.attempted += 1;
            }
        }

        Ok(())
    }

    fn should_stop(&self) -> bool {
        match self.options.mode {
            RunMode::SingleRecord => self.attempted >= 1,
            RunMode::Batch { limit: Some(limit) } => self.attempted >= limit,
            RunMode::Batch { limit: None } => false,
        }
    }

    /// Runs one record through extraction, lookup and insert, updating the statistics.
    pub async fn process_record(&mut self, row: &LegacyUserRow) -> RecordOutcome {
        self.stats.total_records += 1;
        let record_no = self.stats.total_records;

        let report = extract_with_report(&row.public_data, &row.private_data, &row.protected_data);
        for (source, reason) in report.malformed_sources() {
            self.stats.malformed_sources += 1;
            tracing::debug!("Record {} (Id {}): {} ignored: {}", record_no, row.id, source, reason);
        }
        let Some(profile) = report.profile else {
            tracing::debug!("Record {} (Id {}) has no company name, skipping", record_no, row.id);
            return RecordOutcome::NoClientData;
        };

        self.stats.clients_found += 1;
        tracing::info!(
            "Processing record {} (Id {}, email {}): company {}",
            record_no,
            row.id,
            row.email_address,
            profile.company_name
        );

        let email = row.email_address.trim();
        let user_id = if email.is_empty() {
            None
        } else {
            match self.sink.find_user_id(email).await {
                Ok(user_id) => user_id,
                Err(e) => {
                    let message = format!("Error looking up user by email {}: {}", email, e);
                    tracing::error!("{}", message);
                    self.stats.errors.push(message);
                    return RecordOutcome::LookupFailed;
                }
            }
        };

        let Some(user_id) = user_id else {
            self.stats.users_not_found += 1;
            tracing::warn!(
                "❌ User not found in database for email: {:?} (record has client data)",
                row.email_address
            );
            for (field, value) in profile.populated_fields().iter().take(3) {
                tracing::debug!("  {}: {}", field, value);
            }
            return RecordOutcome::UserNotFound;
        };

        tracing::info!("✓ Found user in database: {}", user_id);
        for (field, value) in profile.populated_fields() {
            tracing::debug!("  {}: {}", field, value);
        }

        let profile_row = transform_client_profile(user_id, &profile);

        if self.options.dry_run {
            self.stats.dry_run_previews += 1;
            tracing::info!(
                "Dry run, not inserting: {}",
                serde_json::to_string(&profile_row).unwrap_or_default()
            );
            return RecordOutcome::DryRun;
        }

        match self.sink.insert_profile(&profile_row).await {
            Ok(InsertOutcome::Inserted) => {
                self.stats.profiles_inserted += 1;
                tracing::info!("✓ Successfully inserted client profile for user {}", user_id);
                RecordOutcome::Inserted
            }
            Ok(InsertOutcome::AlreadyExists) => {
                self.stats.duplicates_skipped += 1;
                tracing::warn!("⚠️ Profile already exists for user {} (expected)", user_id);
                RecordOutcome::AlreadyExists
            }
            Ok(InsertOutcome::NoDataReturned) => {
                let message = format!("No data returned for client profile: {}", user_id);
                tracing::error!("❌ {}", message);
                self.stats.errors.push(message);
                RecordOutcome::InsertFailed
            }
            Err(e) => {
                let message = format!(
                    "Error inserting client profile for user {}: {}",
                    user_id, e
                );
                tracing::error!("❌ {}", message);
                self.stats.errors.push(message);
                RecordOutcome::InsertFailed
            }
        }
    }
}
