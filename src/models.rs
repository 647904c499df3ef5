use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table holding the accounts profiles are attached to.
pub const USERS_TABLE: &str = "users";
/// Target table for migrated profiles.
pub const CLIENT_PROFILES_TABLE: &str = "client_profiles";

// ============ Legacy Export ============

/// One row of the legacy user export.
///
/// Every column may be empty or the literal text `null`. Columns missing from the
/// file deserialize as empty strings; extra columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacyUserRow {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "EmailAddress")]
    pub email_address: String,
    #[serde(rename = "PublicData")]
    pub public_data: String,
    #[serde(rename = "PrivateData")]
    pub private_data: String,
    #[serde(rename = "ProtectedData")]
    pub protected_data: String,
}

// ============ Profiles ============

/// Client attributes merged from a legacy record's three JSON documents.
///
/// `company_name` is mandatory: a record without one never produces a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedProfile {
    pub company_name: String,
    pub website: Option<String>,
    pub duns_number: Option<String>,
    pub industry: Option<String>,
    pub organisation_type: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub phone: Option<String>,
}

impl ExtractedProfile {
    /// Populated fields in a stable order, for logging.
    pub fn populated_fields(&self) -> Vec<(&'static str, &str)> {
        let optional = [
            ("website", &self.website),
            ("duns_number", &self.duns_number),
            ("industry", &self.industry),
            ("organisation_type", &self.organisation_type),
            ("country", &self.country),
            ("postal_code", &self.postal_code),
            ("address1", &self.address1),
            ("address2", &self.address2),
            ("address3", &self.address3),
            ("phone", &self.phone),
        ];

        let mut fields = vec![("company_name", self.company_name.as_str())];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.as_deref().map(|v| (name, v))),
        );
        fields
    }
}

/// A row of the `client_profiles` table, ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientProfileRow {
    pub user_id: Uuid,
    pub company_name: String,
    pub website: Option<String>,
    /// Not available in the legacy export.
    pub description: Option<String>,
    pub duns_number: Option<String>,
    pub organisation_type: Option<String>,
    pub industry: Option<String>,
    /// Not available in the legacy export.
    pub logo_url: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    /// Not available in the legacy export.
    pub linkedin_url: Option<String>,
    /// Not available in the legacy export.
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============ Run Bookkeeping ============

/// Counters accumulated over one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStats {
    /// Rows read from the export, including rows that failed to deserialize.
    pub total_records: usize,
    /// Rows that produced a profile (had a company name).
    pub clients_found: usize,
    /// Profiles whose email matched no account.
    pub users_not_found: usize,
    pub profiles_inserted: usize,
    /// Inserts rejected because the user already has a profile.
    pub duplicates_skipped: usize,
    pub dry_run_previews: usize,
    /// JSON columns that were present but unparseable, counted per column.
    pub malformed_sources: usize,
    /// Unexpected failures. Duplicate-key rejections never land here.
    pub errors: Vec<String>,
}

impl MigrationStats {
    /// Logs the end-of-run summary.
    pub fn log_summary(&self) {
        tracing::info!("Migration summary:");
        tracing::info!("  Total records processed: {}", self.total_records);
        tracing::info!("  Clients found: {}", self.clients_found);
        tracing::info!("  Users not found: {}", self.users_not_found);
        tracing::info!("  Profiles inserted: {}", self.profiles_inserted);
        tracing::info!("  Already existing: {}", self.duplicates_skipped);
        if self.dry_run_previews > 0 {
            tracing::info!("  Dry-run previews: {}", self.dry_run_previews);
        }
        tracing::info!("  Malformed JSON columns: {}", self.malformed_sources);
        tracing::info!("  Errors: {}", self.errors.len());

        for error in &self.errors {
            tracing::error!("  - {}", error);
        }
    }
}
