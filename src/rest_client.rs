use crate::errors::MigrationError;
use crate::models::{ClientProfileRow, CLIENT_PROFILES_TABLE, USERS_TABLE};
use crate::sink::{InsertOutcome, ProfileSink};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

const DUPLICATE_KEY_MESSAGE: &str = "duplicate key value violates unique constraint";

/// Profile storage over the hosted backend's REST (PostgREST) API.
#[derive(Clone)]
pub struct RestProfileStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct UserIdRow {
    id: Uuid,
}

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PostgrestError {
    fn is_duplicate_key(&self) -> bool {
        self.code.as_deref() == Some("23505")
            || self
                .message
                .as_deref()
                .is_some_and(|m| m.contains(DUPLICATE_KEY_MESSAGE))
    }
}

impl RestProfileStore {
    /// Creates a new `RestProfileStore`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL of the hosted backend, without the `/rest/v1` suffix.
    /// * `service_key` - Service key sent as both `apikey` and bearer token.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        base_url: String,
        service_key: String,
        timeout: Duration,
    ) -> Result<Self, MigrationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MigrationError::Backend(format!("Failed to create REST client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }
}

#[async_trait]
impl ProfileSink for RestProfileStore {
    async fn find_user_id(&self, email: &str) -> Result<Option<Uuid>, MigrationError> {
        // Build URL with proper parameter encoding, emails may contain '+'
        let url = reqwest::Url::parse_with_params(
            &self.table_url(USERS_TABLE),
            &[
                ("select", "id".to_string()),
                ("email", format!("eq.{}", email)),
                ("limit", "1".to_string()),
            ],
        )
        .map_err(|e| MigrationError::Backend(format!("Failed to build URL: {}", e)))?;

        tracing::debug!("Looking up user by email: {}", email);

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| MigrationError::Backend(format!("User lookup request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MigrationError::Backend(format!(
                "User lookup returned {}: {}",
                status, error_text
            )));
        }

        let rows: Vec<UserIdRow> = response.json().await.map_err(|e| {
            MigrationError::Backend(format!("Failed to parse user lookup response: {}", e))
        })?;

        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn insert_profile(
        &self,
        row: &ClientProfileRow,
    ) -> Result<InsertOutcome, MigrationError> {
        let url = self.table_url(CLIENT_PROFILES_TABLE);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(|e| MigrationError::Backend(format!("Profile insert request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if status == StatusCode::CONFLICT {
                let body: PostgrestError = serde_json::from_str(&error_text).unwrap_or_default();
                if body.is_duplicate_key() || error_text.contains(DUPLICATE_KEY_MESSAGE) {
                    tracing::debug!("client_profiles already has a row for user {}", row.user_id);
                    return Ok(InsertOutcome::AlreadyExists);
                }
            }

            return Err(MigrationError::Backend(format!(
                "Profile insert returned {}: {}",
                status, error_text
            )));
        }

        let inserted: Vec<serde_json::Value> = response.json().await.map_err(|e| {
            MigrationError::Backend(format!("Failed to parse profile insert response: {}", e))
        })?;

        if inserted.is_empty() {
            Ok(InsertOutcome::NoDataReturned)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}
