use crate::errors::{MigrationError, ResultExt};
use crate::models::ClientProfileRow;
use crate::sink::{InsertOutcome, ProfileSink};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

/// Profile storage over a direct Postgres connection
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url` and checks it answers before any record is read.
    pub async fn connect(database_url: &str) -> Result<Self, MigrationError> {
        // Records are processed one at a time, a small pool is enough
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .context("connecting to Postgres")?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("checking Postgres connection")?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProfileSink for PgProfileStore {
    async fn find_user_id(&self, email: &str) -> Result<Option<Uuid>, MigrationError> {
        let user_id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE email = $1 LIMIT 1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("looking up user by email {}", email))?;

        Ok(user_id)
    }

    async fn insert_profile(
        &self,
        row: &ClientProfileRow,
    ) -> Result<InsertOutcome, MigrationError> {
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO client_profiles (
                user_id, company_name, website, description, duns_number,
                organisation_type, industry, logo_url, address1, address2,
                address3, country, postal_code, phone, linkedin_url,
                stripe_customer_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING user_id
            "#,
        )
        .bind(row.user_id)
        .bind(&row.company_name)
        .bind(&row.website)
        .bind(&row.description)
        .bind(&row.duns_number)
        .bind(&row.organisation_type)
        .bind(&row.industry)
        .bind(&row.logo_url)
        .bind(&row.address1)
        .bind(&row.address2)
        .bind(&row.address3)
        .bind(&row.country)
        .bind(&row.postal_code)
        .bind(&row.phone)
        .bind(&row.linkedin_url)
        .bind(&row.stripe_customer_id)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_optional(&self.pool)
        .await;

        match result.map_err(MigrationError::Database) {
            Ok(Some(_)) => Ok(InsertOutcome::Inserted),
            Ok(None) => Ok(InsertOutcome::NoDataReturned),
            Err(e) if e.is_unique_violation() => {
                tracing::debug!("client_profiles already has a row for user {}", row.user_id);
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }
}
