use crate::errors::MigrationError;
use std::fmt;

/// Where profiles are read from and written to.
#[derive(Clone)]
pub enum Backend {
    /// Direct Postgres connection to the hosted database.
    Postgres { database_url: String },
    /// The hosted backend's REST (PostgREST) API, authenticated with a service key.
    Rest { base_url: String, service_key: String },
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Postgres { database_url } => f
                .debug_struct("Postgres")
                .field("database_url", &redact(database_url))
                .finish(),
            Backend::Rest { base_url, .. } => f
                .debug_struct("Rest")
                .field("base_url", base_url)
                .field("service_key", &"[REDACTED]")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        match &config.backend {
            Backend::Postgres { database_url } => {
                tracing::debug!("Backend: postgres ({})", redact(database_url));
            }
            Backend::Rest { base_url, .. } => {
                tracing::debug!("Backend: rest ({})", base_url);
            }
        }
        tracing::debug!("HTTP timeout: {}s", config.http_timeout_secs);

        Ok(config)
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MigrationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").or_else(|| non_empty("DB_URL"));
        let supabase_url = non_empty("SUPABASE_URL");
        let service_key =
            non_empty("SUPABASE_SERVICE_ROLE_KEY").or_else(|| non_empty("SUPABASE_KEY"));

        let backend = match (database_url, supabase_url, service_key) {
            (Some(url), _, _) => {
                if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                    return Err(invalid("DATABASE_URL must start with postgresql:// or postgres://"));
                }
                Backend::Postgres { database_url: url }
            }
            (None, Some(url), Some(key)) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(invalid("SUPABASE_URL must start with http:// or https://"));
                }
                Backend::Rest {
                    base_url: url.trim_end_matches('/').to_string(),
                    service_key: key,
                }
            }
            (None, Some(_), None) => {
                return Err(invalid(
                    "SUPABASE_SERVICE_ROLE_KEY or SUPABASE_KEY environment variable required",
                ))
            }
            (None, None, _) => {
                return Err(invalid(
                    "DATABASE_URL (or DB_URL) or SUPABASE_URL with a service key must be set",
                ))
            }
        };

        let http_timeout_secs = match non_empty("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| invalid("HTTP_TIMEOUT_SECS must be a whole number"))?,
            None => 30,
        };

        Ok(Self {
            backend,
            http_timeout_secs,
        })
    }
}

fn invalid(message: &str) -> MigrationError {
    MigrationError::Config(message.to_string())
}

/// First 20 characters of a connection string, for logs.
fn redact(url: &str) -> String {
    format!("{}...", url.chars().take(20).collect::<String>())
}
