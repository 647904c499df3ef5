use std::fmt;

/// Error types for a migration run.
#[derive(Debug)]
pub enum MigrationError {
    /// Database-related errors from the direct Postgres backend.
    Database(sqlx::Error),
    /// Error reported by the hosted REST backend (transport, status or payload).
    Backend(String),
    /// Error reading the legacy CSV export.
    Csv(csv::Error),
    /// Filesystem errors.
    Io(std::io::Error),
    /// Missing or invalid configuration.
    Config(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<MigrationError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::Database(e) => write!(f, "Database error: {}", e),
            MigrationError::Backend(msg) => write!(f, "Backend error: {}", msg),
            MigrationError::Csv(e) => write!(f, "CSV error: {}", e),
            MigrationError::Io(e) => write!(f, "I/O error: {}", e),
            MigrationError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MigrationError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::Database(e) => Some(e),
            MigrationError::Csv(e) => Some(e),
            MigrationError::Io(e) => Some(e),
            MigrationError::WithContext { source, .. } => Some(source.as_ref()),
            MigrationError::Backend(_) | MigrationError::Config(_) => None,
        }
    }
}

impl MigrationError {
    /// Returns true when the underlying cause is a Postgres unique_violation (SQLSTATE 23505).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            MigrationError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            MigrationError::WithContext { source, .. } => source.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for MigrationError {
    fn from(err: sqlx::Error) -> Self {
        MigrationError::Database(err)
    }
}

impl From<reqwest::Error> for MigrationError {
    fn from(err: reqwest::Error) -> Self {
        MigrationError::Backend(err.to_string())
    }
}

impl From<csv::Error> for MigrationError {
    fn from(err: csv::Error) -> Self {
        MigrationError::Csv(err)
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Io(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `MigrationError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, MigrationError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, MigrationError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, MigrationError> {
    fn context(self, context: impl Into<String>) -> Result<T, MigrationError> {
        self.map_err(|e| MigrationError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, MigrationError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| MigrationError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, MigrationError> {
        self.map_err(MigrationError::Database).context(context)
    }

    fn with_context<F>(self, f: F) -> Result<T, MigrationError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(MigrationError::Database).with_context(f)
    }
}

/// Extension for filesystem errors to add context
impl<T> ResultExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, MigrationError> {
        self.map_err(MigrationError::Io).context(context)
    }

    fn with_context<F>(self, f: F) -> Result<T, MigrationError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(MigrationError::Io).with_context(f)
    }
}
