use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use client_profile_migrator::config::{Backend, Config};
use client_profile_migrator::db_storage::PgProfileStore;
use client_profile_migrator::migrator::{MigrationOptions, Migrator, RunMode};
use client_profile_migrator::rest_client::RestProfileStore;
use client_profile_migrator::sink::ProfileSink;

/// Migrate client profiles from a legacy user export into `client_profiles`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Legacy user export (CSV with Id, EmailAddress, PublicData, PrivateData, ProtectedData)
    #[arg(long, env = "LEGACY_USERS_CSV")]
    csv: PathBuf,

    /// Process the whole export instead of stopping after the first attempted record
    #[arg(long)]
    all: bool,

    /// With --all, stop after this many records reached the user lookup
    #[arg(long, requires = "all")]
    limit: Option<usize>,

    /// Look users up and build rows without inserting anything
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn migration_options(&self) -> MigrationOptions {
        MigrationOptions {
            mode: if self.all {
                RunMode::Batch { limit: self.limit }
            } else {
                RunMode::SingleRecord
            },
            dry_run: self.dry_run,
        }
    }
}

/// Main entry point for the migration.
///
/// Initializes logging, loads configuration, connects to the selected backend
/// and runs the export through the migrator. Exits non-zero if the export cannot
/// be read or any record ended in an unexpected error.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Before argument parsing so env-backed flags see values from .env
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "client_profile_migrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let sink: Box<dyn ProfileSink> = match &config.backend {
        Backend::Postgres { database_url } => {
            let store = PgProfileStore::connect(database_url).await?;
            tracing::info!("Database connection pool established");
            Box::new(store)
        }
        Backend::Rest {
            base_url,
            service_key,
        } => {
            let store = RestProfileStore::new(
                base_url.clone(),
                service_key.clone(),
                Duration::from_secs(config.http_timeout_secs),
            )?;
            tracing::info!("✓ REST client initialized: {}", base_url);
            Box::new(store)
        }
    };

    let options = cli.migration_options();
    tracing::info!("Starting client profile migration ({:?})", options);

    let mut migrator = Migrator::new(sink.as_ref(), options);
    let result = migrator.run_csv_path(&cli.csv).await;

    let stats = migrator.into_stats();
    stats.log_summary();

    result?;
    if !stats.errors.is_empty() {
        anyhow::bail!("{} record(s) failed to migrate", stats.errors.len());
    }

    Ok(())
}
