use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::models::{Client, ClientFields, ClientListing, ClientSummary};

mod memory;
mod postgres;

pub use memory::MemoryClientStore;
pub use postgres::PgClientStore;

/// Repository operations over the clients table.
///
/// Implementations never remove rows and always move `updated_at` forward
/// on a mutation.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Every client, ordered by last name then first name.
    async fn list(&self) -> Result<Vec<ClientListing>, ClientError>;

    async fn get(&self, id: i32) -> Result<Option<Client>, ClientError>;

    /// Insert an active client with both timestamps set to now.
    async fn insert(&self, fields: ClientFields) -> Result<Client, ClientError>;

    /// Overwrite every writable column, but only if the row still carries
    /// `expected_updated_at`. `Ok(None)` means no row matched.
    async fn replace(
        &self,
        id: i32,
        fields: ClientFields,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<Option<Client>, ClientError>;

    /// Mark the client inactive. `Ok(None)` when the id does not exist.
    async fn deactivate(&self, id: i32) -> Result<Option<ClientSummary>, ClientError>;
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let options = config.connect_options()?;

        if config.tls_enabled() {
            warn!("DB_SSL=true: TLS is enabled without server certificate verification");
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "error connecting to the database ({})",
                    config.describe_target()
                )
            })?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round trip to the server, returning its clock.
    pub async fn ping(&self) -> Result<DateTime<Utc>> {
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(self.get_pool())
            .await
            .context("database ping failed")?;

        Ok(now)
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(self.get_pool())
            .await
            .context("failed to run database migrations")?;

        Ok(())
    }

    /// Wait for checked-out connections and close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    let now = db.ping().await?;
    info!(server_time = %now, "connected to PostgreSQL");

    Ok(db)
}
