//! Database Connection Pool Module
//!
//! PostgreSQL-backed [`ScanStore`] over a deadpool-postgres pool. Lookups are
//! single-row reads; the scan increment is one `UPDATE ... RETURNING`, so the
//! database applies it atomically.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use qrflow_core::{Campaign, Grouping, LookupStage, ScanCode, StoreError};
use qrflow_storage::{ScanStore, StoreResult};
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};

/// Tables the store reads. Applied by operators and by the database tests.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS campaigns (
    id                TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    access_credential TEXT,
    fallback_url      TEXT
);

CREATE TABLE IF NOT EXISTS qr_groupings (
    id          TEXT PRIMARY KEY,
    campaign_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS qr_codes (
    id          TEXT PRIMARY KEY,
    grouping_id TEXT NOT NULL,
    scan_count  BIGINT NOT NULL DEFAULT 0 CHECK (scan_count >= 0)
);
"#;

const LOOKUP_CODE_SQL: &str = "SELECT id, grouping_id, scan_count FROM qr_codes WHERE id = $1";
const LOOKUP_GROUPING_SQL: &str = "SELECT id, campaign_id FROM qr_groupings WHERE id = $1";
const LOOKUP_CAMPAIGN_SQL: &str =
    "SELECT id, name, access_credential, fallback_url FROM campaigns WHERE id = $1";
const INCREMENT_SQL: &str =
    "UPDATE qr_codes SET scan_count = scan_count + 1 WHERE id = $1 RETURNING scan_count";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create/recycle timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "qrflow".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("QRFLOW_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("QRFLOW_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("QRFLOW_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("QRFLOW_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("QRFLOW_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("QRFLOW_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("QRFLOW_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// Connections are opened lazily; a bad host surfaces on first use.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts = Timeouts {
            wait: Some(self.timeout),
            create: Some(self.timeout),
            recycle: Some(self.timeout),
        };
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// [`ScanStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgScanStore {
    pool: Pool,
}

impl PgScanStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn conn(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| StoreError::Unavailable {
            reason: format!("connection pool: {}", e),
        })
    }

    async fn query_single(&self, sql: &str, key: &str) -> StoreResult<Option<Row>> {
        let conn = self.conn().await?;
        let start = Instant::now();
        let row = conn
            .query_opt(sql, &[&key])
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: format!("query failed: {}", e),
            })?;
        tracing::trace!(elapsed_ms = start.elapsed().as_millis() as u64, "store lookup");
        Ok(row)
    }
}

fn column<'a, T>(row: &'a Row, stage: LookupStage, name: &str) -> StoreResult<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name).map_err(|e| StoreError::MalformedRecord {
        stage,
        reason: format!("column {}: {}", name, e),
    })
}

#[async_trait]
impl ScanStore for PgScanStore {
    async fn lookup_code(&self, code: &str) -> StoreResult<Option<ScanCode>> {
        let Some(row) = self.query_single(LOOKUP_CODE_SQL, code).await? else {
            return Ok(None);
        };
        Ok(Some(ScanCode {
            id: column(&row, LookupStage::Code, "id")?,
            grouping_ref: column(&row, LookupStage::Code, "grouping_id")?,
            scan_count: column(&row, LookupStage::Code, "scan_count")?,
        }))
    }

    async fn lookup_grouping(&self, grouping_ref: &str) -> StoreResult<Option<Grouping>> {
        let Some(row) = self.query_single(LOOKUP_GROUPING_SQL, grouping_ref).await? else {
            return Ok(None);
        };
        Ok(Some(Grouping {
            id: column(&row, LookupStage::Grouping, "id")?,
            campaign_ref: column(&row, LookupStage::Grouping, "campaign_id")?,
        }))
    }

    async fn lookup_campaign(&self, campaign_ref: &str) -> StoreResult<Option<Campaign>> {
        let Some(row) = self.query_single(LOOKUP_CAMPAIGN_SQL, campaign_ref).await? else {
            return Ok(None);
        };
        Ok(Some(Campaign {
            id: column(&row, LookupStage::Campaign, "id")?,
            name: column(&row, LookupStage::Campaign, "name")?,
            access_credential: column(&row, LookupStage::Campaign, "access_credential")?,
            fallback_url: column(&row, LookupStage::Campaign, "fallback_url")?,
        }))
    }

    async fn increment_scan_count(&self, code_id: &str) -> StoreResult<i64> {
        let update_failed = |reason: String| StoreError::UpdateFailed {
            code_id: code_id.to_string(),
            reason,
        };

        let conn = self.conn().await?;
        let row = conn
            .query_opt(INCREMENT_SQL, &[&code_id])
            .await
            .map_err(|e| update_failed(e.to_string()))?
            .ok_or_else(|| update_failed("code does not exist".to_string()))?;

        row.try_get::<_, i64>("scan_count")
            .map_err(|e| update_failed(format!("column scan_count: {}", e)))
    }

    async fn health_check(&self) -> StoreResult<()> {
        let conn = self.conn().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: format!("health check: {}", e),
            })?;
        Ok(())
    }
}
