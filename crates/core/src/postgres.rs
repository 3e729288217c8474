use std::{env, time::Duration};

use bb8::{Pool, PooledConnection, RunError};
use bb8_postgres::PostgresConnectionManager;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio::{task, time::timeout};
use tokio_postgres::{config::SslMode, types::ToSql, Config, Error as PgError, Row};
use tracing::{error, info, warn};

const DATABASE_URL: &str = "DATABASE_URL";
const DATABASE_POOL_SIZE: &str = "DATABASE_POOL_SIZE";
const DEFAULT_POOL_SIZE: u32 = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type ConnectionManager = PostgresConnectionManager<MakeTlsConnector>;

pub fn connection_string() -> Result<String, env::VarError> {
    env::var(DATABASE_URL)
}

fn pool_size() -> u32 {
    env::var(DATABASE_POOL_SIZE)
        .ok()
        .and_then(|size| size.parse::<u32>().ok())
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_POOL_SIZE)
}

#[derive(thiserror::Error, Debug)]
pub enum PostgresConnectionError {
    #[error("DATABASE_URL is not set, the postgres queue backend needs it: {0}")]
    DatabaseConnectionConfigWrong(#[from] env::VarError),

    #[error("Database connection error: {0}")]
    ConnectionError(#[from] PgError),

    #[error("Can not connect to the database please make sure your connection string is correct")]
    CanNotConnectToDatabase,

    #[error("Could not parse connection string make sure it is correctly formatted")]
    CouldNotParseConnectionString,

    #[error("Could not create tls connector")]
    CouldNotCreateTlsConnector,
}

#[derive(thiserror::Error, Debug)]
pub enum PostgresError {
    #[error("PgError {0}")]
    PgError(#[from] PgError),

    #[error("Connection pool error: {0}")]
    ConnectionPoolError(#[from] RunError<PgError>),
}

/// Opens a single connection and runs `SELECT 1` so a bad url fails at startup instead of
/// on the first enqueue.
async fn check_connection(
    config: &Config,
    tls: MakeTlsConnector,
) -> Result<(), PostgresConnectionError> {
    let (client, connection) = timeout(CONNECT_TIMEOUT, config.connect(tls)).await.map_err(|_| {
        error!("Timed out connecting to the database after {:?}", CONNECT_TIMEOUT);
        PostgresConnectionError::CanNotConnectToDatabase
    })??;

    let connection_handle = task::spawn(connection);
    let reachable = client.query_one("SELECT 1", &[]).await.is_ok();
    drop(client);

    match connection_handle.await {
        Ok(Ok(())) if reachable => Ok(()),
        _ => Err(PostgresConnectionError::CanNotConnectToDatabase),
    }
}

/// Pooled postgres access for the durable queue store.
pub struct PostgresClient {
    pool: Pool<ConnectionManager>,
}

impl PostgresClient {
    /// Connects using `DATABASE_URL`. A server that refuses tls is retried in plain text
    /// unless the url asks for `sslmode=require`.
    pub async fn new() -> Result<Self, PostgresConnectionError> {
        let connection_str = connection_string()?;
        let mut config: Config = connection_str
            .parse()
            .map_err(|_| PostgresConnectionError::CouldNotParseConnectionString)?;

        let connector = TlsConnector::builder()
            .build()
            .map_err(|_| PostgresConnectionError::CouldNotCreateTlsConnector)?;
        let tls = MakeTlsConnector::new(connector);

        if let Err(e) = check_connection(&config, tls.clone()).await {
            if config.get_ssl_mode() == SslMode::Disable
                || connection_str.contains("sslmode=require")
            {
                return Err(e);
            }
            warn!("Could not connect to the database over tls ({}), retrying without", e);
            config.ssl_mode(SslMode::Disable);
            check_connection(&config, tls.clone()).await?;
        }

        let max_size = pool_size();
        let pool = Pool::builder()
            .max_size(max_size)
            .build(PostgresConnectionManager::new(config, tls))
            .await?;
        info!("Connected to the database (pool size {})", max_size);

        Ok(PostgresClient { pool })
    }

    async fn connection(&self) -> Result<PooledConnection<'_, ConnectionManager>, PostgresError> {
        Ok(self.pool.get().await?)
    }

    pub async fn batch_execute(&self, sql: &str) -> Result<(), PostgresError> {
        Ok(self.connection().await?.batch_execute(sql).await?)
    }

    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, PostgresError> {
        Ok(self.connection().await?.execute(sql, params).await?)
    }

    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, PostgresError> {
        Ok(self.connection().await?.query(sql, params).await?)
    }

    pub async fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Row, PostgresError> {
        Ok(self.connection().await?.query_one(sql, params).await?)
    }
}
