//! The production datastore. Queries run on actix's blocking threadpool, one pooled
//! connection each.
mod client;
mod errors;
use crate::config::Config;
use crate::twoface::{Describe, ExternalError, Fallible};
use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};
use prometheus::{
    core::{Collector, Desc},
    proto::MetricFamily,
    IntGauge, Opts,
};
use r2d2::Pool;
use std::fmt;
use std::time::Duration;
use tracing::warn;

type PgPool = Pool<ConnectionManager<PgConnection>>;
pub(crate) type PgConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Connection string for the photofeed database. It carries the DB password, so it never
/// shows up in logs.
pub struct Dsn(String);

impl Dsn {
    pub fn new(config: &Config) -> Self {
        Dsn(config.db_dsn.clone())
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dsn(<redacted>)")
    }
}

impl From<Dsn> for String {
    fn from(dsn: Dsn) -> String {
        dsn.0
    }
}

/// Gauges describing the pool, refreshed whenever Prometheus scrapes.
#[derive(Clone)]
struct PoolGauges {
    idle: IntGauge,
    open: IntGauge,
}

impl PoolGauges {
    fn new() -> prometheus::Result<Self> {
        Ok(Self {
            idle: IntGauge::with_opts(Opts::new(
                "photofeed_db_connections_idle",
                "How many DB connections are currently idle",
            ))?,
            open: IntGauge::with_opts(Opts::new(
                "photofeed_db_connections",
                "How many DB connections are open",
            ))?,
        })
    }
}

/// An implementation of datastore::Client backed by Postgres
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    gauges: PoolGauges,
}

impl PostgresStore {
    pub fn new(
        dsn: Dsn,
        max_pool_size: u32,
        conn_timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let manager = ConnectionManager::<PgConnection>::new(dsn);
        let pool = Pool::builder()
            .max_size(max_pool_size)
            .connection_timeout(conn_timeout)
            .build(manager)?;
        Ok(Self {
            pool,
            gauges: PoolGauges::new()?,
        })
    }

    /// Connect using the `db_*` settings.
    pub fn connect(config: &Config) -> Result<Self, anyhow::Error> {
        Self::new(
            Dsn::new(config),
            config.db_pool_size,
            Duration::from_secs(config.db_connection_timeout),
        )
    }

    /// Check out a connection, waiting at most the configured timeout.
    fn conn(&self) -> Fallible<PgConn> {
        self.pool.get().map_err(|e| {
            let state = self.pool.state();
            warn!(
                open = state.connections,
                idle = state.idle_connections,
                "no DB connection available"
            );
            e.describe(ExternalError::default())
        })
    }
}

impl Collector for PostgresStore {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.gauges.idle.desc();
        descs.extend(self.gauges.open.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let state = self.pool.state();
        self.gauges.idle.set(state.idle_connections as i64);
        self.gauges.open.set(state.connections as i64);
        let mut metrics = self.gauges.idle.collect();
        metrics.extend(self.gauges.open.collect());
        metrics
    }
}
