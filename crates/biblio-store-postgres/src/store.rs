//! [`PgStore`] — pool ownership and transaction entry points.

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::{schema::SCHEMA, Error, Result, Tx};

/// Default pool size; generous for a single-process deployment.
const POOL_MAX_SIZE: usize = 16;

/// A Biblio store backed by a Postgres connection pool.
///
/// Cloning is cheap — the inner pool is reference-counted.
#[derive(Clone)]
pub struct PgStore {
  pool: Pool,
}

impl PgStore {
  /// Build a pool for `database_url` (any libpq-style connection string).
  /// No connection is made until first use.
  pub fn connect(database_url: &str) -> Result<Self> {
    let pg_config = database_url
      .parse::<tokio_postgres::Config>()
      .map_err(Error::from)?;
    let manager = Manager::from_config(pg_config, NoTls, ManagerConfig {
      recycling_method: RecyclingMethod::Fast,
    });
    let pool = Pool::builder(manager)
      .max_size(POOL_MAX_SIZE)
      .build()
      .map_err(|e| Error::Pool(e.to_string()))?;
    Ok(Self { pool })
  }

  /// Run the idempotent schema batch. Called once at startup.
  pub async fn init_schema(&self) -> Result<()> {
    let conn = self.acquire().await?;
    conn.batch_execute(SCHEMA).await?;
    Ok(())
  }

  /// Check out a connection from the pool.
  pub async fn acquire(&self) -> Result<Object> {
    self.pool.get().await.map_err(|e| Error::Pool(e.to_string()))
  }

  /// Open a serializable transaction on a checked-out connection.
  ///
  /// Every state-changing operation in the system runs inside exactly one of
  /// these; dropping the returned [`Tx`] without committing rolls back.
  pub async fn begin<'a>(&self, conn: &'a mut Object) -> Result<Tx<'a>> {
    Tx::begin(&mut **conn).await
  }
}
