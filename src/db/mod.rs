mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::GatewayConfig;
use crate::jwt::SessionVerifier;

pub type DbPool = Pool<SqliteConnectionManager>;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Merchant credentials and public URLs for Z-Pay
    pub gateway: Arc<GatewayConfig>,
    /// `None` when `AUTH_JWT_SECRET` is unset; authenticated routes then
    /// answer with a configuration error.
    pub session_verifier: Option<Arc<SessionVerifier>>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
    Pool::builder().max_size(10).build(manager)
}
