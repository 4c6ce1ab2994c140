use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use crate::config::Config;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub started_at: Instant,
}
