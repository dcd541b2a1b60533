use std::sync::Arc;

use crate::config::ServerConfig;

/// Handed to every handler through `State<AppState>`; clones share the pool.
#[derive(Clone)]
pub struct AppState {
    pub pool: eventhub_db::DbPool,
    pub config: Arc<ServerConfig>,
}
