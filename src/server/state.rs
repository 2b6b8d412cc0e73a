use axum::extract::FromRef;

use crate::import::ImportManager;
use crate::query::CorpusStats;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCorpusStats = Arc<CorpusStats>;
pub type GuardedImportManager = Arc<ImportManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub stats: GuardedCorpusStats,
    pub import_manager: GuardedImportManager,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        stats: GuardedCorpusStats,
        import_manager: GuardedImportManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            stats,
            import_manager,
        }
    }
}

impl FromRef<ServerState> for GuardedCorpusStats {
    fn from_ref(input: &ServerState) -> Self {
        input.stats.clone()
    }
}

impl FromRef<ServerState> for GuardedImportManager {
    fn from_ref(input: &ServerState) -> Self {
        input.import_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
