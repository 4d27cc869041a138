use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::LessondConfig;
use crate::prefs::MemoryStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: LessondConfig,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    /// Session-scoped flags; initialised empty at startup and never persisted.
    pub session: MemoryStore,
}

impl AppState {
    pub fn new(config: LessondConfig) -> Self {
        Self {
            config,
            workspace: None,
            db: None,
            session: MemoryStore::new(),
        }
    }
}
