use std::path::PathBuf;
use std::sync::Arc;

use slog::Logger;

use crate::db::Db;
use crate::store::Store;

pub type SafeDb = dyn Db + Send + Sync;
pub type PathStore = dyn Store<Output = PathBuf, Raw = Vec<u8>> + Send + Sync;

/// Everything a request handler needs, built once at startup and
/// cloned per route. There is no other process-wide state.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<SafeDb>,
    pub store: Arc<PathStore>,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, db: Arc<SafeDb>, store: Arc<PathStore>) -> Self {
        Self { logger, db, store }
    }
}
