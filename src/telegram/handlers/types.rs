//! Handler types and dependencies

use dashmap::DashMap;
use std::sync::Arc;

use crate::storage::db::DbPool;
use crate::telegram::broadcast::PendingBroadcast;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    /// Admin chats that ran /broadcast and whose next message is the
    /// broadcast content, keyed by chat id
    pub pending_broadcasts: Arc<DashMap<i64, PendingBroadcast>>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db_pool,
            pending_broadcasts: Arc::new(DashMap::new()),
        }
    }
}
