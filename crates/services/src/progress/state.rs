use chrono::{DateTime, Utc};
use std::collections::HashSet;

use quiz_core::model::MaterialId;

/// Mutable synchronization state for one authenticated session.
///
/// Owned by the engine and torn down with it on logout; nothing here is
/// process-global, so a logout/login cycle can never leak one user's
/// pending activity into the next session.
#[derive(Debug)]
pub(crate) struct SyncState {
    /// Local cache of viewed ids, authoritative for reads.
    pub viewed: HashSet<MaterialId>,
    /// Ids recorded locally but not yet acknowledged by the server.
    pub pending_push: HashSet<MaterialId>,
    pub last_full_sync_at: Option<DateTime<Utc>>,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub sync_in_flight: bool,
    pub started: bool,
}

impl SyncState {
    pub fn new(viewed: HashSet<MaterialId>) -> Self {
        Self {
            viewed,
            pending_push: HashSet::new(),
            last_full_sync_at: None,
            last_tick_at: None,
            sync_in_flight: false,
            started: false,
        }
    }
}
