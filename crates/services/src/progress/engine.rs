use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use quiz_core::Clock;
use quiz_core::model::{MaterialId, UserId, ViewedFact};
use storage::{StorageError, ViewedFactRepository};

use crate::debounce::Debouncer;
use crate::error::ProgressError;
use crate::gateway::ProgressGateway;
use crate::progress::state::SyncState;

/// Delay before locally recorded facts are pushed upstream. Long enough to
/// batch a reading burst, short enough that a quick app close rarely loses
/// the push.
const DEFAULT_PUSH_DELAY: Duration = Duration::from_millis(250);

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Server round-trip succeeded; `adopted` ids seen on other devices
    /// were folded into the local record.
    Completed { adopted: usize },
    /// Server unreachable or rejecting; local facts are retained and the
    /// next cycle retries.
    Deferred,
    /// Another full sync is already running.
    InFlight,
}

/// Offline-first tracker of which learning materials a user has viewed.
///
/// Reads are answered from an in-memory set hydrated at login, so
/// `is_viewed` is synchronous and never touches the network. Writes land
/// in local storage first and reach the server on a best-effort schedule:
/// a debounced push after each `mark_viewed`, plus union-merge
/// reconciliation via `full_sync` and the periodic ticker. Viewing is
/// non-retractable, so every merge is a set union and no pass can lose
/// an id recorded anywhere.
pub struct ProgressEngine {
    user_id: UserId,
    facts: Arc<dyn ViewedFactRepository>,
    gateway: Arc<dyn ProgressGateway>,
    clock: Clock,
    push_delay: Duration,
    push_debounce: Debouncer,
    state: Mutex<SyncState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressEngine {
    /// Build an engine for a freshly authenticated user, hydrating the
    /// in-memory viewed set from local storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the local store cannot be read.
    pub async fn login(
        user_id: UserId,
        facts: Arc<dyn ViewedFactRepository>,
        gateway: Arc<dyn ProgressGateway>,
        clock: Clock,
    ) -> Result<Self, ProgressError> {
        let viewed: HashSet<MaterialId> = facts
            .facts_for_user(user_id)
            .await?
            .into_iter()
            .map(|fact| fact.material_id)
            .collect();
        debug!(user = %user_id, hydrated = viewed.len(), "progress engine ready");
        Ok(Self {
            user_id,
            facts,
            gateway,
            clock,
            push_delay: DEFAULT_PUSH_DELAY,
            push_debounce: Debouncer::new(),
            state: Mutex::new(SyncState::new(viewed)),
            ticker: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn with_push_delay(mut self, delay: Duration) -> Self {
        self.push_delay = delay;
        self
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Whether the user has viewed this material, answered from the local
    /// cache without any I/O.
    #[must_use]
    pub fn is_viewed(&self, material_id: MaterialId) -> bool {
        self.state
            .lock()
            .map(|s| s.viewed.contains(&material_id))
            .unwrap_or(false)
    }

    #[must_use]
    pub fn viewed_count(&self) -> usize {
        self.state.lock().map(|s| s.viewed.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn last_full_sync_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().ok().and_then(|s| s.last_full_sync_at)
    }

    //
    // ─── RECORDING ─────────────────────────────────────────────────────────────
    //

    /// Record that the user viewed a material.
    ///
    /// The fact is durable locally before this returns; the upstream push
    /// is debounced and best-effort. Re-viewing is a no-op for the stored
    /// timestamp (earliest view wins) but still refreshes the push window.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` only when the local write fails;
    /// network trouble never surfaces here.
    pub async fn mark_viewed(
        self: &Arc<Self>,
        material_id: MaterialId,
        time_spent_sec: Option<u32>,
    ) -> Result<(), ProgressError> {
        let mut fact = ViewedFact::new(material_id, self.clock.now());
        if let Some(secs) = time_spent_sec {
            fact = fact.with_time_spent(secs);
        }
        self.facts.record_fact(self.user_id, &fact).await?;
        {
            let mut state = self.state_mut()?;
            state.viewed.insert(material_id);
            state.pending_push.insert(material_id);
        }
        self.schedule_push();
        Ok(())
    }

    fn schedule_push(self: &Arc<Self>) {
        // Weak, so a pending push never keeps a logged-out engine alive.
        let weak = Arc::downgrade(self);
        self.push_debounce.call(self.push_delay, async move {
            if let Some(engine) = weak.upgrade() {
                engine.push_pending().await;
            }
        });
    }

    /// Flush unacknowledged ids to the server immediately.
    ///
    /// Failures are logged and the ids re-queued; they ride along with the
    /// next push or reconciliation pass.
    pub async fn push_pending(&self) {
        let pending = match self.state_mut() {
            Ok(mut state) => std::mem::take(&mut state.pending_push),
            Err(_) => return,
        };
        if pending.is_empty() {
            return;
        }
        match self.gateway.push_viewed(self.user_id, &pending).await {
            Ok(server_ids) => {
                if let Err(error) = self.adopt_remote(&server_ids).await {
                    warn!(user = %self.user_id, %error, "could not store ids adopted from server");
                }
            }
            Err(error) => {
                warn!(user = %self.user_id, %error, "progress push failed; retrying on next cycle");
                if let Ok(mut state) = self.state.lock() {
                    state.pending_push.extend(pending);
                }
            }
        }
    }

    //
    // ─── RECONCILIATION ────────────────────────────────────────────────────────
    //

    /// Full bidirectional reconciliation with the server.
    ///
    /// Sends the entire local viewed set and adopts everything the server
    /// knows that we do not. At most one full sync runs at a time; callers
    /// racing an in-flight pass get `SyncOutcome::InFlight`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if adopted ids cannot be persisted.
    /// An unreachable server is not an error; it yields `Deferred`.
    pub async fn full_sync(&self) -> Result<SyncOutcome, ProgressError> {
        let local = {
            let mut state = self.state_mut()?;
            if state.sync_in_flight {
                debug!(user = %self.user_id, "full sync skipped, one already running");
                return Ok(SyncOutcome::InFlight);
            }
            state.sync_in_flight = true;
            state.viewed.clone()
        };

        let outcome = self.merge_with_server(&local).await;

        if let Ok(mut state) = self.state.lock() {
            state.sync_in_flight = false;
            if matches!(outcome, Ok(SyncOutcome::Completed { .. })) {
                state.last_full_sync_at = Some(self.clock.now());
            }
        }
        outcome
    }

    /// Lightweight reconciliation for the background ticker.
    ///
    /// Only facts recorded since the previous successful pass are sent;
    /// the server still replies with its complete merged set, so adoption
    /// works the same as in `full_sync`.
    ///
    /// # Errors
    ///
    /// Same contract as [`full_sync`](Self::full_sync).
    pub async fn periodic_sync(&self) -> Result<SyncOutcome, ProgressError> {
        let (since, in_flight) = {
            let state = self.state_mut()?;
            (
                state.last_tick_at.or(state.last_full_sync_at),
                state.sync_in_flight,
            )
        };
        if in_flight {
            return Ok(SyncOutcome::InFlight);
        }

        let recent: HashSet<MaterialId> = match since {
            Some(cutoff) => self
                .facts
                .facts_since(self.user_id, cutoff)
                .await?
                .into_iter()
                .map(|fact| fact.material_id)
                .collect(),
            // First pass has no cutoff; send everything once.
            None => self.state_mut()?.viewed.clone(),
        };

        let outcome = self.merge_with_server(&recent).await?;
        if matches!(outcome, SyncOutcome::Completed { .. }) {
            self.state_mut()?.last_tick_at = Some(self.clock.now());
        }
        Ok(outcome)
    }

    async fn merge_with_server(
        &self,
        local_ids: &HashSet<MaterialId>,
    ) -> Result<SyncOutcome, ProgressError> {
        match self.gateway.sync_viewed(self.user_id, local_ids).await {
            Ok(server_ids) => {
                let adopted = self.adopt_remote(&server_ids).await?;
                if adopted > 0 {
                    debug!(user = %self.user_id, adopted, "adopted ids viewed on other devices");
                }
                Ok(SyncOutcome::Completed { adopted })
            }
            Err(error) => {
                warn!(user = %self.user_id, %error, "sync deferred; local facts retained");
                Ok(SyncOutcome::Deferred)
            }
        }
    }

    /// Fold server-side ids into the local record. Local facts are never
    /// removed; the merge only grows the set.
    async fn adopt_remote(&self, server_ids: &HashSet<MaterialId>) -> Result<usize, ProgressError> {
        let unseen: Vec<MaterialId> = {
            let state = self.state_mut()?;
            server_ids.difference(&state.viewed).copied().collect()
        };
        for material_id in &unseen {
            // The device-local view time is unknown; stamp with adoption time.
            let fact = ViewedFact::new(*material_id, self.clock.now());
            self.facts.record_fact(self.user_id, &fact).await?;
        }
        let mut state = self.state_mut()?;
        state.viewed.extend(unseen.iter().copied());
        Ok(unseen.len())
    }

    //
    // ─── BACKGROUND TICKER ─────────────────────────────────────────────────────
    //

    /// Start the periodic reconciliation loop. Returns `false` if already
    /// started; a session never runs two tickers.
    pub fn start(self: &Arc<Self>, every: Duration) -> bool {
        {
            let Ok(mut state) = self.state.lock() else {
                return false;
            };
            if state.started {
                debug!(user = %self.user_id, "periodic sync already started");
                return false;
            }
            state.started = true;
        }

        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a fresh interval fires immediately; skip it
            // so the loop waits a full period before the first pass.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(engine) = weak.upgrade() else {
                    break;
                };
                if let Err(error) = engine.periodic_sync().await {
                    warn!(%error, "periodic sync pass failed");
                }
            }
        });
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(old) = slot.replace(handle) {
                old.abort();
            }
        }
        true
    }

    /// Stop the ticker and drop any pending debounced push. Idempotent.
    pub fn stop(&self) {
        self.push_debounce.cancel();
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
        if let Ok(mut state) = self.state.lock() {
            state.started = false;
        }
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.lock().map(|s| s.started).unwrap_or(false)
    }

    fn state_mut(&self) -> Result<MutexGuard<'_, SyncState>, ProgressError> {
        self.state
            .lock()
            .map_err(|e| ProgressError::Storage(StorageError::Connection(e.to_string())))
    }
}

impl Drop for ProgressEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ProgressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEngine")
            .field("user_id", &self.user_id)
            .field("viewed_count", &self.viewed_count())
            .finish_non_exhaustive()
    }
}
