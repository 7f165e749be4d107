use crate::application::ports::LocalStore;
use crate::domain::entities::SessionSnapshot;
use crate::shared::error::AppError;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Default)]
struct Pending {
    snapshot: Option<SessionSnapshot>,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

/// Debounced persistence of the learner's session snapshot.
///
/// Each `schedule_save` replaces the pending snapshot and restarts the quiet
/// period; only the last snapshot is written when it expires.
pub struct SessionStateStore {
    store: Arc<dyn LocalStore>,
    debounce: Duration,
    pending: Mutex<Pending>,
}

impl SessionStateStore {
    pub fn new(store: Arc<dyn LocalStore>, debounce: Duration) -> Arc<Self> {
        Arc::new(Self {
            store,
            debounce,
            pending: Mutex::new(Pending::default()),
        })
    }

    pub fn schedule_save(self: &Arc<Self>, snapshot: SessionSnapshot) {
        let mut pending = self.lock_pending();
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.generation = pending.generation.wrapping_add(1);
        pending.snapshot = Some(snapshot);

        let generation = pending.generation;
        let weak: Weak<Self> = Arc::downgrade(self);
        let debounce = self.debounce;
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let Some(sessions) = weak.upgrade() else {
                return;
            };
            let snapshot = {
                let mut pending = sessions.lock_pending();
                if pending.generation != generation {
                    return;
                }
                pending.timer = None;
                pending.snapshot.take()
            };
            if let Some(snapshot) = snapshot
                && let Err(err) = sessions.write(&snapshot).await
            {
                warn!(
                    target: "offline::session",
                    error = %err,
                    "debounced session save failed"
                );
            }
        }));
    }

    pub fn has_pending(&self) -> bool {
        self.lock_pending().snapshot.is_some()
    }

    /// Writes the pending snapshot now and cancels its timer.
    pub async fn flush(&self) -> Result<(), AppError> {
        let snapshot = {
            let mut pending = self.lock_pending();
            if let Some(timer) = pending.timer.take() {
                timer.abort();
            }
            pending.snapshot.take()
        };
        match snapshot {
            Some(snapshot) => self.write(&snapshot).await,
            None => Ok(()),
        }
    }

    pub async fn load(&self) -> Option<SessionSnapshot> {
        let document = match self.store.get_session().await {
            Ok(document) => document?,
            Err(err) => {
                warn!(
                    target: "offline::session",
                    error = %err,
                    "failed to read session snapshot"
                );
                return None;
            }
        };

        match serde_json::from_str(&document) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(
                    target: "offline::session",
                    error = %err,
                    "discarding corrupt session snapshot"
                );
                if let Err(err) = self.store.delete_session().await {
                    warn!(target: "offline::session", error = %err, "failed to delete session snapshot");
                }
                None
            }
        }
    }

    /// Drops any pending save and deletes the stored snapshot.
    pub async fn clear(&self) -> Result<(), AppError> {
        {
            let mut pending = self.lock_pending();
            if let Some(timer) = pending.timer.take() {
                timer.abort();
            }
            pending.snapshot = None;
        }
        self.store.delete_session().await
    }

    async fn write(&self, snapshot: &SessionSnapshot) -> Result<(), AppError> {
        let document = serde_json::to_string(snapshot)?;
        self.store.put_session(&document, snapshot.updated_at).await?;
        debug!(
            target: "offline::session",
            sentence_index = snapshot.sentence_index,
            "session snapshot saved"
        );
        Ok(())
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
