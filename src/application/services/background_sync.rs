use crate::application::ports::{LocalStore, RemoteDataApi};
use crate::application::services::ConnectivityMonitor;
use crate::domain::entities::SyncOperation;
use crate::domain::value_objects::{OperationPayload, SyncOperationId, SyncOperationType};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub pending_count: u64,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// Durable outbox for remote mutations.
///
/// Operations are persisted before anything else happens and delivered in
/// enqueue order by [`BackgroundSync::drain`]. Only one drain runs at a time; a
/// drain requested while another is active returns immediately.
pub struct BackgroundSync {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteDataApi>,
    monitor: Arc<ConnectivityMonitor>,
    max_retries: u32,
    backoff_base: Duration,
    reconnect_delay: Duration,
    draining: AtomicBool,
    status: watch::Sender<SyncStatus>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundSync {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteDataApi>,
        monitor: Arc<ConnectivityMonitor>,
        config: &SyncConfig,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(SyncStatus::default());
        Arc::new(Self {
            store,
            remote,
            monitor,
            max_retries: config.max_retries,
            backoff_base: config.backoff_base(),
            reconnect_delay: config.reconnect_delay(),
            draining: AtomicBool::new(false),
            status,
            listener: Mutex::new(None),
        })
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Persists a new operation and, when online, kicks off a drain without
    /// waiting for it.
    pub async fn enqueue(
        self: &Arc<Self>,
        operation_type: SyncOperationType,
        payload: Value,
    ) -> Result<SyncOperationId, AppError> {
        let payload = OperationPayload::new(payload).map_err(AppError::ValidationError)?;
        let operation = SyncOperation::new(operation_type, payload, Utc::now());
        self.store.push_operation(&operation).await?;

        debug!(
            target: "offline::sync",
            operation_id = %operation.id,
            operation_type = %operation.operation_type,
            "operation queued"
        );
        self.refresh_pending_count().await;

        if self.monitor.is_online() {
            self.spawn_drain();
        }
        Ok(operation.id)
    }

    fn spawn_drain(self: &Arc<Self>) {
        let sync = Arc::clone(self);
        tokio::spawn(async move {
            // Failures are already recorded in the status.
            let _ = sync.drain().await;
        });
    }

    /// One sync pass over the whole queue.
    pub async fn drain(&self) -> Result<DrainReport, AppError> {
        if !self.monitor.is_online() {
            debug!(target: "offline::sync", "offline; drain skipped");
            return Ok(DrainReport::default());
        }
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(target: "offline::sync", "drain already running");
            return Ok(DrainReport::default());
        }
        let _guard = DrainGuard {
            draining: &self.draining,
            status: &self.status,
        };

        self.status.send_modify(|status| status.is_syncing = true);

        let mut report = DrainReport::default();
        let result = self.process_queue(&mut report).await;
        let pending = self.store.count_operations().await;

        self.status.send_modify(|status| {
            status.is_syncing = false;
            if let Ok(count) = &pending {
                status.pending_count = *count;
            }
            match &result {
                Ok(()) => {
                    status.last_sync_at = Some(Utc::now());
                    status.last_error = None;
                }
                Err(err) => status.last_error = Some(err.to_string()),
            }
        });

        match result {
            Ok(()) => {
                if report.attempted > 0 || report.dropped > 0 {
                    info!(
                        target: "offline::sync",
                        attempted = report.attempted,
                        succeeded = report.succeeded,
                        failed = report.failed,
                        skipped = report.skipped,
                        dropped = report.dropped,
                        "sync pass finished"
                    );
                }
                Ok(report)
            }
            Err(err) => {
                error!(target: "offline::sync", error = %err, "sync pass aborted");
                Err(err)
            }
        }
    }

    async fn process_queue(&self, report: &mut DrainReport) -> Result<(), AppError> {
        let operations = self.store.list_operations().await?;

        for mut operation in operations {
            if operation.has_exhausted(self.max_retries) {
                warn!(
                    target: "offline::sync",
                    operation_id = %operation.id,
                    operation_type = %operation.operation_type,
                    retry_count = operation.retry_count,
                    "retry budget exhausted; dropping operation"
                );
                self.store.delete_operation(&operation.id).await?;
                report.dropped += 1;
                continue;
            }

            if operation.is_backing_off(Utc::now(), self.backoff_base) {
                report.skipped += 1;
                continue;
            }

            report.attempted += 1;
            if self.submit(&operation).await {
                self.store.delete_operation(&operation.id).await?;
                report.succeeded += 1;
            } else {
                operation.record_failure(Utc::now());
                self.store.update_operation(&operation).await?;
                report.failed += 1;
            }
        }
        Ok(())
    }

    async fn submit(&self, operation: &SyncOperation) -> bool {
        let payload = operation.payload.as_json();
        let result = match &operation.operation_type {
            SyncOperationType::SaveHistory => self.remote.create_history(payload).await.map(drop),
            SyncOperationType::UpdateProgress => self.remote.update_progress(payload).await,
            SyncOperationType::SaveScenario => self.remote.save_scenario(payload).await.map(drop),
            SyncOperationType::Unknown(kind) => {
                debug!(
                    target: "offline::sync",
                    operation_id = %operation.id,
                    operation_type = %kind,
                    "unknown operation type; treating as delivered"
                );
                Ok(())
            }
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target: "offline::sync",
                    operation_id = %operation.id,
                    operation_type = %operation.operation_type,
                    retry_count = operation.retry_count,
                    error = %err,
                    "operation delivery failed"
                );
                false
            }
        }
    }

    async fn refresh_pending_count(&self) {
        match self.store.count_operations().await {
            Ok(count) => self
                .status
                .send_modify(|status| status.pending_count = count),
            Err(err) => warn!(
                target: "offline::sync",
                error = %err,
                "failed to count pending operations"
            ),
        }
    }

    /// Drains after every offline to online transition, once the reconnect
    /// delay has passed.
    ///
    /// Transitions seen while the listener sleeps or drains are coalesced: an
    /// offline/online flap inside the reconnect delay yields a single drain.
    pub fn start(self: &Arc<Self>) {
        let mut listener = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if listener.is_some() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let mut online_rx = self.monitor.subscribe();
        let reconnect_delay = self.reconnect_delay;

        *listener = Some(tokio::spawn(async move {
            let mut was_online = *online_rx.borrow_and_update();
            if let Some(sync) = weak.upgrade() {
                sync.refresh_pending_count().await;
            }

            while online_rx.changed().await.is_ok() {
                let online = *online_rx.borrow_and_update();
                if online && !was_online {
                    debug!(
                        target: "offline::sync",
                        delay_ms = reconnect_delay.as_millis() as u64,
                        "back online; scheduling drain"
                    );
                    tokio::time::sleep(reconnect_delay).await;
                    let Some(sync) = weak.upgrade() else { break };
                    let _ = sync.drain().await;
                }
                was_online = online;
            }
        }));
    }

    pub fn shutdown(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            debug!(target: "offline::sync", "background sync stopped");
        }
    }
}

/// Releases the drain slot even when the drain future is dropped or unwinds
/// before finishing.
struct DrainGuard<'a> {
    draining: &'a AtomicBool,
    status: &'a watch::Sender<SyncStatus>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.status.send_if_modified(|status| {
            let was_syncing = status.is_syncing;
            status.is_syncing = false;
            was_syncing
        });
        self.draining.store(false, Ordering::Release);
    }
}

impl Drop for BackgroundSync {
    fn drop(&mut self) {
        self.shutdown();
    }
}
