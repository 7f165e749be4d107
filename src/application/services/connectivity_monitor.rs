use crate::application::ports::{ConnectivityProbe, PlatformConnectivity, PlatformEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Process-wide "online" signal that downstream services treat as ground truth.
///
/// A platform "offline" event is trusted immediately. A platform "online" event
/// only triggers a probe, since the platform can report a link with no route to
/// the server. A fixed-interval probe catches silent link loss.
pub struct ConnectivityMonitor {
    platform: Arc<dyn PlatformConnectivity>,
    probe: Arc<dyn ConnectivityProbe>,
    state: watch::Sender<bool>,
    probe_interval: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    pub fn new(
        platform: Arc<dyn PlatformConnectivity>,
        probe: Arc<dyn ConnectivityProbe>,
        probe_interval: Duration,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(platform.reports_online());
        Arc::new(Self {
            platform,
            probe,
            state,
            probe_interval,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Forces an active probe and publishes the result.
    pub async fn check_connectivity(&self) -> bool {
        let online = if self.platform.reports_online() {
            self.probe.probe().await
        } else {
            false
        };
        self.set_online(online);
        online
    }

    fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            info!(
                target: "offline::connectivity",
                online,
                "connectivity state changed"
            );
        }
    }

    /// Subscribes to platform events and starts the periodic probe. Calling it
    /// again while running is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !tasks.is_empty() {
            return;
        }

        let mut events = self.platform.subscribe();
        let monitor = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PlatformEvent::Online) => {
                        debug!(target: "offline::connectivity", "platform reported online; probing");
                        monitor.check_connectivity().await;
                    }
                    Ok(PlatformEvent::Offline) => monitor.set_online(false),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            target: "offline::connectivity",
                            skipped,
                            "missed platform connectivity events; re-probing"
                        );
                        monitor.check_connectivity().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));

        let monitor = Arc::clone(self);
        let period = self.probe_interval;
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                monitor.check_connectivity().await;
            }
        }));
    }

    /// Releases the event subscription and cancels the timer. Idempotent.
    pub fn shutdown(&self) {
        let handles = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *tasks)
        };
        if handles.is_empty() {
            return;
        }
        for handle in handles {
            handle.abort();
        }
        debug!(target: "offline::connectivity", "connectivity monitor stopped");
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
