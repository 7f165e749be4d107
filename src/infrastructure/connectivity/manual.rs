use crate::application::ports::{PlatformConnectivity, PlatformEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Platform signal source driven by the host (OS network callbacks, UI toggles, tests).
pub struct ManualConnectivity {
    online: AtomicBool,
    events: broadcast::Sender<PlatformEvent>,
}

impl ManualConnectivity {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            online: AtomicBool::new(initially_online),
            events,
        }
    }

    /// Records the platform state and emits an event when it changed.
    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return;
        }
        let event = if online {
            PlatformEvent::Online
        } else {
            PlatformEvent::Offline
        };
        // No subscribers yet is fine; the flag is still updated.
        let _ = self.events.send(event);
    }
}

impl PlatformConnectivity for ManualConnectivity {
    fn reports_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_only_on_change() {
        let platform = ManualConnectivity::new(true);
        let mut rx = platform.subscribe();

        platform.set_online(true);
        platform.set_online(false);
        platform.set_online(false);
        platform.set_online(true);

        assert_eq!(rx.recv().await.unwrap(), PlatformEvent::Offline);
        assert_eq!(rx.recv().await.unwrap(), PlatformEvent::Online);
        assert!(rx.try_recv().is_err());
        assert!(platform.reports_online());
    }
}
