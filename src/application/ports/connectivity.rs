use async_trait::async_trait;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Online,
    Offline,
}

/// Connectivity as reported by the host platform. Known to give false positives.
pub trait PlatformConnectivity: Send + Sync {
    fn reports_online(&self) -> bool;
    fn subscribe(&self) -> broadcast::Receiver<PlatformEvent>;
}

/// Active reachability check against a known resource.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// True only for a successful (2xx) response.
    async fn probe(&self) -> bool;
}
