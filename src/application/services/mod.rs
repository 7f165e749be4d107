pub mod background_sync;
pub mod cache_management;
pub mod connectivity_monitor;
pub mod exercise_access;
pub mod offline_storage;
pub mod session_state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use background_sync::{BackgroundSync, DrainReport, SyncStatus};
pub use cache_management::CacheManagement;
pub use connectivity_monitor::ConnectivityMonitor;
pub use exercise_access::ExerciseAccess;
pub use offline_storage::OfflineStorage;
pub use session_state::SessionStateStore;
