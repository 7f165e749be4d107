pub mod connectivity;
pub mod local_store;
pub mod remote_api;
pub mod response_cache;

pub use connectivity::{ConnectivityProbe, PlatformConnectivity, PlatformEvent};
pub use local_store::{LocalStore, StoredExercise, StoredScenario, StoredScenarioSummary};
pub use remote_api::RemoteDataApi;
pub use response_cache::ResponseCacheInspector;
