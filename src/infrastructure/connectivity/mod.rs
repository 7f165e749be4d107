pub mod http_probe;
pub mod manual;

pub use http_probe::HttpConnectivityProbe;
pub use manual::ManualConnectivity;
