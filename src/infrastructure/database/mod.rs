pub mod connection_pool;
pub mod queries;

pub use connection_pool::ConnectionPool;
