pub mod config;
pub mod heartbeat;
pub mod logger;
