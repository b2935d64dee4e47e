pub mod beacon_client;
pub mod chain;
pub mod db;
pub mod env;
pub mod error;
pub mod fetchers;
pub mod health;
pub mod json_codecs;
pub mod logging;
pub mod maintenance;
pub mod process;
pub mod rate_limiter;
pub mod reliable_client;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod summarize;
pub mod units;
