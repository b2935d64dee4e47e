//! Tracing subscriber setup, shared by every binary. JSON to a file in
//! production (where a log shipper expects structured lines), plain
//! text to the console in development.
use crate::env::{LogOutput, ENV_CONFIG};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_new(&ENV_CONFIG.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match ENV_CONFIG.log_output {
        LogOutput::Console => {
            fmt().with_env_filter(filter).init();
        }
        LogOutput::File => {
            fmt().with_env_filter(filter).json().init();
        }
    }
}
