//! Environment-variable configuration, loaded once and validated
//! eagerly so a bad deployment fails at startup rather than on the
//! first scheduled tick.
use lazy_static::lazy_static;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Ethereum,
    Gnosis,
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethereum" => Ok(Chain::Ethereum),
            "gnosis" => Ok(Chain::Gnosis),
            other => Err(format!("CHAIN must be 'ethereum' or 'gnosis', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    File,
    Console,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(LogOutput::File),
            "console" => Ok(LogOutput::Console),
            other => Err(format!(
                "LOG_OUTPUT must be 'file' or 'console', got '{other}'"
            )),
        }
    }
}

pub struct EnvConfig {
    pub chain: Chain,
    pub db_url: String,
    pub test_db_url: String,

    pub consensus_archive_api_url: String,
    pub consensus_full_api_url: String,
    pub consensus_api_request_per_second: u32,
    pub consensus_lookback_slot: i32,

    pub log_output: LogOutput,
    pub log_level: String,

    /// Tick interval for the per-slot/per-epoch fetcher jobs (spec.md
    /// §4.6). Defaults to one slot on the configured chain's cadence
    /// is not known at this point in startup, so this falls back to
    /// mainnet's 12s rather than reading `CHAIN_PROFILE` (which itself
    /// depends on `ENV_CONFIG` being fully constructed first).
    pub job_tick_interval_seconds: u64,
}

fn env_var(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} is required in the environment"))
}

fn env_var_opt(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_var_opt_parsed<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: std::fmt::Debug,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|err| panic!("failed to parse {key}: {err:?}")),
        Err(_) => default,
    }
}

fn env_var_parsed<T: FromStr>(key: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    env_var(key)
        .parse()
        .unwrap_or_else(|err| panic!("failed to parse {key}: {err:?}"))
}

impl EnvConfig {
    fn from_env() -> Self {
        Self {
            chain: env_var_parsed("CHAIN"),
            db_url: env_var("DATABASE_URL"),
            test_db_url: env_var_opt("TEST_DATABASE_URL", "postgres://localhost/testdb"),

            consensus_archive_api_url: env_var("CONSENSUS_ARCHIVE_API_URL"),
            consensus_full_api_url: env_var("CONSENSUS_FULL_API_URL"),
            consensus_api_request_per_second: env_var_parsed(
                "CONSENSUS_API_REQUEST_PER_SECOND",
            ),
            consensus_lookback_slot: env_var_parsed("CONSENSUS_LOOKBACK_SLOT"),

            log_output: env_var_parsed("LOG_OUTPUT"),
            log_level: env_var_opt("LOG_LEVEL", "info"),

            job_tick_interval_seconds: env_var_opt_parsed("JOB_TICK_INTERVAL_SECONDS", 12),
        }
    }
}

lazy_static! {
    pub static ref ENV_CONFIG: EnvConfig = EnvConfig::from_env();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_from_str_test() {
        assert_eq!("ethereum".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!("gnosis".parse::<Chain>().unwrap(), Chain::Gnosis);
        assert!("polygon".parse::<Chain>().is_err());
    }

    #[test]
    fn log_output_from_str_test() {
        assert_eq!("file".parse::<LogOutput>().unwrap(), LogOutput::File);
        assert_eq!("console".parse::<LogOutput>().unwrap(), LogOutput::Console);
        assert!("syslog".parse::<LogOutput>().is_err());
    }
}
