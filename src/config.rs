//! Runtime configuration from command-line flags or `FIBSERVE_*` environment
//! variables.
//!
//! A flag wins over its variable, and the variable wins over the default.

use std::num::NonZeroUsize;
use std::time::Duration;

use clap::Parser;

use crate::cache::DEFAULT_CAPACITY;
use crate::fib::service::DEFAULT_BUDGET;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

/// Server settings.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use clap::Parser;
/// use fibserve::config::Config;
///
/// let config = Config::try_parse_from(["fibserve", "--timeout-secs", "2.5"]).unwrap();
/// assert_eq!(config.timeout, Duration::from_millis(2500));
/// assert_eq!(config.cache_capacity.get(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "fibserve", version, about, long_about = None)]
pub struct Config {
    /// Address the listener binds to.
    #[arg(long, env = "FIBSERVE_ADDR")]
    #[arg(default_value_t = String::from(DEFAULT_ADDR))]
    #[arg(value_parser = parse_addr)]
    pub addr: String,

    /// Maximum number of memoized results.
    #[arg(long, env = "FIBSERVE_CACHE_CAPACITY")]
    #[arg(default_value_t = DEFAULT_CAPACITY)]
    pub cache_capacity: NonZeroUsize,

    /// Wall-clock budget for one computation, in seconds.
    #[arg(long = "timeout-secs", env = "FIBSERVE_TIMEOUT_SECS")]
    #[arg(default_value = "60")]
    #[arg(value_parser = parse_timeout_secs)]
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_owned(),
            cache_capacity: DEFAULT_CAPACITY,
            timeout: DEFAULT_BUDGET,
        }
    }
}

impl Config {
    /// Whether the 504 message, which always says 60 seconds, describes the
    /// configured budget.
    pub fn timeout_matches_message(&self) -> bool {
        self.timeout == DEFAULT_BUDGET
    }
}

fn parse_addr(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("must not be empty".to_owned());
    }
    Ok(raw.to_owned())
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| format!("expected positive seconds, got {raw:?}"))
}
