//! Tracing subscriber setup for binaries and examples.
//!
//! Libraries in this workspace only emit `tracing` events; a caller installs
//! the subscriber once. `CRAFTGRAPH_LOG` takes an `EnvFilter` directive and
//! `CRAFTGRAPH_LOG_FORMAT=json` switches to machine-parseable output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "CRAFTGRAPH_LOG";
pub const LOG_FORMAT_ENV: &str = "CRAFTGRAPH_LOG_FORMAT";

/// Target prefix match: covers `craftgraph_core` and `craftgraph_data`.
const DEFAULT_FILTER: &str = "craftgraph=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing() -> bool {
    let format = LogFormat::from_env_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref());
    let registry = tracing_subscriber::registry().with(env_filter());
    let result = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.is_ok()
}
