//! Tracing setup for the `pieck` binary.
//!
//! ```bash
//! PIECK_LOG=trace pieck tokens main.pieck
//! PIECK_LOG="pieck::shape=debug" PIECK_LOG_FORMAT=json pieck shape m.pieck
//! ```
//!
//! Nothing is installed unless `PIECK_LOG` or `RUST_LOG` is set. Output
//! always goes to stderr.

use tracing_subscriber::{EnvFilter, fmt};

/// Tracing output format, from `PIECK_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("PIECK_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// `PIECK_LOG` wins over `RUST_LOG`.
fn build_filter() -> EnvFilter {
    std::env::var("PIECK_LOG").map_or_else(
        |_| EnvFilter::from_default_env(),
        |val| EnvFilter::builder().parse_lossy(val),
    )
}

pub fn init_tracing() {
    if std::env::var_os("PIECK_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let subscriber = fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr);
    match LogFormat::from_env() {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}
