//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` always wins. Without it the level follows the CLI verbosity:
//! `-q` shows errors only, the default shows warnings, `-v` adds info and
//! `-vv` adds debug.

use crate::error::{LipreadError, Result};
use tracing::Subscriber;
use tracing::subscriber::set_global_default;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Default filter directive for a verbosity setting.
pub fn level_directive(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build a subscriber writing human-readable lines to `sink`.
pub fn get_subscriber<Sink>(env_filter: &str, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(sink)
                .with_target(false)
                .compact(),
        )
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<()> {
    set_global_default(subscriber)
        .map_err(|e| LipreadError::Other(format!("Install log subscriber: {e}")))
}

/// Install the stderr subscriber for the given CLI verbosity.
pub fn init(quiet: bool, verbose: u8) -> Result<()> {
    init_subscriber(get_subscriber(level_directive(quiet, verbose), std::io::stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_directive(false, 0), "warn");
        assert_eq!(level_directive(false, 1), "info");
        assert_eq!(level_directive(false, 2), "debug");
        assert_eq!(level_directive(false, 7), "trace");
    }

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(level_directive(true, 2), "error");
    }

    #[test]
    fn subscriber_captures_events() {
        let subscriber = get_subscriber("info", std::io::sink);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("inside scoped subscriber");
        });
    }
}
