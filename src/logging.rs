//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level.
//!
//! The configured level is only known once the config is loaded, so loading
//! runs under a temporary stderr subscriber (see [`with_startup_logging`]).

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(config: &LoggingConfig) -> String {
    format!("pitwall={},tower_http=debug", config.level)
}

/// Filter for events emitted before the config is loaded
const STARTUP_FILTER: &str = "pitwall=info";

fn startup_subscriber<W>(make_writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| STARTUP_FILTER.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer)
        .finish()
}

/// Run `f` with a stderr subscriber active on this thread.
///
/// Used around config loading, before [`init`] can be called.
pub fn with_startup_logging<T>(f: impl FnOnce() -> T) -> T {
    tracing::subscriber::with_default(startup_subscriber(std::io::stderr), f)
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_warnings_reach_startup_subscriber() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = startup_subscriber(move || writer.clone());

        let config = tracing::subscriber::with_default(subscriber, || {
            let mut config = Config::default();
            config.apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()));
            config
        });

        assert_eq!(config.api.port, 8080);
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Ignoring PORT"), "got: {}", output);
    }

    #[test]
    fn test_default_filter_uses_level() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        };
        assert_eq!(default_filter(&config), "pitwall=debug,tower_http=debug");
    }
}
