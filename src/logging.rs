/*!
 * Tracing subscriber setup
 *
 * Events from this crate and from the simulated engine share one filter. `RUST_LOG`
 * replaces it entirely when set.
 */

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::TesseraConfig;
use crate::error::{Result, TesseraError};

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Targets covered by the configured level
const LOG_TARGETS: &[&str] = &["tessera", "tessera_sim"];

/// Install the global subscriber for `config`.
///
/// Fails with a config error if a subscriber is already installed.
pub fn init_logging(config: &TesseraConfig) -> Result<()> {
    let output = match config.log_file {
        Some(ref path) => json_file_output(path)?,
        None => console_output(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(log_filter(effective_level(config))?)
        .try_init()
        .map_err(|e| TesseraError::Config(format!("Failed to install subscriber: {}", e)))
}

fn effective_level(config: &TesseraConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

fn filter_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

fn log_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(level)))
        .map_err(|e| TesseraError::Config(format!("Invalid log filter: {}", e)))
}

fn console_output() -> OutputLayer {
    fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .boxed()
}

/// One JSON object per event, with source locations
fn json_file_output(path: &Path) -> Result<OutputLayer> {
    let file = File::create(path).map_err(|e| {
        TesseraError::Config(format!("Cannot open log file {}: {}", path.display(), e))
    })?;

    Ok(fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .boxed())
}

#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directives(Level::DEBUG)));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer().compact().boxed())
            .with(filter)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_verbose_overrides_log_level() {
        let config = TesseraConfig {
            log_level: LogLevel::Error,
            verbose: true,
            ..Default::default()
        };
        assert_eq!(effective_level(&config), Level::DEBUG);
    }

    #[test]
    fn test_configured_level_is_used() {
        let config = TesseraConfig {
            log_level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(effective_level(&config), Level::WARN);
    }

    #[test]
    fn test_filter_covers_engine_events() {
        assert_eq!(filter_directives(Level::INFO), "tessera=info,tessera_sim=info");
        assert!(EnvFilter::try_new(filter_directives(Level::TRACE)).is_ok());
    }

    #[test]
    fn test_unwritable_log_file_is_config_error() {
        let config = TesseraConfig {
            log_file: Some("/nonexistent/dir/tessera.log".into()),
            ..Default::default()
        };
        match init_logging(&config) {
            Err(TesseraError::Config(message)) => assert!(message.contains("tessera.log")),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
