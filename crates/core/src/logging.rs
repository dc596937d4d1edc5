//! Logging and observability
//!
//! Structured logging through `tracing`, with text or JSON output selected at
//! runtime. All log output goes to stderr so stdout stays free for command
//! output (dry-run listings, task lists).
//!
//! ## Environment Variables
//!
//! * `BINCI_LOG_FORMAT` - `json` for JSON output, anything else for text
//! * `BINCI_LOG` - filter directive, takes precedence over `RUST_LOG`
//! * `RUST_LOG` - standard filter directive, used as fallback

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Supported log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to text
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Initialize the logging system
///
/// The format argument wins over `BINCI_LOG_FORMAT`; text is the default.
/// Safe to call more than once: later calls are no-ops.
pub fn init(format: Option<LogFormat>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter();
        let effective_format = effective_format(format);

        match effective_format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            LogFormat::Text => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .with_target(false)
                            .without_time()
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("Logging initialized with format: {:?}", effective_format);
    });

    Ok(())
}

fn effective_format(format: Option<LogFormat>) -> LogFormat {
    format
        .or_else(|| {
            std::env::var("BINCI_LOG_FORMAT")
                .ok()
                .map(|name| LogFormat::from_name(&name))
        })
        .unwrap_or(LogFormat::Text)
}

/// Create an EnvFilter from `BINCI_LOG`, then `RUST_LOG`, then `info`
fn create_env_filter() -> EnvFilter {
    if let Ok(binci_log) = std::env::var("BINCI_LOG") {
        EnvFilter::try_new(&binci_log).unwrap_or_else(|_| {
            eprintln!(
                "Invalid BINCI_LOG specification '{}', using default 'info'",
                binci_log
            );
            EnvFilter::new("info")
        })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Check if logging has been initialized
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_init_multiple_calls_safe() {
        let _guard = TEST_MUTEX.lock().unwrap();

        assert!(init(None).is_ok());
        assert!(init(Some(LogFormat::Json)).is_ok());
        assert!(init(Some(LogFormat::Text)).is_ok());
        assert!(is_initialized());
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("text"), LogFormat::Text);
        assert_eq!(LogFormat::from_name("anything"), LogFormat::Text);
    }

    #[test]
    fn test_explicit_format_wins() {
        assert_eq!(effective_format(Some(LogFormat::Json)), LogFormat::Json);
        assert_eq!(effective_format(Some(LogFormat::Text)), LogFormat::Text);
    }
}
