//! Subscriber installation for the whole process.
//!
//! `RUST_LOG` overrides the configured directive. JSON output is the default
//! for release builds and pretty output for debug builds.

use once_cell::sync::OnceCell;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::{Result, TelemetryError};

/// Directive used when neither `RUST_LOG` nor configuration provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber and record the build revision.
///
/// # Errors
///
/// Returns [`TelemetryError::Subscriber`] when a global subscriber is
/// already in place.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let _ = BUILD_SHA.set(config.build_sha.to_owned());

    let output: BoxedLayer = match config.format {
        LogFormat::Json => fmt::layer().json().with_target(false).boxed(),
        LogFormat::Pretty => fmt::layer().with_target(false).boxed(),
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|source| TelemetryError::Subscriber { source })
}

/// Revision recorded by [`init_logging`], or `dev` before initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Inputs for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive such as `info` or `reelfetch_transfer=debug`.
    pub level: &'a str,
    /// Output encoding.
    pub format: LogFormat,
    /// Revision attached to the `app` span.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty for debug builds, JSON otherwise.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Map the `logging.format` setting; anything unrecognised infers.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label.map(|value| value.trim().to_ascii_lowercase()) else {
            return Self::infer();
        };
        match label.as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::infer(),
        }
    }
}
