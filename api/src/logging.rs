//! Tracing subscriber setup for the API binary

use std::env;
use std::io;

use og_shared::{LogFormat, LoggingConfig};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

/// Build the filter: `RUST_LOG` when set, the configured level otherwise,
/// with HTTP client and driver noise always turned down
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    env::var("RUST_LOG")
        .map_or_else(
            |_| EnvFilter::new(&config.level),
            |directive| EnvFilter::new(&directive),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        )
        .add_directive(
            "reqwest=warn"
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        )
        .add_directive(
            "sqlx=info"
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        )
        .add_directive(
            "actix_server=info"
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        )
}

/// Output layer for the configured format, writing to `writer`
pub fn fmt_layer<S, W>(config: &LoggingConfig, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_file(false)
            .with_line_number(false)
            .with_target(false)
            .with_writer(writer)
            .boxed(),
    }
}

/// Initialize the global tracing subscriber
///
/// `log` records (actix-web's access logger among them) are forwarded into
/// the same subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer(config, io::stdout))
        .try_init()
}
