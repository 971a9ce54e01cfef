// Unit Converter - Core Library
// Exposes the conversion engine, history and comment board to the CLI, TUI and web server

pub mod error;
pub mod units;
pub mod conversion;
pub mod history;
pub mod comments;
pub mod config;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use error::{CommentError, CommentResult, ConversionError, ConversionResult};
pub use units::{Category, TemperatureScale, UnitDefinition, UnitKind, UnitTable};
pub use conversion::{
    convert, format_conversion,
    ConversionEngine, ConversionRecord, ConversionRequest,
};
pub use history::{HistoryLog, HISTORY_CAPACITY};
pub use comments::{CommentStore, DEFAULT_COMMENTS_FILE};
pub use config::{Config, ConfigOverrides};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the stderr log subscriber used by the binaries (`RUST_LOG`, default `info`)
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
