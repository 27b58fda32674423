//! Logging setup shared by the bucketfs crates
//!
//! Controlled by the BUCKETFS_LOG environment variable:
//! - off (default): nothing is emitted
//! - error / warn: problems only, such as skipped listing entries
//! - info: connection setup and command-level progress
//! - debug: every filesystem operation

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable read by `init_diagnostics`.
pub const LOG_ENV: &str = "BUCKETFS_LOG";

static INIT: Once = Once::new();

fn min_level(value: &str) -> Option<emit::Level> {
    match value.to_ascii_lowercase().as_str() {
        "off" | "" => None,
        "error" => Some(emit::Level::Error),
        "warn" => Some(emit::Level::Warn),
        "info" => Some(emit::Level::Info),
        "debug" => Some(emit::Level::Debug),
        _ => Some(emit::Level::Info),
    }
}

/// Installs a stderr emitter at the level named by BUCKETFS_LOG.
///
/// Only the first call has any effect.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
        let Some(level) = min_level(&value) else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if min_level(&value) == Some(emit::Level::Info) && !value.eq_ignore_ascii_case("info") {
            emit::warn!("Unknown {var} value {value}, using info", var: LOG_ENV, value: value);
        }

        // The emitter lives for the rest of the process.
        std::mem::forget(rt);
    });
}

/// Log connection setup and other notable steps.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log individual operations and internal detail.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems: skipped entries, missing markers, failed aborts.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that end an operation.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
