//! Logger initialization
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! whole process.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the global logger once. Later calls are ignored.
pub fn init_logging(default_level: &str) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match std::env::var("RUST_LOG") {
            Ok(filter) => {
                builder.parse_filters(&filter);
            }
            Err(_) => {
                builder.parse_filters(&filter_for(default_level));
            }
        }

        builder.init();
        log::debug!("logging initialized");
    });
}

/// Filter string for a configured level.
///
/// wgpu is chatty at info and below, so it is capped at warn unless the
/// level is already stricter.
fn filter_for(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    let level = match level.as_str() {
        "off" | "error" | "warn" | "info" | "debug" | "trace" => level,
        _ => "info".to_string(),
    };

    match level.as_str() {
        "off" | "error" | "warn" => level,
        _ => format!("{},wgpu_core=warn,wgpu_hal=warn,naga=warn", level),
    }
}
