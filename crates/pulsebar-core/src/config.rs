//! Raw-settings decoding for the host shell.
//!
//! Settings arrive as an opaque TOML document through the host's
//! configuration-change event; there is no file watching or persistence in
//! the core.

pub use pulsebar_proto::config::*;

use log::{info, warn};

/// Decode a raw settings document into a validated [`Config`].
///
/// Malformed documents never surface an error to the caller: the documented
/// defaults are substituted and the failure is logged.
pub fn apply(raw: &str) -> Config {
    match toml::from_str(raw) {
        Ok(config) => {
            info!("settings decoded successfully");
            config
        }
        Err(err) => {
            warn!("failed to parse settings, using defaults: {err}");
            Config::default()
        }
    }
}
