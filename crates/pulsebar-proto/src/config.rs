mod clock;
mod traffic;

pub use clock::{ClockModuleConfig, TextStyle};
pub use traffic::{Directions, SpeedUnit, TrafficModuleConfig};

use serde::Deserialize;

/// Top-level settings document handed to the core by the host shell.
///
/// Every field carries a documented default so a partial (or empty) settings
/// document always decodes into a usable configuration.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub traffic: TrafficModuleConfig,
    #[serde(default)]
    pub clock: ClockModuleConfig,
}

fn default_log_level() -> String {
    "warn".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            traffic: TrafficModuleConfig::default(),
            clock: ClockModuleConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_decodes_to_defaults() {
        let config: Config = toml::from_str("").expect("empty settings");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_document_keeps_defaults_for_missing_sections() {
        let config: Config = toml::from_str("[traffic]\ndirections = { down = true }\n")
            .expect("partial settings");

        assert!(config.traffic.directions.down);
        assert!(!config.traffic.directions.up);
        assert_eq!(config.clock, ClockModuleConfig::default());
        assert_eq!(config.log_level, "warn");
    }
}
