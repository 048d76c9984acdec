use hex_color::HexColor;
use serde::{Deserialize, Deserializer, de::Visitor};

/// Transfer directions tracked by the traffic indicator.
///
/// Explicit booleans instead of a packed bitmask; both directions are off by
/// default, which keeps the indicator dormant until the host enables it.
#[derive(Deserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Directions {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
}

impl Directions {
    pub fn any(self) -> bool {
        self.up || self.down
    }

    pub fn both(self) -> bool {
        self.up && self.down
    }
}

/// Unit system used when deriving and displaying a transfer rate.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum SpeedUnit {
    /// Bit rates, decimal magnitude thresholds.
    Bits,
    /// Byte rates, binary magnitude thresholds.
    #[default]
    Bytes,
}

impl SpeedUnit {
    /// Threshold base for magnitude tiers: 1000 for bit rates, 1024 for
    /// byte rates.
    pub fn base(self) -> u64 {
        match self {
            SpeedUnit::Bits => 1000,
            SpeedUnit::Bytes => 1024,
        }
    }

    /// Suffix appended after the tier prefix.
    pub fn symbol(self) -> &'static str {
        match self {
            SpeedUnit::Bits => "b/s",
            SpeedUnit::Bytes => "B/s",
        }
    }
}

impl<'de> Deserialize<'de> for SpeedUnit {
    fn deserialize<D>(deserializer: D) -> Result<SpeedUnit, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SpeedUnitVisitor;
        impl Visitor<'_> for SpeedUnitVisitor {
            type Value = SpeedUnit;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string naming a speed unit")
            }

            fn visit_str<E>(self, value: &str) -> Result<SpeedUnit, E>
            where
                E: serde::de::Error,
            {
                Ok(match value.to_ascii_lowercase().as_str() {
                    "bit" | "bits" => SpeedUnit::Bits,
                    "byte" | "bytes" => SpeedUnit::Bytes,
                    // unrecognised values fall back to the documented default
                    _ => SpeedUnit::default(),
                })
            }
        }
        deserializer.deserialize_str(SpeedUnitVisitor)
    }
}

/// Configuration for the traffic indicator module.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrafficModuleConfig {
    /// Sampling period in milliseconds. Never zero after decoding.
    #[serde(
        deserialize_with = "interval_deserializer",
        default = "default_interval_ms"
    )]
    pub interval_ms: u64,
    #[serde(default)]
    pub unit: SpeedUnit,
    #[serde(default)]
    pub directions: Directions,
    #[serde(default)]
    pub show_text: bool,
    #[serde(default = "default_show_icon")]
    pub show_icon: bool,
    /// Blank the display instead of re-rendering an unchanged value.
    #[serde(default)]
    pub hide_when_idle: bool,
    #[serde(default = "default_color")]
    pub color_up: HexColor,
    #[serde(default = "default_color")]
    pub color_down: HexColor,
    #[serde(default = "default_color")]
    pub color_icon: HexColor,
}

impl TrafficModuleConfig {
    /// Whether sampling should run at all: the display must be visible, the
    /// link must be up, and at least one direction must be tracked.
    pub fn should_run(&self, screen_on: bool, link_active: bool) -> bool {
        screen_on && link_active && self.directions.any()
    }
}

impl Default for TrafficModuleConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            unit: SpeedUnit::default(),
            directions: Directions::default(),
            show_text: false,
            show_icon: default_show_icon(),
            hide_when_idle: false,
            color_up: default_color(),
            color_down: default_color(),
            color_icon: default_color(),
        }
    }
}

fn interval_deserializer<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = i64::deserialize(deserializer)?;

    if v <= 0 {
        // a zero or negative period would stall (or spin) the sampler
        return Ok(default_interval_ms());
    }

    Ok(v as u64)
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_show_icon() -> bool {
    true
}

fn default_color() -> HexColor {
    HexColor::WHITE
}
