use hex_color::HexColor;
use serde::{Deserialize, Deserializer, de::Visitor};

/// Rendering style for the optional clock segments (day-of-week, AM/PM).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum TextStyle {
    /// Render at full size.
    Normal,
    /// Render at reduced emphasis.
    Small,
    /// Omit the segment entirely.
    #[default]
    Gone,
}

impl<'de> Deserialize<'de> for TextStyle {
    fn deserialize<D>(deserializer: D) -> Result<TextStyle, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TextStyleVisitor;
        impl Visitor<'_> for TextStyleVisitor {
            type Value = TextStyle;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or integer naming a text style")
            }

            fn visit_str<E>(self, value: &str) -> Result<TextStyle, E>
            where
                E: serde::de::Error,
            {
                Ok(match value.to_ascii_lowercase().as_str() {
                    "normal" | "0" => TextStyle::Normal,
                    "small" | "1" => TextStyle::Small,
                    "gone" | "2" => TextStyle::Gone,
                    // unrecognised values fall back to the documented default
                    _ => TextStyle::default(),
                })
            }

            fn visit_i64<E>(self, value: i64) -> Result<TextStyle, E>
            where
                E: serde::de::Error,
            {
                Ok(match value {
                    0 => TextStyle::Normal,
                    1 => TextStyle::Small,
                    _ => TextStyle::Gone,
                })
            }

            fn visit_u64<E>(self, value: u64) -> Result<TextStyle, E>
            where
                E: serde::de::Error,
            {
                self.visit_i64(value.min(i64::MAX as u64) as i64)
            }
        }
        deserializer.deserialize_any(TextStyleVisitor)
    }
}

/// Configuration for the clock module.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClockModuleConfig {
    #[serde(default)]
    pub am_pm_style: TextStyle,
    #[serde(default)]
    pub day_of_week_style: TextStyle,
    #[serde(default)]
    pub is_24_hour: bool,
    /// Initial IANA zone id; later changes arrive as host events.
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Opaque locale tag; changing it invalidates any cached rendering.
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default = "default_color")]
    pub color: HexColor,
}

impl Default for ClockModuleConfig {
    fn default() -> Self {
        Self {
            am_pm_style: TextStyle::default(),
            day_of_week_style: TextStyle::default(),
            is_24_hour: false,
            time_zone: None,
            locale: None,
            color: default_color(),
        }
    }
}

fn default_color() -> HexColor {
    HexColor::WHITE
}
