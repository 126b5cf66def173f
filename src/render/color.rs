use std::fmt;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An RGBA color, serialized as a `#rrggbb` hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb` or `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor {
            value: value.to_string(),
        };
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = channel(&c.to_string())?;
                    out[i] = v * 17;
                }
                Ok(Self::rgb(out[0], out[1], out[2]))
            }
            6 => Ok(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(invalid()),
        }
    }

    /// Same color with the alpha replaced by `alpha` in `[0.0, 1.0]`
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn alpha_f32(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Linear blend towards `other`, `t` in `[0.0, 1.0]`
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba([color.r, color.g, color.b, color.a])
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Named accent presets offered by the form
pub const COLOR_PRESETS: [(&str, Color); 5] = [
    ("lavender", Color::rgb(0x9b, 0x5d, 0xe5)),
    ("pink", Color::rgb(0xf1, 0x5b, 0xb5)),
    ("banana", Color::rgb(0xfe, 0xe4, 0x40)),
    ("sky", Color::rgb(0x00, 0xbb, 0xf9)),
    ("aqua", Color::rgb(0x00, 0xf5, 0xd4)),
];

/// Look up a preset by name
pub fn preset(name: &str) -> Option<Color> {
    COLOR_PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, color)| *color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_and_short_hex() {
        assert_eq!(Color::from_hex("#9b5de5").unwrap(), Color::rgb(0x9b, 0x5d, 0xe5));
        assert_eq!(Color::from_hex("fff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#0a0").unwrap(), Color::rgb(0, 0xaa, 0));
    }

    #[test]
    fn test_reject_bad_hex() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_with_alpha_and_hex_output() {
        let c = Color::rgb(1, 2, 3).with_alpha(0.5);
        assert_eq!(c.a, 128);
        assert_eq!(c.to_hex(), "#010203");
    }

    #[test]
    fn test_presets() {
        assert_eq!(preset("Lavender"), Some(Color::rgb(0x9b, 0x5d, 0xe5)));
        assert!(preset("mauve").is_none());
    }
}
