use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::foundation::error::ReelError;

/// Opaque RGB8 text color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Pure white.
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);

    /// Construct from channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Return the color as `[r, g, b, 255]`.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn named(name: &str) -> Option<Self> {
        let c = match name {
            "white" => Self::WHITE,
            "black" => Self::BLACK,
            "red" => Self::new(255, 0, 0),
            "green" => Self::new(0, 255, 0),
            "blue" => Self::new(0, 0, 255),
            "yellow" => Self::new(255, 255, 0),
            "cyan" => Self::new(0, 255, 255),
            "magenta" => Self::new(255, 0, 255),
            _ => return None,
        };
        Some(c)
    }
}

impl Default for Rgb8 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Rgb8 {
    type Err = ReelError;

    /// Parse `#RRGGBB` (case-insensitive) or a basic color name.
    ///
    /// Unknown names fall back to white; malformed hex is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).map_err(ReelError::invalid_style);
        }
        let lower = s.to_ascii_lowercase();
        match Self::named(&lower) {
            Some(c) => Ok(c),
            None => {
                tracing::warn!(color = %s, "unknown color name, using white");
                Ok(Self::WHITE)
            }
        }
    }
}

fn parse_hex(hex: &str) -> Result<Rgb8, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("hex color must be #RRGGBB, got \"#{hex}\""));
    }
    Ok(Rgb8::new(
        hex_byte(&hex[0..2])?,
        hex_byte(&hex[2..4])?,
        hex_byte(&hex[4..6])?,
    ))
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Arr([u8; 3]),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Arr([r, g, b]) => Ok(Self::new(r, g, b)),
        }
    }
}
