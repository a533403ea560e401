//! Paint colors and the fixed set of color presets

use serde::{Deserialize, Serialize};
use std::fmt;

/// An sRGB color with components in 0.0-1.0
///
/// Components are kept as floats so that a material's original color survives a
/// snapshot/restore round trip exactly, whatever precision the asset used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a 24-bit `0xRRGGBB` integer
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Self { r, g, b }
    }

    /// Pack back into `0xRRGGBB`, rounding each channel
    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

/// The paint presets offered by the viewer
///
/// `Original` means "whatever the asset shipped with" and is applied by restoring
/// the snapshot rather than by writing a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreset {
    #[default]
    Original,
    Red,
    Green,
    Blue,
    Gray,
}

impl ColorPreset {
    /// All presets in button order
    pub const ALL: [ColorPreset; 5] = [
        ColorPreset::Original,
        ColorPreset::Red,
        ColorPreset::Green,
        ColorPreset::Blue,
        ColorPreset::Gray,
    ];

    /// Stable key used by the price table
    pub fn key(self) -> &'static str {
        match self {
            ColorPreset::Original => "original",
            ColorPreset::Red => "red",
            ColorPreset::Green => "green",
            ColorPreset::Blue => "blue",
            ColorPreset::Gray => "gray",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key.to_lowercase())
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorPreset::Original => "Original",
            ColorPreset::Red => "Red",
            ColorPreset::Green => "Green",
            ColorPreset::Blue => "Blue",
            ColorPreset::Gray => "Gray",
        }
    }

    /// Paint color as `0xRRGGBB`, `None` for `Original`
    pub fn hex(self) -> Option<u32> {
        match self {
            ColorPreset::Original => None,
            ColorPreset::Red => Some(0x7f0000),
            ColorPreset::Green => Some(0x005300),
            ColorPreset::Blue => Some(0x000082),
            ColorPreset::Gray => Some(0x666666),
        }
    }

    pub fn color(self) -> Option<Rgb> {
        self.hex().map(Rgb::from_hex)
    }
}

impl fmt::Display for ColorPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_conversion() {
        let red = Rgb::from_hex(0x7f0000);
        assert_eq!(red.g, 0.0);
        assert_eq!(red.b, 0.0);
        assert!((red.r - 127.0 / 255.0).abs() < 1e-6);
        assert_eq!(red.to_hex(), 0x7f0000);
        assert_eq!(Rgb::from_hex(0x666666).to_string(), "#666666");
    }

    #[test]
    fn test_preset_keys() {
        for preset in ColorPreset::ALL {
            assert_eq!(ColorPreset::from_key(preset.key()), Some(preset));
        }
        assert_eq!(ColorPreset::from_key("GRAY"), Some(ColorPreset::Gray));
        assert_eq!(ColorPreset::from_key("purple"), None);
        assert_eq!(ColorPreset::Original.color(), None);
        assert_eq!(ColorPreset::Blue.hex(), Some(0x000082));
    }
}
