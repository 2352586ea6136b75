//! Tools, themes, and the fixed color palette.

use serde::{Deserialize, Serialize};

/// RGBA color, straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Parse a `#RRGGBB` hex string. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.0;
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    pub fn rgba(self) -> image::Rgba<u8> {
        image::Rgba(self.0)
    }
}

/// The swatch row offered by the UI, in display order.
pub const PALETTE: [Color; 11] = [
    Color::rgb(0x00, 0x00, 0x00), // black
    Color::rgb(0xFF, 0xFF, 0xFF), // white
    Color::rgb(0xFF, 0x3B, 0x30), // red
    Color::rgb(0xFF, 0x2D, 0x55), // pink
    Color::rgb(0xAF, 0x52, 0xDE), // purple
    Color::rgb(0x58, 0x56, 0xD6), // indigo
    Color::rgb(0x00, 0x7A, 0xFF), // blue
    Color::rgb(0x34, 0xC7, 0x59), // green
    Color::rgb(0xFF, 0xCC, 0x00), // yellow
    Color::rgb(0xFF, 0x95, 0x00), // orange
    Color::rgb(0x8E, 0x8E, 0x93), // gray
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Canvas fill color; also what the eraser paints with.
    pub fn background(self) -> Color {
        match self {
            Theme::Dark => Color::BLACK,
            Theme::Light => Color::WHITE,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

pub const MIN_LINE_WIDTH: u32 = 1;
pub const MAX_LINE_WIDTH: u32 = 20;
pub const DEFAULT_LINE_WIDTH: u32 = 2;

pub fn clamp_line_width(width: u32) -> u32 {
    width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
}
