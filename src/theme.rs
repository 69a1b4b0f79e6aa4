//! Color parsing and font loading.
//! Colors come from the TOML config as hex strings or a few CSS names; fonts are
//! registered by family name and loaded from font files once per run.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("invalid color {value:?}"))
    }
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Hex (`#RGB`, `#RRGGBB`, `#RRGGBBAA`) or one of the basic CSS color names.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.starts_with('#') {
            return Self::from_hex(s);
        }
        let named = match s.to_ascii_lowercase().as_str() {
            "white" => Color::WHITE,
            "black" => Color::BLACK,
            "transparent" => Color { a: 0, ..Color::BLACK },
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 128, 0),
            "blue" => Color::rgb(0, 0, 255),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "orange" => Color::rgb(255, 165, 0),
            "yellow" => Color::rgb(255, 255, 0),
            "purple" => Color::rgb(128, 0, 128),
            _ => return Self::from_hex(s),
        };
        Some(named)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v << 4 | v;
                }
                Some(Color::rgb(rgb[0], rgb[1], rgb[2]))
            }
            6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Color { r: channel(0)?, g: channel(2)?, b: channel(4)?, a: channel(6)? }),
            _ => None,
        }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Loaded fonts keyed by family name.
#[derive(Default)]
pub struct FontBook {
    fonts: HashMap<String, fontdue::Font>,
}

impl FontBook {
    pub fn new() -> Self {
        FontBook::default()
    }

    /// Load every registered family. A family whose file is missing or unparsable is
    /// skipped with a warning; text in that family later fails to measure.
    pub fn load(families: &HashMap<String, PathBuf>) -> Self {
        let mut book = FontBook::new();
        for (family, path) in families {
            match load_font(path) {
                Ok(font) => {
                    info!("Loaded font {family} from {}", path.display());
                    book.insert(family.clone(), font);
                }
                Err(e) => warn!("Skipping font {family}: {e}"),
            }
        }
        book
    }

    pub fn insert(&mut self, family: String, font: fontdue::Font) {
        self.fonts.insert(family, font);
    }

    pub fn get(&self, family: &str) -> Result<&fontdue::Font, RenderError> {
        self.fonts
            .get(family)
            .ok_or_else(|| RenderError::FontUnavailable(family.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn load_font(path: &Path) -> Result<fontdue::Font, RenderError> {
    let data = std::fs::read(path).map_err(|e| RenderError::io(path, e))?;
    fontdue::Font::from_bytes(data, fontdue::FontSettings::default()).map_err(|e| RenderError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
