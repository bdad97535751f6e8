//! Per-ID colors
//!
//! Colors come from a 32-bit rolling string hash, so the same ID always
//! maps to the same `#rrggbb` value.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// An sRGB color written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor(pub [u8; 3]);

impl HexColor {
    pub fn rgb(&self) -> [u8; 3] {
        self.0
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(HexColor([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hash a string over its UTF-16 code units: `hash = c + ((hash << 5) - hash)`,
/// wrapping at 32 bits
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, c| {
        (c as i32).wrapping_add((hash << 5).wrapping_sub(hash))
    })
}

/// Map an ID to its display color
///
/// Channel i is byte i of the hash (arithmetic shift), red first.
pub fn string_to_color(s: &str) -> HexColor {
    let hash = string_hash(s);
    let channel = |i: i32| ((hash >> (i * 8)) & 0xFF) as u8;
    HexColor([channel(0), channel(1), channel(2)])
}

/// ID -> color memo for a single load
#[derive(Debug, Default)]
pub struct ColorAssigner {
    by_id: HashMap<String, HexColor>,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&mut self, id: &str) -> HexColor {
        if let Some(color) = self.by_id.get(id) {
            return *color;
        }
        let color = string_to_color(id);
        self.by_id.insert(id.to_string(), color);
        color
    }

    /// Number of distinct IDs seen so far
    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_colors() {
        assert_eq!(string_to_color("").to_string(), "#000000");
        assert_eq!(string_to_color("A").to_string(), "#410000");
        assert_eq!(string_to_color("A1").to_string(), "#100800");
        assert_eq!(string_to_color("A2").to_string(), "#110800");
        assert_eq!(string_to_color("hello world").to_string(), "#c4e2ef");
    }

    #[test]
    fn test_hash_wraps_negative() {
        assert_eq!(string_hash("vehicle-42"), -1378697025);
        assert_eq!(string_to_color("vehicle-42").to_string(), "#bfc0d2");
    }

    #[test]
    fn test_non_ascii_uses_utf16_units() {
        assert_eq!(string_to_color("Zürich").to_string(), "#beb3a8");
    }

    #[test]
    fn test_assigner_memoizes() {
        let mut colors = ColorAssigner::new();
        let a = colors.color_for("A1");
        let b = colors.color_for("A2");
        assert_eq!(colors.color_for("A1"), a);
        assert_ne!(a, b);
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn test_parse_round_trip() {
        let c = HexColor::parse("#c4e2ef").unwrap();
        assert_eq!(c.rgb(), [0xc4, 0xe2, 0xef]);
        assert_eq!(HexColor::parse("ff8000"), Some(HexColor([255, 128, 0])));
        assert_eq!(HexColor::parse("#fff"), None);
        assert_eq!(HexColor::parse("#gg0000"), None);
    }
}
