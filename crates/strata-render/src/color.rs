use serde::{Deserialize, Serialize};

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const RED: Self = Self(255, 0, 0);

    /// Resolves a color name against the drawing palette, or a `#rgb`/`#rrggbb` literal.
    pub fn parse(text: &str) -> Option<Self> {
        let s = text.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let rgb = match s.as_str() {
            "black" => (0, 0, 0),
            "blue" => (0, 0, 255),
            "brown" => (165, 42, 42),
            "darkgray" | "darkgrey" => (169, 169, 169),
            "gray" | "grey" => (128, 128, 128),
            "green" => (0, 128, 0),
            "lightblue" => (173, 216, 230),
            "lightgray" | "lightgrey" => (211, 211, 211),
            "lightgreen" => (144, 238, 144),
            "magenta" | "fuchsia" => (255, 0, 255),
            "navy" => (0, 0, 128),
            "orange" => (255, 165, 0),
            "purple" => (128, 0, 128),
            "red" => (255, 0, 0),
            "silver" => (192, 192, 192),
            "white" => (255, 255, 255),
            "yellow" => (255, 255, 0),
            _ => return None,
        };
        Some(Self(rgb.0, rgb.1, rgb.2))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    fn hex2(b: &[u8]) -> Option<u8> {
        let hi = (*b.first()? as char).to_digit(16)? as u8;
        let lo = (*b.get(1)? as char).to_digit(16)? as u8;
        Some((hi << 4) | lo)
    }
    fn hex1(c: u8) -> Option<u8> {
        let v = (c as char).to_digit(16)? as u8;
        Some((v << 4) | v)
    }

    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => Some(Rgb(hex1(bytes[0])?, hex1(bytes[1])?, hex1(bytes[2])?)),
        6 => Some(Rgb(
            hex2(&bytes[0..2])?,
            hex2(&bytes[2..4])?,
            hex2(&bytes[4..6])?,
        )),
        _ => None,
    }
}
