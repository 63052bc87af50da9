//gcal-tui/src/color_utils.rs

// Maps calendar colour tags to concrete RGB values and picks readable text
// colours on top of them. No ratatui types here so it stays usable from tests
// and non-terminal code.

use crate::model::EventColor;

/// Hex value for each symbolic tag.
pub fn tag_hex(color: EventColor) -> &'static str {
    match color {
        EventColor::Aqua => "#00FFFF",
        EventColor::Teal => "#008080",
        EventColor::Green => "#00FF00",
        EventColor::Red => "#FF0000",
        EventColor::Blue => "#0000FF",
        EventColor::Yellow => "#FFFF00",
        EventColor::Purple => "#800080",
        EventColor::Orange => "#FFA500",
    }
}

/// RGB tuple for a tag.
pub fn tag_rgb(color: EventColor) -> (u8, u8, u8) {
    // Table above is always well-formed.
    parse_hex_to_u8(tag_hex(color)).unwrap_or((255, 165, 0))
}

/// Parse a hex color string like "#RRGGBB" or "RRGGBB" into u8 tuple.
pub fn parse_hex_to_u8(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() < 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some((r, g, b))
}

/// Determines if text on top of this color should be white rather than black.
pub fn is_dark(r: u8, g: u8, b: u8) -> bool {
    // Perceptual luminance approximation
    let brightness = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    brightness < 128.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values() {
        assert_eq!(tag_hex(EventColor::from_tag("aqua")), "#00FFFF");
        assert_eq!(tag_hex(EventColor::from_tag("teal")), "#008080");
        assert_eq!(tag_hex(EventColor::from_tag("green")), "#00FF00");
        assert_eq!(tag_hex(EventColor::from_tag("red")), "#FF0000");
        assert_eq!(tag_hex(EventColor::from_tag("unknown")), "#FFA500");
        assert_eq!(tag_hex(EventColor::from_tag("")), "#FFA500");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex_to_u8("#008080"), Some((0, 128, 128)));
        assert_eq!(parse_hex_to_u8("ff0000"), Some((255, 0, 0)));
        assert_eq!(parse_hex_to_u8("#fff"), None);
        assert_eq!(parse_hex_to_u8("#zz0000"), None);
    }

    #[test]
    fn test_text_contrast() {
        let (r, g, b) = tag_rgb(EventColor::Teal);
        assert!(is_dark(r, g, b));
        let (r, g, b) = tag_rgb(EventColor::Yellow);
        assert!(!is_dark(r, g, b));
    }
}
