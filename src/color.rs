//! Colour parsing shared by drawing objects and overlay settings.
//!
//! Drawing objects carry CSS-style colour strings: `#RRGGBB`, `#RRGGBBAA`,
//! `rgb(r, g, b)` and `rgba(r, g, b, a)` where `a` is `0.0..=1.0`.

use image::Rgba;

/// Parse a CSS colour string into straight (non-premultiplied) RGBA.
///
/// Returns `None` for anything unrecognised.
pub fn parse_css_color(input: &str) -> Option<Rgba<u8>> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(body) = s.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return None;
        }
        let [r, g, b] = parse_rgb_parts(&parts[..3])?;
        let alpha: f32 = parts[3].parse().ok()?;
        return Some(Rgba([r, g, b, unit_to_byte(alpha)]));
    }
    if let Some(body) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return None;
        }
        let [r, g, b] = parse_rgb_parts(&parts)?;
        return Some(Rgba([r, g, b, 255]));
    }
    None
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

fn parse_rgb_parts(parts: &[&str]) -> Option<[u8; 3]> {
    let mut out = [0u8; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        let v: i32 = part.parse().ok()?;
        *slot = v.clamp(0, 255) as u8;
    }
    Some(out)
}

/// Convert a `0.0..=1.0` alpha into a byte, rounding.
fn unit_to_byte(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Format an RGB triple as `#rrggbb`.
pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_with_alpha() {
        assert_eq!(parse_css_color("#B5B5B580"), Some(Rgba([181, 181, 181, 128])));
        assert_eq!(parse_css_color("#ff0000"), Some(Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_parse_rgba() {
        assert_eq!(
            parse_css_color("rgba(181, 181, 181, 0.8)"),
            Some(Rgba([181, 181, 181, 204]))
        );
        assert_eq!(parse_css_color("rgb(0,0,0)"), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_css_color(""), None);
        assert_eq!(parse_css_color("#12345"), None);
        assert_eq!(parse_css_color("rgba(1,2,3)"), None);
        assert_eq!(parse_css_color("hsl(0, 100%, 50%)"), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex([181, 181, 181]), "#b5b5b5");
    }
}
