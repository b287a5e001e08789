use glam::Vec3;

/// Converts HSL (all components in `[0, 1]`) to linear RGB.
#[must_use]
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= 0.0 {
        return Vec3::splat(l);
    }

    let h = h.rem_euclid(1.0);
    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Vec3::new(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Parses `#rrggbb` into an RGB triple in `[0, 1]`.
#[must_use]
pub fn parse_hex_rgb(hex: &str) -> Option<Vec3> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    let channel = |shift: u32| ((value >> shift) & 0xFF) as f32 / 255.0;
    Some(Vec3::new(channel(16), channel(8), channel(0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn hsl_primaries() {
        assert!(approx(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(approx(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn hsl_grey_without_saturation() {
        assert!(approx(hsl_to_rgb(0.3, 0.0, 0.65), Vec3::splat(0.65)));
    }

    #[test]
    fn hex_parsing() {
        let c = parse_hex_rgb("#ff8000").unwrap();
        assert!(approx(c, Vec3::new(1.0, 128.0 / 255.0, 0.0)));
        assert!(parse_hex_rgb("#fff").is_none());
        assert!(parse_hex_rgb("zzzzzz").is_none());
        assert!(parse_hex_rgb("+12345").is_none());
        assert!(parse_hex_rgb("#-12345").is_none());
    }
}
