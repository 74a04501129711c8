/// Deterministic display color for a participant: a hue hashed from the id,
/// full saturation, 75% lightness, as `#rrggbb`.
pub fn color_from_user_id(user_id: &str) -> String {
    let hue = user_id
        .chars()
        .fold(1u32, |acc, c| (17 * (acc + u32::from(c))) % 360);
    hsl_to_hex(f64::from(hue) / 360.0, 1.0, 0.75)
}

/// HSL (all components in `0.0..=1.0`) to `#rrggbb`.
fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let channel = |value: f64| (value * 255.0).round().clamp(0.0, 255.0) as u8;

    if saturation == 0.0 {
        let grey = channel(lightness);
        return format!("#{grey:02x}{grey:02x}{grey:02x}");
    }

    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;

    let r = channel(hue_to_rgb(p, q, hue + 1.0 / 3.0));
    let g = channel(hue_to_rgb(p, q, hue));
    let b = channel(hue_to_rgb(p, q, hue - 1.0 / 3.0));
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
