use crate::foundation::core::Rgb;
use crate::foundation::error::{StudioError, StudioResult};

/// Parse a color from `#RRGGBB`, `RRGGBB` or `R,G,B` (decimal, spaces allowed).
pub fn parse_color(input: &str) -> StudioResult<Rgb> {
    let s = input.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if s.len() == 6 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return parse_hex(s);
    }

    if s.contains(',') {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() == 3 {
            let mut v = [0i64; 3];
            for (slot, part) in v.iter_mut().zip(&parts) {
                *slot = part.parse::<i64>().map_err(|_| {
                    StudioError::invalid(format!("invalid RGB component '{part}' in '{s}'"))
                })?;
            }
            return Rgb::from_channels(v[0], v[1], v[2]);
        }
    }

    Err(StudioError::invalid(format!(
        "unrecognized color '{s}', expected #RRGGBB or R,G,B"
    )))
}

fn parse_hex(hex: &str) -> StudioResult<Rgb> {
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StudioError::invalid(format!(
            "hex color must be #RRGGBB, got '#{hex}'"
        )));
    }
    let byte = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| StudioError::invalid(format!("invalid hex byte in '#{hex}'")))
    };
    Ok(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
}

/// Euclidean distance between two colors in RGB space (0 to ~441.67).
pub fn color_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = f64::from(a.r) - f64::from(b.r);
    let dg = f64::from(a.g) - f64::from(b.g);
    let db = f64::from(a.b) - f64::from(b.b);
    (dr * dr + dg * dg + db * db).sqrt()
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/color.rs"]
mod tests;
