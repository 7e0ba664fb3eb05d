use rayon::prelude::*;

use crate::foundation::core::Position;
use crate::imaging::bitmap::Bitmap;

pub type StraightRgba8 = [u8; 4];

/// Layer alpha after applying layer opacity, rounded to nearest.
pub fn scale_alpha(a: u8, opacity: f64) -> u8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return a;
    }
    (f64::from(a) * opacity).round() as u8
}

/// Straight-alpha source-over.
pub fn over(dst: StraightRgba8, src: StraightRgba8, opacity: f64) -> StraightRgba8 {
    let sa8 = scale_alpha(src[3], opacity);
    if sa8 == 0 {
        return dst;
    }
    if sa8 == 255 {
        return [src[0], src[1], src[2], 255];
    }

    let sa = f64::from(sa8) / 255.0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (f64::from(src[i]) * sa + f64::from(dst[i]) * da * (1.0 - sa)) / out_a;
        out[i] = to_u8(c);
    }
    out[3] = to_u8(out_a * 255.0);
    out
}

/// Blend `src` onto `dst` with its top-left corner at `at`. Pixels outside `dst` are clipped.
pub fn blit_over(dst: &mut Bitmap, src: &Bitmap, opacity: f64, at: Position) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));
    let (ox, oy) = (i64::from(at.x), i64::from(at.y));

    let x0 = ox.max(0);
    let x1 = (ox + sw).min(dw);
    let y0 = oy.max(0);
    let y1 = (oy + sh).min(dh);
    if x0 >= x1 || y0 >= y1 || opacity <= 0.0 {
        return;
    }

    let dst_stride = dw as usize * 4;
    let src_stride = sw as usize * 4;
    let src_px = src.as_rgba8();
    dst.as_rgba8_mut()
        .par_chunks_exact_mut(dst_stride)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(y, row)| {
            let sy = (y as i64 - oy) as usize;
            let src_row = &src_px[sy * src_stride..(sy + 1) * src_stride];
            for x in x0..x1 {
                let sx = (x - ox) as usize * 4;
                let dx = x as usize * 4;
                let s = [
                    src_row[sx],
                    src_row[sx + 1],
                    src_row[sx + 2],
                    src_row[sx + 3],
                ];
                let d = [row[dx], row[dx + 1], row[dx + 2], row[dx + 3]];
                row[dx..dx + 4].copy_from_slice(&over(d, s, opacity));
            }
        });
}

fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
