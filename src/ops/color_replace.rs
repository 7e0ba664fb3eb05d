use rayon::prelude::*;

use crate::foundation::core::Rgb;
use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::bitmap::Bitmap;

/// Largest accepted tolerance.
pub const MAX_TOLERANCE: i32 = 255;

/// Parameters of the `color_replace` operation.
///
/// Field names on the wire follow the project document (`target_rgb`, `new_rgb`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorReplaceParams {
    /// Color to look for.
    #[serde(rename = "target_rgb")]
    pub target: Rgb,
    /// Color written over matching pixels.
    #[serde(rename = "new_rgb")]
    pub replacement: Rgb,
    /// Maximum Euclidean RGB distance (inclusive) for a pixel to match.
    #[serde(default)]
    pub tolerance: i32,
    /// Keep the source alpha (and skip fully transparent pixels) instead of forcing 255.
    #[serde(default = "default_preserve_alpha")]
    pub preserve_alpha: bool,
}

fn default_preserve_alpha() -> bool {
    true
}

impl ColorReplaceParams {
    /// Exact-match replacement that preserves alpha.
    pub fn new(target: Rgb, replacement: Rgb) -> Self {
        Self {
            target,
            replacement,
            tolerance: 0,
            preserve_alpha: true,
        }
    }

    /// Builder-style tolerance setter.
    pub fn tolerance(mut self, tolerance: i32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder-style alpha policy setter.
    pub fn preserve_alpha(mut self, preserve_alpha: bool) -> Self {
        self.preserve_alpha = preserve_alpha;
        self
    }

    /// Reject tolerances outside `0..=255`.
    pub fn validate(&self) -> StudioResult<()> {
        if !(0..=MAX_TOLERANCE).contains(&self.tolerance) {
            return Err(StudioError::invalid(format!(
                "tolerance must be in 0..={MAX_TOLERANCE}, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Human-readable summary stored as the record note.
    pub fn describe(&self) -> String {
        format!(
            "Replace {} with {} (tolerance: {})",
            self.target, self.replacement, self.tolerance
        )
    }

    /// Produce a new bitmap with matching pixels recolored. The input is not modified.
    pub fn apply(&self, input: &Bitmap) -> StudioResult<Bitmap> {
        self.validate()?;
        let limit = self.limit_sq();
        let mut out = input.clone();
        out.as_rgba8_mut().par_chunks_exact_mut(4).for_each(|px| {
            if !self.matches(px, limit) {
                return;
            }
            px[0] = self.replacement.r;
            px[1] = self.replacement.g;
            px[2] = self.replacement.b;
            if !self.preserve_alpha {
                px[3] = 255;
            }
        });
        Ok(out)
    }

    /// Number of pixels `apply` would recolor, ignoring fully transparent ones.
    pub fn count_matches(&self, input: &Bitmap) -> StudioResult<usize> {
        self.validate()?;
        let limit = self.limit_sq();
        Ok(input
            .as_rgba8()
            .par_chunks_exact(4)
            .filter(|px| px[3] > 0 && self.matches(px, limit))
            .count())
    }

    fn limit_sq(&self) -> u32 {
        let t = self.tolerance.max(0) as u32;
        t * t
    }

    // d <= tolerance  <=>  d^2 <= tolerance^2 for non-negative integers.
    fn matches(&self, px: &[u8], limit_sq: u32) -> bool {
        if self.preserve_alpha && px[3] == 0 {
            return false;
        }
        let dr = i32::from(px[0]) - i32::from(self.target.r);
        let dg = i32::from(px[1]) - i32::from(self.target.g);
        let db = i32::from(px[2]) - i32::from(self.target.b);
        ((dr * dr + dg * dg + db * db) as u32) <= limit_sq
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/color_replace.rs"]
mod tests;
