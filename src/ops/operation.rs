use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::bitmap::Bitmap;
use crate::ops::color_replace::ColorReplaceParams;

/// A parameterized, replayable edit.
///
/// Closed set of kinds: adding a kind means adding a variant here, and every `match` over
/// `Operation` has to handle it.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Recolor pixels close to a target color.
    ColorReplace(ColorReplaceParams),
}

impl Operation {
    /// Stable kind tag used in project documents.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ColorReplace(_) => "color_replace",
        }
    }

    /// Check parameter ranges without touching pixels.
    pub fn validate(&self) -> StudioResult<()> {
        match self {
            Self::ColorReplace(p) => p.validate(),
        }
    }

    /// Run the edit over `input`, producing a new bitmap of the same size.
    pub fn apply(&self, input: &Bitmap) -> StudioResult<Bitmap> {
        match self {
            Self::ColorReplace(p) => p.apply(input),
        }
    }

    /// One-line summary for listings and record notes.
    pub fn describe(&self) -> String {
        match self {
            Self::ColorReplace(p) => p.describe(),
        }
    }

    /// Kind-specific parameters as a JSON object.
    pub fn params_json(&self) -> StudioResult<serde_json::Value> {
        let v = match self {
            Self::ColorReplace(p) => serde_json::to_value(p),
        };
        v.map_err(|e| StudioError::Other(anyhow::Error::new(e).context("serialize op params")))
    }

    /// Rebuild an operation from its kind tag and JSON parameters.
    ///
    /// `color-replace` is accepted as an alias of `color_replace`.
    pub fn from_parts(kind: &str, params: serde_json::Value) -> StudioResult<Self> {
        match kind {
            "color_replace" | "color-replace" => {
                let p: ColorReplaceParams = serde_json::from_value(params).map_err(|e| {
                    StudioError::corrupt(format!("color_replace parameters: {e}"))
                })?;
                p.validate()?;
                Ok(Self::ColorReplace(p))
            }
            other => Err(StudioError::corrupt(format!(
                "unknown operation kind '{other}'"
            ))),
        }
    }
}

impl From<ColorReplaceParams> for Operation {
    fn from(p: ColorReplaceParams) -> Self {
        Self::ColorReplace(p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/operation.rs"]
mod tests;
