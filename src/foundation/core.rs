use crate::foundation::error::{StudioError, StudioResult};

/// Integer offset of a layer's top-left corner on the canvas.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Position {
    /// Horizontal offset in pixels (may be negative).
    pub x: i32,
    /// Vertical offset in pixels (may be negative).
    pub y: i32,
}

impl Position {
    /// Construct a position.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a bitmap or canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a validated size with both dimensions `> 0`.
    pub fn new(width: u32, height: u32) -> StudioResult<Self> {
        if width == 0 || height == 0 {
            return Err(StudioError::invalid(format!(
                "size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered.
    pub fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Straight 8-bit RGB color.
///
/// Serialized as a `[r, g, b]` array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Construct from 8-bit channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Construct from wide integers, rejecting channels outside `[0, 255]`.
    pub fn from_channels(r: i64, g: i64, b: i64) -> StudioResult<Self> {
        fn channel(name: &str, v: i64) -> StudioResult<u8> {
            u8::try_from(v).map_err(|_| {
                StudioError::invalid(format!("{name} channel must be in 0..=255, got {v}"))
            })
        }
        Ok(Self {
            r: channel("red", r)?,
            g: channel("green", g)?,
            b: channel("blue", b)?,
        })
    }

    /// Uppercase `#RRGGBB` representation.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(v: [u8; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// What the canvas shows beneath the bottommost layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    /// Fully transparent pixels.
    #[default]
    Transparent,
    /// An opaque solid color.
    Color(Rgb),
}

impl TryFrom<String> for Background {
    type Error = StudioError;

    fn try_from(s: String) -> StudioResult<Self> {
        if s.trim().eq_ignore_ascii_case("transparent") {
            return Ok(Self::Transparent);
        }
        crate::imaging::color::parse_color(&s).map(Self::Color)
    }
}

impl From<Background> for String {
    fn from(b: Background) -> Self {
        match b {
            Background::Transparent => "transparent".to_owned(),
            Background::Color(c) => c.to_hex(),
        }
    }
}

impl Background {
    /// Straight RGBA8 pixel this background paints.
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Self::Transparent => [0, 0, 0, 0],
            Self::Color(c) => [c.r, c.g, c.b, 255],
        }
    }
}

/// Per-project canvas settings.
///
/// `size` stays `None` until the first layer is imported, which then defines it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSettings {
    /// Output dimensions, if known.
    pub size: Option<Size>,
    /// Fill beneath all layers.
    #[serde(default)]
    pub background: Background,
    /// Optional print resolution; carried through, never used for rendering.
    #[serde(default)]
    pub dpi: Option<u32>,
}

impl CanvasSettings {
    /// Canvas with an explicit size and a transparent background.
    pub fn with_size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
