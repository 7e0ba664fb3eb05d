use crate::foundation::core::{Position, Size};
use crate::foundation::ids::{BitmapRef, LayerId};

/// What a layer holds. Only raster layers are rendered; the others are reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// A bitmap layer.
    #[default]
    Raster,
    /// Reserved.
    Vector,
    /// Reserved.
    Text,
    /// Reserved.
    Group,
}

/// One entry of the layer stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    pub(crate) kind: LayerKind,
    pub(crate) visible: bool,
    pub(crate) opacity: f64,
    pub(crate) locked: bool,
    pub(crate) order: u32,
    pub(crate) position: Position,
    pub(crate) size: Size,
    pub(crate) source: BitmapRef,
}

impl Layer {
    /// Immutable identifier.
    pub fn id(&self) -> &LayerId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layer kind.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Whether the compositor draws this layer.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Opacity in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Advisory lock flag.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Stacking position, `0` is bottommost.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Canvas offset of the top-left corner.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Dimensions of the imported bitmap.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Handle of the originally imported bitmap.
    pub fn source(&self) -> &BitmapRef {
        &self.source
    }
}
