use crate::foundation::core::{Position, Size};
use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::ids::{BitmapRef, LayerId, resolve_prefix};
use crate::layers::model::{Layer, LayerKind};

/// Direction for [`LayerRegistry::move_layer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards the top of the stack (higher order).
    Up,
    /// Towards the bottom of the stack (lower order).
    Down,
}

/// Several layer field changes applied together by [`LayerRegistry::apply_patch`].
///
/// `x` and `y` are independent so one axis can move while the other keeps its current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerPatch {
    /// New visibility.
    pub visible: Option<bool>,
    /// New opacity, in `[0, 1]`.
    pub opacity: Option<f64>,
    /// New horizontal offset.
    pub x: Option<i32>,
    /// New vertical offset.
    pub y: Option<i32>,
    /// New display name.
    pub name: Option<String>,
    /// New advisory lock flag.
    pub locked: Option<bool>,
}

impl LayerPatch {
    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// `true` when a field the compositor reads is set.
    pub fn is_visual(&self) -> bool {
        self.visible.is_some() || self.opacity.is_some() || self.x.is_some() || self.y.is_some()
    }
}

/// Ordered set of layers owned by a project.
///
/// Layers are stored bottom-to-top and their `order` values are always the dense sequence
/// `0..len`.
#[derive(Clone, Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
}

impl LayerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-loaded layers, sorting by `order` and renormalizing.
    pub(crate) fn from_layers(mut layers: Vec<Layer>) -> Self {
        layers.sort_by_key(|l| l.order);
        let mut out = Self { layers };
        out.renormalize();
        out
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// `true` when no layer was imported yet.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Bottommost layer.
    pub fn bottom(&self) -> Option<&Layer> {
        self.layers.first()
    }

    /// Look up by exact id.
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Resolve an exact id or unique prefix of at least six characters.
    pub fn resolve(&self, query: &str) -> StudioResult<&Layer> {
        let i = self.resolve_index(query)?;
        Ok(&self.layers[i])
    }

    fn resolve_index(&self, query: &str) -> StudioResult<usize> {
        resolve_prefix("layer", query, self.layers.iter().map(|l| l.id.as_str()))
    }

    /// Layer an edit targets: `explicit` if given, otherwise the topmost visible layer, otherwise
    /// the topmost layer.
    pub fn resolve_active(&self, explicit: Option<&str>) -> StudioResult<&Layer> {
        if let Some(query) = explicit {
            return self.resolve(query);
        }
        self.layers
            .iter()
            .rev()
            .find(|l| l.visible)
            .or_else(|| self.layers.last())
            .ok_or_else(|| StudioError::not_found("project has no layers"))
    }

    /// Append a raster layer on top of the stack.
    ///
    /// New layers are visible, fully opaque and placed at `(0, 0)`.
    pub fn add(
        &mut self,
        id: LayerId,
        name: impl Into<String>,
        size: Size,
        source: BitmapRef,
    ) -> StudioResult<&Layer> {
        if self.get(&id).is_some() {
            return Err(StudioError::guardrail(format!("layer id {id} already exists")));
        }
        let order = self
            .layers
            .iter()
            .map(|l| l.order + 1)
            .max()
            .unwrap_or(0);
        self.layers.push(Layer {
            id,
            name: name.into(),
            kind: LayerKind::Raster,
            visible: true,
            opacity: 1.0,
            locked: false,
            order,
            position: Position::default(),
            size,
            source,
        });
        Ok(&self.layers[self.layers.len() - 1])
    }

    /// Remove a layer. Refuses to remove the last one.
    ///
    /// Operation records targeting the layer are not touched here; see
    /// [`crate::Project::delete_layer`] for the cascading variant.
    pub fn delete(&mut self, query: &str) -> StudioResult<Layer> {
        let i = self.resolve_index(query)?;
        if self.layers.len() == 1 {
            return Err(StudioError::guardrail(
                "cannot delete the last layer of a project",
            ));
        }
        let removed = self.layers.remove(i);
        self.renormalize();
        Ok(removed)
    }

    /// Swap with the neighbor in `dir`. Returns `false` when already at that boundary.
    pub fn move_layer(&mut self, query: &str, dir: MoveDirection) -> StudioResult<bool> {
        let i = self.resolve_index(query)?;
        let j = match dir {
            MoveDirection::Up if i + 1 < self.layers.len() => i + 1,
            MoveDirection::Down if i > 0 => i - 1,
            _ => return Ok(false),
        };
        self.layers.swap(i, j);
        self.renormalize();
        Ok(true)
    }

    /// [`Self::move_layer`] towards the top.
    pub fn move_up(&mut self, query: &str) -> StudioResult<bool> {
        self.move_layer(query, MoveDirection::Up)
    }

    /// [`Self::move_layer`] towards the bottom.
    pub fn move_down(&mut self, query: &str) -> StudioResult<bool> {
        self.move_layer(query, MoveDirection::Down)
    }

    /// Show or hide a layer.
    pub fn set_visibility(&mut self, query: &str, visible: bool) -> StudioResult<&Layer> {
        self.update(query, |l| l.visible = visible)
    }

    /// Set opacity; values outside `[0, 1]` (or NaN) are rejected.
    pub fn set_opacity(&mut self, query: &str, opacity: f64) -> StudioResult<&Layer> {
        check_opacity(opacity)?;
        self.update(query, |l| l.opacity = opacity)
    }

    /// Move a layer on the canvas.
    pub fn set_position(&mut self, query: &str, position: Position) -> StudioResult<&Layer> {
        self.update(query, |l| l.position = position)
    }

    /// Rename a layer.
    pub fn rename(&mut self, query: &str, name: impl Into<String>) -> StudioResult<&Layer> {
        let name = name.into();
        self.update(query, |l| l.name = name)
    }

    /// Set the advisory lock flag.
    pub fn set_locked(&mut self, query: &str, locked: bool) -> StudioResult<&Layer> {
        self.update(query, |l| l.locked = locked)
    }

    /// Apply every field of `patch` or none of them.
    pub fn apply_patch(&mut self, query: &str, patch: &LayerPatch) -> StudioResult<&Layer> {
        if let Some(opacity) = patch.opacity {
            check_opacity(opacity)?;
        }
        self.update(query, |l| {
            if let Some(v) = patch.visible {
                l.visible = v;
            }
            if let Some(o) = patch.opacity {
                l.opacity = o;
            }
            l.position = Position::new(
                patch.x.unwrap_or(l.position.x),
                patch.y.unwrap_or(l.position.y),
            );
            if let Some(name) = &patch.name {
                l.name.clone_from(name);
            }
            if let Some(locked) = patch.locked {
                l.locked = locked;
            }
        })
    }

    fn update(&mut self, query: &str, f: impl FnOnce(&mut Layer)) -> StudioResult<&Layer> {
        let i = self.resolve_index(query)?;
        f(&mut self.layers[i]);
        Ok(&self.layers[i])
    }

    fn renormalize(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.order = i as u32;
        }
    }
}

fn check_opacity(opacity: f64) -> StudioResult<()> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(())
    } else {
        Err(StudioError::invalid(format!(
            "opacity must be in [0, 1], got {opacity}"
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/registry.rs"]
mod tests;
