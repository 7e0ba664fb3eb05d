//! Persisted project document.
//!
//! This is the JSON shape written next to the bitmaps of a project directory. Older documents
//! used different field names; those are accepted as aliases on read and never written back.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Background, Position, Size};
use crate::foundation::error::StudioResult;
use crate::layers::model::LayerKind;
use crate::project::model::Project;

/// Top-level project document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectDoc {
    /// Display name.
    #[serde(alias = "project_name")]
    pub name: String,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Canvas settings; absent in older documents.
    #[serde(default)]
    pub canvas: Option<CanvasDoc>,
    /// Older flat canvas width.
    #[serde(default, skip_serializing)]
    pub canvas_width: Option<u32>,
    /// Older flat canvas height.
    #[serde(default, skip_serializing)]
    pub canvas_height: Option<u32>,
    /// Layers in any order; `order` decides stacking.
    #[serde(default)]
    pub layers: Vec<LayerDoc>,
    /// Operation history, oldest first.
    #[serde(default)]
    pub operations: Vec<RecordDoc>,
    /// History cursor; `-1` means nothing applied. Missing in documents that predate it.
    #[serde(default)]
    pub active_op_index: Option<i64>,
    /// Layer that receives whole-project operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_base_layer: Option<String>,
}

/// Canvas section of a [`ProjectDoc`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CanvasDoc {
    /// Width in pixels; `0` or missing means unknown.
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in pixels; `0` or missing means unknown.
    #[serde(default)]
    pub height: Option<u32>,
    /// Background fill.
    #[serde(default)]
    pub background: Background,
    /// Optional print resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

/// One layer entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerDoc {
    /// Layer id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Layer kind.
    #[serde(default, alias = "type")]
    pub kind: LayerKind,
    /// Visibility.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Opacity; out-of-range values are clamped on load.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Advisory lock.
    #[serde(default)]
    pub locked: bool,
    /// Stacking position; missing orders are assigned on load.
    #[serde(default)]
    pub order: Option<u32>,
    /// Canvas offset.
    #[serde(default)]
    pub position: Option<Position>,
    /// Older top-level horizontal offset.
    #[serde(default, skip_serializing)]
    pub x: Option<i32>,
    /// Older top-level vertical offset.
    #[serde(default, skip_serializing)]
    pub y: Option<i32>,
    /// Bitmap dimensions; read from the bitmap when missing.
    #[serde(default)]
    pub size: Option<Size>,
    /// Handle of the imported bitmap.
    #[serde(alias = "layer_path")]
    pub source_reference: String,
}

/// One operation history entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordDoc {
    /// Record id.
    pub id: String,
    /// Operation kind tag.
    #[serde(alias = "op_type")]
    pub kind: String,
    /// Kind-specific parameters.
    #[serde(default, alias = "params")]
    pub parameters: serde_json::Value,
    /// Target layer; `null` for whole-project operations from older documents.
    #[serde(default, alias = "input_layer_id")]
    pub target_layer_id: Option<String>,
    /// Composite snapshot (or the only output, for older records).
    #[serde(alias = "output_path")]
    pub output_reference: String,
    /// Derived layer bitmap.
    #[serde(default)]
    pub output_layer_reference: Option<String>,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

impl ProjectDoc {
    /// Parse a document from JSON.
    pub fn from_json_str(s: &str) -> StudioResult<Self> {
        Ok(serde_json::from_str(s).context("parse project JSON")?)
    }

    /// Read a document from a reader.
    pub fn from_reader(r: impl Read) -> StudioResult<Self> {
        Ok(serde_json::from_reader(r).context("parse project JSON")?)
    }

    /// Read a document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> StudioResult<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("open project file '{}'", path.display()))?;
        Self::from_reader(std::io::BufReader::new(f))
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> StudioResult<String> {
        Ok(serde_json::to_string_pretty(self).context("serialize project JSON")?)
    }

    /// Write the document to `path`, replacing it atomically.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> StudioResult<()> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("write project file '{}'", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("replace project file '{}'", path.display()))?;
        Ok(())
    }
}

impl Project {
    /// Canonical document for this project. Older aliases are never produced.
    pub fn to_doc(&self) -> StudioResult<ProjectDoc> {
        let layers = self
            .layers
            .iter()
            .map(|l| LayerDoc {
                id: l.id().to_string(),
                name: l.name().to_owned(),
                kind: l.kind(),
                visible: l.visible(),
                opacity: l.opacity(),
                locked: l.locked(),
                order: Some(l.order()),
                position: Some(l.position()),
                x: None,
                y: None,
                size: Some(l.size()),
                source_reference: l.source().to_string(),
            })
            .collect();
        let operations = self
            .history
            .records()
            .iter()
            .map(|r| -> StudioResult<RecordDoc> {
                Ok(RecordDoc {
                    id: r.id().to_string(),
                    kind: r.operation().kind().to_owned(),
                    parameters: r.operation().params_json()?,
                    target_layer_id: r.target().map(ToString::to_string),
                    output_reference: r.output().to_string(),
                    output_layer_reference: r.output_layer().map(ToString::to_string),
                    created_at: r.created_at(),
                    note: r.note().map(str::to_owned),
                })
            })
            .collect::<StudioResult<Vec<_>>>()?;
        Ok(ProjectDoc {
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            canvas: Some(CanvasDoc {
                width: self.canvas.size.map(|s| s.width),
                height: self.canvas.size.map(|s| s.height),
                background: self.canvas.background,
                dpi: self.canvas.dpi,
            }),
            canvas_width: None,
            canvas_height: None,
            layers,
            operations,
            active_op_index: Some(self.history.cursor() as i64),
            legacy_base_layer: self.legacy_base_layer.as_ref().map(ToString::to_string),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/doc.rs"]
mod tests;
