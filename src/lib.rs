//! Creator Studio is a non-destructive layered image editing backend.
//!
//! A project is a stack of raster layers plus an append-only history of edits with a playback
//! cursor. Edits never overwrite imported pixels; the composite is re-derived on demand.
//!
//! - Open or create a [`Session`] over a [`BitmapStore`]
//! - Import layers and apply [`Operation`]s (today: color replacement)
//! - Undo, redo, delete records or layers; [`render`] flattens the result
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod foundation;
mod history;
mod imaging;
mod layers;
mod ops;
mod project;
mod render;
mod session;
mod store;

pub use crate::config::settings::{DEFAULT_WORKSPACE, PROJECT_FILE, Settings, WORKSPACE_ENV};
pub use crate::foundation::core::{Background, CanvasSettings, Position, Rgb, Size};
pub use crate::foundation::error::{StudioError, StudioResult};
pub use crate::foundation::ids::{BitmapRef, LayerId, MIN_PREFIX_LEN, OpId, resolve_prefix};
pub use crate::history::record::OperationRecord;
pub use crate::history::stack::OperationStack;
pub use crate::imaging::bitmap::Bitmap;
pub use crate::imaging::codec::{decode_image, encode_png, read_image, write_png};
pub use crate::imaging::color::{color_distance, parse_color};
pub use crate::layers::model::{Layer, LayerKind};
pub use crate::layers::registry::{LayerPatch, LayerRegistry, MoveDirection};
pub use crate::ops::color_replace::{ColorReplaceParams, MAX_TOLERANCE};
pub use crate::ops::operation::Operation;
pub use crate::project::doc::{CanvasDoc, LayerDoc, ProjectDoc, RecordDoc};
pub use crate::project::model::Project;
pub use crate::project::repair::{Repair, RepairReport, load_project};
pub use crate::render::compositor::{layer_bitmap, render};
pub use crate::session::opts::{DEFAULT_COMPOSITE_REF, SessionOpts};
pub use crate::session::service::Session;
pub use crate::store::dir::DirBitmapStore;
pub use crate::store::memory::MemoryBitmapStore;
pub use crate::store::{BitmapSource, BitmapStore};
