use chrono::{DateTime, Utc};

use crate::foundation::ids::{BitmapRef, LayerId, OpId};
use crate::ops::operation::Operation;

/// One immutable entry of the operation history.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationRecord {
    pub(crate) id: OpId,
    pub(crate) operation: Operation,
    pub(crate) target: Option<LayerId>,
    pub(crate) output: BitmapRef,
    pub(crate) output_layer: Option<BitmapRef>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) note: Option<String>,
}

impl OperationRecord {
    /// Record a layer-targeted operation with its two derived outputs.
    pub fn new(id: OpId, operation: Operation, target: LayerId) -> Self {
        let note = Some(operation.describe());
        Self {
            output: BitmapRef::op_composite_output(&id),
            output_layer: Some(BitmapRef::op_layer_output(&id)),
            id,
            operation,
            target: Some(target),
            created_at: Utc::now(),
            note,
        }
    }

    /// Build a record from stored fields (loading a project document).
    pub(crate) fn from_stored(
        id: OpId,
        operation: Operation,
        target: Option<LayerId>,
        output: BitmapRef,
        output_layer: Option<BitmapRef>,
        created_at: DateTime<Utc>,
        note: Option<String>,
    ) -> Self {
        Self {
            id,
            operation,
            target,
            output,
            output_layer,
            created_at,
            note,
        }
    }

    /// Record id.
    pub fn id(&self) -> &OpId {
        &self.id
    }

    /// The recorded edit and its parameters.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Target layer, or `None` for a whole-project (legacy) record.
    pub fn target(&self) -> Option<&LayerId> {
        self.target.as_ref()
    }

    /// Whole-project output (composite captured when the record was applied).
    pub fn output(&self) -> &BitmapRef {
        &self.output
    }

    /// Per-layer derived bitmap, if recorded.
    pub fn output_layer(&self) -> Option<&BitmapRef> {
        self.output_layer.as_ref()
    }

    /// Bitmap the compositor uses for the target layer: the per-layer output, falling back to
    /// the whole-project output for legacy records.
    pub fn effective_output(&self) -> &BitmapRef {
        self.output_layer.as_ref().unwrap_or(&self.output)
    }

    /// Every bitmap handle this record owns.
    pub fn outputs(&self) -> impl Iterator<Item = &BitmapRef> {
        std::iter::once(&self.output).chain(self.output_layer.as_ref())
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Human-readable summary.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}
