/// Convenience result type used across the studio core.
pub type StudioResult<T> = Result<T, StudioError>;

/// Top-level error taxonomy returned by every public entry point.
///
/// All variants are recoverable; none of them leaves a partially applied mutation behind.
#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    /// A layer or operation id did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// A prefix matched more than one candidate or was shorter than the minimum length.
    #[error("ambiguous reference: {0}")]
    AmbiguousReference(String),

    /// The mutation would break a structural rule (e.g. removing the last layer).
    #[error("guardrail violation: {0}")]
    GuardrailViolation(String),

    /// An out-of-range numeric input (opacity, tolerance, color channel).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The cursor already sits before the first operation.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The cursor already sits on the last operation.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Loaded state violates an invariant that could not be repaired.
    #[error("corrupt state: {0}")]
    CorruptState(String),

    /// Image decode or encode failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StudioError {
    /// Build a [`StudioError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`StudioError::AmbiguousReference`] value.
    pub fn ambiguous(msg: impl Into<String>) -> Self {
        Self::AmbiguousReference(msg.into())
    }

    /// Build a [`StudioError::GuardrailViolation`] value.
    pub fn guardrail(msg: impl Into<String>) -> Self {
        Self::GuardrailViolation(msg.into())
    }

    /// Build a [`StudioError::InvalidParameter`] value.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Build a [`StudioError::CorruptState`] value.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptState(msg.into())
    }

    /// Build a [`StudioError::Codec`] value.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
