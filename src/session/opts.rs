use crate::foundation::ids::BitmapRef;

/// Default handle of the latest composite.
pub const DEFAULT_COMPOSITE_REF: &str = "composite.png";

/// Options controlling a [`crate::Session`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOpts {
    /// Re-render and store the composite after every command that can change visible output.
    pub render_on_mutation: bool,
    /// Remove derived bitmaps of truncated or deleted records as soon as a command commits.
    ///
    /// When disabled, they are queued until [`crate::Session::collect_garbage`] is called.
    pub collect_garbage: bool,
    /// Handle under which the latest composite is stored.
    pub composite_ref: BitmapRef,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            render_on_mutation: true,
            collect_garbage: true,
            composite_ref: BitmapRef::new(DEFAULT_COMPOSITE_REF),
        }
    }
}
