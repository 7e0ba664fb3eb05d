use crate::foundation::error::{StudioError, StudioResult};

/// Minimum length of a caller-supplied id prefix.
pub const MIN_PREFIX_LEN: usize = 6;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh random (v4 UUID) identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Wrap an existing identifier string.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First eight characters, for listings.
            pub fn short(&self) -> &str {
                let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
                &self.0[..end]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Opaque, immutable identifier of a layer.
    LayerId
);

string_id!(
    /// Opaque identifier of an operation record.
    OpId
);

string_id!(
    /// Opaque handle of a bitmap held by a [`crate::BitmapStore`].
    ///
    /// Handles look like relative paths (`layers/<id>.png`) so a directory-backed store can use
    /// them as-is.
    BitmapRef
);

impl BitmapRef {
    /// Handle of a layer's imported bitmap.
    pub fn layer_source(layer: &LayerId) -> Self {
        Self(format!("layers/{layer}.png"))
    }

    /// Handle of the layer bitmap derived by an operation.
    pub fn op_layer_output(op: &OpId) -> Self {
        Self(format!("ops/{op}_layer.png"))
    }

    /// Handle of the project composite captured right after an operation.
    pub fn op_composite_output(op: &OpId) -> Self {
        Self(format!("ops/{op}_composite.png"))
    }
}

/// Resolve `query` against `candidates` by exact match or unique prefix.
///
/// Returns the index of the matching candidate. Queries shorter than [`MIN_PREFIX_LEN`] are
/// rejected before matching, zero matches is `NotFound` and several matches is
/// `AmbiguousReference`. `what` names the id kind in error messages.
pub fn resolve_prefix<'a, I>(what: &str, query: &str, candidates: I) -> StudioResult<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    if query.chars().count() < MIN_PREFIX_LEN {
        return Err(StudioError::ambiguous(format!(
            "{what} id '{query}' is shorter than {MIN_PREFIX_LEN} characters"
        )));
    }

    let mut found: Option<usize> = None;
    let mut matches = 0usize;
    for (i, id) in candidates.into_iter().enumerate() {
        if id == query {
            return Ok(i);
        }
        if id.starts_with(query) {
            matches += 1;
            found.get_or_insert(i);
        }
    }

    match (matches, found) {
        (1, Some(i)) => Ok(i),
        (0, _) | (_, None) => Err(StudioError::not_found(format!("no {what} matches '{query}'"))),
        (n, _) => Err(StudioError::ambiguous(format!(
            "{what} id '{query}' matches {n} candidates"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/ids.rs"]
mod tests;
