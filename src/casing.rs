//! Separates "unknown name" from "known name in the wrong case".

use crate::LookupError;

/// A per-cluster name table that can be checked for casing mistakes.
pub(crate) trait KnownNames {
    /// Exact-case membership test.
    fn has_name(&self, name: &str) -> bool;

    /// Every name in the table, in table order.
    fn known_names(&self) -> impl Iterator<Item = &str>;
}

/// Fails if `requested` is absent from `table` but matches one of its names
/// when letter case is ignored.
///
/// Returns `Ok(())` both for an exact hit and for a name with no
/// case-insensitive match at all; the caller's exact lookup then decides
/// between found and not found.
pub(crate) fn enforce_casing(
    requested: &str,
    table: &impl KnownNames,
) -> Result<(), LookupError> {
    if table.has_name(requested) {
        return Ok(());
    }

    let folded = requested.to_lowercase();
    match table.known_names().find(|name| name.to_lowercase() == folded) {
        Some(suggestion) => Err(LookupError::AmbiguousCasing {
            requested: requested.to_string(),
            suggestion: suggestion.to_string(),
        }),
        None => Ok(()),
    }
}
