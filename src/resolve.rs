//! Layer Resolution - One Target Layer Per Run
//!
//! Ambiguity is always reported. The resolver never guesses.

use thiserror::Error;

use crate::templates::LayerCandidate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Layer not found: {name}")]
    LayerNotFound { name: String, available: Vec<String> },

    #[error("No replaceable layer in template")]
    NoReplaceableLayer,

    #[error("Ambiguous layer: {} replaceable layers ({}); specify one by name", .candidates.len(), tree_paths(.candidates))]
    AmbiguousLayer { candidates: Vec<LayerCandidate> },
}

fn tree_paths(candidates: &[LayerCandidate]) -> String {
    candidates
        .iter()
        .map(|c| c.tree_path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pick the layer every task targets.
///
/// A blank or whitespace-only name means auto-detect. Otherwise the name is
/// matched exactly as given (case and surrounding spaces count), first match wins.
pub fn resolve_layer(
    requested: Option<&str>,
    candidates: &[LayerCandidate],
) -> Result<LayerCandidate, ResolveError> {
    let requested = requested.filter(|name| !name.trim().is_empty());

    match (requested, candidates) {
        (Some(name), _) => candidates
            .iter()
            .find(|c| c.display_name == name)
            .cloned()
            .ok_or_else(|| ResolveError::LayerNotFound {
                name: name.to_string(),
                available: candidates.iter().map(|c| c.display_name.clone()).collect(),
            }),
        (None, []) => Err(ResolveError::NoReplaceableLayer),
        (None, [only]) => Ok(only.clone()),
        (None, many) => Err(ResolveError::AmbiguousLayer {
            candidates: many.to_vec(),
        }),
    }
}
