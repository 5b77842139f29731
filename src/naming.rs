//! Output Naming - Deterministic, Collision-Free File Names

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default suffix when the user did not choose an output name
pub const DEFAULT_NAME_SUFFIX: &str = "_mockup";

/// An artwork file queued for placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkEntry {
    pub source_path: PathBuf,
    /// File name without its last extension
    pub base_name: String,
    #[serde(default)]
    pub user_output_name: Option<String>,
}

impl ArtworkEntry {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let source_path = path.into();
        let base_name = base_name_of(&source_path);
        Self {
            source_path,
            base_name,
            user_output_name: None,
        }
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.user_output_name = Some(name.into());
        self
    }

    pub fn rename(&mut self, name: Option<String>) {
        self.user_output_name = name;
    }
}

/// `shirt.front.png` becomes `shirt.front`; dotfiles keep their name.
fn base_name_of(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name[..idx].to_string(),
        _ => file_name,
    }
}

/// User-chosen name if non-blank, else `{base_name}_mockup`.
pub fn base_output_name(artwork: &ArtworkEntry) -> String {
    match artwork.user_output_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}{}", artwork.base_name, DEFAULT_NAME_SUFFIX),
    }
}

/// Output file name (no extension) for combination `index` of `total`.
///
/// A single combination keeps the base name. Otherwise `_v{index+1}` is
/// appended, zero-padded to the digit count of `total`.
pub fn output_name(artwork: &ArtworkEntry, index: usize, total: usize) -> String {
    let base = base_output_name(artwork);
    if total <= 1 {
        return base;
    }
    let width = digit_width(total);
    format!("{}_v{:0width$}", base, index + 1, width = width)
}

fn digit_width(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_strips_last_extension() {
        assert_eq!(ArtworkEntry::from_path("/art/shirt.front.png").base_name, "shirt.front");
        assert_eq!(ArtworkEntry::from_path("/art/plain").base_name, "plain");
        assert_eq!(ArtworkEntry::from_path("/art/.hidden").base_name, ".hidden");
    }

    #[test]
    fn test_default_and_user_base() {
        let art = ArtworkEntry::from_path("artwork.png");
        assert_eq!(base_output_name(&art), "artwork_mockup");
        assert_eq!(base_output_name(&art.clone().with_output_name("  ")), "artwork_mockup");
        assert_eq!(base_output_name(&art.with_output_name(" Hero Shot ")), "Hero Shot");
    }

    #[test]
    fn test_single_combination_has_no_suffix() {
        let art = ArtworkEntry::from_path("artwork.png");
        assert_eq!(output_name(&art, 0, 1), "artwork_mockup");
    }

    #[test]
    fn test_suffix_padded_to_total_width() {
        let art = ArtworkEntry::from_path("artwork.png");
        assert_eq!(output_name(&art, 0, 2), "artwork_mockup_v1");
        assert_eq!(output_name(&art, 1, 2), "artwork_mockup_v2");
        assert_eq!(output_name(&art, 0, 12), "artwork_mockup_v01");
        assert_eq!(output_name(&art, 11, 12), "artwork_mockup_v12");
        assert_eq!(output_name(&art, 9, 100), "artwork_mockup_v010");
    }

    #[test]
    fn test_rename_updates_output() {
        let mut art = ArtworkEntry::from_path("cover.jpg");
        art.rename(Some("final".into()));
        assert_eq!(output_name(&art, 2, 3), "final_v3");
        art.rename(None);
        assert_eq!(output_name(&art, 2, 3), "cover_mockup_v3");
    }
}
