//! Template Layer Sources - Replaceable Layer Discovery
//!
//! The template's native layer format is parsed elsewhere. Sources here only
//! hand over the flat list of replaceable (smart object) layers.
//!
//! An empty list and an unreadable template are different outcomes:
//! `Ok(vec![])` means the template has no replaceable layer,
//! `Err(_)` means the template could not be inspected at all.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separator between group names in `tree_path`
pub const TREE_PATH_SEPARATOR: &str = " > ";

/// Sidecar suffix read by [`ManifestLayerSource`]
pub const MANIFEST_SUFFIX: &str = "layers.json";

pub type LayerId = u32;

/// A replaceable layer as reported by the template parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCandidate {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "id")]
    pub identifier: LayerId,
    #[serde(rename = "path", default)]
    pub tree_path: String,
}

impl LayerCandidate {
    pub fn new(display_name: impl Into<String>, identifier: LayerId) -> Self {
        let display_name = display_name.into();
        Self {
            tree_path: display_name.clone(),
            display_name,
            identifier,
        }
    }

    /// Place the layer under nested groups, outermost first.
    pub fn within(mut self, groups: &[&str]) -> Self {
        let mut parts: Vec<&str> = groups.to_vec();
        parts.push(&self.display_name);
        self.tree_path = parts.join(TREE_PATH_SEPARATOR);
        self
    }
}

#[derive(Debug, Error)]
pub enum LayerSourceError {
    #[error("Template layers unreadable for {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Template layer list malformed for {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Supplies the replaceable layers of a template
pub trait LayerSource {
    fn list_replaceable_layers(&self, template: &Path) -> Result<Vec<LayerCandidate>, LayerSourceError>;
}

/// In-memory source keyed by template path
#[derive(Debug, Clone, Default)]
pub struct StaticLayerSource {
    layers: HashMap<PathBuf, Vec<LayerCandidate>>,
}

impl StaticLayerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: impl Into<PathBuf>, layers: Vec<LayerCandidate>) {
        self.layers.insert(template.into(), layers);
    }

    pub fn with(mut self, template: impl Into<PathBuf>, layers: Vec<LayerCandidate>) -> Self {
        self.register(template, layers);
        self
    }
}

impl LayerSource for StaticLayerSource {
    fn list_replaceable_layers(&self, template: &Path) -> Result<Vec<LayerCandidate>, LayerSourceError> {
        self.layers
            .get(template)
            .cloned()
            .ok_or_else(|| LayerSourceError::Unreadable {
                path: template.to_path_buf(),
                reason: "template not registered".to_string(),
            })
    }
}

/// Reads `<template>.layers.json` written by the external template parser.
///
/// Expected content: `[{ "name": "...", "id": 12, "path": "Group > name" }]`
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLayerSource;

impl ManifestLayerSource {
    pub fn manifest_path(template: &Path) -> PathBuf {
        let mut name = template.as_os_str().to_os_string();
        name.push(".");
        name.push(MANIFEST_SUFFIX);
        PathBuf::from(name)
    }
}

impl LayerSource for ManifestLayerSource {
    fn list_replaceable_layers(&self, template: &Path) -> Result<Vec<LayerCandidate>, LayerSourceError> {
        let manifest = Self::manifest_path(template);
        let content = fs::read_to_string(&manifest).map_err(|e| LayerSourceError::Unreadable {
            path: manifest.clone(),
            reason: e.to_string(),
        })?;
        let layers: Vec<LayerCandidate> = serde_json::from_str(&content).map_err(|e| {
            LayerSourceError::Malformed {
                path: manifest.clone(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(manifest = %manifest.display(), count = layers.len(), "loaded layer manifest");
        Ok(layers)
    }
}
