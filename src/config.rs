//! Generation Config - Pipeline Input
//!
//! Axis values arrive either as JSON lists or as the raw text users type
//! (`"95, 105"`, `"-20,0; 20,0"`). Both are normalized here, so nothing
//! downstream ever sees malformed axis input.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::export::ExportSettings;
use crate::naming::ArtworkEntry;
use crate::planner::{PlanLimits, DEFAULT_MAX_TASKS};
use crate::templates::{LayerCandidate, LayerId};
use crate::validation::FailureMode;
use crate::variation::{
    parse_number_list, parse_offset_list, Offset, VariationAxes, VariationAxis, NEUTRAL_OFFSET,
    NEUTRAL_ROTATION, NEUTRAL_SCALE, NEUTRAL_TILT,
};

/// Folder created next to the template when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub template_path: PathBuf,
    #[serde(default)]
    pub output_folder: Option<PathBuf>,
    /// Blank means auto-detect
    #[serde(default)]
    pub smart_object_name: Option<String>,
    #[serde(default)]
    pub fallback_layer: Option<LayerOverride>,
    #[serde(default)]
    pub artwork: Vec<ArtworkSpec>,
    #[serde(default)]
    pub variations: VariationSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
    #[serde(default)]
    pub on_warning: FailureMode,
    #[serde(default)]
    pub engine_min_version: Option<String>,
}

fn default_max_tasks() -> usize { DEFAULT_MAX_TASKS }

impl GenerationConfig {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            output_folder: None,
            smart_object_name: None,
            fallback_layer: None,
            artwork: vec![],
            variations: VariationSettings::default(),
            export: ExportSettings::default(),
            max_tasks: DEFAULT_MAX_TASKS,
            on_warning: FailureMode::default(),
            engine_min_version: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("templatePath must not be empty".into()));
        }
        if let Some((index, _)) = self
            .artwork
            .iter()
            .enumerate()
            .find(|(_, a)| a.path.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid(format!("artwork[{index}].path must not be empty")));
        }
        self.export.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn with_artwork(mut self, path: impl Into<PathBuf>) -> Self {
        self.artwork.push(ArtworkSpec { path: path.into(), output_name: None });
        self
    }

    /// Configured folder, else `output/` beside the template
    pub fn resolved_output_folder(&self) -> PathBuf {
        match &self.output_folder {
            Some(folder) => folder.clone(),
            None => self
                .template_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn artwork_entries(&self) -> Vec<ArtworkEntry> {
        self.artwork
            .iter()
            .map(|spec| {
                let mut entry = ArtworkEntry::from_path(&spec.path);
                entry.rename(spec.output_name.clone());
                entry
            })
            .collect()
    }

    pub fn variation_axes(&self) -> VariationAxes {
        self.variations.normalize()
    }

    pub fn plan_limits(&self) -> PlanLimits {
        PlanLimits { max_tasks: self.max_tasks }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub output_name: Option<String>,
}

/// Manually supplied layer id, used when the template offers no candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerOverride {
    pub id: LayerId,
    #[serde(default)]
    pub name: Option<String>,
}

impl LayerOverride {
    pub fn to_candidate(&self) -> LayerCandidate {
        let name = self
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Layer {}", self.id));
        LayerCandidate::new(name, self.id)
    }
}

/// Raw axis values: a list, or user-typed text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AxisInput<V> {
    List(Vec<V>),
    Text(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AxisConfig<V> {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub values: Option<AxisInput<V>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariationSettings {
    #[serde(default)]
    pub scale: AxisConfig<f64>,
    #[serde(default)]
    pub offset: AxisConfig<Offset>,
    #[serde(default)]
    pub tilt: AxisConfig<f64>,
    #[serde(default)]
    pub rotation: AxisConfig<f64>,
}

impl VariationSettings {
    /// Values used when an axis is enabled without explicit values
    pub fn presets() -> VariationAxes {
        VariationAxes {
            scale: VariationAxis::enabled(vec![95.0, 105.0]),
            offset: VariationAxis::enabled(vec![Offset::new(-20.0, 0.0), Offset::new(20.0, 0.0)]),
            tilt: VariationAxis::enabled(vec![-5.0, 5.0]),
            rotation: VariationAxis::enabled(vec![-3.0, 3.0]),
        }
    }

    pub fn normalize(&self) -> VariationAxes {
        let presets = Self::presets();
        VariationAxes {
            scale: normalize_numbers(&self.scale, presets.scale.values, NEUTRAL_SCALE),
            offset: normalize_axis(
                &self.offset,
                presets.offset.values,
                NEUTRAL_OFFSET,
                parse_offset_list,
                |o: &Offset| o.x.is_finite() && o.y.is_finite(),
            ),
            tilt: normalize_numbers(&self.tilt, presets.tilt.values, NEUTRAL_TILT),
            rotation: normalize_numbers(&self.rotation, presets.rotation.values, NEUTRAL_ROTATION),
        }
    }
}

fn normalize_numbers(config: &AxisConfig<f64>, preset: Vec<f64>, neutral: f64) -> VariationAxis<f64> {
    normalize_axis(config, preset, neutral, parse_number_list, |v: &f64| v.is_finite())
}

fn normalize_axis<V: Clone>(
    config: &AxisConfig<V>,
    preset: Vec<V>,
    neutral: V,
    parse: fn(&str) -> Vec<V>,
    valid: fn(&V) -> bool,
) -> VariationAxis<V> {
    if !config.enabled {
        return VariationAxis::disabled();
    }
    let values: Vec<V> = match &config.values {
        None => preset,
        Some(AxisInput::List(values)) => values.iter().filter(|v| valid(v)).cloned().collect(),
        Some(AxisInput::Text(text)) => parse(text),
    };
    if values.is_empty() {
        VariationAxis::enabled(vec![neutral])
    } else {
        VariationAxis::enabled(values)
    }
}
