//! Generation Pipeline - Single Entry Point
//!
//! config -> layer resolution -> combinations -> task plan -> script.
//! CRITICAL: generate MUST go through plan, which always runs the plan checks. No bypass.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::{ConfigError, GenerationConfig};
use crate::export::ExportSettings;
use crate::hashing::{compute_plan_hash, compute_script_hash};
use crate::planner::{check_plan_size, plan_tasks_with, PlanError, RenderTask, TaskPlan};
use crate::resolve::{resolve_layer, ResolveError};
use crate::script::{emit_script, EmitError, ScriptContext};
use crate::templates::{LayerCandidate, LayerSource, LayerSourceError, ManifestLayerSource};
use crate::validation::{FailureMode, PlanChecker, PlanWarning, WarningSeverity};
use crate::variation::enumerate_combinations;
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static PLAN_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_plan_call_count() -> u32 {
    PLAN_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_plan_call_count() {
    PLAN_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    LayerSource(#[from] LayerSourceError),

    #[error("Layer resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("Script emission failed: {0}")]
    Emit(#[from] EmitError),

    #[error("Plan warnings block generation: {0}")]
    WarningsBlocked(String),

    #[error("Config requires engine >= {0}, current is {1}")]
    EngineVersionMismatch(String, String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Where the run's layer came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayerOrigin {
    Resolved,
    /// Manually configured id, template offered no usable candidate
    Fallback,
}

/// A fully resolved run, ready for emission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRun {
    pub template_path: PathBuf,
    pub output_folder: PathBuf,
    pub layer: LayerCandidate,
    pub layer_origin: LayerOrigin,
    pub export: ExportSettings,
    pub plan: TaskPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedScript {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub template_path: PathBuf,
    pub output_folder: PathBuf,
    pub layer: LayerCandidate,
    pub layer_origin: LayerOrigin,
    pub task_count: usize,
    pub combination_count: usize,
    pub warnings: Vec<PlanWarning>,
    pub plan_hash: String,
    pub script_hash: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanFingerprint<'a> {
    template_path: &'a Path,
    output_folder: &'a Path,
    layer: &'a LayerCandidate,
    export: &'a ExportSettings,
    tasks: &'a [RenderTask],
}

/// The generation pipeline - single entry point for script generation
pub struct GenerationPipeline<S = ManifestLayerSource> {
    source: S,
    checker: PlanChecker,
}

impl<S: LayerSource> GenerationPipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            checker: PlanChecker::new(),
        }
    }

    /// Replaceable layers of a template, as the layer source reports them
    pub fn list_layers(&self, template: &Path) -> Result<Vec<LayerCandidate>, PipelineError> {
        Ok(self.source.list_replaceable_layers(template)?)
    }

    /// Decide the run's target layer, falling back to the configured id
    /// only when the template offers nothing to choose from.
    pub fn resolve(&self, config: &GenerationConfig) -> Result<(LayerCandidate, LayerOrigin), PipelineError> {
        let requested = config.smart_object_name.as_deref();
        let fallback = config.fallback_layer.as_ref();

        let candidates = match self.source.list_replaceable_layers(&config.template_path) {
            Ok(candidates) => candidates,
            Err(err) => {
                return match fallback {
                    Some(layer) => {
                        tracing::warn!(error = %err, id = layer.id, "layer source failed, using fallback layer");
                        Ok((layer.to_candidate(), LayerOrigin::Fallback))
                    }
                    None => Err(err.into()),
                };
            }
        };
        tracing::debug!(candidates = candidates.len(), "listed replaceable layers");

        match (resolve_layer(requested, &candidates), fallback) {
            (Ok(layer), _) => Ok((layer, LayerOrigin::Resolved)),
            (Err(ResolveError::NoReplaceableLayer), Some(layer)) => {
                tracing::warn!(id = layer.id, "template has no replaceable layer, using fallback layer");
                Ok((layer.to_candidate(), LayerOrigin::Fallback))
            }
            (Err(err), _) => Err(err.into()),
        }
    }

    /// Resolve and plan without emitting. Warnings are attached, never fatal here.
    #[tracing::instrument(skip(self, config), fields(template = %config.template_path.display()))]
    pub fn plan(&self, config: &GenerationConfig) -> Result<PlannedRun, PipelineError> {
        #[cfg(feature = "test-hooks")]
        PLAN_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        check_engine_version(config)?;
        config.validate()?;

        let (layer, layer_origin) = self.resolve(config)?;
        let axes = config.variation_axes();
        let artwork = config.artwork_entries();
        check_plan_size(artwork.len(), axes.combination_count(), config.plan_limits())?;
        let combinations = enumerate_combinations(&axes);
        let plan = plan_tasks_with(&artwork, &combinations, config.plan_limits(), &self.checker)?;

        log_warnings(&plan.warnings, config.on_warning);
        tracing::info!(
            layer = %layer.display_name,
            artwork = artwork.len(),
            combinations = combinations.len(),
            tasks = plan.len(),
            "planned run"
        );

        Ok(PlannedRun {
            template_path: config.template_path.clone(),
            output_folder: config.resolved_output_folder(),
            layer,
            layer_origin,
            export: config.export,
            plan,
        })
    }

    /// Generate the automation script.
    ///
    /// Fails without partial output on resolution, size, or blocking warnings.
    #[tracing::instrument(skip(self, config), fields(template = %config.template_path.display()))]
    pub fn generate(&self, config: &GenerationConfig) -> Result<GeneratedScript, PipelineError> {
        let run = self.plan(config)?;

        if config.on_warning.blocks(&run.plan.warnings) {
            let messages: Vec<_> = run.plan.warnings.iter()
                .filter(|w| w.severity == WarningSeverity::Warning)
                .map(|w| format!("{}: {}", w.rule, w.message))
                .collect();
            return Err(PipelineError::WarningsBlocked(messages.join("; ")));
        }

        let ctx = ScriptContext {
            layer: Some(&run.layer),
            template_path: &run.template_path,
            output_folder: &run.output_folder,
            export: run.export,
        };
        let script = emit_script(&ctx, &run.plan.tasks)?;

        let plan_hash = compute_plan_hash(
            &PlanFingerprint {
                template_path: &run.template_path,
                output_folder: &run.output_folder,
                layer: &run.layer,
                export: &run.export,
                tasks: &run.plan.tasks,
            },
            ENGINE_VERSION,
        )?;
        let script_hash = compute_script_hash(&script);
        tracing::info!(tasks = run.plan.len(), bytes = script.len(), %plan_hash, "generated script");

        Ok(GeneratedScript {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            task_count: run.plan.len(),
            combination_count: run.plan.combination_count,
            template_path: run.template_path,
            output_folder: run.output_folder,
            layer: run.layer,
            layer_origin: run.layer_origin,
            warnings: run.plan.warnings,
            plan_hash,
            script_hash,
            script,
        })
    }
}

fn check_engine_version(config: &GenerationConfig) -> Result<(), PipelineError> {
    let Some(required) = &config.engine_min_version else {
        return Ok(());
    };
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| ConfigError::Invalid("Invalid engine version".into()))?;
    let min_ver = semver::Version::parse(required)
        .map_err(|_| ConfigError::Invalid(format!("Invalid engineMinVersion: {required}")))?;

    if engine_ver < min_ver {
        return Err(PipelineError::EngineVersionMismatch(
            required.clone(),
            ENGINE_VERSION.to_string(),
        ));
    }
    Ok(())
}

fn log_warnings(warnings: &[PlanWarning], mode: FailureMode) {
    for warning in warnings {
        match (mode, warning.severity) {
            (FailureMode::Log, _) | (_, WarningSeverity::Info) => {
                tracing::debug!(rule = %warning.rule, "{}", warning.message)
            }
            _ => tracing::warn!(rule = %warning.rule, "{}", warning.message),
        }
    }
}

impl Default for GenerationPipeline {
    fn default() -> Self {
        Self::new(ManifestLayerSource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerOverride;
    use crate::templates::StaticLayerSource;

    fn pipeline(layers: Vec<LayerCandidate>) -> GenerationPipeline<StaticLayerSource> {
        GenerationPipeline::new(StaticLayerSource::new().with("/t/shirt.psd", layers))
    }

    #[test]
    fn test_fallback_used_only_without_candidates() {
        let mut config = GenerationConfig::new("/t/shirt.psd");
        config.fallback_layer = Some(LayerOverride { id: 77, name: None });

        let (layer, origin) = pipeline(vec![]).resolve(&config).unwrap();
        assert_eq!((layer.identifier, origin), (77, LayerOrigin::Fallback));

        let (layer, origin) = pipeline(vec![LayerCandidate::new("Design", 3)]).resolve(&config).unwrap();
        assert_eq!((layer.identifier, origin), (3, LayerOrigin::Resolved));
    }

    #[test]
    fn test_fallback_never_hides_ambiguity() {
        let mut config = GenerationConfig::new("/t/shirt.psd");
        config.fallback_layer = Some(LayerOverride { id: 77, name: None });
        let layers = vec![LayerCandidate::new("A", 1), LayerCandidate::new("B", 2)];

        let err = pipeline(layers).resolve(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Resolve(ResolveError::AmbiguousLayer { .. })));
    }

    #[test]
    fn test_source_failure_distinct_from_empty() {
        let config = GenerationConfig::new("/t/unknown.psd");
        let err = pipeline(vec![]).resolve(&config).unwrap_err();
        assert!(matches!(err, PipelineError::LayerSource(LayerSourceError::Unreadable { .. })));

        let config = GenerationConfig::new("/t/shirt.psd");
        let err = pipeline(vec![]).resolve(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Resolve(ResolveError::NoReplaceableLayer)));
    }

    #[test]
    fn test_engine_version_gate() {
        let mut config = GenerationConfig::new("/t/shirt.psd").with_artwork("/a.png");
        config.engine_min_version = Some("99.0.0".into());
        let err = pipeline(vec![LayerCandidate::new("Design", 3)]).plan(&config).unwrap_err();
        assert!(matches!(err, PipelineError::EngineVersionMismatch(..)));

        config.engine_min_version = Some("not-a-version".into());
        let err = pipeline(vec![LayerCandidate::new("Design", 3)]).plan(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Config(ConfigError::Invalid(_))));
    }
}
