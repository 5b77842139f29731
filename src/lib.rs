//! MockupGen Core - Mockup Script Compiler
//!
//! Turns one template with a replaceable smart object layer plus a set of
//! artwork images into an automation script the image host runs to batch
//! render composited mockups.
//!
//! # Guarantees
//! 1. Pure Pipeline: identical config, identical script
//! 2. Ambiguity Is Reported, Never Guessed
//! 3. The Template Is Never Saved
//! 4. One Task, One Output, One Instruction Block

pub mod variation;
pub mod templates;
pub mod resolve;
pub mod naming;
pub mod planner;
pub mod validation;
pub mod export;
pub mod script;
pub mod config;
pub mod hashing;
pub mod pipeline;

pub use variation::{enumerate_combinations, Combination, Offset, VariationAxes, VariationAxis};
pub use templates::{LayerCandidate, LayerSource, LayerSourceError, ManifestLayerSource, StaticLayerSource};
pub use resolve::{resolve_layer, ResolveError};
pub use naming::{output_name, ArtworkEntry};
pub use planner::{check_plan_size, plan_tasks, PlanError, PlanLimits, RenderTask, TaskPlan};
pub use validation::{FailureMode, PlanWarning, WarningSeverity};
pub use export::{ExportFormat, ExportSettings};
pub use script::{emit_script, EmitError, ScriptContext};
pub use config::{ConfigError, GenerationConfig};
pub use hashing::{canonical_json, compute_plan_hash};
pub use pipeline::{GeneratedScript, GenerationPipeline, LayerOrigin, PipelineError, PlannedRun};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
