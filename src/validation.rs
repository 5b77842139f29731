//! Plan Checks - Rule/Policy Separation
//!
//! Rules inspect a finished task list and produce structured warnings.
//! Policy (`FailureMode`) is applied by the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::planner::RenderTask;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanWarning {
    pub rule: String,
    pub severity: WarningSeverity,
    pub message: String,
    /// Output names involved, in task order
    pub outputs: Vec<String>,
    pub remediation: Vec<String>,
}

/// What the caller does with warnings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Any `Warning` severity aborts the run
    Block,
    #[default]
    Warn,
    Log,
}

impl FailureMode {
    pub fn blocks(&self, warnings: &[PlanWarning]) -> bool {
        *self == FailureMode::Block
            && warnings.iter().any(|w| w.severity == WarningSeverity::Warning)
    }
}

/// Plan rule trait - produces warnings
pub trait PlanRule {
    fn name(&self) -> &'static str;
    fn check(&self, tasks: &[RenderTask]) -> Vec<PlanWarning>;
}

// --- Concrete Rules ---

/// Two tasks writing the same file. Compared ASCII case-insensitively.
pub struct DuplicateOutputNameRule;

impl PlanRule for DuplicateOutputNameRule {
    fn name(&self) -> &'static str { "duplicate_output_name" }

    fn check(&self, tasks: &[RenderTask]) -> Vec<PlanWarning> {
        let mut groups: BTreeMap<String, Vec<&RenderTask>> = BTreeMap::new();
        for task in tasks {
            groups.entry(task.output_name.to_ascii_lowercase()).or_default().push(task);
        }

        let mut collisions: Vec<Vec<&RenderTask>> = groups
            .into_values()
            .filter(|group| group.len() > 1)
            .collect();
        collisions.sort_by_key(|group| group[0].task_index);

        collisions
            .into_iter()
            .map(|group| {
                let sources: Vec<String> = group
                    .iter()
                    .map(|t| t.artwork.source_path.display().to_string())
                    .collect();
                PlanWarning {
                    rule: self.name().to_string(),
                    severity: WarningSeverity::Warning,
                    message: format!(
                        "Output name '{}' is produced {} times ({})",
                        group[0].output_name,
                        group.len(),
                        sources.join(", ")
                    ),
                    outputs: group.iter().map(|t| t.output_name.clone()).collect(),
                    remediation: vec![
                        "Give each artwork a distinct output name".to_string(),
                        "Later exports overwrite earlier ones otherwise".to_string(),
                    ],
                }
            })
            .collect()
    }
}

/// Scale at or below zero cannot be rendered meaningfully.
pub struct DegenerateTransformRule;

impl PlanRule for DegenerateTransformRule {
    fn name(&self) -> &'static str { "degenerate_transform" }

    fn check(&self, tasks: &[RenderTask]) -> Vec<PlanWarning> {
        let affected: Vec<&RenderTask> = tasks
            .iter()
            .filter(|t| t.combination.scale <= 0.0)
            .collect();
        if affected.is_empty() {
            return vec![];
        }

        vec![PlanWarning {
            rule: self.name().to_string(),
            severity: WarningSeverity::Warning,
            message: format!("{} task(s) use a scale of 0% or less", affected.len()),
            outputs: affected.iter().map(|t| t.output_name.clone()).collect(),
            remediation: vec!["Use positive scale percentages (100 = original size)".to_string()],
        }]
    }
}

/// Identical combinations render identical images under different names.
pub struct RepeatedCombinationRule;

impl PlanRule for RepeatedCombinationRule {
    fn name(&self) -> &'static str { "repeated_combination" }

    fn check(&self, tasks: &[RenderTask]) -> Vec<PlanWarning> {
        let Some(first) = tasks.first() else {
            return vec![];
        };
        // Every artwork shares the same combination list; one pass suffices.
        let per_artwork: Vec<&RenderTask> = tasks
            .iter()
            .take_while(|t| t.artwork_index == first.artwork_index)
            .collect();

        let mut repeated = vec![];
        for (i, task) in per_artwork.iter().enumerate() {
            if per_artwork[..i].iter().any(|prev| prev.combination == task.combination) {
                repeated.push(task.combination_index + 1);
            }
        }
        if repeated.is_empty() {
            return vec![];
        }

        let labels: Vec<String> = repeated.iter().map(|n| format!("v{n}")).collect();
        vec![PlanWarning {
            rule: self.name().to_string(),
            severity: WarningSeverity::Info,
            message: format!("Variations {} repeat an earlier combination", labels.join(", ")),
            outputs: labels,
            remediation: vec!["Remove duplicate values from the variation axes".to_string()],
        }]
    }
}

/// Runs every rule over a plan
pub struct PlanChecker {
    rules: Vec<Box<dyn PlanRule>>,
}

impl PlanChecker {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DuplicateOutputNameRule),
                Box::new(DegenerateTransformRule),
                Box::new(RepeatedCombinationRule),
            ],
        }
    }

    pub fn check(&self, tasks: &[RenderTask]) -> Vec<PlanWarning> {
        self.rules.iter().flat_map(|rule| rule.check(tasks)).collect()
    }
}

impl Default for PlanChecker {
    fn default() -> Self {
        Self::new()
    }
}
