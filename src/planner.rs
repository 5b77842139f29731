//! Task Planning - Artwork x Combination
//!
//! Order is a contract: outer loop over artwork in user order,
//! inner loop over combinations in enumeration order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::{output_name, ArtworkEntry};
use crate::validation::{PlanChecker, PlanWarning};
use crate::variation::Combination;

pub const DEFAULT_MAX_TASKS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Plan too large: {artwork} artwork x {combinations} combinations = {tasks} tasks exceeds limit of {limit}")]
    PlanTooLarge {
        artwork: usize,
        combinations: usize,
        tasks: usize,
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_tasks: usize,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self { max_tasks: DEFAULT_MAX_TASKS }
    }
}

/// One rendered output: one artwork placed with one combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTask {
    pub task_index: usize,
    pub artwork_index: usize,
    pub artwork: ArtworkEntry,
    pub combination: Combination,
    pub combination_index: usize,
    /// File name without extension
    pub output_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPlan {
    pub tasks: Vec<RenderTask>,
    pub combination_count: usize,
    pub warnings: Vec<PlanWarning>,
}

impl TaskPlan {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Reject an `artwork x combinations` product above the ceiling.
///
/// Callers run this before enumerating, so oversized axes never allocate.
pub fn check_plan_size(
    artwork: usize,
    combinations: usize,
    limits: PlanLimits,
) -> Result<(), PlanError> {
    let tasks = artwork.saturating_mul(combinations);
    if tasks > limits.max_tasks {
        return Err(PlanError::PlanTooLarge {
            artwork,
            combinations,
            tasks,
            limit: limits.max_tasks,
        });
    }
    Ok(())
}

/// Build the full task list and run the plan checks over it.
///
/// The size ceiling is checked before the task list is allocated.
pub fn plan_tasks(
    artwork: &[ArtworkEntry],
    combinations: &[Combination],
    limits: PlanLimits,
) -> Result<TaskPlan, PlanError> {
    plan_tasks_with(artwork, combinations, limits, &PlanChecker::new())
}

pub fn plan_tasks_with(
    artwork: &[ArtworkEntry],
    combinations: &[Combination],
    limits: PlanLimits,
    checker: &PlanChecker,
) -> Result<TaskPlan, PlanError> {
    let total = combinations.len();
    check_plan_size(artwork.len(), total, limits)?;

    let mut tasks = Vec::with_capacity(artwork.len() * total);
    for (artwork_index, entry) in artwork.iter().enumerate() {
        for (combination_index, combination) in combinations.iter().enumerate() {
            tasks.push(RenderTask {
                task_index: tasks.len(),
                artwork_index,
                artwork: entry.clone(),
                combination: *combination,
                combination_index,
                output_name: output_name(entry, combination_index, total),
            });
        }
    }

    let warnings = checker.check(&tasks);
    tracing::debug!(tasks = tasks.len(), warnings = warnings.len(), "planned tasks");

    Ok(TaskPlan {
        tasks,
        combination_count: total,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variation::{enumerate_combinations, VariationAxes, VariationAxis};

    fn artwork(names: &[&str]) -> Vec<ArtworkEntry> {
        names.iter().map(|n| ArtworkEntry::from_path(*n)).collect()
    }

    #[test]
    fn test_size_check_saturates() {
        let limits = PlanLimits { max_tasks: 10 };
        assert!(check_plan_size(2, 5, limits).is_ok());
        assert_eq!(
            check_plan_size(usize::MAX, 3, limits),
            Err(PlanError::PlanTooLarge {
                artwork: usize::MAX,
                combinations: 3,
                tasks: usize::MAX,
                limit: 10,
            })
        );
    }

    #[test]
    fn test_outer_artwork_inner_combination() {
        let axes = VariationAxes {
            tilt: VariationAxis::enabled(vec![-5.0, 0.0, 5.0]),
            ..Default::default()
        };
        let combos = enumerate_combinations(&axes);
        let plan = plan_tasks(&artwork(&["a.png", "b.png"]), &combos, PlanLimits::default()).unwrap();

        let order: Vec<_> = plan
            .tasks
            .iter()
            .map(|t| (t.artwork.base_name.as_str(), t.combination.tilt))
            .collect();
        assert_eq!(
            order,
            vec![("a", -5.0), ("a", 0.0), ("a", 5.0), ("b", -5.0), ("b", 0.0), ("b", 5.0)]
        );
        assert!(plan.tasks.iter().enumerate().all(|(i, t)| t.task_index == i));
        assert_eq!(plan.combination_count, 3);
    }

    #[test]
    fn test_empty_artwork_gives_empty_plan() {
        let plan = plan_tasks(&[], &[Combination::NEUTRAL], PlanLimits::default()).unwrap();
        assert!(plan.is_empty());
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        let combos = vec![Combination::NEUTRAL; 5];
        let art = artwork(&["a.png", "b.png"]);

        assert_eq!(plan_tasks(&art, &combos, PlanLimits { max_tasks: 10 }).unwrap().len(), 10);

        let err = plan_tasks(&art, &combos, PlanLimits { max_tasks: 9 }).unwrap_err();
        assert_eq!(
            err,
            PlanError::PlanTooLarge { artwork: 2, combinations: 5, tasks: 10, limit: 9 }
        );
    }

    #[test]
    fn test_duplicate_base_names_warned() {
        let art = vec![
            ArtworkEntry::from_path("front/shirt.png"),
            ArtworkEntry::from_path("back/shirt.png"),
        ];
        let plan = plan_tasks(&art, &[Combination::NEUTRAL], PlanLimits::default()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.warnings.len(), 1);
        assert_eq!(plan.warnings[0].rule, "duplicate_output_name");
    }
}
