//! `check` command diagnostics: cycle detection and requirement/capacity
//! sanity checks, reported the way the teacher's `diagnostics.rs` splits
//! text vs. JSON emission, scaled down to this engine's much smaller
//! diagnostic vocabulary (no severities beyond error/warning; no
//! file/line spans, since a fixture has none).

use rso_core::{Store, SchedulingError};
use rso_solver::topological_sort;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{tag}[{}]: {}", self.code, self.message)
    }
}

/// Runs cycle detection and a requirement-vs-capacity sweep against
/// `store`. A cycle is always fatal (`E-CYCLE`); an unmet capacity is a
/// warning (`W-CAPACITY`) unless `strict` escalates it.
pub fn run_check(store: &impl Store, strict: bool) -> rso_core::SchedulingResult<Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    let tasks = store.tasks()?;
    let task_ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
    let dependencies = store.all_dependencies()?;

    if let Err(SchedulingError::CycleDetected { tasks: cyclic }) =
        topological_sort(&task_ids, &dependencies)
    {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code: "E-CYCLE",
            message: format!("dependency cycle among tasks: {cyclic:?}"),
        });
    }

    let capacity = store.capacity_table()?;
    let mut skill_demand: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
    let mut equipment_demand: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
    for task in &tasks {
        let requirement = store.requirement_of(&task.id)?;
        for (group, count) in &requirement.skill_groups {
            *skill_demand.entry(group.clone()).or_default() += count;
        }
        for (category, count) in &requirement.equipment_categories {
            *equipment_demand.entry(category.clone()).or_default() += count;
        }
    }
    for (group, demand) in skill_demand {
        let available = capacity.skill(&group);
        if demand > available {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "W-CAPACITY",
                message: format!(
                    "skill group `{group}` demands {demand} but only {available} available"
                ),
            });
        }
    }
    for (category, demand) in equipment_demand {
        let available = capacity.equipment(&category);
        if demand > available {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "W-CAPACITY",
                message: format!(
                    "equipment category `{category}` demands {demand} but only {available} available"
                ),
            });
        }
    }

    if strict {
        for diag in &mut diagnostics {
            if diag.severity == Severity::Warning {
                diag.severity = Severity::Error;
            }
        }
    }

    Ok(diagnostics)
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rso_core::{Dependency, InMemoryStore, Requirement, Task};
    use rust_decimal_macros::dec;

    #[test]
    fn clean_project_has_no_diagnostics() {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("a", "Dig trench", dec!(4)));
        let diagnostics = run_check(&store, false).unwrap();
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn cycle_is_always_an_error() {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("a", "A", dec!(1)));
        store.seed_task(Task::new("b", "B", dec!(1)));
        store.seed_dependency(Dependency::new("a", "b"));
        store.seed_dependency(Dependency::new("b", "a"));

        let diagnostics = run_check(&store, false).unwrap();
        assert!(has_errors(&diagnostics));
        assert_eq!(diagnostics[0].code, "E-CYCLE");
    }

    #[test]
    fn capacity_shortfall_is_a_warning_unless_strict() {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("a", "Wire kitchen", dec!(4)));
        store.seed_requirement(Requirement::new("a").needs_skill("electrician", 2));

        let lenient = run_check(&store, false).unwrap();
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient[0].severity, Severity::Warning);
        assert!(!has_errors(&lenient));

        let strict = run_check(&store, true).unwrap();
        assert!(has_errors(&strict));
    }
}
