//! Full reschedule through C3/C4/C5 (§9 Open Question 3): always the
//! chosen behavior for `complete` and `skip`, never a dependent-only
//! cascade, with a preserve set of every terminal or in-progress task.

use rso_core::{
    is_reserved_wbs, CalendarConfig, Requirement, SchedulingResult, Store, TaskStatus,
};
use rso_solver::{ModelInput, SolveOutcome};
use std::collections::HashMap;
use std::time::Duration;

pub fn full_reschedule(
    store: &impl Store,
    calendar: &CalendarConfig,
    time_budget: Duration,
) -> SchedulingResult<SolveOutcome> {
    let tasks: Vec<_> = store
        .tasks()?
        .into_iter()
        .filter(|t| !is_reserved_wbs(&t.wbs_code))
        .collect();
    let dependencies = store.all_dependencies()?;

    let mut requirements: HashMap<String, Requirement> = HashMap::new();
    for task in &tasks {
        requirements.insert(task.id.clone(), store.requirement_of(&task.id)?);
    }
    let capacity = store.capacity_table()?;

    let mut preserved: HashMap<String, (i64, i64)> = HashMap::new();
    for task in &tasks {
        if let Some(sched) = store.schedule_of(&task.id)? {
            if matches!(
                sched.status,
                TaskStatus::Completed | TaskStatus::Skipped | TaskStatus::InProgress
            ) {
                preserved.insert(task.id.clone(), (sched.planned_start, sched.planned_end));
            }
        }
    }

    let input = ModelInput {
        calendar,
        tasks: &tasks,
        dependencies: &dependencies,
        requirements: &requirements,
        capacity: &capacity,
        preserved: &preserved,
    };

    let outcome = rso_solver::solve(&input, time_budget)?;
    if let SolveOutcome::Optimal(sol) | SolveOutcome::Feasible(sol) = &outcome {
        rso_solver::commit(store, calendar, &tasks, &requirements, &capacity, sol)?;
    }
    Ok(outcome)
}
