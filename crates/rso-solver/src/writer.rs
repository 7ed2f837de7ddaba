//! Schedule Writer & Validator (§4.5, component C5).
//!
//! Runs an independent capacity check over a solved schedule before
//! committing it through the `Store`: the check recomputes pool occupancy
//! from the raw task intervals rather than trusting the CP model's own
//! bookkeeping, so a violation here means the model builder itself has a
//! bug, not that the instance is infeasible.

use crate::driver::Solution;
use rso_core::{
    CalendarConfig, CapacityTable, Requirement, ScheduleRecord, SchedulingError, SchedulingResult,
    Store, Task, TaskStatus,
};
use std::collections::{HashMap, HashSet};

pub(crate) fn task_end(solution: &Solution, task_id: &str, duration_units: &HashMap<String, i32>) -> i64 {
    solution.start_times[task_id] + duration_units[task_id] as i64
}

/// Validates pool occupancy, then writes every task's new planned span.
/// Status preservation rule: a schedule already in a non-resettable state
/// keeps that status; otherwise the task becomes `Scheduled`.
pub fn commit(
    store: &impl Store,
    calendar: &CalendarConfig,
    tasks: &[Task],
    requirements: &HashMap<String, Requirement>,
    capacity: &CapacityTable,
    solution: &Solution,
) -> SchedulingResult<()> {
    let duration_units: HashMap<String, i32> = tasks
        .iter()
        .map(|t| (t.id.clone(), crate::model::task_duration_units(calendar, t)))
        .collect();

    validate_capacity(tasks, requirements, capacity, solution, &duration_units)?;

    for task in tasks {
        let Some(&start) = solution.start_times.get(&task.id) else {
            continue;
        };
        let end = start + duration_units[&task.id] as i64;

        let existing = store.schedule_of(&task.id)?;
        let mut record = ScheduleRecord::new(task.id.clone(), start, end);
        if let Some(prev) = existing {
            if prev.status.is_non_resettable() {
                record.status = prev.status;
                record.actual_start = prev.actual_start;
                record.actual_end = prev.actual_end;
            }
        } else {
            record.status = TaskStatus::Scheduled;
        }
        store.put_schedule(record)?;
    }

    Ok(())
}

fn validate_capacity(
    tasks: &[Task],
    requirements: &HashMap<String, Requirement>,
    capacity: &CapacityTable,
    solution: &Solution,
    duration_units: &HashMap<String, i32>,
) -> SchedulingResult<()> {
    let mut skill_groups: HashSet<&str> = HashSet::new();
    let mut equipment_categories: HashSet<&str> = HashSet::new();
    for req in requirements.values() {
        skill_groups.extend(req.skill_groups.keys().map(String::as_str));
        equipment_categories.extend(req.equipment_categories.keys().map(String::as_str));
    }

    for group in skill_groups {
        let cap = capacity.skill(group);
        check_pool(tasks, requirements, solution, duration_units, group, cap, true)?;
    }
    for category in equipment_categories {
        let cap = capacity.equipment(category);
        check_pool(tasks, requirements, solution, duration_units, category, cap, false)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn check_pool(
    tasks: &[Task],
    requirements: &HashMap<String, Requirement>,
    solution: &Solution,
    duration_units: &HashMap<String, i32>,
    pool: &str,
    capacity: i64,
    is_skill: bool,
) -> SchedulingResult<()> {
    if capacity <= 0 {
        // The builder posts no cumulative constraint for a capacity-less
        // pool (§4.3); the validator must not invent one either.
        return Ok(());
    }

    let mut intervals: Vec<(i64, i64, i64)> = Vec::new();
    for task in tasks {
        let Some(req) = requirements.get(&task.id) else {
            continue;
        };
        let demand = if is_skill {
            req.skill_groups.get(pool).copied()
        } else {
            req.equipment_categories.get(pool).copied()
        };
        let Some(demand) = demand else { continue };
        if demand <= 0 {
            continue;
        }
        let Some(&start) = solution.start_times.get(&task.id) else {
            continue;
        };
        let end = task_end(solution, &task.id, duration_units);
        let clamped = demand.min(capacity);
        intervals.push((start, end, clamped));
    }

    if intervals.is_empty() {
        return Ok(());
    }

    let mut boundaries: Vec<i64> = intervals.iter().map(|&(s, _, _)| s).collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    for &unit in &boundaries {
        let demand: i64 = intervals
            .iter()
            .filter(|&&(s, e, _)| s <= unit && unit < e)
            .map(|&(_, _, d)| d)
            .sum();
        if demand > capacity {
            return Err(SchedulingError::CapacityViolation {
                pool: pool.to_string(),
                unit,
                demand,
                capacity,
            });
        }
    }

    Ok(())
}
