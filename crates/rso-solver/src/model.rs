//! CP model builder (§4.3, component C3).
//!
//! Builds the constraint model onto a fresh [`pumpkin_solver::Solver`]:
//! interval start variables, precedence constraints (anchor-selected per
//! dependency type, lag-adjusted per [`crate::lag`]), phase-ordering
//! boundaries, cumulative resource constraints per skill group and
//! equipment category, and preserved-task equality pins. The solver driver
//! (`crate::driver`) takes the built model and runs the two-stage
//! lexicographic optimisation over it.

use crate::anchors::{anchors_for, Anchor};
use crate::lag::fallback_bound;
use pumpkin_solver::constraints as cp;
use pumpkin_solver::proof::ConstraintTag;
use pumpkin_solver::variables::{DomainId, TransformableVariable};
use pumpkin_solver::Solver;
use rust_decimal::prelude::ToPrimitive;
use rso_core::{
    phase_rank, CalendarConfig, CapacityTable, Dependency, Requirement, SchedulingError,
    SchedulingResult, SchedulingWarning, Task, PHASE_ORDER,
};
use std::collections::{HashMap, HashSet};

/// A built CP model.
pub struct BuiltModel {
    pub solver: Solver,
    pub task_order: Vec<String>,
    pub start_vars: HashMap<String, DomainId>,
    pub durations: HashMap<String, i32>,
    pub priority_weights: HashMap<String, i32>,
    pub makespan: DomainId,
    pub warnings: Vec<SchedulingWarning>,
}

/// Inputs to model construction, already resolved from the store.
pub struct ModelInput<'a> {
    pub calendar: &'a CalendarConfig,
    pub tasks: &'a [Task],
    pub dependencies: &'a [Dependency],
    pub requirements: &'a HashMap<String, Requirement>,
    pub capacity: &'a CapacityTable,
    pub preserved: &'a HashMap<String, (i64, i64)>,
}

pub(crate) fn task_duration_units(calendar: &CalendarConfig, task: &Task) -> i32 {
    let hours = task.estimated_hours.to_f64().unwrap_or(0.0);
    ((hours * calendar.scale_factor as f64).ceil() as i64).max(1) as i32
}

pub fn build(input: &ModelInput<'_>) -> SchedulingResult<BuiltModel> {
    let horizon = input.calendar.horizon_units() as i32;
    let mut solver = Solver::default();
    let tag = solver.new_constraint_tag();

    let task_order: Vec<String> = input.tasks.iter().map(|t| t.id.clone()).collect();
    let mut durations: HashMap<String, i32> = HashMap::new();
    let mut priority_weights: HashMap<String, i32> = HashMap::new();
    let mut start_vars = HashMap::new();

    for task in input.tasks {
        // A preserved task's duration comes from its pinned span, not from
        // `estimated_hours`: those can diverge (a carry-over split, or a
        // manual reschedule that changed the span's length) and every other
        // constraint below derives "end" as `start + duration`, so deriving
        // duration from `estimated_hours` here would silently let the
        // preserved end drift from `preserved_end`.
        let duration = if let Some(&(fixed_start, fixed_end)) = input.preserved.get(&task.id) {
            (fixed_end - fixed_start).max(1) as i32
        } else {
            task_duration_units(input.calendar, task)
        };
        durations.insert(task.id.clone(), duration);
        priority_weights.insert(task.id.clone(), task.priority.weight() as i32);

        let var = if let Some(&(fixed_start, _fixed_end)) = input.preserved.get(&task.id) {
            let fixed = fixed_start as i32;
            solver.new_bounded_integer(fixed, fixed)
        } else {
            solver.new_bounded_integer(0, (horizon - duration).max(0))
        };
        start_vars.insert(task.id.clone(), var);
    }

    // Precedence constraints, anchor-selected per dependency type.
    for dep in input.dependencies {
        let (Some(&pred_var), Some(&succ_var)) = (
            start_vars.get(&dep.predecessor_id),
            start_vars.get(&dep.successor_id),
        ) else {
            continue;
        };
        let pred_duration = durations[&dep.predecessor_id];
        let succ_duration = durations[&dep.successor_id];
        let (pred_anchor, succ_anchor) = anchors_for(dep.dep_type);

        let rhs = fallback_bound(input.calendar, dep.lag_hours) as i32;
        let pred_offset = if pred_anchor == Anchor::End {
            pred_duration
        } else {
            0
        };
        let succ_offset = if succ_anchor == Anchor::End {
            succ_duration
        } else {
            0
        };
        // succ_var + succ_offset - (pred_var + pred_offset) >= rhs
        // => succ_var - pred_var >= rhs + pred_offset - succ_offset
        let adjusted_rhs = rhs + pred_offset - succ_offset;
        let vars = vec![succ_var.scaled(1), pred_var.scaled(-1)];
        solver
            .add_constraint(cp::greater_than_or_equals(vars, adjusted_rhs, tag))
            .post()
            .map_err(|_| SchedulingError::InfeasibleModel {
                reason: format!(
                    "precedence {} -> {} is unsatisfiable at model build time",
                    dep.predecessor_id, dep.successor_id
                ),
            })?;
    }

    // Phase ordering: every task in phase rank r must end before any task in
    // phase rank r+1 starts, expressed via one boundary variable per phase
    // pair rather than O(n^2) pairwise constraints.
    let mut warnings = Vec::new();
    build_phase_ordering(&mut solver, input, &start_vars, &durations, tag)?;

    // Cumulative resource constraints per skill group and equipment category.
    build_capacity_constraints(
        &mut solver,
        input,
        &start_vars,
        &durations,
        tag,
        &mut warnings,
    )?;

    // Makespan: >= end time of every task.
    let makespan = solver.new_bounded_integer(0, horizon);
    for task in input.tasks {
        let var = start_vars[&task.id];
        let duration = durations[&task.id];
        let vars = vec![makespan.scaled(1), var.scaled(-1)];
        solver
            .add_constraint(cp::greater_than_or_equals(vars, duration, tag))
            .post()
            .map_err(|_| SchedulingError::InfeasibleModel {
                reason: "makespan constraint unsatisfiable".to_string(),
            })?;
    }

    Ok(BuiltModel {
        solver,
        task_order,
        start_vars,
        durations,
        priority_weights,
        makespan,
        warnings,
    })
}

fn build_phase_ordering(
    solver: &mut Solver,
    input: &ModelInput<'_>,
    start_vars: &HashMap<String, DomainId>,
    durations: &HashMap<String, i32>,
    tag: ConstraintTag,
) -> SchedulingResult<()> {
    let horizon = input.calendar.horizon_units() as i32;
    let mut by_phase: HashMap<usize, Vec<&Task>> = HashMap::new();
    for task in input.tasks {
        if let Some(rank) = phase_rank(&task.phase) {
            by_phase.entry(rank).or_default().push(task);
        }
    }

    let mut boundary_end: HashMap<usize, DomainId> = HashMap::new();
    for (&rank, tasks) in &by_phase {
        let end_var = solver.new_bounded_integer(0, horizon);
        for task in tasks {
            let var = start_vars[&task.id];
            let duration = durations[&task.id];
            let vars = vec![end_var.scaled(1), var.scaled(-1)];
            solver
                .add_constraint(cp::greater_than_or_equals(vars, duration, tag))
                .post()
                .map_err(|_| SchedulingError::InfeasibleModel {
                    reason: "phase end boundary unsatisfiable".to_string(),
                })?;
        }
        boundary_end.insert(rank, end_var);
    }

    for window in PHASE_ORDER.windows(2) {
        let (earlier, later) = (phase_rank(window[0]), phase_rank(window[1]));
        let (Some(earlier), Some(later)) = (earlier, later) else {
            continue;
        };
        let (Some(&end_var), Some(later_tasks)) =
            (boundary_end.get(&earlier), by_phase.get(&later))
        else {
            continue;
        };
        for task in later_tasks {
            let var = start_vars[&task.id];
            let vars = vec![var.scaled(1), end_var.scaled(-1)];
            solver
                .add_constraint(cp::greater_than_or_equals(vars, 0, tag))
                .post()
                .map_err(|_| SchedulingError::InfeasibleModel {
                    reason: "phase ordering unsatisfiable".to_string(),
                })?;
        }
    }

    Ok(())
}

fn build_capacity_constraints(
    solver: &mut Solver,
    input: &ModelInput<'_>,
    start_vars: &HashMap<String, DomainId>,
    durations: &HashMap<String, i32>,
    tag: ConstraintTag,
    warnings: &mut Vec<SchedulingWarning>,
) -> SchedulingResult<()> {
    let mut skill_groups: HashSet<&str> = HashSet::new();
    let mut equipment_categories: HashSet<&str> = HashSet::new();
    for req in input.requirements.values() {
        skill_groups.extend(req.skill_groups.keys().map(String::as_str));
        equipment_categories.extend(req.equipment_categories.keys().map(String::as_str));
    }

    for group in skill_groups {
        let capacity = input.capacity.skill(group);
        post_cumulative(
            solver, input, start_vars, durations, tag, warnings, group, capacity, true,
        )?;
    }
    for category in equipment_categories {
        let capacity = input.capacity.equipment(category);
        post_cumulative(
            solver, input, start_vars, durations, tag, warnings, category, capacity, false,
        )?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn post_cumulative(
    solver: &mut Solver,
    input: &ModelInput<'_>,
    start_vars: &HashMap<String, DomainId>,
    durations: &HashMap<String, i32>,
    tag: ConstraintTag,
    warnings: &mut Vec<SchedulingWarning>,
    pool: &str,
    capacity: i64,
    is_skill: bool,
) -> SchedulingResult<()> {
    let mut starts = Vec::new();
    let mut task_durations = Vec::new();
    let mut demands = Vec::new();

    for task in input.tasks {
        let Some(req) = input.requirements.get(&task.id) else {
            continue;
        };
        let demand = if is_skill {
            req.skill_groups.get(pool).copied()
        } else {
            req.equipment_categories.get(pool).copied()
        };
        let Some(demand) = demand else { continue };
        if demand == 0 {
            continue;
        }
        let clamped = if capacity > 0 && demand > capacity {
            warnings.push(SchedulingWarning::CapacityClamped {
                pool: pool.to_string(),
                task_id: task.id.clone(),
                requested: demand,
                clamped_to: capacity,
            });
            capacity
        } else {
            demand
        };
        starts.push(start_vars[&task.id]);
        task_durations.push(durations[&task.id]);
        demands.push(clamped as i32);
    }

    if starts.is_empty() || capacity <= 0 {
        return Ok(());
    }

    let max_demand = demands.iter().map(|&d| d as i64).max().unwrap_or(0);
    solver
        .add_constraint(cp::cumulative(
            starts,
            task_durations,
            demands,
            capacity as i32,
            tag,
        ))
        .post()
        .map_err(|_| SchedulingError::CapacityViolation {
            pool: pool.to_string(),
            unit: 0,
            demand: max_demand,
            capacity,
        })
}
