//! Resource assignment (§4.6, the full assign pass), grounded on
//! `auto_assign_resources_to_tasks`'s task ordering
//! (`ORDER BY t.priority DESC, s.planned_start`) and its per-group
//! candidate/availability/load-balance pipeline, generalized from two
//! hardcoded tables (`employee_assignments`, `resource_assignments`) to one
//! `Assignment` type carrying a `ResourceKind`.

use crate::candidates::{is_available, matching_candidates, sorted_by_load};
use rso_core::{Assignment, ResourceKind, SchedulingResult, Store, TaskStatus};
use std::cmp::Reverse;

#[derive(Debug, Default)]
pub struct AssignmentOutcome {
    pub assigned: Vec<Assignment>,
    /// (task_id, group_or_category) pairs left short of their required count.
    pub skipped: Vec<(String, String)>,
}

/// Assigns employees and equipment to every `Scheduled` task, in
/// (priority desc, planned_start asc) order. `is_initial` marks whether
/// this is the planning-time pass (`is_initial=true, is_modified=false`)
/// or a post-event reassignment (`is_initial=false, is_modified=true`).
pub fn assign_all(store: &impl Store, is_initial: bool) -> SchedulingResult<AssignmentOutcome> {
    let mut candidates = Vec::new();
    for task in store.tasks()? {
        if let Some(sched) = store.schedule_of(&task.id)? {
            if sched.status == TaskStatus::Scheduled {
                candidates.push((task, sched));
            }
        }
    }
    candidates.sort_by_key(|(task, sched)| (Reverse(task.priority), sched.planned_start));

    let employees = store.employees()?;
    let equipment = store.equipment()?;

    let mut outcome = AssignmentOutcome::default();
    for (task, sched) in candidates {
        let requirement = store.requirement_of(&task.id)?;
        for (group, count) in &requirement.skill_groups {
            assign_group(
                store,
                &task.id,
                sched.planned_start,
                sched.planned_end,
                group,
                *count,
                &employees,
                ResourceKind::Employee,
                is_initial,
                &mut outcome,
            )?;
        }
        for (category, count) in &requirement.equipment_categories {
            assign_group(
                store,
                &task.id,
                sched.planned_start,
                sched.planned_end,
                category,
                *count,
                &equipment,
                ResourceKind::Equipment,
                is_initial,
                &mut outcome,
            )?;
        }
    }
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn assign_group(
    store: &impl Store,
    task_id: &str,
    start: i64,
    end: i64,
    group: &str,
    count: i64,
    pool: &[rso_core::PoolEntity],
    kind: ResourceKind,
    is_initial: bool,
    outcome: &mut AssignmentOutcome,
) -> SchedulingResult<()> {
    if count <= 0 {
        return Ok(());
    }
    let matched = matching_candidates(pool, group);
    let mut open = Vec::with_capacity(matched.len());
    for candidate in matched {
        if is_available(store, &candidate.id, start, end)? {
            open.push(candidate);
        }
    }
    let ranked = sorted_by_load(store, open)?;

    let mut filled = 0i64;
    for entity in ranked.into_iter().take(count as usize) {
        let assignment = Assignment {
            task_id: task_id.to_string(),
            entity_id: entity.id,
            kind,
            is_initial,
            is_modified: !is_initial,
        };
        store.put_assignment(assignment.clone())?;
        outcome.assigned.push(assignment);
        filled += 1;
    }
    if filled < count {
        outcome.skipped.push((task_id.to_string(), group.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rso_core::{InMemoryStore, PoolEntity, Requirement, ScheduleRecord, Task};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn seed_requirement(store: &InMemoryStore, task_id: &str, skill: &str, count: i64) {
        let mut req = Requirement::new(task_id);
        req.skill_groups.insert(skill.to_string(), count);
        store.seed_requirement(req);
    }

    #[test]
    fn assigns_matching_available_candidate() {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("a", "Wire kitchen", dec!(4)));
        store.put_schedule(ScheduleRecord::new("a", 0, 400)).unwrap();
        seed_requirement(&store, "a", "electrician", 1);
        store.seed_employee(PoolEntity {
            id: "emp1".to_string(),
            display_name: "Sam".to_string(),
            kind: ResourceKind::Employee,
            groups: vec!["electrician".to_string()],
        });

        let outcome = assign_all(&store, true).unwrap();
        assert_eq!(outcome.assigned.len(), 1);
        assert_eq!(outcome.assigned[0].entity_id, "emp1");
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn load_balances_across_two_qualified_candidates() {
        let store = InMemoryStore::new();
        for id in ["a", "b"] {
            store.seed_task(Task::new(id, id, dec!(4)));
            seed_requirement(&store, id, "electrician", 1);
        }
        store.put_schedule(ScheduleRecord::new("a", 0, 400)).unwrap();
        store.put_schedule(ScheduleRecord::new("b", 1000, 1400)).unwrap();
        for id in ["emp1", "emp2"] {
            store.seed_employee(PoolEntity {
                id: id.to_string(),
                display_name: id.to_string(),
                kind: ResourceKind::Employee,
                groups: vec!["electrician".to_string()],
            });
        }

        // Pre-load emp1 with an unrelated assignment so emp2 looks less busy.
        store.seed_task(Task::new("z", "Other", dec!(1)));
        store.put_schedule(ScheduleRecord::new("z", 2000, 2100)).unwrap();
        store
            .put_assignment(Assignment {
                task_id: "z".to_string(),
                entity_id: "emp1".to_string(),
                kind: ResourceKind::Employee,
                is_initial: true,
                is_modified: false,
            })
            .unwrap();

        let outcome = assign_all(&store, true).unwrap();
        let picks: HashMap<_, _> = outcome
            .assigned
            .iter()
            .filter(|a| a.task_id != "z")
            .map(|a| (a.task_id.clone(), a.entity_id.clone()))
            .collect();
        assert_eq!(picks.get("a"), Some(&"emp2".to_string()));
    }

    #[test]
    fn unmet_requirement_is_recorded_without_erroring() {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("a", "Wire kitchen", dec!(4)));
        store.put_schedule(ScheduleRecord::new("a", 0, 400)).unwrap();
        seed_requirement(&store, "a", "electrician", 1);

        let outcome = assign_all(&store, true).unwrap();
        assert!(outcome.assigned.is_empty());
        assert_eq!(outcome.skipped, vec![("a".to_string(), "electrician".to_string())]);
    }
}
