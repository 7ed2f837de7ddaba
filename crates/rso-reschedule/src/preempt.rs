//! Priority preemption for cross-project resource conflicts (§4.8, third
//! clause), grounded directly on `handle_resource_conflict`: sort the
//! tasks contending for one employee or equipment unit by priority, let
//! the top task keep its schedule, and either split or fully delay each
//! loser, cascading their dependents afterward.

use crate::cascade::cascade_dependents;
use crate::segment::split_task;
use crate::slot::next_working_wtu;
use rso_core::{
    CalendarConfig, ChangeKind, ChangeLogEntry, SchedulingResult, Store, TaskStatus,
};

#[derive(Debug, Clone)]
pub struct ConflictResolution {
    pub task_id: String,
    pub change_kind: ChangeKind,
    pub original_end: i64,
    pub new_end: i64,
}

/// Resolves a conflict over `entity_id` (an employee or equipment id) at
/// `conflict_time`. Returns one entry per task whose schedule moved,
/// including cascaded dependents.
pub fn resolve_resource_conflict(
    store: &impl Store,
    calendar: &CalendarConfig,
    entity_id: &str,
    conflict_time: i64,
    timestamp: i64,
) -> SchedulingResult<Vec<ConflictResolution>> {
    let mut conflicting = Vec::new();
    for assignment in store.assignments_for_entity(entity_id)? {
        let Some(sched) = store.schedule_of(&assignment.task_id)? else {
            continue;
        };
        if !matches!(sched.status, TaskStatus::Scheduled | TaskStatus::InProgress) {
            continue;
        }
        if !(sched.planned_start <= conflict_time && conflict_time <= sched.planned_end) {
            continue;
        }
        let task = store.task(&assignment.task_id)?;
        conflicting.push((task, sched));
    }

    if conflicting.len() <= 1 {
        return Ok(Vec::new());
    }

    conflicting.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));
    let (winner_task, winner_sched) = conflicting[0].clone();
    let hp_end = winner_sched.planned_end;

    let mut results = Vec::new();
    for (task, sched) in &conflicting[1..] {
        if task.preemptable && sched.status == TaskStatus::InProgress {
            let reason = format!(
                "Preempted due to resource conflict with higher priority task {} ({})",
                winner_task.id, winner_task.name
            );
            let (_seg1, _seg2, updated) = split_task(
                store,
                calendar,
                sched,
                conflict_time,
                hp_end,
                ChangeKind::Preemption,
                reason,
                timestamp,
            )?;
            results.push(ConflictResolution {
                task_id: task.id.clone(),
                change_kind: ChangeKind::Preemption,
                original_end: sched.planned_end,
                new_end: updated.planned_end,
            });
            for cascaded in
                cascade_dependents(store, calendar, &task.id, sched.planned_end, updated.planned_end, timestamp)?
            {
                results.push(ConflictResolution {
                    task_id: cascaded.task_id,
                    change_kind: ChangeKind::Dependency,
                    original_end: cascaded.original_end,
                    new_end: cascaded.new_end,
                });
            }
        } else {
            let duration = sched.duration();
            let new_start = next_working_wtu(calendar, hp_end);
            let new_end = new_start + duration;

            let mut updated = sched.clone();
            updated.planned_start = new_start;
            updated.planned_end = new_end;
            store.put_schedule(updated)?;

            store.append_change_log(ChangeLogEntry {
                task_id: task.id.clone(),
                prior_start: sched.planned_start,
                prior_end: sched.planned_end,
                new_start,
                new_end,
                change_kind: ChangeKind::Delayed,
                reason: format!(
                    "Delayed due to resource conflict with higher priority task {} ({})",
                    winner_task.id, winner_task.name
                ),
                timestamp,
            })?;

            results.push(ConflictResolution {
                task_id: task.id.clone(),
                change_kind: ChangeKind::Delayed,
                original_end: sched.planned_end,
                new_end,
            });
            for cascaded in
                cascade_dependents(store, calendar, &task.id, sched.planned_end, new_end, timestamp)?
            {
                results.push(ConflictResolution {
                    task_id: cascaded.task_id,
                    change_kind: ChangeKind::Dependency,
                    original_end: cascaded.original_end,
                    new_end: cascaded.new_end,
                });
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rso_core::{Assignment, InMemoryStore, PoolEntity, Priority, ResourceKind, ScheduleRecord, Task};
    use rust_decimal_macros::dec;

    fn calendar() -> CalendarConfig {
        CalendarConfig::new(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap())
    }

    fn assign(store: &InMemoryStore, task_id: &str, entity_id: &str) {
        store
            .put_assignment(Assignment {
                task_id: task_id.to_string(),
                entity_id: entity_id.to_string(),
                kind: ResourceKind::Employee,
                is_initial: true,
                is_modified: false,
            })
            .unwrap();
    }

    #[test]
    fn non_preemptable_loser_is_delayed_entirely() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_employee(PoolEntity {
            id: "emp1".to_string(),
            display_name: "Sam".to_string(),
            kind: ResourceKind::Employee,
            groups: vec!["electrician".to_string()],
        });
        store.seed_task(Task::new("hi", "Critical wiring", dec!(2)).priority(Priority::High));
        store.seed_task(Task::new("lo", "Low priority wiring", dec!(2)).priority(Priority::Low).preemptable(false));
        store.put_schedule(ScheduleRecord::new("hi", 0, 200)).unwrap();
        let mut lo_sched = ScheduleRecord::new("lo", 0, 200);
        lo_sched.status = TaskStatus::Scheduled;
        store.put_schedule(lo_sched).unwrap();
        assign(&store, "hi", "emp1");
        assign(&store, "lo", "emp1");

        let resolutions = resolve_resource_conflict(&store, &cal, "emp1", 50, 0).unwrap();
        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolutions[0].change_kind, ChangeKind::Delayed);
        let lo = store.schedule_of("lo").unwrap().unwrap();
        assert!(lo.planned_start >= 200);
    }

    #[test]
    fn preemptable_in_progress_loser_is_split() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("hi", "Critical wiring", dec!(2)).priority(Priority::High));
        store.seed_task(Task::new("lo", "Splittable wiring", dec!(2)).priority(Priority::Low).preemptable(true));
        store.put_schedule(ScheduleRecord::new("hi", 0, 200)).unwrap();
        let mut lo_sched = ScheduleRecord::new("lo", 0, 200);
        lo_sched.status = TaskStatus::InProgress;
        store.put_schedule(lo_sched).unwrap();
        assign(&store, "hi", "emp1");
        assign(&store, "lo", "emp1");

        let resolutions = resolve_resource_conflict(&store, &cal, "emp1", 50, 0).unwrap();
        assert_eq!(resolutions[0].change_kind, ChangeKind::Preemption);
        let segments = store.segments_of("lo").unwrap();
        assert_eq!(segments.len(), 2);
        assert!(!segments[0].is_carry_over);
        assert!(segments[1].is_carry_over);
    }

    #[test]
    fn single_contender_is_not_a_conflict() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("solo", "Solo task", dec!(2)));
        store.put_schedule(ScheduleRecord::new("solo", 0, 200)).unwrap();
        assign(&store, "solo", "emp1");

        let resolutions = resolve_resource_conflict(&store, &cal, "emp1", 50, 0).unwrap();
        assert!(resolutions.is_empty());
    }
}
