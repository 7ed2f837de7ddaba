//! Dependency cascade (§4.8, first half of the Local Repair Engine).
//!
//! Walks outgoing dependents of a task whose planned span shifted, via an
//! iterative worklist rather than recursion, so a diamond-shaped dependency
//! graph cannot requeue the same task twice in one cascade. This is the
//! direct re-architecture of `_reschedule_dependent_tasks`'s recursive walk
//! (see §9 REDESIGN FLAGS): same propagation rule, an explicit queue and
//! visited-set instead of call-stack recursion.

use rso_core::{CalendarConfig, ChangeKind, ChangeLogEntry, SchedulingResult, Store};
use rso_solver::anchors::{anchors_for, Anchor};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct RescheduledTask {
    pub task_id: String,
    pub original_start: i64,
    pub original_end: i64,
    pub new_start: i64,
    pub new_end: i64,
}

/// Propagates a shift in `task_id`'s planned end from `old_end` to
/// `new_end` onto every transitive dependent whose own anchor requirement
/// is no longer satisfied. A task already carrying enough slack absorbs the
/// shift and the cascade does not continue past it.
pub fn cascade_dependents(
    store: &impl Store,
    calendar: &CalendarConfig,
    task_id: &str,
    old_end: i64,
    new_end: i64,
    timestamp: i64,
) -> SchedulingResult<Vec<RescheduledTask>> {
    if old_end >= new_end {
        return Ok(Vec::new());
    }

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(task_id.to_string());
    let mut worklist: VecDeque<String> = VecDeque::new();
    worklist.push_back(task_id.to_string());

    let mut rescheduled = Vec::new();

    while let Some(current_id) = worklist.pop_front() {
        let Some(current_schedule) = store.schedule_of(&current_id)? else {
            continue;
        };
        for dep in store.dependents_of(&current_id)? {
            if visited.contains(&dep.successor_id) {
                continue;
            }
            let Some(succ_schedule) = store.schedule_of(&dep.successor_id)? else {
                continue;
            };

            let (pred_anchor, succ_anchor) = anchors_for(dep.dep_type);
            let anchor_value = match pred_anchor {
                Anchor::Start => current_schedule.planned_start,
                Anchor::End => current_schedule.planned_end,
            };
            let required = calendar.add_lag(anchor_value, dep.lag_hours);

            let succ_duration = succ_schedule.duration();
            let (new_succ_start, new_succ_end) = match succ_anchor {
                Anchor::Start => (required, required + succ_duration),
                Anchor::End => (required - succ_duration, required),
            };

            if new_succ_end <= succ_schedule.planned_end {
                // Enough slack already; the shift does not propagate further.
                continue;
            }

            let mut updated = succ_schedule.clone();
            updated.planned_start = new_succ_start;
            updated.planned_end = new_succ_end;
            store.put_schedule(updated)?;

            store.append_change_log(ChangeLogEntry {
                task_id: dep.successor_id.clone(),
                prior_start: succ_schedule.planned_start,
                prior_end: succ_schedule.planned_end,
                new_start: new_succ_start,
                new_end: new_succ_end,
                change_kind: ChangeKind::Dependency,
                reason: format!("Rescheduled due to change in dependency task {current_id}"),
                timestamp,
            })?;

            rescheduled.push(RescheduledTask {
                task_id: dep.successor_id.clone(),
                original_start: succ_schedule.planned_start,
                original_end: succ_schedule.planned_end,
                new_start: new_succ_start,
                new_end: new_succ_end,
            });

            visited.insert(dep.successor_id.clone());
            worklist.push_back(dep.successor_id);
        }
    }

    Ok(rescheduled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rso_core::{Dependency, InMemoryStore, ScheduleRecord, Task};
    use rust_decimal_macros::dec;

    fn calendar() -> CalendarConfig {
        CalendarConfig::new(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap())
    }

    #[test]
    fn shift_propagates_to_direct_dependent() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("a", "Frame", dec!(8)));
        store.seed_task(Task::new("b", "Wire", dec!(8)));
        store.seed_dependency(Dependency::new("a", "b"));
        store.put_schedule(ScheduleRecord::new("a", 0, 800)).unwrap();
        store.put_schedule(ScheduleRecord::new("b", 800, 1600)).unwrap();

        // Every real caller writes the initiating task's new span before
        // cascading; `cascade_dependents` reads it fresh from the store for
        // its own anchor computation, including on this first iteration.
        store.put_schedule(ScheduleRecord::new("a", 0, 1200)).unwrap();
        let rescheduled =
            cascade_dependents(&store, &cal, "a", 800, 1200, 0).unwrap();

        assert_eq!(rescheduled.len(), 1);
        assert_eq!(rescheduled[0].task_id, "b");
        let b = store.schedule_of("b").unwrap().unwrap();
        assert_eq!(b.planned_start, 1200);
        assert_eq!(b.duration(), 800);
    }

    #[test]
    fn slack_absorbs_shift_without_propagating_further() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("a", "Frame", dec!(1)));
        store.seed_task(Task::new("b", "Wire", dec!(1)));
        store.seed_dependency(Dependency::new("a", "b"));
        store.put_schedule(ScheduleRecord::new("a", 0, 100)).unwrap();
        // b starts far later than a ends, carrying plenty of slack.
        store.put_schedule(ScheduleRecord::new("b", 2000, 2100)).unwrap();

        let rescheduled = cascade_dependents(&store, &cal, "a", 100, 150, 0).unwrap();
        assert!(rescheduled.is_empty());
        let b = store.schedule_of("b").unwrap().unwrap();
        assert_eq!(b.planned_start, 2000);
    }

    #[test]
    fn diamond_dependency_visits_shared_descendant_once() {
        let store = InMemoryStore::new();
        let cal = calendar();
        for id in ["a", "b", "c", "d"] {
            store.seed_task(Task::new(id, id, dec!(1)));
        }
        store.seed_dependency(Dependency::new("a", "b"));
        store.seed_dependency(Dependency::new("a", "c"));
        store.seed_dependency(Dependency::new("b", "d"));
        store.seed_dependency(Dependency::new("c", "d"));
        store.put_schedule(ScheduleRecord::new("a", 0, 100)).unwrap();
        store.put_schedule(ScheduleRecord::new("b", 100, 200)).unwrap();
        store.put_schedule(ScheduleRecord::new("c", 100, 200)).unwrap();
        store.put_schedule(ScheduleRecord::new("d", 200, 300)).unwrap();

        store.put_schedule(ScheduleRecord::new("a", 0, 150)).unwrap();
        let rescheduled = cascade_dependents(&store, &cal, "a", 100, 150, 0).unwrap();
        let d_hits = rescheduled.iter().filter(|r| r.task_id == "d").count();
        assert_eq!(d_hits, 1);
    }

    #[test]
    fn zero_or_negative_shift_does_not_cascade() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("a", "Frame", dec!(1)));
        store.put_schedule(ScheduleRecord::new("a", 0, 100)).unwrap();
        let rescheduled = cascade_dependents(&store, &cal, "a", 100, 100, 0).unwrap();
        assert!(rescheduled.is_empty());
    }
}
