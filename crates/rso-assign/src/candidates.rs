//! Candidate filtering and availability (§4.6, steps 1-2).
//!
//! Grounded on `main.py`'s `get_employee_availability`/`get_resource_availability`
//! (skill/type match, case-insensitive via `LOWER(...)`) and
//! `auto_assign_resources_to_tasks`'s `is_available_during_timeframe` closure,
//! whose overlap rule this reproduces exactly: a boundary touch is fine, but
//! an exact shared start or end is a conflict even though it doesn't overlap
//! in the interval-arithmetic sense.

use rso_core::{PoolEntity, ScheduleRecord, SchedulingResult, Store};

/// Entities from `pool` whose groups match `group` case-insensitively.
pub fn matching_candidates(pool: &[PoolEntity], group: &str) -> Vec<PoolEntity> {
    pool.iter().filter(|e| e.matches(group)).cloned().collect()
}

/// True iff `entity_id` has no existing assignment whose task window collides
/// with `[start, end)` per §4.6's boundary rule.
pub fn is_available(
    store: &impl Store,
    entity_id: &str,
    start: i64,
    end: i64,
) -> SchedulingResult<bool> {
    for assignment in store.assignments_for_entity(entity_id)? {
        let Some(sched) = store.schedule_of(&assignment.task_id)? else {
            continue;
        };
        if !window_is_clear(&sched, start, end) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn window_is_clear(existing: &ScheduleRecord, start: i64, end: i64) -> bool {
    let boundary_touch = existing.planned_end <= start || existing.planned_start >= end;
    let exact_collision = existing.planned_start == start || existing.planned_end == end;
    boundary_touch && !exact_collision
}

/// Candidates sorted by ascending current assignment count, for load
/// balancing (§4.6 step 3).
pub fn sorted_by_load(store: &impl Store, candidates: Vec<PoolEntity>) -> SchedulingResult<Vec<PoolEntity>> {
    let mut loaded: Vec<(usize, PoolEntity)> = Vec::with_capacity(candidates.len());
    for entity in candidates {
        let count = store.assignments_for_entity(&entity.id)?.len();
        loaded.push((count, entity));
    }
    loaded.sort_by_key(|(count, _)| *count);
    Ok(loaded.into_iter().map(|(_, e)| e).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rso_core::ResourceKind;

    fn entity(id: &str, groups: &[&str]) -> PoolEntity {
        PoolEntity {
            id: id.to_string(),
            display_name: id.to_string(),
            kind: ResourceKind::Employee,
            groups: groups.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let pool = vec![entity("a", &["Electrician"]), entity("b", &["Plumber"])];
        let matched = matching_candidates(&pool, "electrician");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "a");
    }

    #[test]
    fn boundary_touch_is_available() {
        let existing = ScheduleRecord::new("x", 0, 100);
        assert!(window_is_clear(&existing, 100, 200));
        assert!(window_is_clear(&existing, -100, 0));
    }

    #[test]
    fn exact_shared_boundary_is_a_collision() {
        let existing = ScheduleRecord::new("x", 0, 100);
        assert!(!window_is_clear(&existing, 0, 50));
        assert!(!window_is_clear(&existing, 50, 100));
    }

    #[test]
    fn interior_overlap_is_a_collision() {
        let existing = ScheduleRecord::new("x", 0, 100);
        assert!(!window_is_clear(&existing, 50, 150));
    }
}
