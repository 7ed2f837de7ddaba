//! Segment split (§4.8, second clause): captures the completed portion of
//! an interrupted task as one immutable segment and the carried-over
//! remainder as another, grounded on the `task_segments` insert pairs in
//! `handle_clock_out`'s carry-over branch and `handle_resource_conflict`'s
//! preemption branch — the same shape serves both callers.

use crate::slot::next_working_wtu;
use rso_core::{
    CalendarConfig, ChangeKind, ChangeLogEntry, ScheduleRecord, SchedulingResult, Store,
    TaskSegment,
};

/// Splits `current` at `split_point`, resuming after `resume_after` snapped
/// to the next working instant. Returns the two segments and the schedule
/// record updated to the new (carried-over) end; the caller is responsible
/// for any status transition on the record.
#[allow(clippy::too_many_arguments)]
pub fn split_task(
    store: &impl Store,
    calendar: &CalendarConfig,
    current: &ScheduleRecord,
    split_point: i64,
    resume_after: i64,
    change_kind: ChangeKind,
    reason: impl Into<String>,
    timestamp: i64,
) -> SchedulingResult<(TaskSegment, TaskSegment, ScheduleRecord)> {
    let total_duration = current.planned_end - current.planned_start;
    let worked = (split_point - current.planned_start).clamp(0, total_duration.max(0));
    let completion_percentage = if total_duration <= 0 {
        100
    } else {
        ((worked as f64 / total_duration as f64) * 100.0)
            .clamp(0.0, 100.0)
            .round() as u8
    };
    let remaining_duration = (total_duration - worked).max(0);

    let resume_point = next_working_wtu(calendar, resume_after);
    let new_end = resume_point + remaining_duration;

    let segment_one = TaskSegment {
        task_id: current.task_id.clone(),
        segment_index: 1,
        planned_start: current.planned_start,
        planned_end: split_point,
        actual_start: current.actual_start,
        actual_end: Some(split_point),
        completion_percentage,
        is_carry_over: false,
    };
    let segment_two = TaskSegment {
        task_id: current.task_id.clone(),
        segment_index: 2,
        planned_start: resume_point,
        planned_end: new_end,
        actual_start: None,
        actual_end: None,
        completion_percentage: 0,
        is_carry_over: true,
    };

    store.append_segment(segment_one.clone())?;
    store.append_segment(segment_two.clone())?;

    let mut updated = current.clone();
    updated.planned_end = new_end;
    store.put_schedule(updated.clone())?;

    store.append_change_log(ChangeLogEntry {
        task_id: current.task_id.clone(),
        prior_start: current.planned_start,
        prior_end: current.planned_end,
        new_start: current.planned_start,
        new_end,
        change_kind,
        reason: reason.into(),
        timestamp,
    })?;

    Ok((segment_one, segment_two, updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rso_core::InMemoryStore;

    fn calendar() -> CalendarConfig {
        CalendarConfig::new(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap())
    }

    #[test]
    fn split_computes_proportional_completion_and_carry_over() {
        let store = InMemoryStore::new();
        let cal = calendar();
        let current = ScheduleRecord::new("a", 0, 800); // 8h task
        let (seg1, seg2, updated) = split_task(
            &store,
            &cal,
            &current,
            400, // half worked
            400,
            ChangeKind::CarryOver,
            "End of day carry-over",
            0,
        )
        .unwrap();

        assert_eq!(seg1.completion_percentage, 50);
        assert!(!seg1.is_carry_over);
        assert!(seg2.is_carry_over);
        assert_eq!(seg2.planned_end - seg2.planned_start, 400);
        assert_eq!(updated.planned_end, seg2.planned_end);
    }

    #[test]
    fn resume_point_snaps_to_next_working_instant() {
        let store = InMemoryStore::new();
        let cal = calendar();
        // Friday close: 4 working days in, end of day.
        let friday_close = 4 * cal.units_per_day() + cal.units_per_day();
        let current = ScheduleRecord::new("a", 4 * cal.units_per_day(), friday_close);
        let (_, seg2, _) = split_task(
            &store,
            &cal,
            &current,
            friday_close,
            friday_close,
            ChangeKind::CarryOver,
            "carry over weekend",
            0,
        )
        .unwrap();
        // Resume lands Monday 09:00, which is exactly one more working day in.
        assert_eq!(seg2.planned_start, 5 * cal.units_per_day());
    }
}
