//! Event State Machine (§4.7, component C7): one function per transition
//! row, each grounded on the matching `handle_*` method in
//! `rescheduler.py`, reworked around explicit WTU instants and an
//! append-only progress/pause history instead of open-ended DB rows that
//! get mutated in place.

use crate::cascade::{cascade_dependents, RescheduledTask};
use crate::config::RescheduleConfig;
use crate::event::{Event, EventKind};
use crate::full_reschedule::full_reschedule;
use crate::preempt::{resolve_resource_conflict, ConflictResolution};
use crate::segment::split_task;
use crate::slot::next_working_wtu;
use rso_core::{
    ChangeKind, ChangeLogEntry, InMemoryStore, PauseEntry, ProgressEntry, ScheduleRecord,
    SchedulingError, SchedulingResult, SchedulingWarning, Store, TaskStatus,
};
use rso_core::CalendarConfig;
use rso_solver::anchors::{anchors_for, Anchor};
use rso_solver::SolveOutcome;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;

/// Matches C4's own default absolute wall-clock cap (§4.4); a full
/// reschedule triggered by an event gets the same budget a first-pass
/// solve would.
const FULL_RESCHEDULE_BUDGET: Duration = Duration::from_secs(120);

const NON_TERMINAL: &[TaskStatus] = &[
    TaskStatus::Scheduled,
    TaskStatus::InProgress,
    TaskStatus::Paused,
    TaskStatus::OnHold,
    TaskStatus::Blocked,
];

#[derive(Debug, Default)]
pub struct EventResult {
    pub new_status: Option<TaskStatus>,
    pub rescheduled: Vec<RescheduledTask>,
    pub blocked: Vec<String>,
    pub unblocked: Vec<String>,
    pub conflict_resolutions: Vec<ConflictResolution>,
    pub full_reschedule: Option<SolveOutcome>,
    pub warnings: Vec<SchedulingWarning>,
}

fn wtu_to_minutes(calendar: &CalendarConfig, units: i64) -> i64 {
    ((units as f64) * 60.0 / calendar.scale_factor as f64).round() as i64
}

fn minutes_to_wtu(calendar: &CalendarConfig, minutes: i64) -> i64 {
    ((minutes as f64) * calendar.scale_factor as f64 / 60.0).round() as i64
}

fn require_status(
    store: &impl Store,
    task_id: &str,
    event_name: &str,
    allowed: &[TaskStatus],
) -> SchedulingResult<ScheduleRecord> {
    let sched = store
        .schedule_of(task_id)?
        .ok_or_else(|| SchedulingError::TaskNotFound {
            task_id: task_id.to_string(),
        })?;
    if !allowed.contains(&sched.status) {
        return Err(SchedulingError::InvalidEventTransition {
            task_id: task_id.to_string(),
            event: event_name.to_string(),
            from_state: sched.status.to_string(),
        });
    }
    Ok(sched)
}

/// Remaining planned duration (in WTU) after subtracting work already
/// logged in the progress history, converted back from the minutes that
/// history is kept in.
fn remaining_duration_units(
    store: &impl Store,
    calendar: &CalendarConfig,
    task_id: &str,
    sched: &ScheduleRecord,
) -> SchedulingResult<i64> {
    let worked_minutes: i64 = store
        .progress_of(task_id)?
        .iter()
        .map(|p| p.duration_minutes)
        .sum();
    let worked_units = minutes_to_wtu(calendar, worked_minutes);
    Ok((sched.duration() - worked_units).max(0))
}

fn block_descendants(store: &impl Store, task_id: &str) -> SchedulingResult<Vec<String>> {
    use std::collections::{HashSet, VecDeque};
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(task_id.to_string());
    let mut worklist: VecDeque<String> = VecDeque::from([task_id.to_string()]);
    let mut blocked = Vec::new();

    while let Some(current) = worklist.pop_front() {
        for dep in store.dependents_of(&current)? {
            if visited.contains(&dep.successor_id) {
                continue;
            }
            visited.insert(dep.successor_id.clone());
            if let Some(mut sched) = store.schedule_of(&dep.successor_id)? {
                if !sched.status.is_terminal() {
                    sched.status = TaskStatus::Blocked;
                    store.put_schedule(sched)?;
                    blocked.push(dep.successor_id.clone());
                }
            }
            worklist.push_back(dep.successor_id);
        }
    }
    Ok(blocked)
}

fn unblock_descendants(store: &impl Store, task_id: &str) -> SchedulingResult<Vec<String>> {
    use std::collections::{HashSet, VecDeque};
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(task_id.to_string());
    let mut worklist: VecDeque<String> = VecDeque::from([task_id.to_string()]);
    let mut unblocked = Vec::new();

    while let Some(current) = worklist.pop_front() {
        for dep in store.dependents_of(&current)? {
            if visited.contains(&dep.successor_id) {
                continue;
            }
            visited.insert(dep.successor_id.clone());
            if let Some(mut sched) = store.schedule_of(&dep.successor_id)? {
                if sched.status == TaskStatus::Blocked {
                    sched.status = TaskStatus::Scheduled;
                    store.put_schedule(sched)?;
                    unblocked.push(dep.successor_id.clone());
                }
            }
            worklist.push_back(dep.successor_id);
        }
    }
    Ok(unblocked)
}

fn apply_event(
    store: &impl Store,
    calendar: &CalendarConfig,
    config: &RescheduleConfig,
    event: &Event,
) -> SchedulingResult<EventResult> {
    match &event.kind {
        EventKind::ClockIn => clock_in(store, event),
        EventKind::ClockOut { period_start, carry_over } => {
            clock_out(store, calendar, event, *period_start, *carry_over)
        }
        EventKind::Pause { start_time, end_time, reason } => {
            pause(store, calendar, config, event, *start_time, *end_time, reason)
        }
        EventKind::OnHold { reason, expected_resume } => {
            on_hold(store, event, reason, *expected_resume)
        }
        EventKind::Resume => resume(store, calendar, event),
        EventKind::Complete => complete(store, calendar, event),
        EventKind::Skip { .. } => skip(store, calendar, event),
        EventKind::ManualReschedule { new_start, new_end, reason } => {
            manual_reschedule(store, calendar, event, *new_start, *new_end, reason)
        }
        EventKind::ResourceConflict { entity_id, conflict_time } => {
            let resolutions =
                resolve_resource_conflict(store, calendar, entity_id, *conflict_time, event.timestamp)?;
            Ok(EventResult {
                conflict_resolutions: resolutions,
                ..Default::default()
            })
        }
    }
}

fn clock_in(store: &impl Store, event: &Event) -> SchedulingResult<EventResult> {
    let sched = require_status(
        store,
        &event.task_id,
        event.name(),
        &[TaskStatus::Scheduled, TaskStatus::Paused],
    )?;
    let mut updated = sched;
    updated.status = TaskStatus::InProgress;
    if updated.actual_start.is_none() {
        updated.actual_start = Some(event.timestamp);
    }
    store.put_schedule(updated)?;
    // accumulated_minutes needs no carry-forward bookkeeping here: it is
    // computed lazily as the sum of closed progress entries at clock_out.
    Ok(EventResult {
        new_status: Some(TaskStatus::InProgress),
        ..Default::default()
    })
}

fn clock_out(
    store: &impl Store,
    calendar: &CalendarConfig,
    event: &Event,
    period_start: i64,
    carry_over: bool,
) -> SchedulingResult<EventResult> {
    let sched = require_status(store, &event.task_id, event.name(), &[TaskStatus::InProgress])?;
    let task = store.task(&event.task_id)?;

    let worked_units = (event.timestamp - period_start).max(0);
    let worked_minutes = wtu_to_minutes(calendar, worked_units);
    let prior_minutes: i64 = store.progress_of(&event.task_id)?.iter().map(|p| p.duration_minutes).sum();
    let accumulated_minutes = prior_minutes + worked_minutes;
    let planned_duration_minutes =
        (task.estimated_hours.to_f64().unwrap_or(0.0) * 60.0).round() as i64;

    let mut entry = ProgressEntry {
        task_id: event.task_id.clone(),
        start_time: period_start,
        end_time: Some(event.timestamp),
        status: TaskStatus::Paused,
        duration_minutes: worked_minutes,
        accumulated_minutes,
    };
    let completed_percentage = entry.completed_percentage(planned_duration_minutes);

    if carry_over {
        entry.status = TaskStatus::Paused;
        store.append_progress(entry)?;

        let (_, _, updated_sched) = split_task(
            store,
            calendar,
            &sched,
            event.timestamp,
            event.timestamp,
            ChangeKind::CarryOver,
            "End of day carry-over",
            event.timestamp,
        )?;
        let mut final_sched = updated_sched.clone();
        final_sched.status = TaskStatus::Paused;
        store.put_schedule(final_sched)?;

        let rescheduled = cascade_dependents(
            store,
            calendar,
            &event.task_id,
            sched.planned_end,
            updated_sched.planned_end,
            event.timestamp,
        )?;
        return Ok(EventResult {
            new_status: Some(TaskStatus::Paused),
            rescheduled,
            ..Default::default()
        });
    }

    if completed_percentage >= 100 {
        entry.status = TaskStatus::Completed;
        store.append_progress(entry)?;

        let mut updated = sched;
        updated.status = TaskStatus::Completed;
        updated.actual_end = Some(event.timestamp);
        store.put_schedule(updated)?;

        let outcome = full_reschedule(store, calendar, FULL_RESCHEDULE_BUDGET)?;
        return Ok(EventResult {
            new_status: Some(TaskStatus::Completed),
            full_reschedule: Some(outcome),
            ..Default::default()
        });
    }

    entry.status = TaskStatus::Paused;
    store.append_progress(entry)?;
    let mut updated = sched;
    updated.status = TaskStatus::Paused;
    store.put_schedule(updated)?;
    Ok(EventResult {
        new_status: Some(TaskStatus::Paused),
        ..Default::default()
    })
}

#[allow(clippy::too_many_arguments)]
fn pause(
    store: &impl Store,
    calendar: &CalendarConfig,
    config: &RescheduleConfig,
    event: &Event,
    start_time: i64,
    end_time: i64,
    reason: &str,
) -> SchedulingResult<EventResult> {
    let sched = require_status(store, &event.task_id, event.name(), &[TaskStatus::InProgress])?;

    let duration_minutes = wtu_to_minutes(calendar, (end_time - start_time).max(0));
    let prior_cumulative: i64 = store
        .pauses_of(&event.task_id)?
        .iter()
        .filter(|p| !p.is_on_hold)
        .map(|p| p.duration_minutes)
        .sum();
    let cumulative = prior_cumulative + duration_minutes;

    store.append_pause(PauseEntry {
        task_id: event.task_id.clone(),
        start_time,
        end_time: Some(end_time),
        reason: reason.to_string(),
        duration_minutes,
        is_on_hold: false,
        expected_resume_time: None,
    })?;

    if duration_minutes <= config.short_break_threshold_minutes
        && cumulative <= config.cumulative_break_threshold_minutes
    {
        return Ok(EventResult {
            new_status: Some(TaskStatus::InProgress),
            ..Default::default()
        });
    }

    let remaining = remaining_duration_units(store, calendar, &event.task_id, &sched)?;
    let resume_point = next_working_wtu(calendar, end_time);
    let new_end = resume_point + remaining;

    let mut updated = sched.clone();
    updated.planned_end = new_end;
    store.put_schedule(updated)?;

    store.append_change_log(ChangeLogEntry {
        task_id: event.task_id.clone(),
        prior_start: sched.planned_start,
        prior_end: sched.planned_end,
        new_start: sched.planned_start,
        new_end,
        change_kind: ChangeKind::Delayed,
        reason: format!("Extended break: {reason}"),
        timestamp: event.timestamp,
    })?;

    let rescheduled =
        cascade_dependents(store, calendar, &event.task_id, sched.planned_end, new_end, event.timestamp)?;
    Ok(EventResult {
        new_status: Some(TaskStatus::InProgress),
        rescheduled,
        ..Default::default()
    })
}

fn on_hold(
    store: &impl Store,
    event: &Event,
    reason: &str,
    expected_resume: Option<i64>,
) -> SchedulingResult<EventResult> {
    let sched = require_status(
        store,
        &event.task_id,
        event.name(),
        &[TaskStatus::Scheduled, TaskStatus::InProgress],
    )?;
    let mut updated = sched;
    updated.status = TaskStatus::OnHold;
    store.put_schedule(updated)?;

    store.append_pause(PauseEntry {
        task_id: event.task_id.clone(),
        start_time: event.timestamp,
        end_time: None,
        reason: reason.to_string(),
        duration_minutes: 0,
        is_on_hold: true,
        expected_resume_time: expected_resume,
    })?;

    let blocked = block_descendants(store, &event.task_id)?;
    Ok(EventResult {
        new_status: Some(TaskStatus::OnHold),
        blocked,
        ..Default::default()
    })
}

fn resume(store: &impl Store, calendar: &CalendarConfig, event: &Event) -> SchedulingResult<EventResult> {
    let sched = require_status(store, &event.task_id, event.name(), &[TaskStatus::OnHold])?;

    let remaining = remaining_duration_units(store, calendar, &event.task_id, &sched)?;
    let resume_point = next_working_wtu(calendar, event.timestamp);
    let new_end = resume_point + remaining;

    let mut updated = sched.clone();
    updated.status = TaskStatus::InProgress;
    updated.planned_end = new_end;
    store.put_schedule(updated)?;

    store.append_change_log(ChangeLogEntry {
        task_id: event.task_id.clone(),
        prior_start: sched.planned_start,
        prior_end: sched.planned_end,
        new_start: sched.planned_start,
        new_end,
        change_kind: ChangeKind::Delayed,
        reason: "Resumed from on-hold".to_string(),
        timestamp: event.timestamp,
    })?;

    let unblocked = unblock_descendants(store, &event.task_id)?;
    let rescheduled =
        cascade_dependents(store, calendar, &event.task_id, sched.planned_end, new_end, event.timestamp)?;
    Ok(EventResult {
        new_status: Some(TaskStatus::InProgress),
        rescheduled,
        unblocked,
        ..Default::default()
    })
}

fn complete(store: &impl Store, calendar: &CalendarConfig, event: &Event) -> SchedulingResult<EventResult> {
    require_status(store, &event.task_id, event.name(), NON_TERMINAL)?;
    let mut updated = store.schedule_of(&event.task_id)?.expect("checked by require_status");
    updated.status = TaskStatus::Completed;
    updated.actual_end = Some(event.timestamp);
    store.put_schedule(updated)?;

    let outcome = full_reschedule(store, calendar, FULL_RESCHEDULE_BUDGET)?;
    Ok(EventResult {
        new_status: Some(TaskStatus::Completed),
        full_reschedule: Some(outcome),
        ..Default::default()
    })
}

fn skip(store: &impl Store, calendar: &CalendarConfig, event: &Event) -> SchedulingResult<EventResult> {
    require_status(store, &event.task_id, event.name(), NON_TERMINAL)?;
    let mut updated = store.schedule_of(&event.task_id)?.expect("checked by require_status");
    updated.status = TaskStatus::Skipped;
    store.put_schedule(updated)?;

    let outcome = full_reschedule(store, calendar, FULL_RESCHEDULE_BUDGET)?;
    Ok(EventResult {
        new_status: Some(TaskStatus::Skipped),
        full_reschedule: Some(outcome),
        ..Default::default()
    })
}

/// Predecessor-anchor check for a requested manual reschedule (§4.3/§7):
/// for every dependency where `task_id` is the successor, the requested span
/// must still satisfy the predecessor's anchor value plus lag. A violation
/// is non-fatal — the caller decides whether to override or cancel — so it
/// comes back as a `DependencyWarning`, not an `Err`.
fn check_predecessor_anchors(
    store: &impl Store,
    calendar: &CalendarConfig,
    task_id: &str,
    new_start: i64,
    new_end: i64,
) -> SchedulingResult<Vec<SchedulingWarning>> {
    let mut warnings = Vec::new();
    for dep in store.dependencies_of(task_id)? {
        let Some(pred_schedule) = store.schedule_of(&dep.predecessor_id)? else {
            continue;
        };
        let (pred_anchor, succ_anchor) = anchors_for(dep.dep_type);
        let anchor_value = match pred_anchor {
            Anchor::Start => pred_schedule.planned_start,
            Anchor::End => pred_schedule.planned_end,
        };
        let required = calendar.add_lag(anchor_value, dep.lag_hours);
        let requested = match succ_anchor {
            Anchor::Start => new_start,
            Anchor::End => new_end,
        };
        if requested < required {
            warnings.push(SchedulingWarning::DependencyWarning {
                task_id: task_id.to_string(),
                predecessor_id: dep.predecessor_id.clone(),
                detail: format!("requested {requested} is earlier than predecessor anchor {required}"),
            });
        }
    }
    Ok(warnings)
}

fn manual_reschedule(
    store: &impl Store,
    calendar: &CalendarConfig,
    event: &Event,
    new_start: i64,
    new_end: i64,
    reason: &str,
) -> SchedulingResult<EventResult> {
    let sched = require_status(store, &event.task_id, event.name(), NON_TERMINAL)?;
    let warnings = check_predecessor_anchors(store, calendar, &event.task_id, new_start, new_end)?;

    let mut updated = sched.clone();
    updated.planned_start = new_start;
    updated.planned_end = new_end;
    store.put_schedule(updated)?;

    let mut task = store.task(&event.task_id)?;
    task.estimated_hours = Decimal::from(new_end - new_start) / Decimal::from(calendar.scale_factor);
    store.put_task(task)?;

    store.append_change_log(ChangeLogEntry {
        task_id: event.task_id.clone(),
        prior_start: sched.planned_start,
        prior_end: sched.planned_end,
        new_start,
        new_end,
        change_kind: ChangeKind::ManualReschedule,
        reason: reason.to_string(),
        timestamp: event.timestamp,
    })?;

    let rescheduled =
        cascade_dependents(store, calendar, &event.task_id, sched.planned_end, new_end, event.timestamp)?;
    Ok(EventResult {
        rescheduled,
        warnings,
        ..Default::default()
    })
}

/// Entry point: runs `event` inside one `Store` transaction so a cascade's
/// writes share the triggering event's transaction (§5).
pub fn handle_event(
    store: &InMemoryStore,
    calendar: &CalendarConfig,
    config: &RescheduleConfig,
    event: Event,
) -> SchedulingResult<EventResult> {
    store.transaction(|scope| apply_event(scope, calendar, config, &event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rso_core::Task;
    use rust_decimal_macros::dec;

    fn calendar() -> CalendarConfig {
        CalendarConfig::new(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap())
    }

    fn store_with_in_progress_task() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.seed_task(Task::new("a", "Frame", dec!(8)));
        let mut sched = ScheduleRecord::new("a", 0, 800);
        sched.status = TaskStatus::InProgress;
        sched.actual_start = Some(0);
        store.put_schedule(sched).unwrap();
        store
    }

    #[test]
    fn clock_in_from_scheduled_moves_to_in_progress() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("a", "Frame", dec!(8)));
        store.put_schedule(ScheduleRecord::new("a", 0, 800)).unwrap();

        let result =
            handle_event(&store, &cal, &RescheduleConfig::default(), Event::new("a", 0, EventKind::ClockIn))
                .unwrap();
        assert_eq!(result.new_status, Some(TaskStatus::InProgress));
        let sched = store.schedule_of("a").unwrap().unwrap();
        assert_eq!(sched.status, TaskStatus::InProgress);
        assert_eq!(sched.actual_start, Some(0));
    }

    #[test]
    fn clock_in_from_completed_is_rejected() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("a", "Frame", dec!(8)));
        let mut sched = ScheduleRecord::new("a", 0, 800);
        sched.status = TaskStatus::Completed;
        store.put_schedule(sched).unwrap();

        let err = handle_event(&store, &cal, &RescheduleConfig::default(), Event::new("a", 0, EventKind::ClockIn))
            .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidEventTransition { .. }));
    }

    #[test]
    fn short_break_leaves_schedule_untouched() {
        let store = store_with_in_progress_task();
        let cal = calendar();
        let config = RescheduleConfig::default();
        let event = Event::new(
            "a",
            400,
            EventKind::Pause { start_time: 400, end_time: 410, reason: "water".to_string() },
        );
        let result = handle_event(&store, &cal, &config, event).unwrap();
        assert_eq!(result.new_status, Some(TaskStatus::InProgress));
        assert!(result.rescheduled.is_empty());
        let sched = store.schedule_of("a").unwrap().unwrap();
        assert_eq!(sched.planned_end, 800);
    }

    #[test]
    fn long_break_pushes_planned_end_and_logs_delay() {
        let store = store_with_in_progress_task();
        let cal = calendar();
        let mut config = RescheduleConfig::default();
        config.short_break_threshold_minutes = 5;
        let event = Event::new(
            "a",
            400,
            EventKind::Pause { start_time: 400, end_time: 500, reason: "equipment failure".to_string() },
        );
        let result = handle_event(&store, &cal, &config, event).unwrap();
        assert_eq!(result.new_status, Some(TaskStatus::InProgress));
        let sched = store.schedule_of("a").unwrap().unwrap();
        assert!(sched.planned_end > 800);
    }

    #[test]
    fn on_hold_blocks_dependents_and_resume_unblocks_them() {
        let store = store_with_in_progress_task();
        let cal = calendar();
        let config = RescheduleConfig::default();
        store.seed_task(Task::new("b", "Wire", dec!(8)));
        store.seed_dependency(rso_core::Dependency::new("a", "b"));
        store.put_schedule(ScheduleRecord::new("b", 800, 1600)).unwrap();

        let on_hold_result = handle_event(
            &store,
            &cal,
            &config,
            Event::new("a", 100, EventKind::OnHold { reason: "waiting on permit".to_string(), expected_resume: None }),
        )
        .unwrap();
        assert_eq!(on_hold_result.blocked, vec!["b".to_string()]);
        assert_eq!(store.schedule_of("b").unwrap().unwrap().status, TaskStatus::Blocked);

        let resume_result =
            handle_event(&store, &cal, &config, Event::new("a", 500, EventKind::Resume)).unwrap();
        assert_eq!(resume_result.new_status, Some(TaskStatus::InProgress));
        assert_eq!(resume_result.unblocked, vec!["b".to_string()]);
        assert_eq!(store.schedule_of("b").unwrap().unwrap().status, TaskStatus::Scheduled);
    }

    #[test]
    fn manual_reschedule_updates_estimated_hours_to_the_new_span() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("a", "Frame", dec!(8)));
        store.put_schedule(ScheduleRecord::new("a", 0, 800)).unwrap();

        handle_event(
            &store,
            &cal,
            &RescheduleConfig::default(),
            Event::new(
                "a",
                0,
                EventKind::ManualReschedule { new_start: 1000, new_end: 3000, reason: "client request".to_string() },
            ),
        )
        .unwrap();

        let sched = store.schedule_of("a").unwrap().unwrap();
        assert_eq!((sched.planned_start, sched.planned_end), (1000, 3000));
        // New span is 2000 WTU at scale_factor 100 -> 20 hours, replacing the
        // original 8h estimate verbatim (no working-hour clamp).
        assert_eq!(store.task("a").unwrap().estimated_hours, dec!(20));
    }

    #[test]
    fn manual_reschedule_warns_when_predecessor_anchor_is_violated() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("a", "Frame", dec!(8)));
        store.seed_task(Task::new("b", "Wire", dec!(8)));
        store.seed_dependency(rso_core::Dependency::new("a", "b"));
        store.put_schedule(ScheduleRecord::new("a", 0, 800)).unwrap();
        store.put_schedule(ScheduleRecord::new("b", 800, 1600)).unwrap();

        let result = handle_event(
            &store,
            &cal,
            &RescheduleConfig::default(),
            Event::new(
                "b",
                0,
                EventKind::ManualReschedule { new_start: 200, new_end: 1000, reason: "pull forward".to_string() },
            ),
        )
        .unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert!(matches!(
            &result.warnings[0],
            SchedulingWarning::DependencyWarning { predecessor_id, .. } if predecessor_id == "a"
        ));
    }

    #[test]
    fn resource_conflict_event_delegates_to_preemption() {
        let store = InMemoryStore::new();
        let cal = calendar();
        store.seed_task(Task::new("hi", "Critical", dec!(2)).priority(rso_core::Priority::High));
        store.seed_task(Task::new("lo", "Routine", dec!(2)).preemptable(false));
        store.put_schedule(ScheduleRecord::new("hi", 0, 200)).unwrap();
        store.put_schedule(ScheduleRecord::new("lo", 0, 200)).unwrap();
        for (task_id, entity_id) in [("hi", "emp1"), ("lo", "emp1")] {
            store
                .put_assignment(rso_core::Assignment {
                    task_id: task_id.to_string(),
                    entity_id: entity_id.to_string(),
                    kind: rso_core::ResourceKind::Employee,
                    is_initial: true,
                    is_modified: false,
                })
                .unwrap();
        }

        let result = handle_event(
            &store,
            &cal,
            &RescheduleConfig::default(),
            Event::new("", 0, EventKind::ResourceConflict { entity_id: "emp1".to_string(), conflict_time: 50 }),
        )
        .unwrap();
        assert_eq!(result.conflict_resolutions.len(), 1);
        assert_eq!(result.conflict_resolutions[0].task_id, "lo");
    }
}
