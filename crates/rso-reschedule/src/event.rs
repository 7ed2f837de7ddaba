//! Event types accepted by the state machine (§4.7). All instants are WTU,
//! the same unit `rso-solver` and `ScheduleRecord` use, so a handler never
//! has to convert between a wall-clock timestamp and the schedule's own
//! time axis.

#[derive(Debug, Clone)]
pub enum EventKind {
    ClockIn,
    /// `period_start` is when this work session began; the session's end
    /// is the event's own timestamp. `carry_over` marks the end-of-day
    /// branch regardless of the computed completion percentage.
    ClockOut { period_start: i64, carry_over: bool },
    /// A break from `start_time` to `end_time`.
    Pause { start_time: i64, end_time: i64, reason: String },
    OnHold { reason: String, expected_resume: Option<i64> },
    Resume,
    Complete,
    Skip { reason: String },
    ManualReschedule { new_start: i64, new_end: i64, reason: String },
    ResourceConflict { entity_id: String, conflict_time: i64 },
}

#[derive(Debug, Clone)]
pub struct Event {
    pub task_id: String,
    pub timestamp: i64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(task_id: impl Into<String>, timestamp: i64, kind: EventKind) -> Self {
        Self {
            task_id: task_id.into(),
            timestamp,
            kind,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match &self.kind {
            EventKind::ClockIn => "clock_in",
            EventKind::ClockOut { .. } => "clock_out",
            EventKind::Pause { .. } => "pause",
            EventKind::OnHold { .. } => "on_hold",
            EventKind::Resume => "resume",
            EventKind::Complete => "complete",
            EventKind::Skip { .. } => "skip",
            EventKind::ManualReschedule { .. } => "manual_reschedule",
            EventKind::ResourceConflict { .. } => "resource_conflict",
        }
    }
}
