//! Rescheduling thresholds (§4.7). Configuration values, not literals baked
//! into the state machine, so `rso-cli`'s layered config can override them.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescheduleConfig {
    /// A single break at or under this many minutes never triggers a
    /// reschedule.
    pub short_break_threshold_minutes: i64,
    /// Once a task's breaks accumulate past this many minutes in one day,
    /// the next break triggers a reschedule even if it is itself short.
    pub cumulative_break_threshold_minutes: i64,
}

impl Default for RescheduleConfig {
    fn default() -> Self {
        Self {
            short_break_threshold_minutes: 30,
            cumulative_break_threshold_minutes: 30,
        }
    }
}
