//! Free-slot finder (§4.8). Shared by the carry-over, preemption, and
//! resume paths so none of them disagrees about what counts as an open
//! slot: the earliest working instant not overlapped by any span in a
//! busy list, with boundary contact allowed.

use rso_core::CalendarConfig;

/// The smallest working WTU >= `u`, expressed in WTU space via a zero-hour
/// lag through [`CalendarConfig::add_lag`] — the same forward clamp
/// `add_lag` already applies, so the two never disagree about what counts
/// as "working."
pub fn next_working_wtu(calendar: &CalendarConfig, u: i64) -> i64 {
    calendar.add_lag(u, 0.0)
}

/// Earliest working instant >= `t` that does not fall strictly inside any
/// `[start, end)` span in `busy`. Touching a boundary (`candidate == end`)
/// is not a conflict.
pub fn next_available_after(calendar: &CalendarConfig, t: i64, busy: &[(i64, i64)]) -> i64 {
    let mut candidate = next_working_wtu(calendar, t);
    loop {
        match busy.iter().find(|&&(s, e)| candidate >= s && candidate < e) {
            Some(&(_, e)) => candidate = next_working_wtu(calendar, e),
            None => return candidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn calendar() -> CalendarConfig {
        CalendarConfig::new(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap())
    }

    #[test]
    fn empty_busy_list_returns_next_working_instant() {
        let cal = calendar();
        assert_eq!(next_available_after(&cal, 100, &[]), 100);
    }

    #[test]
    fn overlapping_span_pushes_candidate_past_its_end() {
        let cal = calendar();
        let slot = next_available_after(&cal, 100, &[(50, 300)]);
        assert_eq!(slot, 300);
    }

    #[test]
    fn boundary_touch_is_not_a_conflict() {
        let cal = calendar();
        // candidate lands exactly on a span's end; that's allowed.
        let slot = next_available_after(&cal, 300, &[(50, 300)]);
        assert_eq!(slot, 300);
    }

    #[test]
    fn chained_overlaps_resolve_to_first_open_slot() {
        let cal = calendar();
        let slot = next_available_after(&cal, 0, &[(0, 100), (100, 250)]);
        assert_eq!(slot, 250);
    }
}
