//! Working-Time Unit (WTU) calendar arithmetic.
//!
//! A WTU is an integer where `SCALE_FACTOR` units equal one hour of working
//! time. Working time flows Monday-Friday, `work_start`-`work_end` local, and
//! skips weekends entirely. Unit 0 is anchored at `work_start` on the
//! project's start date.
//!
//! The bijection `datetime_to_wtu . wtu_to_datetime == id` holds exactly on
//! the *working-instant image* of `wtu_to_datetime` restricted to
//! `[0, horizon_units()]` -- i.e. for any `u` in range, round-tripping it
//! is lossless. `datetime_to_wtu` is a total, clamping function over all
//! datetimes (including weekends and off-hours) but is not required to be
//! the precise inverse of `wtu_to_datetime` there; see DESIGN.md.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Calendar constants, loadable from configuration (see `rso-cli`'s layered
/// config) rather than hardcoded into the scheduling logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub project_start: NaiveDate,
    pub scale_factor: i64,
    pub work_hours_per_day: i64,
    pub horizon_days: i64,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
}

impl CalendarConfig {
    pub fn new(project_start: NaiveDate) -> Self {
        Self {
            project_start,
            scale_factor: 100,
            work_hours_per_day: 8,
            horizon_days: 60,
            work_start_hour: 9,
            work_end_hour: 17,
        }
    }

    pub fn units_per_day(&self) -> i64 {
        self.scale_factor * self.work_hours_per_day
    }

    pub fn horizon_units(&self) -> i64 {
        self.horizon_days * self.units_per_day()
    }

    pub fn work_start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.work_start_hour, 0, 0).expect("valid work_start_hour")
    }

    pub fn work_end_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.work_end_hour, 0, 0).expect("valid work_end_hour")
    }

    /// `weekday < 5`, i.e. Monday through Friday.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        is_working_day(date)
    }

    /// The smallest working instant >= `dt`. Shared by `datetime_to_wtu`'s
    /// own clamp and by the local repair engine's free-slot finder, so the
    /// two never disagree about what counts as "working."
    pub fn next_working_instant(&self, dt: NaiveDateTime) -> NaiveDateTime {
        let mut date = dt.date();
        let mut time = dt.time();
        loop {
            if !is_working_day(date) {
                date = date.succ_opt().expect("date overflow");
                time = self.work_start_time();
                continue;
            }
            if time < self.work_start_time() {
                time = self.work_start_time();
            } else if time >= self.work_end_time() {
                date = date.succ_opt().expect("date overflow");
                time = self.work_start_time();
                continue;
            }
            break;
        }
        NaiveDateTime::new(date, time)
    }

    /// `u = d * units_per_day + r`; advance `d` working days from
    /// `project_start`, then add `r / scale_factor` hours past `work_start`.
    pub fn wtu_to_datetime(&self, u: i64) -> NaiveDateTime {
        let units_per_day = self.units_per_day();
        let d = u.div_euclid(units_per_day);
        let r = u.rem_euclid(units_per_day);
        let date = advance_working_days(self.project_start, d);
        let minutes = ((r as f64) / (self.scale_factor as f64) * 60.0).round() as i64;
        let time = self.work_start_time() + ChronoDuration::minutes(minutes);
        NaiveDateTime::new(date, time)
    }

    /// Clamp `t` onto a working instant, then express it as a WTU count of
    /// working days (from `project_start`) plus a sub-day remainder.
    pub fn datetime_to_wtu(&self, t: NaiveDateTime) -> i64 {
        let (date, time) = if !is_working_day(t.date()) {
            (next_working_day(t.date()), self.work_start_time())
        } else if t.time() < self.work_start_time() {
            (t.date(), self.work_start_time())
        } else if t.time() > self.work_end_time() {
            (t.date(), self.work_end_time())
        } else {
            (t.date(), t.time())
        };

        let d = working_days_between(self.project_start, date);
        let minutes_past_start = (time - self.work_start_time()).num_minutes();
        let r = ((minutes_past_start as f64) / 60.0 * (self.scale_factor as f64)).round() as i64;
        d * self.units_per_day() + r
    }

    /// Convert `end_wtu` to a datetime, add `lag_hours` of *calendar* time,
    /// forward-clamp onto the next working instant, convert back. Lag
    /// traverses calendar time, not working time: a 24h lag starting Friday
    /// 17:00 lands Monday 09:00.
    pub fn add_lag(&self, end_wtu: i64, lag_hours: f64) -> i64 {
        let dt = self.wtu_to_datetime(end_wtu);
        let lag_minutes = (lag_hours * 60.0).round() as i64;
        let shifted = dt + ChronoDuration::minutes(lag_minutes);
        let working = self.next_working_instant(shifted);
        self.datetime_to_wtu(working)
    }

    /// Average working units per calendar hour, used as the fallback linear
    /// bound when the piecewise lag sampling (see `rso-solver`) needs a safe
    /// default: `scale_factor * work_hours_per_day / 24`.
    pub fn avg_units_per_calendar_hour(&self) -> f64 {
        (self.scale_factor as f64) * (self.work_hours_per_day as f64) / 24.0
    }
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn next_working_day(mut date: NaiveDate) -> NaiveDate {
    loop {
        date = date.succ_opt().expect("date overflow");
        if is_working_day(date) {
            return date;
        }
    }
}

fn advance_working_days(date: NaiveDate, n: i64) -> NaiveDate {
    if n == 0 {
        return date;
    }
    let mut current = date;
    let mut remaining = n;
    while remaining > 0 {
        current = current.succ_opt().expect("date overflow");
        if is_working_day(current) {
            remaining -= 1;
        }
    }
    current
}

fn working_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end == start {
        return 0;
    }
    let mut date = start;
    let mut count = 0i64;
    if end > start {
        while date < end {
            date = date.succ_opt().expect("date overflow");
            if is_working_day(date) {
                count += 1;
            }
        }
    } else {
        while date > end {
            date = date.pred_opt().expect("date underflow");
            if is_working_day(date) {
                count -= 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        // 2026-02-02 is a Monday.
        NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()
    }

    fn calendar() -> CalendarConfig {
        CalendarConfig::new(monday())
    }

    #[test]
    fn unit_zero_is_project_start_at_work_start() {
        let cal = calendar();
        let dt = cal.wtu_to_datetime(0);
        assert_eq!(dt.date(), monday());
        assert_eq!(dt.time(), cal.work_start_time());
    }

    #[test]
    fn units_per_day_boundary_rolls_to_next_working_day() {
        let cal = calendar();
        let dt = cal.wtu_to_datetime(cal.units_per_day());
        assert_eq!(dt.date(), monday().succ_opt().unwrap());
        assert_eq!(dt.time(), cal.work_start_time());
    }

    #[test]
    fn units_per_day_skips_weekend() {
        let cal = calendar();
        // Friday is day offset 4 from Monday; day offset 5 must be the
        // following Monday, not Saturday.
        let dt = cal.wtu_to_datetime(5 * cal.units_per_day());
        assert!(is_working_day(dt.date()));
        assert_eq!(dt.date().weekday(), Weekday::Mon);
    }

    #[test]
    fn round_trip_on_working_instant_image() {
        let cal = calendar();
        for u in [0_i64, 1, 399, 400, 799, 800, 801, 4000, 4800].into_iter() {
            let dt = cal.wtu_to_datetime(u);
            assert_eq!(cal.datetime_to_wtu(dt), u, "round trip failed for u={u}");
        }
    }

    #[test]
    fn lag_24h_from_friday_close_lands_monday_open() {
        let cal = calendar();
        // Friday is day offset 4; end-of-day Friday is WTU (4 * units_per_day) + units_per_day.
        let friday_close = 5 * cal.units_per_day();
        let landed = cal.add_lag(friday_close, 24.0);
        let dt = cal.wtu_to_datetime(landed);
        assert_eq!(dt.date().weekday(), Weekday::Mon);
        assert_eq!(dt.time(), cal.work_start_time());
    }

    #[test]
    fn lag_72h_weekend_crossing() {
        let cal = calendar();
        // A(1h) Mon 09:00-10:00; B depends with lag=72h -> Thu 09:00.
        let a_end = cal.datetime_to_wtu(NaiveDateTime::new(
            monday(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        ));
        let landed = cal.add_lag(a_end, 72.0);
        let dt = cal.wtu_to_datetime(landed);
        assert_eq!(dt.date(), monday() + ChronoDuration::days(3));
        assert_eq!(dt.time(), cal.work_start_time());
    }

    #[test]
    fn next_working_instant_clamps_weekend_to_monday() {
        let cal = calendar();
        let saturday = monday() + ChronoDuration::days(5);
        let dt = NaiveDateTime::new(saturday, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        let clamped = cal.next_working_instant(dt);
        assert_eq!(clamped.date().weekday(), Weekday::Mon);
        assert_eq!(clamped.time(), cal.work_start_time());
    }

    #[test]
    fn next_working_instant_identity_within_hours() {
        let cal = calendar();
        let dt = NaiveDateTime::new(monday(), NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(cal.next_working_instant(dt), dt);
    }

    #[test]
    fn is_working_day_excludes_weekend() {
        let sat = monday() + ChronoDuration::days(5);
        let sun = monday() + ChronoDuration::days(6);
        assert!(is_working_day(monday()));
        assert!(!is_working_day(sat));
        assert!(!is_working_day(sun));
    }
}
