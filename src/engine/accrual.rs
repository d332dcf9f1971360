use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use strum_macros::{Display, EnumString};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("attendance already marked for {0}")]
    AlreadyMarked(NaiveDate),
    #[error("shift already signed off for {0}")]
    SignedOff(NaiveDate),
    #[error("attendance not marked for {0}")]
    NotMarked(NaiveDate),
    #[error("office hours start {start} is after end {end}")]
    InvalidOfficeHours { start: NaiveTime, end: NaiveTime },
}

/// Label shown next to an employee on the home screen and the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
pub enum DisplayStatus {
    Active,
    Present,
    Absent,
    #[strum(serialize = "--")]
    #[serde(rename = "--")]
    Dash,
}

impl DisplayStatus {
    /// No network or no location services always wins; otherwise the zone decides.
    /// Whether attendance was marked is reported separately and never overrides this.
    pub fn compute(inside_zone: bool, internet_connected: bool, location_enabled: bool) -> Self {
        if !internet_connected || !location_enabled {
            return DisplayStatus::Dash;
        }
        if inside_zone {
            DisplayStatus::Active
        } else {
            DisplayStatus::Dash
        }
    }
}

/// Daily window during which time inside the zone counts. Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfficeHours {
    start: NaiveTime,
    end: NaiveTime,
}

impl OfficeHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, EngineError> {
        if start > end {
            return Err(EngineError::InvalidOfficeHours { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn clamp(&self, t: NaiveTime) -> NaiveTime {
        t.clamp(self.start, self.end)
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Per-employee, per-date accrual state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceDay {
    date: NaiveDate,
    marked_attendance: bool,
    signed_off: bool,
    check_in: Option<NaiveTime>,
    accumulated: Duration,
    last_zone_entry: Option<NaiveTime>,
    // largest span observed for the open interval; keeps the display from
    // going backwards when ticks arrive out of order
    open_high_water: Duration,
    was_inside_zone: bool,
    display_status: DisplayStatus,
}

impl AttendanceDay {
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            marked_attendance: false,
            signed_off: false,
            check_in: None,
            accumulated: Duration::zero(),
            last_zone_entry: None,
            open_high_water: Duration::zero(),
            was_inside_zone: false,
            display_status: DisplayStatus::Dash,
        }
    }

    /// Rebuilds a day from a persisted row. Zone membership is not persisted,
    /// so the first observation after a restore is treated as a fresh edge.
    pub fn restore(
        date: NaiveDate,
        check_in: Option<NaiveTime>,
        accumulated: Duration,
        signed_off: bool,
    ) -> Self {
        let mut day = Self::fresh(date);
        if signed_off {
            day.signed_off = true;
            return day;
        }
        if let Some(check_in) = check_in {
            day.marked_attendance = true;
            day.check_in = Some(check_in);
            day.accumulated = accumulated.max(Duration::zero());
        }
        day
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn marked_attendance(&self) -> bool {
        self.marked_attendance
    }

    pub fn signed_off(&self) -> bool {
        self.signed_off
    }

    pub fn check_in(&self) -> Option<NaiveTime> {
        self.check_in
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    pub fn last_zone_entry(&self) -> Option<NaiveTime> {
        self.last_zone_entry
    }

    pub fn was_inside_zone(&self) -> bool {
        self.was_inside_zone
    }

    pub fn display_status(&self) -> DisplayStatus {
        self.display_status
    }

    /// "Present" once marked for the day, "Absent" otherwise.
    pub fn attendance_label(&self) -> DisplayStatus {
        if self.marked_attendance {
            DisplayStatus::Present
        } else {
            DisplayStatus::Absent
        }
    }
}

/// Point-in-time view handed to the persistence sink and the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualSnapshot {
    pub date: NaiveDate,
    pub marked_attendance: bool,
    pub signed_off: bool,
    pub check_in: Option<NaiveTime>,
    pub worked: Duration,
    pub attendance: DisplayStatus,
    pub status: DisplayStatus,
    pub inside_zone: bool,
}

/// Folds a stream of `(now, inside_zone)` observations into worked time for one
/// employee. Callers serialize access; every method is a synchronous fold.
#[derive(Debug, Clone)]
pub struct AccrualEngine {
    hours: OfficeHours,
    day: AttendanceDay,
}

impl AccrualEngine {
    pub fn new(hours: OfficeHours, today: NaiveDate) -> Self {
        Self::resume(hours, AttendanceDay::fresh(today))
    }

    pub fn resume(hours: OfficeHours, day: AttendanceDay) -> Self {
        Self { hours, day }
    }

    pub fn day(&self) -> &AttendanceDay {
        &self.day
    }

    pub fn office_hours(&self) -> OfficeHours {
        self.hours
    }

    pub fn mark_attendance(&mut self, now: NaiveTime) -> Result<(), EngineError> {
        if self.day.signed_off {
            return Err(EngineError::SignedOff(self.day.date));
        }
        if self.day.marked_attendance {
            return Err(EngineError::AlreadyMarked(self.day.date));
        }

        self.day.marked_attendance = true;
        self.day.check_in = Some(now);
        self.day.accumulated = Duration::zero();
        self.day.open_high_water = Duration::zero();
        // checking in from inside the zone opens the first interval right away
        self.day.last_zone_entry = if self.day.was_inside_zone {
            Some(self.hours.clamp(now))
        } else {
            None
        };
        Ok(())
    }

    /// Applies one observation and returns the duration to display.
    pub fn update_accrual(&mut self, now: NaiveTime, inside_zone: bool) -> Duration {
        let bounded = self.hours.clamp(now);

        if self.day.marked_attendance {
            if inside_zone && !self.day.was_inside_zone {
                self.day.last_zone_entry = Some(bounded);
                self.day.open_high_water = Duration::zero();
            } else if !inside_zone && self.day.was_inside_zone {
                self.fold_open_interval(bounded);
            }
        }
        self.day.was_inside_zone = inside_zone;

        self.display_duration(bounded)
    }

    /// Derives the display status and stores it on the day.
    pub fn refresh_status(
        &mut self,
        inside_zone: bool,
        internet_connected: bool,
        location_enabled: bool,
    ) -> DisplayStatus {
        let status = DisplayStatus::compute(inside_zone, internet_connected, location_enabled);
        self.day.display_status = status;
        status
    }

    /// Ends the shift early: closes any open interval, then clears the day.
    /// Returns the final figures so the caller can persist them.
    pub fn sign_off(&mut self, now: NaiveTime) -> Result<AccrualSnapshot, EngineError> {
        if !self.day.marked_attendance {
            return Err(EngineError::NotMarked(self.day.date));
        }

        let bounded = self.hours.clamp(now);
        self.fold_open_interval(bounded);

        let summary = AccrualSnapshot {
            date: self.day.date,
            marked_attendance: true,
            signed_off: true,
            check_in: self.day.check_in,
            worked: self.day.accumulated,
            attendance: DisplayStatus::Present,
            status: DisplayStatus::Dash,
            inside_zone: self.day.was_inside_zone,
        };

        let mut cleared = AttendanceDay::fresh(self.day.date);
        cleared.signed_off = true;
        self.day = cleared;

        Ok(summary)
    }

    /// Returns true when the stored day was replaced.
    pub fn rollover_if_new_day(&mut self, today: NaiveDate) -> bool {
        if self.day.date == today {
            return false;
        }
        self.day = AttendanceDay::fresh(today);
        true
    }

    /// Current figures at `now` without recording a new observation.
    pub fn snapshot(&mut self, now: NaiveTime) -> AccrualSnapshot {
        let worked = self.display_duration(self.hours.clamp(now));
        AccrualSnapshot {
            date: self.day.date,
            marked_attendance: self.day.marked_attendance,
            signed_off: self.day.signed_off,
            check_in: self.day.check_in,
            worked,
            attendance: self.day.attendance_label(),
            status: self.day.display_status,
            inside_zone: self.day.was_inside_zone,
        }
    }

    fn open_span(&mut self, bounded: NaiveTime) -> Duration {
        let Some(entry) = self.day.last_zone_entry else {
            return Duration::zero();
        };
        let span = (bounded - entry).max(Duration::zero());
        self.day.open_high_water = self.day.open_high_water.max(span);
        self.day.open_high_water
    }

    fn display_duration(&mut self, bounded: NaiveTime) -> Duration {
        self.day.accumulated + self.open_span(bounded)
    }

    fn fold_open_interval(&mut self, bounded: NaiveTime) {
        let span = self.open_span(bounded);
        if let Some(entry) = self.day.last_zone_entry.take() {
            if self.hours.contains(entry) {
                self.day.accumulated = self.day.accumulated + span;
            }
        }
        self.day.open_high_water = Duration::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::format::format_duration;
    use proptest::prelude::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn engine() -> AccrualEngine {
        AccrualEngine::new(OfficeHours::new(t(9, 0), t(18, 0)).unwrap(), day())
    }

    #[test]
    fn office_hours_reject_inverted_window() {
        let err = OfficeHours::new(t(18, 0), t(9, 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidOfficeHours { .. }));
    }

    #[test]
    fn office_hours_clamp_is_inclusive() {
        let hours = OfficeHours::new(t(9, 0), t(18, 0)).unwrap();
        assert_eq!(hours.clamp(t(8, 0)), t(9, 0));
        assert_eq!(hours.clamp(t(19, 0)), t(18, 0));
        assert!(hours.contains(t(9, 0)));
        assert!(hours.contains(t(18, 0)));
        assert!(!hours.contains(t(18, 1)));
    }

    #[test]
    fn working_day_scenario() {
        let mut engine = engine();
        engine.update_accrual(t(9, 5), true);
        engine.mark_attendance(t(9, 5)).unwrap();

        let shown = engine.update_accrual(t(9, 10), true);
        assert_eq!(format_duration(shown), "0h 5m 0s");

        engine.update_accrual(t(9, 10), false);
        assert_eq!(engine.day().accumulated(), Duration::minutes(5));
        assert_eq!(engine.day().last_zone_entry(), None);

        let shown = engine.update_accrual(t(9, 20), true);
        assert_eq!(shown, Duration::minutes(5));

        let shown = engine.update_accrual(t(9, 25), true);
        assert_eq!(format_duration(shown), "0h 10m 0s");
    }

    #[test]
    fn mark_before_first_observation_opens_on_entry() {
        let mut engine = engine();
        engine.mark_attendance(t(9, 5)).unwrap();
        engine.update_accrual(t(9, 5), true);
        let shown = engine.update_accrual(t(9, 10), true);
        assert_eq!(shown, Duration::minutes(5));
    }

    #[test]
    fn entry_before_opening_is_clipped() {
        let mut engine = engine();
        engine.mark_attendance(t(8, 45)).unwrap();
        engine.update_accrual(t(8, 50), true);
        engine.update_accrual(t(9, 10), false);
        assert_eq!(engine.day().accumulated(), Duration::minutes(10));
    }

    #[test]
    fn time_after_closing_is_not_counted() {
        let mut engine = engine();
        engine.mark_attendance(t(17, 0)).unwrap();
        engine.update_accrual(t(17, 30), true);
        engine.update_accrual(t(19, 0), true);
        engine.update_accrual(t(20, 0), false);
        assert_eq!(engine.day().accumulated(), Duration::minutes(30));

        engine.update_accrual(t(20, 30), true);
        engine.update_accrual(t(21, 0), false);
        assert_eq!(engine.day().accumulated(), Duration::minutes(30));
    }

    #[test]
    fn marking_twice_is_rejected_without_side_effects() {
        let mut engine = engine();
        engine.update_accrual(t(9, 0), true);
        engine.mark_attendance(t(9, 0)).unwrap();
        engine.update_accrual(t(9, 30), false);

        let err = engine.mark_attendance(t(10, 0)).unwrap_err();
        assert_eq!(err, EngineError::AlreadyMarked(day()));
        assert_eq!(engine.day().check_in(), Some(t(9, 0)));
        assert_eq!(engine.day().accumulated(), Duration::minutes(30));
    }

    #[test]
    fn nothing_accrues_before_marking() {
        let mut engine = engine();
        engine.update_accrual(t(9, 0), true);
        let shown = engine.update_accrual(t(10, 0), true);
        assert_eq!(shown, Duration::zero());
        assert_eq!(engine.day().last_zone_entry(), None);
    }

    #[test]
    fn leaving_before_check_in_adds_nothing() {
        let mut engine = engine();
        engine.update_accrual(t(9, 0), true);
        engine.update_accrual(t(9, 30), false);
        engine.mark_attendance(t(9, 40)).unwrap();
        engine.update_accrual(t(10, 0), false);
        assert_eq!(engine.day().accumulated(), Duration::zero());
    }

    #[test]
    fn repeated_ticks_do_not_touch_accumulated() {
        let mut engine = engine();
        engine.mark_attendance(t(9, 0)).unwrap();
        engine.update_accrual(t(9, 0), true);
        for minute in 1..30 {
            engine.update_accrual(t(9, minute), true);
            assert_eq!(engine.day().accumulated(), Duration::zero());
        }
    }

    #[test]
    fn out_of_order_tick_never_shrinks_display() {
        let mut engine = engine();
        engine.mark_attendance(t(9, 0)).unwrap();
        engine.update_accrual(t(9, 0), true);
        assert_eq!(engine.update_accrual(t(9, 20), true), Duration::minutes(20));
        assert_eq!(engine.update_accrual(t(9, 10), true), Duration::minutes(20));
        engine.update_accrual(t(9, 5), false);
        assert_eq!(engine.day().accumulated(), Duration::minutes(20));
    }

    #[test]
    fn sign_off_folds_open_interval_and_blocks_remarking() {
        let mut engine = engine();
        engine.mark_attendance(t(9, 0)).unwrap();
        engine.update_accrual(t(9, 0), true);

        let summary = engine.sign_off(t(12, 0)).unwrap();
        assert_eq!(summary.worked, Duration::hours(3));
        assert_eq!(summary.check_in, Some(t(9, 0)));

        assert!(!engine.day().marked_attendance());
        assert_eq!(engine.day().accumulated(), Duration::zero());
        assert_eq!(
            engine.mark_attendance(t(13, 0)),
            Err(EngineError::SignedOff(day()))
        );
    }

    #[test]
    fn sign_off_requires_marked_attendance() {
        let mut engine = engine();
        assert_eq!(engine.sign_off(t(12, 0)), Err(EngineError::NotMarked(day())));
    }

    #[test]
    fn rollover_resets_state() {
        let mut engine = engine();
        engine.mark_attendance(t(9, 0)).unwrap();
        engine.update_accrual(t(9, 0), true);
        engine.update_accrual(t(11, 0), false);

        assert!(!engine.rollover_if_new_day(day()));
        assert_eq!(engine.day().accumulated(), Duration::hours(2));

        let next = day().succ_opt().unwrap();
        assert!(engine.rollover_if_new_day(next));
        assert_eq!(engine.day().date(), next);
        assert_eq!(engine.day().accumulated(), Duration::zero());
        assert!(!engine.day().marked_attendance());
        assert!(engine.mark_attendance(t(9, 0)).is_ok());
    }

    #[test]
    fn restore_keeps_accumulated_but_not_open_interval() {
        let restored =
            AttendanceDay::restore(day(), Some(t(9, 0)), Duration::minutes(42), false);
        let mut engine = AccrualEngine::resume(OfficeHours::new(t(9, 0), t(18, 0)).unwrap(), restored);
        assert!(engine.day().marked_attendance());
        assert_eq!(engine.update_accrual(t(10, 0), true), Duration::minutes(42));
        assert_eq!(engine.update_accrual(t(10, 5), true), Duration::minutes(47));
    }

    #[test]
    fn restore_of_signed_off_day_stays_closed() {
        let restored = AttendanceDay::restore(day(), Some(t(9, 0)), Duration::hours(1), true);
        assert!(restored.signed_off());
        assert!(!restored.marked_attendance());
    }

    #[test]
    fn status_derivation() {
        assert_eq!(DisplayStatus::compute(true, true, true), DisplayStatus::Active);
        assert_eq!(DisplayStatus::compute(false, true, true), DisplayStatus::Dash);
        assert_eq!(DisplayStatus::compute(true, false, true), DisplayStatus::Dash);
        assert_eq!(DisplayStatus::compute(true, true, false), DisplayStatus::Dash);
        assert_eq!(DisplayStatus::Dash.to_string(), "--");
        assert_eq!("Present".parse::<DisplayStatus>().unwrap(), DisplayStatus::Present);
    }

    #[test]
    fn status_is_independent_of_marking() {
        let mut engine = engine();
        engine.mark_attendance(t(9, 0)).unwrap();
        let status = engine.refresh_status(false, true, true);
        assert_eq!(status, DisplayStatus::Dash);
        assert_eq!(engine.day().attendance_label(), DisplayStatus::Present);
    }

    proptest! {
        #[test]
        fn displayed_duration_never_decreases(
            mark_at in 0usize..20,
            steps in proptest::collection::vec((0u32..24 * 60, any::<bool>()), 1..60),
        ) {
            let mut engine = engine();
            let mut last = Duration::zero();
            for (i, (minute, inside)) in steps.into_iter().enumerate() {
                if i == mark_at {
                    let _ = engine.mark_attendance(t(minute / 60, minute % 60));
                }
                let shown = engine.update_accrual(t(minute / 60, minute % 60), inside);
                prop_assert!(shown >= Duration::zero());
                prop_assert!(shown >= last);
                last = shown;
            }
        }
    }
}
