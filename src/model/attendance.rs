use crate::engine::AttendanceDay;
use chrono::{Duration, NaiveDate, NaiveTime};

/// The part of an `attendance` row needed to resume a day's session.
#[derive(Debug, sqlx::FromRow)]
pub struct StoredDay {
    pub check_in: Option<NaiveTime>,
    pub accumulated_secs: i64,
    pub marked: bool,
    pub signed_off: bool,
}

impl StoredDay {
    /// A row that was never marked nor signed off carries nothing to resume.
    pub fn into_day(self, date: NaiveDate) -> Option<AttendanceDay> {
        (self.marked || self.signed_off).then(|| {
            AttendanceDay::restore(
                date,
                self.check_in,
                Duration::seconds(self.accumulated_secs.max(0)),
                self.signed_off,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn unmarked_row_resumes_nothing() {
        let row = StoredDay {
            check_in: None,
            accumulated_secs: 0,
            marked: false,
            signed_off: false,
        };
        assert!(row.into_day(date()).is_none());
    }

    #[test]
    fn marked_row_resumes_accumulated_time() {
        let row = StoredDay {
            check_in: NaiveTime::from_hms_opt(9, 5, 0),
            accumulated_secs: 1800,
            marked: true,
            signed_off: false,
        };
        let day = row.into_day(date()).expect("marked day");
        assert!(day.marked_attendance());
        assert_eq!(day.accumulated(), Duration::minutes(30));
        assert_eq!(day.check_in(), NaiveTime::from_hms_opt(9, 5, 0));
    }
}
