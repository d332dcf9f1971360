use crate::engine::{AccrualEngine, AttendanceDay, Clock, OfficeHours};
use chrono::{NaiveDate, NaiveTime};
use moka::future::Cache;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to load attendance day: {0}")]
    Load(Arc<anyhow::Error>),
    #[error("attendance session lock poisoned")]
    Poisoned,
}

/// One accrual engine per employee, kept in memory while the employee is
/// active. Each engine sits behind its own mutex so observations for the same
/// employee apply in arrival order.
pub struct AttendanceSessions {
    cache: Cache<u64, Arc<Mutex<AccrualEngine>>>,
    hours: OfficeHours,
    clock: Arc<dyn Clock>,
}

impl AttendanceSessions {
    pub fn new(hours: OfficeHours, clock: Arc<dyn Clock>, idle: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(idle)
                .build(),
            hours,
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Runs `f` against the employee's engine at the current time. On a cache
    /// miss `load` is asked for the persisted state of today's date; `None`
    /// starts a fresh day. Day rollover is applied before `f` sees the engine.
    pub async fn with_session<L, Fut, F, R>(
        &self,
        employee_id: u64,
        load: L,
        f: F,
    ) -> Result<R, SessionError>
    where
        L: FnOnce(NaiveDate) -> Fut,
        Fut: Future<Output = anyhow::Result<Option<AttendanceDay>>>,
        F: FnOnce(&mut AccrualEngine, NaiveTime) -> R,
    {
        let now = self.clock.now();
        let today = now.date();
        let hours = self.hours;

        let session = self
            .cache
            .try_get_with(employee_id, async move {
                let engine = match load(today).await? {
                    Some(day) => AccrualEngine::resume(hours, day),
                    None => AccrualEngine::new(hours, today),
                };
                Ok::<_, anyhow::Error>(Arc::new(Mutex::new(engine)))
            })
            .await
            .map_err(SessionError::Load)?;

        let mut engine = session.lock().map_err(|_| SessionError::Poisoned)?;
        if engine.rollover_if_new_day(today) {
            tracing::info!(employee_id, %today, "Attendance day rolled over");
        }
        Ok(f(&mut engine, now.time()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::fixed::FixedClock;
    use chrono::NaiveDateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap()
    }

    fn hours() -> OfficeHours {
        OfficeHours::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
        .unwrap()
    }

    async fn nothing_persisted(_: NaiveDate) -> anyhow::Result<Option<AttendanceDay>> {
        Ok(None)
    }

    #[actix_web::test]
    async fn loads_once_and_keeps_state() {
        let clock = Arc::new(FixedClock::at(at("2025-03-14", "09:00")));
        let sessions = AttendanceSessions::new(hours(), clock.clone(), Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        let load = |_: NaiveDate| {
            loads.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        };
        sessions
            .with_session(7, load, |engine, now| {
                engine.update_accrual(now, true);
                engine.mark_attendance(now)
            })
            .await
            .unwrap()
            .unwrap();

        clock.set(at("2025-03-14", "09:30"));
        let load = |_: NaiveDate| {
            loads.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        };
        let worked = sessions
            .with_session(7, load, |engine, now| engine.update_accrual(now, true))
            .await
            .unwrap();

        assert_eq!(worked, chrono::Duration::minutes(30));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn restores_persisted_day() {
        let clock = Arc::new(FixedClock::at(at("2025-03-14", "11:00")));
        let sessions = AttendanceSessions::new(hours(), clock, Duration::from_secs(60));

        let marked = sessions
            .with_session(
                3,
                |date| async move {
                    Ok(Some(AttendanceDay::restore(
                        date,
                        NaiveTime::from_hms_opt(9, 0, 0),
                        chrono::Duration::minutes(90),
                        false,
                    )))
                },
                |engine, _| (engine.day().marked_attendance(), engine.day().accumulated()),
            )
            .await
            .unwrap();

        assert_eq!(marked, (true, chrono::Duration::minutes(90)));
    }

    #[actix_web::test]
    async fn rolls_over_at_midnight() {
        let clock = Arc::new(FixedClock::at(at("2025-03-14", "10:00")));
        let sessions = AttendanceSessions::new(hours(), clock.clone(), Duration::from_secs(60));

        sessions
            .with_session(1, nothing_persisted, |engine, now| engine.mark_attendance(now))
            .await
            .unwrap()
            .unwrap();

        clock.set(at("2025-03-15", "08:00"));
        let day = sessions
            .with_session(1, nothing_persisted, |engine, _| engine.day().clone())
            .await
            .unwrap();

        assert_eq!(day.date(), NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert!(!day.marked_attendance());
    }

    #[actix_web::test]
    async fn load_failure_is_reported() {
        let clock = Arc::new(FixedClock::at(at("2025-03-14", "10:00")));
        let sessions = AttendanceSessions::new(hours(), clock, Duration::from_secs(60));

        let result = sessions
            .with_session(
                9,
                |_| async { Err(anyhow::anyhow!("database down")) },
                |_, _| (),
            )
            .await;

        assert!(matches!(result, Err(SessionError::Load(_))));
    }
}
