use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::format::{format_clock_time, format_duration};
use crate::engine::{AccrualSnapshot, AttendanceDay, EngineError, GeoPoint};
use crate::model::attendance::StoredDay;
use crate::utils::session_cache::{AttendanceSessions, SessionError};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ObservationReq {
    /// Device latitude; omitted when there is no location fix
    #[schema(example = 29.275748)]
    pub latitude: Option<f64>,
    #[schema(example = 79.545030)]
    pub longitude: Option<f64>,
    #[schema(example = true)]
    pub internet_connected: bool,
    #[schema(example = true)]
    pub location_enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "date": "2026-01-05",
    "day": "Monday",
    "check_in": "09:05 AM",
    "working_hours": "0h 5m 0s",
    "accumulated_secs": 300,
    "attendance": "Present",
    "status": "Active",
    "inside_zone": true,
    "signed_off": false,
    "distance_m": 12.4
}))]
pub struct AttendanceView {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub day: String,
    pub check_in: Option<String>,
    pub working_hours: String,
    pub accumulated_secs: i64,
    pub attendance: String,
    pub status: String,
    pub inside_zone: bool,
    pub signed_off: bool,
    /// Distance to the office reference point, when the request carried a fix
    pub distance_m: Option<f64>,
}

impl AttendanceView {
    fn from_snapshot(snapshot: &AccrualSnapshot, distance_m: Option<f64>) -> Self {
        Self {
            date: snapshot.date,
            day: snapshot.date.format("%A").to_string(),
            check_in: snapshot.check_in.map(format_clock_time),
            working_hours: format_duration(snapshot.worked),
            accumulated_secs: snapshot.worked.num_seconds(),
            attendance: snapshot.attendance.to_string(),
            status: snapshot.status.to_string(),
            inside_zone: snapshot.inside_zone,
            signed_off: snapshot.signed_off,
            distance_m,
        }
    }
}

/// Where the device was when the snapshot was taken.
#[derive(Debug, Clone, Copy)]
struct LocationFix {
    point: GeoPoint,
    inside_zone: bool,
}

fn session_failure(e: SessionError, employee_id: u64) -> actix_web::Error {
    tracing::error!(error = %e, employee_id, "Attendance session unavailable");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

fn rejection(e: EngineError) -> HttpResponse {
    let message = match e {
        EngineError::AlreadyMarked(_) => "Attendance already marked today",
        EngineError::SignedOff(_) => "Shift already signed off today",
        EngineError::NotMarked(_) => "Attendance not marked today",
        EngineError::InvalidOfficeHours { .. } => "Invalid office hours",
    };
    HttpResponse::BadRequest().json(serde_json::json!({ "message": message }))
}

/// Persisted state for `date`, if attendance was marked or signed off that day.
async fn load_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> anyhow::Result<Option<AttendanceDay>> {
    let row = sqlx::query_as::<_, StoredDay>(
        r#"
        SELECT check_in, accumulated_secs, marked, signed_off
        FROM attendance
        WHERE employee_id = ? AND date = ?
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|row| row.into_day(date)))
}

async fn upsert_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    snapshot: &AccrualSnapshot,
    fix: Option<LocationFix>,
) -> Result<(), sqlx::Error> {
    let location = fix.map(|f| if f.inside_zone { "In Office" } else { "Not in Office" });

    // accumulated time never moves backwards within a date, so a late write
    // from an older snapshot cannot undo a newer one
    sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, date, check_in, accumulated_secs, working_hours, marked,
             status, location, latitude, longitude, signed_off)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            check_in = COALESCE(check_in, VALUES(check_in)),
            accumulated_secs = GREATEST(accumulated_secs, VALUES(accumulated_secs)),
            working_hours = IF(VALUES(accumulated_secs) >= accumulated_secs,
                               VALUES(working_hours), working_hours),
            marked = marked OR VALUES(marked),
            status = VALUES(status),
            location = COALESCE(VALUES(location), location),
            latitude = COALESCE(VALUES(latitude), latitude),
            longitude = COALESCE(VALUES(longitude), longitude),
            signed_off = signed_off OR VALUES(signed_off)
        "#,
    )
    .bind(employee_id)
    .bind(snapshot.date)
    .bind(snapshot.check_in)
    .bind(snapshot.worked.num_seconds())
    .bind(format_duration(snapshot.worked))
    .bind(snapshot.marked_attendance)
    .bind(snapshot.status.to_string())
    .bind(location)
    .bind(fix.map(|f| f.point.latitude()))
    .bind(fix.map(|f| f.point.longitude()))
    .bind(snapshot.signed_off)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fire-and-forget write; the in-memory session stays authoritative.
fn persist(pool: &MySqlPool, employee_id: u64, snapshot: AccrualSnapshot, fix: Option<LocationFix>) {
    let pool = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = upsert_attendance(&pool, employee_id, &snapshot, fix).await {
            tracing::error!(error = %e, employee_id, date = %snapshot.date, "Attendance write failed");
        }
    });
}

/// Mark attendance for today
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    responses(
        (status = 200, description = "Attendance marked", body = AttendanceView),
        (status = 400, description = "Already marked or signed off today", body = Object, example = json!({
            "message": "Attendance already marked today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    sessions: web::Data<AttendanceSessions>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let result = sessions
        .with_session(
            employee_id,
            |date| load_day(pool.get_ref(), employee_id, date),
            |engine, now| {
                engine.mark_attendance(now)?;
                Ok::<_, EngineError>(engine.snapshot(now))
            },
        )
        .await
        .map_err(|e| session_failure(e, employee_id))?;

    match result {
        Ok(snapshot) => {
            tracing::info!(employee_id, check_in = ?snapshot.check_in, "Attendance marked");
            let view = AttendanceView::from_snapshot(&snapshot, None);
            persist(pool.get_ref(), employee_id, snapshot, None);
            Ok(HttpResponse::Ok().json(view))
        }
        Err(e) => Ok(rejection(e)),
    }
}

/// Report a location / connectivity observation
#[utoipa::path(
    post,
    path = "/api/attendance/observation",
    request_body = ObservationReq,
    responses(
        (status = 200, description = "Updated attendance", body = AttendanceView),
        (status = 400, description = "Malformed coordinates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn record_observation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    sessions: web::Data<AttendanceSessions>,
    payload: web::Json<ObservationReq>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let point = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon).map_err(|e| {
            actix_web::error::ErrorBadRequest(e.to_string())
        })?),
        _ => None,
    };
    // no fix or disabled location services means the zone cannot be confirmed
    let fix = point
        .filter(|_| payload.location_enabled)
        .map(|point| LocationFix {
            point,
            inside_zone: config.geofence.contains(&point),
        });
    let inside_zone = fix.is_some_and(|f| f.inside_zone);

    let snapshot = sessions
        .with_session(
            employee_id,
            |date| load_day(pool.get_ref(), employee_id, date),
            |engine, now| {
                engine.update_accrual(now, inside_zone);
                engine.refresh_status(
                    inside_zone,
                    payload.internet_connected,
                    payload.location_enabled,
                );
                engine.snapshot(now)
            },
        )
        .await
        .map_err(|e| session_failure(e, employee_id))?;

    tracing::debug!(
        employee_id,
        inside_zone,
        worked_secs = snapshot.worked.num_seconds(),
        "Observation applied"
    );

    let distance_m = fix.map(|f| config.geofence.distance_m(&f.point));
    let view = AttendanceView::from_snapshot(&snapshot, distance_m);
    // a signed-off day keeps the final figures written at sign-off
    if !snapshot.signed_off {
        persist(pool.get_ref(), employee_id, snapshot, fix);
    }
    Ok(HttpResponse::Ok().json(view))
}

/// Sign off for the rest of the day
#[utoipa::path(
    post,
    path = "/api/attendance/sign-off",
    responses(
        (status = 200, description = "Final figures for the day", body = AttendanceView),
        (status = 400, description = "Attendance not marked today", body = Object, example = json!({
            "message": "Attendance not marked today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn sign_off(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    sessions: web::Data<AttendanceSessions>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let result = sessions
        .with_session(
            employee_id,
            |date| load_day(pool.get_ref(), employee_id, date),
            |engine, now| engine.sign_off(now),
        )
        .await
        .map_err(|e| session_failure(e, employee_id))?;

    match result {
        Ok(summary) => {
            tracing::info!(
                employee_id,
                worked = %format_duration(summary.worked),
                "Signed off"
            );
            let view = AttendanceView::from_snapshot(&summary, None);
            persist(pool.get_ref(), employee_id, summary, None);
            Ok(HttpResponse::Ok().json(view))
        }
        Err(e) => Ok(rejection(e)),
    }
}

/// Current attendance figures for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    responses(
        (status = 200, description = "Current attendance", body = AttendanceView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    sessions: web::Data<AttendanceSessions>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let snapshot = sessions
        .with_session(
            employee_id,
            |date| load_day(pool.get_ref(), employee_id, date),
            |engine, now| engine.snapshot(now),
        )
        .await
        .map_err(|e| session_failure(e, employee_id))?;

    Ok(HttpResponse::Ok().json(AttendanceView::from_snapshot(&snapshot, None)))
}
