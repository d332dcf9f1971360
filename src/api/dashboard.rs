use crate::auth::auth::AuthUser;
use crate::engine::DisplayStatus;
use crate::utils::session_cache::AttendanceSessions;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Day to report on (defaults to today)
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: Option<NaiveDate>,
}

#[derive(FromRow)]
struct DashboardRow {
    employee_id: u64,
    name: String,
    email: String,
    check_in: Option<NaiveTime>,
    working_hours: Option<String>,
    marked: Option<bool>,
    status: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeAttendance {
    pub employee_id: u64,
    pub name: String,
    pub email: String,
    /// "Present" or "Absent"
    pub attendance: String,
    pub check_in: Option<String>,
    pub working_hours: String,
    pub status: String,
    pub location: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DashboardTotals {
    pub present: u32,
    pub absent: u32,
    pub active: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub totals: DashboardTotals,
    pub employees: Vec<EmployeeAttendance>,
}

impl From<DashboardRow> for EmployeeAttendance {
    fn from(row: DashboardRow) -> Self {
        let present = row.marked.unwrap_or(false);
        Self {
            employee_id: row.employee_id,
            name: row.name,
            email: row.email,
            attendance: if present {
                DisplayStatus::Present
            } else {
                DisplayStatus::Absent
            }
            .to_string(),
            check_in: row
                .check_in
                .map(crate::engine::format::format_clock_time),
            working_hours: row.working_hours.unwrap_or_else(|| "0h 0m 0s".to_string()),
            status: row.status.unwrap_or_else(|| DisplayStatus::Dash.to_string()),
            location: row.location,
        }
    }
}

fn totals(employees: &[EmployeeAttendance]) -> DashboardTotals {
    employees.iter().fold(DashboardTotals::default(), |mut acc, e| {
        if e.attendance == DisplayStatus::Present.to_string() {
            acc.present += 1;
        } else {
            acc.absent += 1;
        }
        if e.status == DisplayStatus::Active.to_string() {
            acc.active += 1;
        }
        acc
    })
}

/// Attendance of every employee for one day
#[utoipa::path(
    get,
    path = "/api/dashboard/attendance",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Attendance overview", body = DashboardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn attendance_overview(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    sessions: web::Data<AttendanceSessions>,
    query: web::Query<DashboardQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| sessions.clock().today());

    let rows = sqlx::query_as::<_, DashboardRow>(
        r#"
        SELECT
            e.id AS employee_id,
            e.name,
            e.email,
            a.check_in,
            a.working_hours,
            a.marked,
            a.status,
            a.location
        FROM employees e
        LEFT JOIN attendance a
            ON a.employee_id = e.id AND a.date = ?
        ORDER BY e.name
        "#,
    )
    .bind(date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, %date, "Failed to load attendance overview");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let employees: Vec<EmployeeAttendance> = rows.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(DashboardResponse {
        date,
        totals: totals(&employees),
        employees,
    }))
}
