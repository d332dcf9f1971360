use crate::api::attendance::{AttendanceView, ObservationReq};
use crate::api::dashboard::{DashboardQuery, DashboardResponse, DashboardTotals, EmployeeAttendance};
use crate::api::notification::NotificationView;
use crate::api::task::{AssignTask, UpdateTaskStatus};
use crate::auth::handlers::LoginResponse;
use crate::model::employee::Employee;
use crate::model::notification::Notification;
use crate::model::task::{Task, TaskStatus};
use crate::models::{LoginReqDto, UserReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geofenced Attendance API",
        version = "1.0.0",
        description = r#"
## Geofenced attendance

Employees mark attendance once a day and their phones report location and
connectivity observations. Working hours accrue only while the employee is
inside the office geofence during office hours.

### Key features
- **Attendance**: mark attendance, report observations, sign off, view today's figures
- **Dashboard**: per-day attendance overview and employee directory for admins
- **Tasks**: admins assign tasks, employees report progress
- **Notifications**: admins see task status changes

### Security
All `/api` endpoints require a **JWT bearer** access token obtained from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::record_observation,
        crate::api::attendance::sign_off,
        crate::api::attendance::my_attendance,

        crate::api::dashboard::attendance_overview,
        crate::api::employee::list_employees,

        crate::api::task::assign_task,
        crate::api::task::list_tasks,
        crate::api::task::my_tasks,
        crate::api::task::update_task_status,
        crate::api::task::delete_task,

        crate::api::notification::unread_notifications,
        crate::api::notification::mark_read
    ),
    components(
        schemas(
            UserReq,
            LoginReqDto,
            LoginResponse,
            ObservationReq,
            AttendanceView,
            DashboardQuery,
            DashboardResponse,
            DashboardTotals,
            EmployeeAttendance,
            Employee,
            AssignTask,
            UpdateTaskStatus,
            Task,
            TaskStatus,
            Notification,
            NotificationView
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Registration and tokens"),
        (name = "Attendance", description = "Attendance and working hours"),
        (name = "Dashboard", description = "Admin overview"),
        (name = "Employee", description = "Employee directory"),
        (name = "Task", description = "Task assignment"),
        (name = "Notification", description = "Task status notifications"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
