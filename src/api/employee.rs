use crate::auth::auth::AuthUser;
use crate::model::employee::Employee;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()))
}

/// Employee directory (admin)
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employees", body = [Employee]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employees = match search_pattern(query.search.as_deref()) {
        Some(pattern) => {
            sqlx::query_as::<_, Employee>(
                r#"
                SELECT id, name, email FROM employees
                WHERE LOWER(name) LIKE ? OR LOWER(email) LIKE ?
                ORDER BY name
                "#,
            )
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Employee>("SELECT id, name, email FROM employees ORDER BY name")
                .fetch_all(pool.get_ref())
                .await
        }
    }
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to list employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tracing::debug!(count = employees.len(), "Employees listed");

    Ok(HttpResponse::Ok().json(employees))
}
