use crate::auth::auth::AuthUser;
use crate::model::task::{Task, TaskStatus};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTask {
    #[schema(example = 2)]
    pub employee_id: u64,
    #[schema(example = "Prepare weekly report")]
    pub title: String,
    #[schema(example = "Summarise this week's site visits")]
    pub description: String,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub due_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskStatus {
    #[schema(example = "In Progress")]
    pub status: TaskStatus,
    #[schema(example = "Started on the first section")]
    pub response: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskFilter {
    /// Employee whose tasks to list
    pub employee_id: u64,
}

const TASK_COLUMNS: &str = r#"
    id, employee_id, employee_name, admin_id, admin_name, title, description,
    due_date, status, employee_response, created_at, last_updated
"#;

fn internal(context: &'static str) -> impl Fn(sqlx::Error) -> actix_web::Error {
    move |e| {
        tracing::error!(error = %e, "{context}");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    }
}

async fn fetch_tasks_for(pool: &MySqlPool, employee_id: u64) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE employee_id = ? ORDER BY created_at DESC"
    ))
    .bind(employee_id)
    .fetch_all(pool)
    .await
}

/// Assign a task to an employee (admin)
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = AssignTask,
    responses(
        (status = 201, description = "Task assigned", body = Object, example = json!({
            "message": "Task assigned",
            "id": "5f0c6f0e-3c55-4a3e-9d51-8f0b9a3f6d10"
        })),
        (status = 400, description = "Missing title"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn assign_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AssignTask>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Task title is required"
        })));
    }

    let employee_name = sqlx::query_scalar::<_, String>("SELECT name FROM employees WHERE id = ?")
        .bind(payload.employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(internal("Failed to look up employee"))?;

    let Some(employee_name) = employee_name else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let task_id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, employee_id, employee_name, admin_id, admin_name, title, description,
             due_date, status, employee_response)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, '')
        "#,
    )
    .bind(&task_id)
    .bind(payload.employee_id)
    .bind(&employee_name)
    .bind(auth.user_id)
    .bind(&auth.username)
    .bind(title)
    .bind(payload.description.trim())
    .bind(payload.due_date)
    .bind(TaskStatus::Pending.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(internal("Failed to assign task"))?;

    tracing::info!(task_id = %task_id, employee_id = payload.employee_id, "Task assigned");

    Ok(HttpResponse::Created().json(json!({
        "message": "Task assigned",
        "id": task_id
    })))
}

/// Tasks assigned to an employee (admin)
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskFilter),
    responses(
        (status = 200, description = "Tasks for the employee", body = [Task]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn list_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TaskFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let tasks = fetch_tasks_for(pool.get_ref(), query.employee_id)
        .await
        .map_err(internal("Failed to list tasks"))?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Tasks assigned to the caller (employee)
#[utoipa::path(
    get,
    path = "/api/tasks/mine",
    responses(
        (status = 200, description = "Caller's tasks", body = [Task]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn my_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let tasks = fetch_tasks_for(pool.get_ref(), employee_id)
        .await
        .map_err(internal("Failed to list tasks"))?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Update progress on one of the caller's tasks (employee)
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}/status",
    request_body = UpdateTaskStatus,
    params(("task_id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Illegal status change"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn update_task_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<UpdateTaskStatus>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let task_id = path.into_inner();

    let mut tx = pool
        .begin()
        .await
        .map_err(internal("Failed to start transaction"))?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND employee_id = ? FOR UPDATE"
    ))
    .bind(&task_id)
    .bind(employee_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(internal("Failed to fetch task"))?;

    let Some(task) = task else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Task not found"
        })));
    };

    let current = task.status().unwrap_or(TaskStatus::Pending);
    if !current.can_transition_to(payload.status) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Cannot move task from {current} to {}", payload.status)
        })));
    }

    sqlx::query(
        r#"
        UPDATE tasks
        SET status = ?, employee_response = ?, last_updated = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(payload.status.to_string())
    .bind(payload.response.trim())
    .bind(&task_id)
    .execute(&mut *tx)
    .await
    .map_err(internal("Failed to update task"))?;

    sqlx::query(
        r#"
        INSERT INTO notifications (admin_id, task_id, task_title, employee_name, new_status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.admin_id)
    .bind(&task_id)
    .bind(&task.title)
    .bind(&task.employee_name)
    .bind(payload.status.to_string())
    .execute(&mut *tx)
    .await
    .map_err(internal("Failed to record task notification"))?;

    tx.commit()
        .await
        .map_err(internal("Failed to commit task update"))?;

    tracing::info!(task_id = %task_id, employee_id, status = %payload.status, "Task status updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task updated",
        "status": payload.status
    })))
}

/// Delete a task (admin)
#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    params(("task_id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn delete_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let task_id = path.into_inner();

    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(&task_id)
        .execute(pool.get_ref())
        .await
        .map_err(internal("Failed to delete task"))?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Task not found"
        })));
    }

    tracing::info!(task_id = %task_id, "Task deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task deleted"
    })))
}
