use crate::auth::auth::AuthUser;
use crate::model::notification::Notification;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    #[schema(example = "Task Completed: Prepare weekly report")]
    pub title: String,
    #[schema(example = "By employee1")]
    pub body: String,
}

impl From<Notification> for NotificationView {
    fn from(notification: Notification) -> Self {
        Self {
            title: notification.title(),
            body: notification.body(),
            notification,
        }
    }
}

/// Unread task updates for the calling admin
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Unread notifications, newest first", body = [NotificationView]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn unread_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, admin_id, task_id, task_title, employee_name, new_status, is_read, created_at
        FROM notifications
        WHERE admin_id = ? AND is_read = 0
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, admin_id = auth.user_id, "Failed to fetch notifications");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let views: Vec<NotificationView> = notifications.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// Mark a notification as read
#[utoipa::path(
    put,
    path = "/api/notifications/{notification_id}/read",
    params(("notification_id" = u64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let notification_id = path.into_inner();

    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND admin_id = ?")
        .bind(notification_id)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, notification_id, "Failed to mark notification read");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // an already-read row reports zero affected rows
    if result.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM notifications WHERE id = ? AND admin_id = ?)",
        )
        .bind(notification_id)
        .bind(auth.user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, notification_id, "Failed to look up notification");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        if !exists {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Notification not found"
            })));
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Notification marked as read"
    })))
}
