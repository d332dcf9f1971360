use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raised for the assigning admin whenever an employee changes a task status.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    pub id: u64,
    pub admin_id: u64,
    pub task_id: String,
    pub task_title: String,
    pub employee_name: String,
    pub new_status: String,
    pub is_read: bool,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn title(&self) -> String {
        format!("Task {}: {}", self.new_status, self.task_title)
    }

    pub fn body(&self) -> String {
        format!("By {}", self.employee_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_title_and_body() {
        let n = Notification {
            id: 7,
            admin_id: 1,
            task_id: "t-1".into(),
            task_title: "Inventory".into(),
            employee_name: "employee1".into(),
            new_status: "Completed".into(),
            is_read: false,
            created_at: Utc::now(),
        };
        assert_eq!(n.title(), "Task Completed: Inventory");
        assert_eq!(n.body(), "By employee1");
    }
}
