use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
    Display, EnumString,
)]
pub enum TaskStatus {
    Pending,
    #[strum(serialize = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Status only moves forward and a completed task is frozen. Staying on the
    /// same status is allowed so the employee can edit their response.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        self != TaskStatus::Completed && next >= self
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": "5f0c6f0e-3c55-4a3e-9d51-8f0b9a3f6d10",
    "employee_id": 2,
    "employee_name": "employee1",
    "admin_id": 1,
    "admin_name": "admin",
    "title": "Prepare weekly report",
    "description": "Summarise site visits",
    "due_date": "2026-01-10",
    "status": "Pending",
    "employee_response": "",
    "created_at": "2026-01-01T09:00:00Z",
    "last_updated": "2026-01-01T09:00:00Z"
}))]
pub struct Task {
    pub id: String,
    pub employee_id: u64,
    pub employee_name: String,
    pub admin_id: u64,
    pub admin_name: String,
    pub title: String,
    pub description: String,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub due_date: NaiveDate,
    #[schema(example = "Pending", value_type = String)]
    pub status: String,
    pub employee_response: String,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub last_updated: DateTime<Utc>,
}

impl Task {
    pub fn status(&self) -> Option<TaskStatus> {
        self.status.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_stored_values() {
        assert_eq!(TaskStatus::InProgress.to_string(), "In Progress");
        assert_eq!("In Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert!("Done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn transitions_move_forward_only() {
        use TaskStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Pending));
        assert!(InProgress.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
    }
}
