//! SQLite task persistence.
//!
//! Intentionally narrow: the supervisor core reads tasks and creates them for
//! bootstrap/testing, but status writes go through the verdict consumer's
//! transactional path, never through a blanket update here.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Task, TaskState};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &Task) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO tasks (id, title, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(task.status.as_str())
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Task::try_from).transpose()
    }

    /// Current status only; errors if the task does not exist.
    pub async fn get_status(&self, id: Uuid) -> DomainResult<TaskState> {
        let row: Option<(String,)> = sqlx::query_as("SELECT status FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let (status,) = row.ok_or(DomainError::TaskNotFound(id))?;
        TaskState::from_str(&status)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid status: {status}")))
    }

    pub async fn list_by_status(&self, status: TaskState) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks WHERE status = ? ORDER BY created_at")
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    /// Direct status write for bootstrap and test setup. Validates the
    /// transition so even this path cannot corrupt the lifecycle.
    pub async fn force_status(&self, id: Uuid, status: TaskState) -> DomainResult<()> {
        let current = self.get_status(id).await?;
        if current != status && !current.can_transition_to(status) {
            return Err(DomainError::InvalidStateTransition {
                from: current,
                to: status,
            });
        }

        sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskState::from_str(&row.status)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid status: {}", row.status)))?;

        Ok(Task {
            id: parse_uuid(&row.id)?,
            title: row.title,
            status,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_repo() -> SqliteTaskRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteTaskRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_repo().await;
        let task = Task::new("Verify deployment");
        repo.create(&task).await.unwrap();

        let got = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(got.title, "Verify deployment");
        assert_eq!(got.status, TaskState::Planned);
    }

    #[tokio::test]
    async fn test_get_status_missing_task() {
        let repo = setup_repo().await;
        let err = repo.get_status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_force_status_validates_transition() {
        let repo = setup_repo().await;
        let task = Task::new("Illegal jump");
        repo.create(&task).await.unwrap();

        let err = repo.force_status(task.id, TaskState::Done).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));

        repo.force_status(task.id, TaskState::Approved).await.unwrap();
        assert_eq!(repo.get_status(task.id).await.unwrap(), TaskState::Approved);
    }
}
