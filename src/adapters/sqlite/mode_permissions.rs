//! SQLite-backed mode permission oracle.
//!
//! The `mode_permissions` table is the authoritative record of which
//! operations each execution mode allows. The mode guardian consults it to
//! confirm or refute claimed policy violations.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::ports::PermissionOracle;

#[derive(Clone)]
pub struct SqliteModePermissions {
    pool: SqlitePool,
}

impl SqliteModePermissions {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Seed or update a permission entry.
    pub async fn set_permission(
        &self,
        mode_id: &str,
        operation: &str,
        allowed: bool,
    ) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO mode_permissions (mode_id, operation, allowed)
             VALUES (?, ?, ?)
             ON CONFLICT(mode_id, operation) DO UPDATE SET allowed = excluded.allowed",
        )
        .bind(mode_id)
        .bind(operation)
        .bind(i32::from(allowed))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PermissionOracle for SqliteModePermissions {
    /// Unknown (mode, operation) pairs are denied.
    async fn check_permission(&self, mode_id: &str, operation: &str) -> DomainResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT allowed FROM mode_permissions WHERE mode_id = ? AND operation = ?",
        )
        .bind(mode_id)
        .bind(operation)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(allowed,)| allowed != 0).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[tokio::test]
    async fn test_permission_lookup() {
        let pool = create_migrated_test_pool().await.unwrap();
        let oracle = SqliteModePermissions::new(pool);

        oracle.set_permission("readonly", "fs.read", true).await.unwrap();
        oracle.set_permission("readonly", "fs.write", false).await.unwrap();

        assert!(oracle.check_permission("readonly", "fs.read").await.unwrap());
        assert!(!oracle.check_permission("readonly", "fs.write").await.unwrap());
        // Unknown pairs deny
        assert!(!oracle.check_permission("readonly", "net.connect").await.unwrap());
    }
}
