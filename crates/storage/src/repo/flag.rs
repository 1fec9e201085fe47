// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for per-backend flags (paused / db-maintenance / reboot).

use sqlx::{Row, SqlitePool};

use rap_core::{BackendFlag, FlagKey};

use crate::error::Result;

#[derive(Clone)]
pub struct FlagRepository {
    pool: SqlitePool,
}

impl FlagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Operator write: upserts a flag's value, bumping its timestamp.
    pub async fn set(&self, flag: &BackendFlag) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO backend_flags (backend_id, key, value, updated_at_ms)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (backend_id, key) DO UPDATE SET
                value = excluded.value, updated_at_ms = excluded.updated_at_ms
            "#,
        )
        .bind(flag.backend_id.as_str())
        .bind(flag.key.as_str())
        .bind(&flag.value)
        .bind(flag.updated_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read on every controller tick. Not transactional with job state by
    /// design — callers tolerate the flag appearing one tick late.
    pub async fn get(&self, backend_id: &str, key: FlagKey) -> Result<Option<BackendFlag>> {
        let row = sqlx::query(
            "SELECT * FROM backend_flags WHERE backend_id = ? AND key = ?",
        )
        .bind(backend_id)
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_flag))
    }

    pub async fn list_for_backend(&self, backend_id: &str) -> Result<Vec<BackendFlag>> {
        let rows = sqlx::query("SELECT * FROM backend_flags WHERE backend_id = ?")
            .bind(backend_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_flag).collect())
    }

    pub async fn clear(&self, backend_id: &str, key: FlagKey) -> Result<()> {
        sqlx::query("DELETE FROM backend_flags WHERE backend_id = ? AND key = ?")
            .bind(backend_id)
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_flag(row: &sqlx::sqlite::SqliteRow) -> BackendFlag {
    let key = match row.get::<String, _>("key").as_str() {
        "paused" => FlagKey::Paused,
        "db-maintenance" => FlagKey::DbMaintenance,
        _ => FlagKey::Reboot,
    };
    BackendFlag::new(
        row.get::<String, _>("backend_id"),
        key,
        row.get::<String, _>("value"),
        row.get("updated_at_ms"),
    )
}

#[cfg(test)]
#[path = "flag_repo_tests.rs"]
mod tests;
