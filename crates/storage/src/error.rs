// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row: failed to decode {column} as {expected}: {source}")]
    Decode {
        column: &'static str,
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("not found: {what} {id}")]
    NotFound { what: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;
