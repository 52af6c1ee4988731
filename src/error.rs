use thiserror::Error;

/// Failures surfaced by the repositories in `store`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str) -> Self {
        StoreError::NotFound { entity }
    }

    /// IPC error code for this failure. `op` names the failing database
    /// operation (`query`, `insert`, `update`, `delete`).
    pub fn code(&self, op: &str) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Conflict(_) => "conflict",
            StoreError::Invalid(_) => "bad_params",
            StoreError::Sqlite(_) => match op {
                "insert" => "db_insert_failed",
                "update" => "db_update_failed",
                "delete" => "db_delete_failed",
                "tx" => "db_tx_failed",
                _ => "db_query_failed",
            },
        }
    }

    /// Translate unique/foreign-key violations into typed errors.
    pub fn from_write(e: rusqlite::Error, what: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(f, _) = &e {
            if f.code == rusqlite::ErrorCode::ConstraintViolation {
                let msg = e.to_string();
                if msg.contains("UNIQUE") {
                    return StoreError::Conflict(format!("{what} already exists"));
                }
                if msg.contains("FOREIGN KEY") {
                    return StoreError::Invalid(format!("{what} references a missing record"));
                }
            }
        }
        StoreError::Sqlite(e)
    }

    /// Deleting a row other rows still point at.
    pub fn from_delete(e: rusqlite::Error, what: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(f, _) = &e {
            if f.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::Conflict(format!("{what} is still referenced"));
            }
        }
        StoreError::Sqlite(e)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
