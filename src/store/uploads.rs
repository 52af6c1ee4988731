use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{ensure_deleted, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, Upload};

const COLUMNS: &str = "id, file_name, stored_path, size_bytes, sha256, created_at";

#[derive(Debug, Clone)]
pub struct NewUpload {
    pub id: String,
    pub file_name: String,
    pub stored_path: String,
    pub size_bytes: i64,
    pub sha256: String,
}

/// Metadata rows for blobs written by a `FileStore`.
pub struct Uploads<'c> {
    conn: &'c Connection,
}

impl<'c> Uploads<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Uploads { conn }
    }
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<Upload> {
    Ok(Upload {
        id: r.get(0)?,
        file_name: r.get(1)?,
        stored_path: r.get(2)?,
        size_bytes: r.get(3)?,
        sha256: r.get(4)?,
        created_at: r.get(5)?,
    })
}

impl Repository for Uploads<'_> {
    type Record = Upload;
    type New = NewUpload;

    fn list(&self) -> StoreResult<Vec<Upload>> {
        let sql = format!("SELECT {COLUMNS} FROM uploads ORDER BY created_at DESC, file_name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<Upload> {
        let sql = format!("SELECT {COLUMNS} FROM uploads WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("upload"))
    }

    fn create(&self, new: &NewUpload) -> StoreResult<Upload> {
        self.conn.execute(
            "INSERT INTO uploads(id, file_name, stored_path, size_bytes, sha256, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            params![
                new.id,
                new.file_name,
                new.stored_path,
                new.size_bytes,
                new.sha256,
                now_stamp(),
            ],
        )?;
        self.get(&new.id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self.conn.execute("DELETE FROM uploads WHERE id = ?", [id])?;
        ensure_deleted(changed, "upload")
    }
}
