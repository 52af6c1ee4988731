use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ensure_deleted, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, Incident, NewIncident};
use crate::search::Searchable;

const COLUMNS: &str = "id, description, date, created_at";

/// Incident reports. Stored as submitted; the quick form does no validation.
pub struct Incidents<'c> {
    conn: &'c Connection,
}

impl<'c> Incidents<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Incidents { conn }
    }
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<Incident> {
    Ok(Incident {
        id: r.get(0)?,
        description: r.get(1)?,
        date: r.get(2)?,
        created_at: r.get(3)?,
    })
}

impl Repository for Incidents<'_> {
    type Record = Incident;
    type New = NewIncident;

    /// Most recent first.
    fn list(&self) -> StoreResult<Vec<Incident>> {
        let sql = format!("SELECT {COLUMNS} FROM incidents ORDER BY date DESC, created_at DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<Incident> {
        let sql = format!("SELECT {COLUMNS} FROM incidents WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("incident"))
    }

    fn create(&self, new: &NewIncident) -> StoreResult<Incident> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO incidents(id, description, date, created_at) VALUES(?, ?, ?, ?)",
            params![id, new.description, new.date, now_stamp()],
        )?;
        self.get(&id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self.conn.execute("DELETE FROM incidents WHERE id = ?", [id])?;
        ensure_deleted(changed, "incident")
    }
}

impl Searchable for Incident {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.description.as_str()), Some(self.date.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::search;

    #[test]
    fn newest_date_first() {
        let conn = db::open_in_memory().expect("db");
        let repo = Incidents::new(&conn);
        for (d, date) in [("Pneu furado", "2025-08-19"), ("Atraso", "2025-08-20")] {
            repo.create(&NewIncident {
                description: d.into(),
                date: date.into(),
            })
            .expect("create");
        }
        let all = repo.list().expect("list");
        assert_eq!(all[0].description, "Atraso");
        assert_eq!(search::filter(repo.list().expect("list"), "PNEU").len(), 1);
        assert_eq!(search::filter(repo.list().expect("list"), "2025-08").len(), 2);
    }
}
