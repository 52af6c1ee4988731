use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ensure_deleted, non_blank, required, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, MonitoringLog, NewMonitoringLog};
use crate::search::Searchable;

const COLUMNS: &str = "id, route_id, student_id, user_id, event_type, notes, created_at";

pub struct MonitoringLogs<'c> {
    conn: &'c Connection,
}

impl<'c> MonitoringLogs<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        MonitoringLogs { conn }
    }

    pub fn for_route(&self, route_id: &str) -> StoreResult<Vec<MonitoringLog>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM monitoring_logs WHERE route_id = ? ORDER BY created_at DESC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([route_id], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Raw `created_at` values for the report snapshot.
    pub fn created_at_stamps(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT created_at FROM monitoring_logs")?;
        let stamps = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stamps)
    }
}

/// Normalize a caller-supplied timestamp to the stored UTC form.
fn normalize_stamp(raw: &str) -> StoreResult<String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| {
            t.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .map_err(|e| StoreError::Invalid(format!("createdAt must be RFC 3339: {e}")))
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<MonitoringLog> {
    Ok(MonitoringLog {
        id: r.get(0)?,
        route_id: r.get(1)?,
        student_id: r.get(2)?,
        user_id: r.get(3)?,
        event_type: r.get(4)?,
        notes: r.get(5)?,
        created_at: r.get(6)?,
    })
}

impl Repository for MonitoringLogs<'_> {
    type Record = MonitoringLog;
    type New = NewMonitoringLog;

    /// Newest first.
    fn list(&self) -> StoreResult<Vec<MonitoringLog>> {
        let sql = format!("SELECT {COLUMNS} FROM monitoring_logs ORDER BY created_at DESC, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<MonitoringLog> {
        let sql = format!("SELECT {COLUMNS} FROM monitoring_logs WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("monitoring log"))
    }

    fn create(&self, new: &NewMonitoringLog) -> StoreResult<MonitoringLog> {
        let route_id = required(&new.route_id, "routeId")?;
        let event_type = required(&new.event_type, "eventType")?;
        let created_at = match new.created_at.as_deref() {
            Some(raw) => normalize_stamp(raw)?,
            None => now_stamp(),
        };
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO monitoring_logs(
                   id, route_id, student_id, user_id, event_type, notes, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    route_id,
                    non_blank(&new.student_id),
                    non_blank(&new.user_id),
                    event_type,
                    non_blank(&new.notes),
                    created_at,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "monitoring log"))?;
        self.get(&id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM monitoring_logs WHERE id = ?", [id])?;
        ensure_deleted(changed, "monitoring log")
    }
}

impl Searchable for MonitoringLog {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.event_type.as_str()), self.notes.as_deref()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::model::NewRoute;
    use crate::store::Routes;

    #[test]
    fn backdated_stamp_is_stored_in_utc() {
        let conn = db::open_in_memory().expect("db");
        let r = Routes::new(&conn)
            .create(&NewRoute {
                name: "Rota".into(),
                start_time: "06:00".into(),
                active: true,
                ..Default::default()
            })
            .expect("route");
        let repo = MonitoringLogs::new(&conn);
        let log = repo
            .create(&NewMonitoringLog {
                route_id: r.id.clone(),
                event_type: "embarque".into(),
                created_at: Some("2025-08-20T00:00:00-03:00".into()),
                ..Default::default()
            })
            .expect("log");
        assert_eq!(log.created_at, "2025-08-20T03:00:00.000Z");
        assert_eq!(
            repo.created_at_stamps().expect("stamps"),
            vec!["2025-08-20T03:00:00.000Z".to_string()]
        );

        let bad = repo.create(&NewMonitoringLog {
            route_id: r.id,
            event_type: "embarque".into(),
            created_at: Some("yesterday".into()),
            ..Default::default()
        });
        assert!(matches!(bad, Err(StoreError::Invalid(_))));
    }

    #[test]
    fn unknown_route_is_invalid() {
        let conn = db::open_in_memory().expect("db");
        let e = MonitoringLogs::new(&conn)
            .create(&NewMonitoringLog {
                route_id: "nope".into(),
                event_type: "desembarque".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(e, StoreError::Invalid(_)), "{e:?}");
    }
}
