use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ensure_deleted, non_blank, required, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, Assignment, NewAssignment};

const COLUMNS: &str =
    "id, student_id, route_id, boarding_point, boarding_time, active, created_at";

/// Student-route join rows.
pub struct Assignments<'c> {
    conn: &'c Connection,
}

impl<'c> Assignments<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Assignments { conn }
    }

    fn query(&self, filter: &str, arg: &str) -> StoreResult<Vec<Assignment>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM student_routes WHERE {filter} = ? ORDER BY boarding_time, created_at"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([arg], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn for_route(&self, route_id: &str) -> StoreResult<Vec<Assignment>> {
        self.query("route_id", route_id)
    }

    pub fn for_student(&self, student_id: &str) -> StoreResult<Vec<Assignment>> {
        self.query("student_id", student_id)
    }
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: r.get(0)?,
        student_id: r.get(1)?,
        route_id: r.get(2)?,
        boarding_point: r.get(3)?,
        boarding_time: r.get(4)?,
        active: r.get(5)?,
        created_at: r.get(6)?,
    })
}

impl Repository for Assignments<'_> {
    type Record = Assignment;
    type New = NewAssignment;

    fn list(&self) -> StoreResult<Vec<Assignment>> {
        let sql = format!("SELECT {COLUMNS} FROM student_routes ORDER BY created_at, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<Assignment> {
        let sql = format!("SELECT {COLUMNS} FROM student_routes WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("assignment"))
    }

    fn create(&self, new: &NewAssignment) -> StoreResult<Assignment> {
        let student_id = required(&new.student_id, "studentId")?;
        let route_id = required(&new.route_id, "routeId")?;
        let boarding_point = required(&new.boarding_point, "boardingPoint")?;
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO student_routes(
                   id, student_id, route_id, boarding_point, boarding_time, active, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    student_id,
                    route_id,
                    boarding_point,
                    non_blank(&new.boarding_time),
                    new.active,
                    now_stamp(),
                ],
            )
            .map_err(|e| StoreError::from_write(e, "assignment"))?;
        self.get(&id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM student_routes WHERE id = ?", [id])?;
        ensure_deleted(changed, "assignment")
    }
}
