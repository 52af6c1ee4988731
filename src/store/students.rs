use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ensure_deleted, non_blank, required, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, NewStudent, Student, StudentPatch};
use crate::search::Searchable;

const COLUMNS: &str = "id, full_name, birth_date, school, shift, guardian_name, guardian_phone,
     phone, address, document, notes, active, created_at, updated_at";

pub struct Students<'c> {
    conn: &'c Connection,
}

impl<'c> Students<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Students { conn }
    }

    pub fn update(&self, id: &str, patch: &StudentPatch) -> StoreResult<Student> {
        self.get(id)?;
        let full_name = patch
            .full_name
            .as_deref()
            .map(|v| required(v, "fullName"))
            .transpose()?;
        let school = patch
            .school
            .as_deref()
            .map(|v| required(v, "school"))
            .transpose()?;
        self.conn
            .execute(
                "UPDATE students SET
                   full_name = COALESCE(?, full_name),
                   school = COALESCE(?, school),
                   birth_date = COALESCE(?, birth_date),
                   shift = COALESCE(?, shift),
                   guardian_name = COALESCE(?, guardian_name),
                   guardian_phone = COALESCE(?, guardian_phone),
                   phone = COALESCE(?, phone),
                   address = COALESCE(?, address),
                   document = COALESCE(?, document),
                   notes = COALESCE(?, notes),
                   active = COALESCE(?, active),
                   updated_at = ?
                 WHERE id = ?",
                params![
                    full_name,
                    school,
                    non_blank(&patch.birth_date),
                    patch.shift,
                    patch.guardian_name,
                    patch.guardian_phone,
                    non_blank(&patch.phone),
                    non_blank(&patch.address),
                    non_blank(&patch.document),
                    non_blank(&patch.notes),
                    patch.active,
                    now_stamp(),
                    id,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "student"))?;
        self.get(id)
    }

    /// Active flag of every student, for the report snapshot.
    pub fn active_flags(&self) -> StoreResult<Vec<bool>> {
        let mut stmt = self.conn.prepare("SELECT active FROM students")?;
        let flags = stmt
            .query_map([], |r| r.get::<_, bool>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(flags)
    }
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        full_name: r.get(1)?,
        birth_date: r.get(2)?,
        school: r.get(3)?,
        shift: r.get(4)?,
        guardian_name: r.get(5)?,
        guardian_phone: r.get(6)?,
        phone: r.get(7)?,
        address: r.get(8)?,
        document: r.get(9)?,
        notes: r.get(10)?,
        active: r.get(11)?,
        created_at: r.get(12)?,
        updated_at: r.get(13)?,
    })
}

impl Repository for Students<'_> {
    type Record = Student;
    type New = NewStudent;

    fn list(&self) -> StoreResult<Vec<Student>> {
        let sql = format!("SELECT {COLUMNS} FROM students ORDER BY full_name, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<Student> {
        let sql = format!("SELECT {COLUMNS} FROM students WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("student"))
    }

    fn create(&self, new: &NewStudent) -> StoreResult<Student> {
        let full_name = required(&new.full_name, "fullName")?;
        let school = required(&new.school, "school")?;
        let id = Uuid::new_v4().to_string();
        let now = now_stamp();
        self.conn
            .execute(
                "INSERT INTO students(
                   id, full_name, birth_date, school, shift, guardian_name, guardian_phone,
                   phone, address, document, notes, active, created_at, updated_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    full_name,
                    non_blank(&new.birth_date),
                    school,
                    new.shift,
                    new.guardian_name.trim(),
                    new.guardian_phone.trim(),
                    non_blank(&new.phone),
                    non_blank(&new.address),
                    non_blank(&new.document),
                    non_blank(&new.notes),
                    new.active,
                    now,
                    now,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "student"))?;
        self.get(&id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE id = ?", [id])
            .map_err(|e| StoreError::from_delete(e, "student"))?;
        ensure_deleted(changed, "student")
    }
}

impl Searchable for Student {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.full_name.as_str()),
            Some(self.school.as_str()),
            Some(self.guardian_name.as_str()),
        ]
    }
}
