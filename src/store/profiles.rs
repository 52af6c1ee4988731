use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ensure_deleted, non_blank, required, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, NewProfile, Profile};

const COLUMNS: &str = "id, user_id, full_name, email, role, avatar_url, created_at, updated_at";
const DEFAULT_ROLE: &str = "operator";

pub struct Profiles<'c> {
    conn: &'c Connection,
}

impl<'c> Profiles<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Profiles { conn }
    }

    pub fn by_user(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {COLUMNS} FROM profiles WHERE user_id = ?");
        Ok(self.conn.query_row(&sql, [user_id], read_row).optional()?)
    }

    /// Insert or refresh the profile keyed by `user_id`. The role is kept
    /// when the update does not name one.
    pub fn upsert(&self, new: &NewProfile) -> StoreResult<Profile> {
        let user_id = required(&new.user_id, "userId")?;
        let full_name = required(&new.full_name, "fullName")?;
        let email = required(&new.email, "email")?;
        let role = non_blank(&new.role);
        let now = now_stamp();
        self.conn.execute(
            "INSERT INTO profiles(id, user_id, full_name, email, role, avatar_url, created_at, updated_at)
             VALUES(?1, ?2, ?3, ?4, COALESCE(?5, ?6), ?7, ?8, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
               full_name = excluded.full_name,
               email = excluded.email,
               role = COALESCE(?5, profiles.role),
               avatar_url = excluded.avatar_url,
               updated_at = excluded.updated_at",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                full_name,
                email,
                role,
                DEFAULT_ROLE,
                non_blank(&new.avatar_url),
                now,
            ],
        )?;
        self.by_user(&user_id)?
            .ok_or_else(|| StoreError::not_found("profile"))
    }
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: r.get(0)?,
        user_id: r.get(1)?,
        full_name: r.get(2)?,
        email: r.get(3)?,
        role: r.get(4)?,
        avatar_url: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

impl Repository for Profiles<'_> {
    type Record = Profile;
    type New = NewProfile;

    fn list(&self) -> StoreResult<Vec<Profile>> {
        let sql = format!("SELECT {COLUMNS} FROM profiles ORDER BY full_name, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<Profile> {
        let sql = format!("SELECT {COLUMNS} FROM profiles WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("profile"))
    }

    fn create(&self, new: &NewProfile) -> StoreResult<Profile> {
        if self.by_user(new.user_id.trim())?.is_some() {
            return Err(StoreError::Conflict("profile already exists".into()));
        }
        self.upsert(new)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self.conn.execute("DELETE FROM profiles WHERE id = ?", [id])?;
        ensure_deleted(changed, "profile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn profile(role: Option<&str>) -> NewProfile {
        NewProfile {
            user_id: "auth-1".into(),
            full_name: "Rita Gomes".into(),
            email: "rita@example.org".into(),
            role: role.map(str::to_string),
            avatar_url: None,
        }
    }

    #[test]
    fn upsert_defaults_and_keeps_role() {
        let conn = db::open_in_memory().expect("db");
        let repo = Profiles::new(&conn);
        let p = repo.upsert(&profile(None)).expect("insert");
        assert_eq!(p.role, "operator");

        let p = repo.upsert(&profile(Some("admin"))).expect("promote");
        assert_eq!(p.role, "admin");

        let mut renamed = profile(None);
        renamed.full_name = "Rita G. Gomes".into();
        let p2 = repo.upsert(&renamed).expect("rename");
        assert_eq!(p2.id, p.id);
        assert_eq!(p2.role, "admin");
        assert_eq!(p2.full_name, "Rita G. Gomes");
        assert_eq!(repo.list().expect("list").len(), 1);
    }

    #[test]
    fn create_refuses_second_profile_for_user() {
        let conn = db::open_in_memory().expect("db");
        let repo = Profiles::new(&conn);
        repo.create(&profile(None)).expect("create");
        assert!(matches!(
            repo.create(&profile(None)),
            Err(StoreError::Conflict(_))
        ));
    }
}
