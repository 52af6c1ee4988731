use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "transport.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            birth_date TEXT,
            school TEXT NOT NULL,
            shift TEXT NOT NULL DEFAULT 'morning'
                CHECK(shift IN ('morning', 'afternoon', 'night')),
            guardian_name TEXT NOT NULL DEFAULT '',
            guardian_phone TEXT NOT NULL DEFAULT '',
            phone TEXT,
            address TEXT,
            document TEXT,
            notes TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_name ON students(full_name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS vehicles(
            id TEXT PRIMARY KEY,
            plate TEXT NOT NULL UNIQUE,
            make TEXT NOT NULL DEFAULT '',
            model TEXT NOT NULL DEFAULT '',
            year INTEGER NOT NULL DEFAULT 0,
            capacity INTEGER NOT NULL DEFAULT 0,
            color TEXT NOT NULL DEFAULT '',
            driver_name TEXT NOT NULL DEFAULT '',
            driver_license TEXT NOT NULL DEFAULT '',
            driver_phone TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'active'
                CHECK(status IN ('active', 'maintenance', 'inactive')),
            chassis TEXT,
            registration TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS routes(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            shift TEXT NOT NULL DEFAULT 'morning'
                CHECK(shift IN ('morning', 'afternoon', 'night')),
            start_time TEXT NOT NULL,
            end_time TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            vehicle_id TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(vehicle_id) REFERENCES vehicles(id) ON DELETE SET NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_routes_name ON routes(name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_routes_vehicle ON routes(vehicle_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_routes(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            route_id TEXT NOT NULL,
            boarding_point TEXT NOT NULL,
            boarding_time TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(route_id) REFERENCES routes(id),
            UNIQUE(student_id, route_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_routes_route ON student_routes(route_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_routes_student ON student_routes(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'operator',
            avatar_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // user_id is the auth identity; it need not have a profile row.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS monitoring_logs(
            id TEXT PRIMARY KEY,
            route_id TEXT NOT NULL,
            student_id TEXT,
            user_id TEXT,
            event_type TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(route_id) REFERENCES routes(id),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_monitoring_logs_route ON monitoring_logs(route_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_monitoring_logs_created ON monitoring_logs(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS incidents(
            id TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS uploads(
            id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            stored_path TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            sha256 TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(&s).with_context(|| format!("corrupt setting {key}"))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_roundtrip_overwrites() {
        let conn = open_in_memory().expect("db");
        assert!(settings_get_json(&conn, "reports.weekStart")
            .expect("get")
            .is_none());
        settings_set_json(&conn, "reports.weekStart", &json!("sunday")).expect("set");
        settings_set_json(&conn, "reports.weekStart", &json!("monday")).expect("set");
        assert_eq!(
            settings_get_json(&conn, "reports.weekStart").expect("get"),
            Some(json!("monday"))
        );
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = open_in_memory().expect("db");
        init_schema(&conn).expect("second init");
    }
}
