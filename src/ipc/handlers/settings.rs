use rusqlite::Connection;
use serde_json::{json, Value};

use super::reports::WEEK_START_KEY;
use crate::config::parse_week_start;
use crate::db;
use crate::ipc::helpers::{required_str, with_db, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};

fn settings_get(conn: &Connection, params: &Value) -> HandlerResult {
    let key = required_str(params, "key")?;
    let value = db::settings_get_json(conn, &key)
        .map_err(|e| HandlerErr::new("db_query_failed", format!("{e:?}")))?;
    Ok(json!({ "key": key, "value": value }))
}

fn settings_set(conn: &Connection, params: &Value) -> HandlerResult {
    let key = required_str(params, "key")?;
    let Some(value) = params.get("value") else {
        return Err(HandlerErr::bad_params("missing value"));
    };
    if key == WEEK_START_KEY && value.as_str().and_then(parse_week_start).is_none() {
        return Err(HandlerErr::bad_params(format!(
            "{WEEK_START_KEY} must be a day name"
        )));
    }
    db::settings_set_json(conn, &key, value)
        .map_err(|e| HandlerErr::new("db_update_failed", format!("{e:?}")))?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "settings.get" => Some(with_db(state, req, settings_get)),
        "settings.set" => Some(with_db(state, req, settings_set)),
        _ => None,
    }
}
