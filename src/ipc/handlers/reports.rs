use chrono::{DateTime, FixedOffset, Local, Weekday};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::parse_week_start;
use crate::db;
use crate::ipc::helpers::{db_conn, optional_str, respond, to_json, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::stats::{DashboardStats, ReportStats, Snapshot, Windows};

pub(crate) const WEEK_START_KEY: &str = "reports.weekStart";

/// `params.now` (RFC 3339) pins the clock and its offset defines the local
/// calendar; otherwise the host's local time is used.
fn windows_for(params: &Value, week_start: Weekday) -> Result<Windows, HandlerErr> {
    let windows = match optional_str(params, "now") {
        Some(raw) => {
            let now: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| HandlerErr::bad_params(format!("invalid now: {e}")))?;
            Windows::around(&now, week_start)
        }
        None => Windows::around(&Local::now(), week_start),
    };
    windows.ok_or_else(|| HandlerErr::bad_params("date out of range"))
}

/// Request param, then workspace setting, then config file.
fn week_start_for(
    state: &AppState,
    conn: &Connection,
    params: &Value,
) -> Result<Weekday, HandlerErr> {
    if let Some(raw) = optional_str(params, "weekStart") {
        return parse_week_start(raw)
            .ok_or_else(|| HandlerErr::bad_params(format!("invalid weekStart: {raw}")));
    }
    match db::settings_get_json(conn, WEEK_START_KEY) {
        Ok(Some(v)) => {
            if let Some(day) = v.as_str().and_then(parse_week_start) {
                return Ok(day);
            }
            warn!(key = WEEK_START_KEY, value = %v, "ignoring unparseable setting");
        }
        Ok(None) => {}
        Err(e) => warn!(key = WEEK_START_KEY, error = %e, "failed to read setting"),
    }
    Ok(state.config.week_start())
}

fn dashboard_summary(state: &AppState, params: &Value) -> HandlerResult {
    let conn = db_conn(state)?;
    let windows = windows_for(params, state.config.week_start())?;
    let stats = DashboardStats::compute(&Snapshot::load(conn), &windows.today);
    to_json(&stats)
}

fn reports_summary(state: &AppState, params: &Value) -> HandlerResult {
    let conn = db_conn(state)?;
    let week_start = week_start_for(state, conn, params)?;
    let windows = windows_for(params, week_start)?;
    let stats = ReportStats::compute(&Snapshot::load(conn), &windows);
    let mut result = to_json(&stats)?;
    result["weekStart"] = json!(week_start.to_string());
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "dashboard.summary" => dashboard_summary(state, &req.params),
        "reports.summary" => reports_summary(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
