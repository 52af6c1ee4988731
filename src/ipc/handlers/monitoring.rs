use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

use crate::ipc::helpers::{
    db_conn, optional_str, parse_params, respond, search_term, session_user, to_json, with_db,
    HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::model::NewMonitoringLog;
use crate::search::ListView;
use crate::session::AuthUser;
use crate::store::{MonitoringLogs, Repository};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordParams {
    route_id: String,
    event_type: String,
    #[serde(default)]
    student_id: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    /// Backdated events; defaults to now.
    #[serde(default)]
    created_at: Option<String>,
}

fn monitoring_record(conn: &Connection, user: &AuthUser, params: &Value) -> HandlerResult {
    let p: RecordParams = parse_params(params, None)?;
    let log = MonitoringLogs::new(conn)
        .create(&NewMonitoringLog {
            route_id: p.route_id,
            student_id: p.student_id,
            user_id: Some(user.user_id.clone()),
            event_type: p.event_type,
            notes: p.notes,
            created_at: p.created_at,
        })
        .map_err(|e| HandlerErr::store(e, "insert"))?;
    to_json(&log)
}

fn handle_monitoring_record(state: &mut AppState, req: &Request) -> Value {
    let result = record_for_session(state, &req.params);
    respond(req, result)
}

fn record_for_session(state: &AppState, params: &Value) -> HandlerResult {
    let conn = db_conn(state)?;
    let user = session_user(state)?;
    monitoring_record(conn, user, params)
}

fn monitoring_list(conn: &Connection, params: &Value) -> HandlerResult {
    let repo = MonitoringLogs::new(conn);
    let all = match optional_str(params, "routeId") {
        Some(route_id) => repo.for_route(route_id),
        None => repo.list(),
    }
    .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&ListView::build(all, search_term(params), messages::no_logs))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "monitoring.record" => Some(handle_monitoring_record(state, req)),
        "monitoring.list" => Some(with_db(state, req, monitoring_list)),
        _ => None,
    }
}
