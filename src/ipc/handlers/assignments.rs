use rusqlite::Connection;
use serde_json::{json, Value};

use crate::ipc::helpers::{
    optional_str, parse_params, required_str, to_json, with_db, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::model::NewAssignment;
use crate::store::{Assignments, Repository};

/// Filtered by `routeId` or `studentId` when either is given.
fn assignments_list(conn: &Connection, params: &Value) -> HandlerResult {
    let repo = Assignments::new(conn);
    let rows = if let Some(route_id) = optional_str(params, "routeId") {
        repo.for_route(route_id)
    } else if let Some(student_id) = optional_str(params, "studentId") {
        repo.for_student(student_id)
    } else {
        repo.list()
    }
    .map_err(|e| HandlerErr::store(e, "query"))?;
    Ok(json!({ "assignments": rows }))
}

fn assignments_create(conn: &Connection, params: &Value) -> HandlerResult {
    let new: NewAssignment = parse_params(params, None)?;
    let assignment = Assignments::new(conn)
        .create(&new)
        .map_err(|e| HandlerErr::store(e, "insert"))?;
    to_json(&assignment)
}

fn assignments_delete(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    Assignments::new(conn)
        .delete(&id)
        .map_err(|e| HandlerErr::store(e, "delete"))?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "assignments.list" => Some(with_db(state, req, assignments_list)),
        "assignments.create" => Some(with_db(state, req, assignments_create)),
        "assignments.delete" => Some(with_db(state, req, assignments_delete)),
        _ => None,
    }
}
