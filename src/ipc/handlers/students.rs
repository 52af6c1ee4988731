use rusqlite::Connection;
use serde_json::{json, Value};

use crate::forms::StudentForm;
use crate::ipc::helpers::{
    parse_params, required_str, search_term, to_json, with_db, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::model::{NewStudent, StudentPatch};
use crate::search::ListView;
use crate::store::{Repository, Students};

fn students_list(conn: &Connection, params: &Value) -> HandlerResult {
    let all = Students::new(conn)
        .list()
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&ListView::build_counted(
        all,
        search_term(params),
        messages::no_students,
        &["active", "inactive"],
        |s| if s.active { "active" } else { "inactive" },
    ))
}

fn students_get(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    let student = Students::new(conn)
        .get(&id)
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&student)
}

fn students_create(conn: &Connection, params: &Value) -> HandlerResult {
    let new: NewStudent = parse_params(params, None)?;
    let student = Students::new(conn)
        .create(&new)
        .map_err(|e| HandlerErr::store(e, "insert"))?;
    to_json(&student)
}

fn students_register(conn: &Connection, params: &Value) -> HandlerResult {
    let mut form: StudentForm = parse_params(params, None)?;
    let submission = form.submit(&Students::new(conn));
    Ok(json!({
        "outcome": submission.outcome,
        "message": submission.message,
        "form": form,
    }))
}

fn students_update(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    let patch: StudentPatch = parse_params(params, Some("patch"))?;
    let student = Students::new(conn)
        .update(&id, &patch)
        .map_err(|e| HandlerErr::store(e, "update"))?;
    to_json(&student)
}

fn students_delete(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    Students::new(conn)
        .delete(&id)
        .map_err(|e| HandlerErr::store(e, "delete"))?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.list" => Some(with_db(state, req, students_list)),
        "students.get" => Some(with_db(state, req, students_get)),
        "students.create" => Some(with_db(state, req, students_create)),
        "students.register" => Some(with_db(state, req, students_register)),
        "students.update" => Some(with_db(state, req, students_update)),
        "students.delete" => Some(with_db(state, req, students_delete)),
        _ => None,
    }
}
