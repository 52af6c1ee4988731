use rusqlite::Connection;
use serde_json::{json, Value};

use crate::forms::IncidentForm;
use crate::ipc::helpers::{
    parse_params, required_str, search_term, to_json, with_db, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::search::ListView;
use crate::store::{Incidents, Repository};

fn incidents_list(conn: &Connection, params: &Value) -> HandlerResult {
    let all = Incidents::new(conn)
        .list()
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&ListView::build(all, search_term(params), messages::no_incidents))
}

fn incidents_register(conn: &Connection, params: &Value) -> HandlerResult {
    let mut form: IncidentForm = parse_params(params, None)?;
    let submission = form.submit(&Incidents::new(conn));
    Ok(json!({
        "outcome": submission.outcome,
        "message": submission.message,
        "form": form,
    }))
}

fn incidents_delete(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    Incidents::new(conn)
        .delete(&id)
        .map_err(|e| HandlerErr::store(e, "delete"))?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "incidents.list" => Some(with_db(state, req, incidents_list)),
        "incidents.register" => Some(with_db(state, req, incidents_register)),
        "incidents.delete" => Some(with_db(state, req, incidents_delete)),
        _ => None,
    }
}
