use rusqlite::Connection;
use serde_json::{json, Value};

use crate::ipc::helpers::{
    parse_params, required_str, search_term, to_json, with_db, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::model::{NewRoute, RoutePatch};
use crate::search::ListView;
use crate::store::{Repository, Routes};

fn routes_list(conn: &Connection, params: &Value) -> HandlerResult {
    let all = Routes::new(conn)
        .list()
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&ListView::build_counted(
        all,
        search_term(params),
        messages::no_routes,
        &["active", "inactive"],
        |r| if r.active { "active" } else { "inactive" },
    ))
}

fn routes_get(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    let route = Routes::new(conn)
        .get(&id)
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&route)
}

fn routes_create(conn: &Connection, params: &Value) -> HandlerResult {
    let new: NewRoute = parse_params(params, None)?;
    let route = Routes::new(conn)
        .create(&new)
        .map_err(|e| HandlerErr::store(e, "insert"))?;
    to_json(&route)
}

fn routes_update(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    let patch: RoutePatch = parse_params(params, Some("patch"))?;
    let route = Routes::new(conn)
        .update(&id, &patch)
        .map_err(|e| HandlerErr::store(e, "update"))?;
    to_json(&route)
}

/// Also drops the route's student assignments.
fn routes_delete(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    Routes::new(conn)
        .delete(&id)
        .map_err(|e| HandlerErr::store(e, "delete"))?;
    Ok(json!({ "ok": true }))
}

fn routes_capacity(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    let capacity = Routes::new(conn)
        .capacity(&id)
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&capacity)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "routes.list" => Some(with_db(state, req, routes_list)),
        "routes.get" => Some(with_db(state, req, routes_get)),
        "routes.create" => Some(with_db(state, req, routes_create)),
        "routes.update" => Some(with_db(state, req, routes_update)),
        "routes.delete" => Some(with_db(state, req, routes_delete)),
        "routes.capacity" => Some(with_db(state, req, routes_capacity)),
        _ => None,
    }
}
