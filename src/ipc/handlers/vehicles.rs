use rusqlite::Connection;
use serde_json::{json, Value};

use crate::forms::VehicleForm;
use crate::ipc::helpers::{
    parse_params, required_str, search_term, to_json, with_db, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::model::{NewVehicle, VehiclePatch, VehicleStatus};
use crate::search::ListView;
use crate::store::{Repository, Vehicles};

fn vehicles_list(conn: &Connection, params: &Value) -> HandlerResult {
    let all = Vehicles::new(conn)
        .list()
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&ListView::build_counted(
        all,
        search_term(params),
        messages::no_vehicles,
        VehicleStatus::ALL_STR,
        |v| v.status.as_str(),
    ))
}

fn vehicles_get(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    let vehicle = Vehicles::new(conn)
        .get(&id)
        .map_err(|e| HandlerErr::store(e, "query"))?;
    to_json(&vehicle)
}

fn vehicles_create(conn: &Connection, params: &Value) -> HandlerResult {
    let new: NewVehicle = parse_params(params, None)?;
    let vehicle = Vehicles::new(conn)
        .create(&new)
        .map_err(|e| HandlerErr::store(e, "insert"))?;
    to_json(&vehicle)
}

fn vehicles_register(conn: &Connection, params: &Value) -> HandlerResult {
    let mut form: VehicleForm = parse_params(params, None)?;
    let submission = form.submit(&Vehicles::new(conn));
    Ok(json!({
        "outcome": submission.outcome,
        "message": submission.message,
        "form": form,
    }))
}

fn vehicles_update(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    let patch: VehiclePatch = parse_params(params, Some("patch"))?;
    let vehicle = Vehicles::new(conn)
        .update(&id, &patch)
        .map_err(|e| HandlerErr::store(e, "update"))?;
    to_json(&vehicle)
}

fn vehicles_delete(conn: &Connection, params: &Value) -> HandlerResult {
    let id = required_str(params, "id")?;
    Vehicles::new(conn)
        .delete(&id)
        .map_err(|e| HandlerErr::store(e, "delete"))?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "vehicles.list" => Some(with_db(state, req, vehicles_list)),
        "vehicles.get" => Some(with_db(state, req, vehicles_get)),
        "vehicles.create" => Some(with_db(state, req, vehicles_create)),
        "vehicles.register" => Some(with_db(state, req, vehicles_register)),
        "vehicles.update" => Some(with_db(state, req, vehicles_update)),
        "vehicles.delete" => Some(with_db(state, req, vehicles_delete)),
        _ => None,
    }
}
