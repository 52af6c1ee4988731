use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use crate::session;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if state.session.is_none() && !session::is_public_method(&req.method) {
        return err(&req.id, "unauthenticated", "open a session first", None);
    }

    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::session::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::profiles::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::vehicles::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::routes::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::assignments::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::monitoring::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::incidents::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::reports::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::uploads::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::settings::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
