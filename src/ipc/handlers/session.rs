use serde_json::json;
use tracing::info;

use crate::ipc::error::ok;
use crate::ipc::helpers::{parse_params, respond, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::session::AuthUser;
use crate::store::Profiles;

/// Display name: the stored profile's, else the email's local part.
pub(crate) fn display_name(state: &AppState, user: &AuthUser) -> String {
    state
        .db
        .as_ref()
        .and_then(|conn| Profiles::new(conn).by_user(&user.user_id).ok().flatten())
        .map(|p| p.full_name)
        .unwrap_or_else(|| user.fallback_name().to_string())
}

fn session_open(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let user: AuthUser = parse_params(params, None)?;
    if user.user_id.trim().is_empty() {
        return Err(HandlerErr::bad_params("userId must not be empty"));
    }
    info!(user_id = %user.user_id, "session opened");
    let name = display_name(state, &user);
    let result = json!({ "user": &user, "displayName": name });
    state.session = Some(user);
    Ok(result)
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = session_open(state, &req.params);
    respond(req, result)
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = match state.session.as_ref() {
        Some(user) => json!({ "user": user, "displayName": display_name(state, user) }),
        None => json!({ "user": null }),
    };
    ok(&req.id, result)
}

fn handle_session_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let closed = state.session.take();
    if let Some(user) = &closed {
        info!(user_id = %user.user_id, "session closed");
    }
    ok(&req.id, json!({ "closed": closed.is_some() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.open" => Some(handle_session_open(state, req)),
        "session.get" => Some(handle_session_get(state, req)),
        "session.close" => Some(handle_session_close(state, req)),
        _ => None,
    }
}
