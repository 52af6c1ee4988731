use serde::Deserialize;
use serde_json::json;

use crate::ipc::helpers::{
    db_conn, parse_params, respond, session_user, to_json, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::model::NewProfile;
use crate::store::{Profiles, Repository};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProfileParams {
    full_name: Option<String>,
    role: Option<String>,
    avatar_url: Option<String>,
}

fn profiles_me(state: &AppState) -> HandlerResult {
    let conn = db_conn(state)?;
    let user = session_user(state)?;
    let profile = Profiles::new(conn)
        .by_user(&user.user_id)
        .map_err(|e| HandlerErr::store(e, "query"))?;
    let display_name = profile
        .as_ref()
        .map(|p| p.full_name.clone())
        .unwrap_or_else(|| user.fallback_name().to_string());
    Ok(json!({ "profile": profile, "displayName": display_name }))
}

/// Identity fields come from the session; only presentation fields are
/// taken from params.
fn profiles_upsert(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let conn = db_conn(state)?;
    let user = session_user(state)?;
    let p: ProfileParams = parse_params(params, None)?;
    let new = NewProfile {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        full_name: p
            .full_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.fallback_name().to_string()),
        role: p.role,
        avatar_url: p.avatar_url.or_else(|| user.avatar_url.clone()),
    };
    let profile = Profiles::new(conn)
        .upsert(&new)
        .map_err(|e| HandlerErr::store(e, "update"))?;
    to_json(&profile)
}

fn profiles_list(state: &AppState) -> HandlerResult {
    let conn = db_conn(state)?;
    let profiles = Profiles::new(conn)
        .list()
        .map_err(|e| HandlerErr::store(e, "query"))?;
    Ok(json!({ "profiles": profiles }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "profiles.me" => profiles_me(state),
        "profiles.upsert" => profiles_upsert(state, &req.params),
        "profiles.list" => profiles_list(state),
        _ => return None,
    };
    Some(respond(req, result))
}
