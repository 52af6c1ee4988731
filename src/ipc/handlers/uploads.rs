use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use tracing::error;

use crate::ipc::helpers::{
    db_conn, optional_str, required_str, respond, to_json, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::messages;
use crate::store::{Repository, Uploads};
use crate::uploads::{DirFileStore, FileStore};

fn uploads_put(state: &AppState, params: &Value) -> HandlerResult {
    let conn = db_conn(state)?;
    let Some(workspace) = state.workspace.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    let file_name = optional_str(params, "fileName").unwrap_or("").trim();
    if file_name.is_empty() {
        return Err(HandlerErr::bad_params(messages::UPLOAD_NO_FILE));
    }
    let encoded = required_str(params, "contentBase64")?;
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| HandlerErr::bad_params(format!("invalid contentBase64: {e}")))?;

    let store = DirFileStore::new(workspace.join(&state.config.uploads_dir_name), conn);
    match store.put(file_name, &bytes) {
        Ok(receipt) => to_json(&receipt),
        Err(e) => {
            error!(file = file_name, error = ?e, "upload failed");
            Err(HandlerErr {
                code: "upload_failed",
                message: messages::UPLOAD_FAILED.to_string(),
                details: Some(json!({ "cause": format!("{e:#}") })),
            })
        }
    }
}

fn uploads_list(state: &AppState) -> HandlerResult {
    let conn = db_conn(state)?;
    let uploads = Uploads::new(conn)
        .list()
        .map_err(|e| HandlerErr::store(e, "query"))?;
    Ok(json!({ "uploads": uploads }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "uploads.put" => uploads_put(state, &req.params),
        "uploads.list" => uploads_list(state),
        _ => return None,
    };
    Some(respond(req, result))
}
