use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::StoreError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::AuthUser;

pub(crate) struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    /// `op` picks the db_* code for raw SQLite failures.
    pub fn store(e: StoreError, op: &str) -> Self {
        let details = match &e {
            StoreError::NotFound { entity } => Some(json!({ "entity": entity })),
            _ => None,
        };
        HandlerErr {
            code: e.code(op),
            message: e.to_string(),
            details,
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

pub(crate) type HandlerResult = Result<Value, HandlerErr>;

pub(crate) fn db_conn<'a>(state: &'a AppState) -> Result<&'a Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub(crate) fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub(crate) fn optional_str<'p>(params: &'p Value, key: &str) -> Option<&'p str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Deserialize `params[key]` (or the whole params object when `key` is
/// `None`) into a typed value.
pub(crate) fn parse_params<T: DeserializeOwned>(
    params: &Value,
    key: Option<&str>,
) -> Result<T, HandlerErr> {
    let raw = match key {
        Some(k) => params
            .get(k)
            .cloned()
            .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", k)))?,
        None => params.clone(),
    };
    serde_json::from_value(raw).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))
}

/// Run a handler body against the open workspace connection.
pub(crate) fn with_db<F>(state: &AppState, req: &Request, f: F) -> Value
where
    F: FnOnce(&Connection, &Value) -> HandlerResult,
{
    let conn = match db_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    respond(req, f(conn, &req.params))
}

pub(crate) fn respond(req: &Request, result: HandlerResult) -> Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub(crate) fn session_user(state: &AppState) -> Result<&AuthUser, HandlerErr> {
    state
        .session
        .as_ref()
        .ok_or_else(|| HandlerErr::new("unauthenticated", "open a session first"))
}

pub(crate) fn search_term(params: &Value) -> &str {
    optional_str(params, "search").unwrap_or("")
}
