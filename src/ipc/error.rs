use serde_json::{json, Value};

pub fn ok(id: &str, result: Value) -> Value {
    json!({ "id": id, "ok": true, "result": result })
}

/// Error envelope; `details` is omitted when there are none.
pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    let mut error = json!({ "code": code, "message": message.into() });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({ "id": id, "ok": false, "error": error })
}

/// Reply to a line that did not parse as a request. There is no id to echo.
pub fn bad_json(message: impl Into<String>) -> Value {
    json!({
        "ok": false,
        "error": { "code": "bad_json", "message": message.into() },
    })
}
