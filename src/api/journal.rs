use serde_json::{json, Value};
use tracing::info;

/// Tracing target the request journal is written to.
pub const JOURNAL_TARGET: &str = "opregistrar::journal";

pub enum Outcome<'a> {
    Response(&'a Value),
    Error(&'a str),
}

pub fn journal_record(method: &str, path: &str, data: &Value, outcome: Outcome<'_>) -> Value {
    match outcome {
        Outcome::Response(response) => json!({
            "method": method,
            "url": path,
            "data": data,
            "response": response,
        }),
        Outcome::Error(error) => json!({
            "method": method,
            "url": path,
            "data": data,
            "error": error,
        }),
    }
}

/// Emit one request/response pair on the journal target.
pub fn record(method: &str, path: &str, data: &Value, outcome: Outcome<'_>) {
    let entry = journal_record(method, path, data, outcome);
    info!(target: JOURNAL_TARGET, "{}", entry);
}
