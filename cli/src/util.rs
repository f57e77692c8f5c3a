use kilo_core::error::codes;
use serde::Serialize;
use serde_json::{Value, json};

/// Exit codes: 0=success, 1=client error (4xx), 2=server error (5xx),
/// 3=connection error, 4=usage error
pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 4;

pub fn error_json(error: &str, message: &str, docs_hint: Option<&str>) -> Value {
    let mut err = json!({
        "error": error,
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    err
}

pub fn print_error(error: &str, message: &str, docs_hint: Option<&str>) {
    eprintln!("{}", pretty(&error_json(error, message, docs_hint)));
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    print_error(codes::USAGE_ERROR, message, docs_hint);
    std::process::exit(EXIT_USAGE);
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_value(value) {
        Ok(v) => println!("{}", pretty(&v)),
        Err(e) => print_error("serialization_error", &e.to_string(), None),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
