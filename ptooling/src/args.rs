//! JSON argument parsing helpers for function handlers.
//!
//! Backends occasionally stream argument objects without the closing brace, so
//! parsing is lenient about exactly that one defect.
//!
//! ```rust
//! use ptooling::{parse_json_object, required_string};
//!
//! let args = parse_json_object(r#"{"url":"https://example.com""#).expect("object should parse");
//! let url = required_string(&args, "url").expect("url should be present");
//! assert_eq!(url, "https://example.com");
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

/// Appends a missing trailing `}` to an object-shaped argument string.
pub fn normalize_arguments(args_json: &str) -> String {
    let trimmed = args_json.trim();
    if trimmed.starts_with('{') && !trimmed.ends_with('}') {
        format!("{trimmed}}}")
    } else {
        trimmed.to_string()
    }
}

pub fn parse_json_value(args_json: &str) -> Result<Value, ToolError> {
    serde_json::from_str(&normalize_arguments(args_json))
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))
}

pub fn parse_json_object(args_json: &str) -> Result<Map<String, Value>, ToolError> {
    match parse_json_value(args_json)? {
        Value::Object(map) => Ok(map),
        _ => Err(ToolError::invalid_arguments("expected JSON object arguments")),
    }
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    optional_string(args, key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn optional_string(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_closing_brace_is_repaired() {
        assert_eq!(normalize_arguments("{\"q\":\"x\""), "{\"q\":\"x\"}");
        assert_eq!(normalize_arguments(" {\"q\":1} "), "{\"q\":1}");
        assert_eq!(normalize_arguments("[1,2]"), "[1,2]");
    }

    #[test]
    fn parse_object_and_extract_strings() {
        let args = parse_json_object("{\"query\":\"rust\",\"n\":3}").expect("args should parse");
        assert_eq!(required_string(&args, "query").expect("query"), "rust");
        assert_eq!(optional_string(&args, "n"), None);
    }

    #[test]
    fn parse_invalid_json_returns_invalid_arguments() {
        let error = parse_json_value("{\"q\":").expect_err("json should fail");
        assert_eq!(error.kind, crate::ToolErrorKind::InvalidArguments);

        let error = parse_json_object("[1]").expect_err("array is not an object");
        assert_eq!(error.kind, crate::ToolErrorKind::InvalidArguments);
    }
}
