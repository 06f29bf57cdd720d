//! Tool argument decoding
//!
//! Arguments arrive as raw JSON text. Each tool decodes them into its own
//! typed struct; tools with a single primary field may also accept a bare
//! string in place of the object.

use serde::de::DeserializeOwned;

use crate::core::{Result, TandemError};

/// Typed arguments of one tool
pub trait ToolArgs: DeserializeOwned {
    /// Build arguments from a bare string, if the tool has a primary field
    fn from_bare(_value: String) -> Option<Self> {
        None
    }
}

/// Decode raw argument text for `tool`.
///
/// Strict JSON decoding is tried first. If it fails and the input is a JSON
/// string or not JSON at all, the tool's bare-string fallback is applied.
pub fn decode_args<T: ToolArgs>(tool: &str, arguments: &str) -> Result<T> {
    let raw = match arguments.trim() {
        "" => "{}",
        trimmed => trimmed,
    };

    let strict = match serde_json::from_str::<T>(raw) {
        Ok(args) => return Ok(args),
        Err(e) => e,
    };

    let bare = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(s)) => Some(s),
        Ok(_) => None,
        Err(_) => Some(raw.to_string()),
    };

    bare.and_then(T::from_bare).ok_or_else(|| {
        TandemError::tool(format!("Invalid arguments for {}: {}", tool, strict))
    })
}
