//! Satellite result decoding.
//!
//! A satellite's raw output is a dynamic [`Value`]. `decode_result`
//! coerces it into the structured [`SatelliteResult`] by explicit
//! per-field extraction: each recognized field is pulled out with a type
//! check, and a mismatch is a decode error rather than a silent default.
//!
//! Recognized fields of the result map:
//!
//! | field     | type                          | default     |
//! |-----------|-------------------------------|-------------|
//! | `status`  | integer                       | 200 (also on 0) |
//! | `headers` | map of string → list of string| empty       |
//! | `body`    | string                        | empty       |
//!
//! Any other fields are ignored.

use crate::error::{GatewayError, GatewayResult};
use crate::value::Value;
use std::collections::HashMap;

/// Default status applied when a satellite omits or zeroes `status`.
pub const DEFAULT_STATUS: i64 = 200;

/// Structured response decoded from a satellite's raw output.
///
/// `status` is carried as the satellite produced it; the gateway
/// validates it against recognized HTTP status codes before writing
/// the response.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteResult {
    pub status: i64,
    pub headers: HashMap<String, Vec<String>>,
    pub body: String,
}

impl Default for SatelliteResult {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            headers: HashMap::new(),
            body: String::new(),
        }
    }
}

/// Decode a satellite's raw output into a [`SatelliteResult`].
///
/// The output must be map-shaped; anything else is a decode error
/// naming the actual type.
pub fn decode_result(raw: &Value) -> GatewayResult<SatelliteResult> {
    let map = raw.as_map().ok_or_else(|| {
        GatewayError::Decode(format!("expected a map, got {}", raw.type_name()))
    })?;

    let mut result = SatelliteResult::default();

    if let Some(status) = map.get("status") {
        let code = status.as_int().ok_or_else(|| {
            GatewayError::Decode(format!(
                "status: expected integer, got {}",
                status.type_name()
            ))
        })?;
        if code != 0 {
            result.status = code;
        }
    }

    if let Some(headers) = map.get("headers") {
        result.headers = decode_headers(headers)?;
    }

    if let Some(body) = map.get("body") {
        result.body = body
            .as_str()
            .ok_or_else(|| {
                GatewayError::Decode(format!(
                    "body: expected string, got {}",
                    body.type_name()
                ))
            })?
            .to_string();
    }

    Ok(result)
}

fn decode_headers(headers: &Value) -> GatewayResult<HashMap<String, Vec<String>>> {
    let map = headers.as_map().ok_or_else(|| {
        GatewayError::Decode(format!(
            "headers: expected map, got {}",
            headers.type_name()
        ))
    })?;

    let mut decoded = HashMap::with_capacity(map.len());
    for (name, values) in map {
        let list = match values {
            Value::List(list) => list,
            other => {
                return Err(GatewayError::Decode(format!(
                    "headers[{name}]: expected list of strings, got {}",
                    other.type_name()
                )));
            }
        };
        let mut strings = Vec::with_capacity(list.len());
        for value in list {
            let s = value.as_str().ok_or_else(|| {
                GatewayError::Decode(format!(
                    "headers[{name}]: expected list of strings, got {} element",
                    value.type_name()
                ))
            })?;
            strings.push(s.to_string());
        }
        decoded.insert(name.clone(), strings);
    }
    Ok(decoded)
}
