//! Conversions between engine types and uplink types.
//!
//! The request context crosses into the engine as rhai values, and the
//! evaluation result crosses back out as an explicit [`Value`]. Nothing
//! outside this module touches `rhai::Dynamic`.

use rhai::{Array, Dynamic, ImmutableString, Map, Scope};
use uplink_core::{ExecutionContext, GatewayError, Value, error::GatewayResult};

/// Build the evaluation scope for one request.
///
/// Bindings are pushed as constants: `method` (string), `headers`
/// (map of name → array of values), `url` (map with `raw`, `path`,
/// `query`).
pub fn context_scope(ctx: &ExecutionContext) -> Scope<'static> {
    let mut scope = Scope::new();
    scope.push_constant("method", ctx.method.clone());
    scope.push_constant("headers", headers_map(ctx));
    scope.push_constant("url", url_map(ctx));
    scope
}

fn headers_map(ctx: &ExecutionContext) -> Map {
    let mut map = Map::new();
    for (name, values) in &ctx.headers {
        let list: Array = values
            .iter()
            .map(|v| Dynamic::from(v.clone()))
            .collect();
        map.insert(name.as_str().into(), Dynamic::from(list));
    }
    map
}

fn url_map(ctx: &ExecutionContext) -> Map {
    let mut map = Map::new();
    map.insert("raw".into(), Dynamic::from(ctx.url.raw.clone()));
    map.insert("path".into(), Dynamic::from(ctx.url.path.clone()));
    map.insert("query".into(), Dynamic::from(ctx.url.query.clone()));
    map
}

/// Convert an engine result into the explicit tagged value.
///
/// Engine types with no counterpart (function pointers, custom types)
/// are runtime errors naming the offending type.
pub fn dynamic_to_value(dynamic: Dynamic) -> GatewayResult<Value> {
    let type_name = dynamic.type_name();

    if dynamic.is_unit() {
        return Ok(Value::Null);
    }
    if let Some(b) = dynamic.clone().try_cast::<bool>() {
        return Ok(Value::Bool(b));
    }
    if let Some(i) = dynamic.clone().try_cast::<i64>() {
        return Ok(Value::Int(i));
    }
    if let Some(f) = dynamic.clone().try_cast::<f64>() {
        return Ok(Value::Float(f));
    }
    if let Some(s) = dynamic.clone().try_cast::<ImmutableString>() {
        return Ok(Value::String(s.to_string()));
    }
    if let Some(list) = dynamic.clone().try_cast::<Array>() {
        let converted = list
            .into_iter()
            .map(dynamic_to_value)
            .collect::<GatewayResult<Vec<_>>>()?;
        return Ok(Value::List(converted));
    }
    if let Some(map) = dynamic.try_cast::<Map>() {
        let mut converted = std::collections::BTreeMap::new();
        for (key, value) in map {
            converted.insert(key.to_string(), dynamic_to_value(value)?);
        }
        return Ok(Value::Map(converted));
    }

    Err(GatewayError::Runtime(format!(
        "unsupported result type: {type_name}"
    )))
}
