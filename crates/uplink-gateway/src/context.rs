//! Execution-context construction from inbound requests.

use http::Request;
use uplink_core::{ExecutionContext, UrlParts};

/// Snapshot the parts of a request a satellite may inspect.
///
/// Header values that are not valid UTF-8 are carried lossily; header
/// order and multi-valued headers are preserved.
pub fn request_context<B>(req: &Request<B>) -> ExecutionContext {
    let mut headers: Vec<(String, Vec<String>)> = Vec::new();
    for (name, value) in req.headers() {
        let text = String::from_utf8_lossy(value.as_bytes()).to_string();
        match headers.iter_mut().find(|(n, _)| n == name.as_str()) {
            Some((_, values)) => values.push(text),
            None => headers.push((name.as_str().to_string(), vec![text])),
        }
    }

    let uri = req.uri();
    ExecutionContext {
        method: req.method().as_str().to_string(),
        headers,
        url: UrlParts {
            raw: uri.to_string(),
            path: uri.path().to_string(),
            query: uri.query().unwrap_or_default().to_string(),
        },
    }
}
