//! Per-request execution context.
//!
//! A snapshot of the triggering HTTP request, exposed to the satellite
//! as its evaluation environment. Built once per request and immutable
//! for the duration of one execution.

/// Request metadata bound into the satellite's scope.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    /// Request headers in arrival order. Each name maps to every value
    /// received for it.
    pub headers: Vec<(String, Vec<String>)>,
    /// Components of the request URL.
    pub url: UrlParts,
}

/// Request URL broken into the pieces satellites care about.
#[derive(Debug, Clone, Default)]
pub struct UrlParts {
    /// The URI exactly as received.
    pub raw: String,
    /// Path component, `/` at minimum.
    pub path: String,
    /// Query string without the leading `?`, empty if absent.
    pub query: String,
}

impl ExecutionContext {
    /// Look up a header value by exact name. First value wins, mirroring
    /// typical single-value header access.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}
