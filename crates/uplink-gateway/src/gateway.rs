//! Per-request satellite pipeline.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use tracing::{debug, warn};

use uplink_core::config::LOCATION_HEADER;
use uplink_core::error::GatewayResult;
use uplink_core::{GatewayError, SatelliteResult, decode_result};
use uplink_fetch::SatelliteFetcher;
use uplink_runtime::{CompiledSatellite, SatelliteEngine, ScriptCache};

use crate::context::request_context;

/// Orchestrates fetch → compile → cache → execute → decode for one
/// request at a time. All collaborators are injected at construction
/// and shared across requests.
pub struct Gateway {
    cache: ScriptCache,
    fetcher: SatelliteFetcher,
    engine: SatelliteEngine,
}

impl Gateway {
    pub fn new(cache: ScriptCache, fetcher: SatelliteFetcher, engine: SatelliteEngine) -> Self {
        Self {
            cache,
            fetcher,
            engine,
        }
    }

    /// Handle one request end to end.
    ///
    /// Never fails: any pipeline error is folded into a 400 response
    /// carrying the error's text.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        match self.dispatch(&req).await {
            Ok((status, result)) => satellite_response(status, result),
            Err(err) => {
                warn!(error = %err, "satellite pipeline failed");
                error_response(err)
            }
        }
    }

    async fn dispatch<B>(&self, req: &Request<B>) -> GatewayResult<(StatusCode, SatelliteResult)> {
        let location = location_header(req)?;

        let satellite = match self.cache.get(&location).await {
            Some(cached) => {
                debug!(%location, "satellite cache hit");
                cached
            }
            None => self.resolve(&location).await?,
        };

        let ctx = request_context(req);
        let raw = self.engine.run(&satellite, &ctx)?;
        let result = decode_result(&raw)?;
        let status = validate_status(result.status)?;
        Ok((status, result))
    }

    // Miss path: fetch source, compile, publish to the cache. Concurrent
    // misses on one location each do this independently; the last insert
    // wins and every produced program is valid.
    async fn resolve(&self, location: &str) -> GatewayResult<CompiledSatellite> {
        debug!(%location, "satellite cache miss");
        let source = self.fetcher.fetch(location).await?;
        let satellite = self.engine.compile(&source)?;
        self.cache.insert(location, satellite.clone()).await;
        Ok(satellite)
    }
}

fn location_header<B>(req: &Request<B>) -> GatewayResult<String> {
    req.headers()
        .get(LOCATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(GatewayError::MissingLocationHeader)
}

fn validate_status(code: i64) -> GatewayResult<StatusCode> {
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .filter(|status| status.canonical_reason().is_some())
        .ok_or(GatewayError::InvalidStatus(code))
}

// Satellite headers are appended on top of whatever defaults the
// transport adds; names or values the transport cannot represent are
// skipped.
fn satellite_response(status: StatusCode, result: SatelliteResult) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(result.body)));
    *response.status_mut() = status;
    for (name, values) in result.headers {
        for value in values {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                response.headers_mut().append(name, value);
            }
        }
    }
    response
}

fn error_response(err: GatewayError) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(err.to_string())));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}
