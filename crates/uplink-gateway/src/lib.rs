//! uplink-gateway — HTTP front end of the satellite pipeline.
//!
//! Each inbound request names a satellite via the
//! `X-Satellite-Location` header. The gateway resolves it through the
//! cache (fetching and compiling on a miss), executes it against the
//! request's context, and translates the decoded result into the HTTP
//! response.
//!
//! # Request flow
//!
//! ```text
//! HTTP client
//!   │
//!   ▼
//! hyper server (one task per connection)
//!   │
//!   ├── extract location header
//!   ├── cache get ──miss──▶ fetch → compile → cache insert
//!   ├── build ExecutionContext (method, headers, url)
//!   ├── run satellite → decode result → validate status
//!   │
//!   ▼
//! HTTP response (status, appended headers, body)
//! ```
//!
//! Every pipeline failure becomes a 400 response whose body is the
//! error's text; nothing in the pipeline can crash the process.

pub mod context;
pub mod gateway;
pub mod server;

pub use gateway::Gateway;
pub use server::GatewayServer;
