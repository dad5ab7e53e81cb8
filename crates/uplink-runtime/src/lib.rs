//! uplink-runtime — satellite compilation and execution.
//!
//! Wraps the rhai expression engine behind a small surface: compile
//! source text into an immutable program, execute a program against a
//! per-request context, and keep compiled programs in a bounded cache.
//!
//! # Architecture
//!
//! ```text
//! SatelliteEngine (shared rhai::Engine with evaluation limits)
//!   ├── compile(source) → CompiledSatellite (Arc-shared AST)
//!   └── run(program, context) → Value
//! ScriptCache (location → CompiledSatellite, LRU-bounded)
//! ```
//!
//! A `CompiledSatellite` is immutable and may be executed repeatedly
//! and concurrently; each run gets a fresh scope with the request
//! context bound as constants.

pub mod cache;
pub mod convert;
pub mod engine;

pub use cache::ScriptCache;
pub use engine::{CompiledSatellite, SatelliteEngine};
