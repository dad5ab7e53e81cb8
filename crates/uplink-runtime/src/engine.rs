//! Satellite compilation and execution.
//!
//! One `SatelliteEngine` is built at startup and shared by every
//! request. Compilation produces an immutable AST; execution never
//! mutates the program or the engine, so a compiled satellite can run
//! concurrently from any number of request tasks.

use std::sync::Arc;

use rhai::{AST, Dynamic, Engine};
use tracing::debug;
use uplink_core::{ExecutionContext, GatewayError, Value, error::GatewayResult};

use crate::convert::{context_scope, dynamic_to_value};

// Evaluation guards. Satellites are small expressions; anything that
// trips these limits is pathological.
const MAX_OPERATIONS: u64 = 1_000_000;
const MAX_CALL_LEVELS: usize = 64;
const MAX_EXPR_DEPTH: usize = 64;
const MAX_STRING_SIZE: usize = 1024 * 1024;
const MAX_ARRAY_SIZE: usize = 10_000;
const MAX_MAP_SIZE: usize = 1_000;

/// A compiled satellite program.
///
/// Immutable once created; cloning shares the underlying AST.
#[derive(Debug, Clone)]
pub struct CompiledSatellite {
    ast: Arc<AST>,
}

impl CompiledSatellite {
    fn new(ast: AST) -> Self {
        Self { ast: Arc::new(ast) }
    }
}

/// The shared script engine, with evaluation limits applied.
pub struct SatelliteEngine {
    engine: Engine,
}

impl SatelliteEngine {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        engine.set_max_call_levels(MAX_CALL_LEVELS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
        engine.set_max_string_size(MAX_STRING_SIZE);
        engine.set_max_array_size(MAX_ARRAY_SIZE);
        engine.set_max_map_size(MAX_MAP_SIZE);
        Self { engine }
    }

    /// Compile satellite source text into an executable program.
    ///
    /// Pure: identical source always yields an equivalent program. The
    /// error carries the engine's diagnostic, including the source
    /// position.
    pub fn compile(&self, source: &str) -> GatewayResult<CompiledSatellite> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|e| GatewayError::Compile(e.to_string()))?;
        debug!(source_bytes = source.len(), "satellite compiled");
        Ok(CompiledSatellite::new(ast))
    }

    /// Execute a compiled satellite against one request's context.
    ///
    /// The context is bound as scope constants; the program cannot
    /// mutate it or any shared state.
    pub fn run(
        &self,
        satellite: &CompiledSatellite,
        ctx: &ExecutionContext,
    ) -> GatewayResult<Value> {
        let mut scope = context_scope(ctx);
        let raw = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &satellite.ast)
            .map_err(|e| GatewayError::Runtime(e.to_string()))?;
        dynamic_to_value(raw)
    }
}

impl Default for SatelliteEngine {
    fn default() -> Self {
        Self::new()
    }
}
