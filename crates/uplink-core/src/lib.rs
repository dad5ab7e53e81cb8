pub mod config;
pub mod context;
pub mod error;
pub mod result;
pub mod value;

pub use config::GatewayConfig;
pub use context::{ExecutionContext, UrlParts};
pub use error::{FetchError, GatewayError};
pub use result::{SatelliteResult, decode_result};
pub use value::Value;
