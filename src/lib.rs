//! # CK Script Runner
//!
//! This library embeds a QuickJS engine, optionally exposes a native Ed25519
//! key pair to scripts as `CK.Crypto`, runs one fixed script, and returns
//! the coerced result.
//!
//! ## Architecture
//!
//! ```text
//! Runner (this crate)
//!     │
//!     │ engine init → bind → execute → coerce → teardown
//!     ▼
//! Engine (QuickJS runtime + one context)
//!     │
//!     │ CK.Crypto(bool).getPublicKey() / getPrivateKey()
//!     ▼
//! KeyPair (native)
//! ```
//!
//! ## Features
//!
//! - **Scoped Engine**: one engine per thread, torn down on every exit path
//! - **Capability Tables**: native classes are exposed through an explicit
//!   method table rather than ad hoc registration
//! - **Phased Errors**: every failure carries the phase it originated in
//! - **Resource Limits**: heap, stack, and native call limits per run

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod capability;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod host_functions;
pub mod metrics;
pub mod runner;

// Re-export commonly used types
pub use capability::{CapabilityTable, NativeClass};
pub use config::RunnerConfig;
pub use context::{Coercion, RunReport, Script, ScriptValue};
pub use engine::{Engine, EngineState};
pub use error::{Phase, RunnerError, ScriptError};
pub use host_functions::crypto::KeyPair;
pub use metrics::ExecutionMetrics;
pub use runner::{Runner, Variant};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }

    #[test]
    fn test_default_run() {
        let report = Runner::new(RunnerConfig::default()).unwrap().run().unwrap();
        assert_eq!(report.value, ScriptValue::Integer(8));
    }
}
