//! The embedded-script runner.
//!
//! A run moves through five ordered phases: engine init, optional binding
//! of `CK.Crypto`, execution, coercion, and teardown. Teardown happens on
//! every path; errors from any phase are returned with the phase attached.

use crate::config::RunnerConfig;
use crate::context::{Coercion, RunReport, Script};
use crate::engine::Engine;
use crate::error::Result;
use crate::host_functions::crypto::crypto_class;
use crate::metrics::ExecutionTimer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument};

/// Source of the arithmetic variant
pub const ARITHMETIC_SOURCE: &str = "2 + 6";

/// Source of the public-key variant
pub const PUBLIC_KEY_SOURCE: &str = "var cryptLib = new CK.Crypto(true); cryptLib.getPublicKey();";

/// Source of the key-pair variant
pub const KEY_PAIR_SOURCE: &str =
    "var cryptLib = new CK.Crypto(true); cryptLib.getPublicKey() + cryptLib.getPrivateKey();";

/// The fixed scripts a runner can execute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// `2 + 6`, printed as an integer
    #[default]
    Arithmetic,
    /// The public key of a freshly generated key pair
    PublicKey,
    /// Public key followed by private key of a freshly generated key pair
    KeyPair,
}

impl Variant {
    /// The script this variant runs
    pub fn script(&self) -> Script {
        match self {
            Variant::Arithmetic => Script::new(ARITHMETIC_SOURCE, Coercion::Integer),
            Variant::PublicKey => Script::new(PUBLIC_KEY_SOURCE, Coercion::String).with_crypto(),
            Variant::KeyPair => Script::new(KEY_PAIR_SOURCE, Coercion::String).with_crypto(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Arithmetic => write!(f, "arithmetic"),
            Variant::PublicKey => write!(f, "public-key"),
            Variant::KeyPair => write!(f, "key-pair"),
        }
    }
}

/// Runs one script per invocation
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner, validating the configuration
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the configured variant
    #[instrument(skip(self), fields(variant = %self.config.variant))]
    pub fn run(&self) -> Result<RunReport> {
        self.run_script(&self.config.variant.script())
    }

    /// Run `script` in a fresh engine
    #[instrument(skip(self, script), fields(bind_crypto = script.bind_crypto))]
    pub fn run_script(&self, script: &Script) -> Result<RunReport> {
        let timer = ExecutionTimer::start();

        let mut engine = Engine::new(&self.config)?;

        if script.bind_crypto {
            engine.bind(crypto_class(self.config.key_path.clone()))?;
        }

        let value = engine.execute(&script.source, script.coercion)?;

        let mut metrics = timer
            .into_metrics()
            .with_host_calls(engine.host_calls());
        if let Some(memory) = engine.memory_usage() {
            metrics = metrics.with_memory(memory.used_bytes, memory.malloc_bytes, memory.object_count);
        }

        engine.dispose();

        info!(
            duration_us = metrics.duration_us,
            memory_used = metrics.memory_used_bytes,
            host_calls = metrics.total_host_calls(),
            "Run completed"
        );

        Ok(RunReport { value, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScriptValue;
    use crate::error::{Phase, RunnerError};
    use crate::host_functions::crypto::KeyPair;

    fn run(variant: Variant) -> RunReport {
        let config = RunnerConfig::new().with_variant(variant);
        Runner::new(config).unwrap().run().unwrap()
    }

    fn script_error(err: RunnerError) -> crate::error::ScriptError {
        match err {
            RunnerError::Script(e) => e,
            other => panic!("expected script error, got {}", other),
        }
    }

    #[test]
    fn test_arithmetic_variant() {
        let report = run(Variant::Arithmetic);
        assert_eq!(report.value, ScriptValue::Integer(8));
        assert_eq!(report.value.to_string(), "8");
        assert_eq!(report.metrics.total_host_calls(), 0);
    }

    #[test]
    fn test_public_key_variant() {
        let report = run(Variant::PublicKey);
        let public = report.value.as_str().unwrap();
        assert_eq!(public.len(), 64);
        assert!(public.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(report.metrics.host_calls["getPublicKey"], 1);
    }

    #[test]
    fn test_key_pair_variant_is_concatenation() {
        let report = run(Variant::KeyPair);
        let combined = report.value.as_str().unwrap();
        assert_eq!(combined.len(), 128);

        let (public, private) = combined.split_at(64);
        assert_ne!(public, private);

        // the public half is derived from the private half
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ck.key");
        std::fs::write(&path, private).unwrap();
        assert_eq!(KeyPair::load(&path).unwrap().public_key(), public);
    }

    #[test]
    fn test_accessors_concatenate_in_script() {
        let runner = Runner::new(RunnerConfig::default()).unwrap();
        let script = Script::new(
            "var c = new CK.Crypto(true); \
             (c.getPublicKey() + c.getPrivateKey()) === c.getPublicKey().concat(c.getPrivateKey()) \
             && c.getPublicKey() !== c.getPrivateKey() ? 1 : 0",
            Coercion::Integer,
        )
        .with_crypto();

        assert_eq!(runner.run_script(&script).unwrap().value, ScriptValue::Integer(1));
    }

    #[test]
    fn test_unregistered_global_reports_thrown_message() {
        let runner = Runner::new(RunnerConfig::default()).unwrap();
        let script = Script::new(PUBLIC_KEY_SOURCE, Coercion::String);

        let err = runner.run_script(&script).unwrap_err();
        assert!(err.to_string().contains("CK"));

        let err = script_error(err);
        assert_eq!(err.phase, Phase::Execute);
        assert!(err.message.contains("ReferenceError"));
        assert!(err.message.contains("CK"));
    }

    #[test]
    fn test_error_path_tears_down_engine() {
        let runner = Runner::new(RunnerConfig::default()).unwrap();
        let failing = Script::new("undefinedSymbol.call()", Coercion::Integer);
        assert!(runner.run_script(&failing).is_err());

        // the failed run released its engine, so another can start here
        let report = runner.run_script(&Variant::Arithmetic.script()).unwrap();
        assert_eq!(report.value, ScriptValue::Integer(8));
    }

    #[test]
    fn test_load_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ck.key");
        let pair = KeyPair::generate();
        pair.save(&path).unwrap();

        let runner = Runner::new(RunnerConfig::new().with_key_path(path)).unwrap();
        let script = Script::new(
            "new CK.Crypto(false).getPublicKey()",
            Coercion::String,
        )
        .with_crypto();

        let report = runner.run_script(&script).unwrap();
        assert_eq!(report.value, ScriptValue::String(pair.public_key()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RunnerConfig::new().with_stack_size(1024);
        assert!(matches!(
            Runner::new(config),
            Err(RunnerError::Config(_))
        ));
    }

    #[test]
    fn test_variant_scripts() {
        assert!(!Variant::Arithmetic.script().bind_crypto);
        assert_eq!(Variant::PublicKey.script().coercion, Coercion::String);
        assert!(Variant::KeyPair.script().source.contains("getPrivateKey"));
        assert_eq!(Variant::KeyPair.to_string(), "key-pair");
    }
}
