//! QuickJS engine management.
//!
//! This module provides the `Engine`, a scoped handle over one QuickJS
//! runtime and its single execution context. Only one engine may be active
//! per thread; dropping the handle tears it down on every exit path.

mod binding;
pub mod stack;

use crate::capability::NativeClass;
use crate::config::RunnerConfig;
use crate::context::{Coercion, ScriptValue};
use crate::error::ScriptError;
use crate::host_functions::{HostCalls, SharedHostCalls};
use rquickjs::convert::Coerced;
use rquickjs::{Context, Ctx, Runtime, Value};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, warn};
use uuid::Uuid;

thread_local! {
    static ENGINE_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Initialized; bindings may be installed and a script executed
    Ready,
    /// The one script has been executed
    Executed,
    /// Torn down
    Disposed,
}

/// Marks the thread as owning an engine until dropped
struct ActiveGuard;

impl ActiveGuard {
    fn acquire() -> Result<Self, ScriptError> {
        ENGINE_ACTIVE.with(|active| {
            if active.get() {
                return Err(ScriptError::engine_init(
                    "an engine instance is already active on this thread",
                ));
            }
            active.set(true);
            Ok(ActiveGuard)
        })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ENGINE_ACTIVE.with(|active| active.set(false));
    }
}

/// Runtime and context. The context is declared first so it is dropped
/// before the runtime whose allocator backs it.
struct EngineInner {
    context: Context,
    runtime: Runtime,
    _guard: ActiveGuard,
}

/// Engine heap usage snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Heap bytes in use
    pub used_bytes: u64,
    /// Bytes allocated through the engine allocator
    pub malloc_bytes: u64,
    /// Live objects
    pub object_count: u64,
}

/// A single QuickJS engine instance
///
/// At most one engine is active per thread at a time; a second `Engine::new`
/// on the same thread fails with `ENGINE_INIT` until the first is disposed.
/// Engines on different threads are independent.
pub struct Engine {
    /// Unique engine ID
    id: String,
    /// Lifecycle state
    state: EngineState,
    /// Runtime and context, `None` once disposed
    inner: Option<EngineInner>,
    /// Native call ledger shared with bound classes
    host_calls: SharedHostCalls,
}

impl Engine {
    /// Initialize the engine and create its execution context
    pub fn new(config: &RunnerConfig) -> Result<Self, ScriptError> {
        let guard = ActiveGuard::acquire()?;
        let id = Uuid::new_v4().to_string();

        let runtime = Runtime::new()
            .map_err(|e| ScriptError::engine_init(format!("failed to create runtime: {}", e)))?;

        let stack_size = usize::try_from(config.stack_size_bytes).unwrap_or(usize::MAX);
        runtime.set_memory_limit(usize::try_from(config.memory_limit_bytes).unwrap_or(usize::MAX));
        runtime.set_max_stack_size(stack_size);
        if let Some(threshold) = config.gc_threshold_bytes {
            runtime.set_gc_threshold(usize::try_from(threshold).unwrap_or(usize::MAX));
        }

        debug!(
            engine_id = %id,
            stack_limit = %format!("{:#x}", stack::stack_limit(stack_size)),
            "Computed stack limit"
        );

        let context = Context::full(&runtime)
            .map_err(|e| ScriptError::context_create(format!("failed to create context: {}", e)))?;

        info!(
            engine_id = %id,
            memory_limit = config.memory_limit_bytes,
            stack_size = config.stack_size_bytes,
            "Initialized engine"
        );

        Ok(Self {
            id,
            state: EngineState::Ready,
            inner: Some(EngineInner {
                context,
                runtime,
                _guard: guard,
            }),
            host_calls: Rc::new(HostCalls::new(config.max_host_calls)),
        })
    }

    /// Get the engine ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Register a native class on the global namespace
    pub fn bind<T: 'static>(&mut self, class: NativeClass<T>) -> Result<(), ScriptError> {
        let inner = self.ready("bind")?;
        class.validate().map_err(ScriptError::bind)?;

        let path = class.exposed_path();
        let calls = Rc::clone(&self.host_calls);
        inner
            .context
            .with(|ctx| binding::install(&ctx, class, calls))
            .map_err(|e| ScriptError::bind(format!("failed to bind {}: {}", path, e)))?;

        debug!(engine_id = %self.id, class = %path, "Bound native class");
        Ok(())
    }

    /// Execute `source` and coerce its result
    ///
    /// Only one script may be executed per engine.
    pub fn execute(&mut self, source: &str, coercion: Coercion) -> Result<ScriptValue, ScriptError> {
        let inner = self.ready("execute")?;

        let result = inner.context.with(|ctx| match ctx.eval::<Value, _>(source) {
            Ok(value) => coerce(&value, coercion),
            Err(rquickjs::Error::Exception) => Err(thrown(&ctx)),
            Err(e) => Err(ScriptError::execution(e.to_string())),
        });
        self.state = EngineState::Executed;

        match &result {
            Ok(_) => debug!(engine_id = %self.id, "Script executed"),
            Err(e) => warn!(engine_id = %self.id, phase = %e.phase, error = %e.message, "Script failed"),
        }

        result
    }

    /// Engine heap usage, `None` once disposed
    pub fn memory_usage(&self) -> Option<MemorySnapshot> {
        self.inner.as_ref().map(|inner| {
            let usage = inner.runtime.memory_usage();
            MemorySnapshot {
                used_bytes: usage.memory_used_size.max(0) as u64,
                malloc_bytes: usage.malloc_size.max(0) as u64,
                object_count: usage.obj_count.max(0) as u64,
            }
        })
    }

    /// Native method call counts so far
    pub fn host_calls(&self) -> HashMap<String, u32> {
        self.host_calls.snapshot()
    }

    /// Tear the engine down. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(inner) = self.inner.take() {
            drop(inner);
            info!(engine_id = %self.id, "Disposed engine");
        }
        self.state = EngineState::Disposed;
    }

    fn ready(&self, operation: &str) -> Result<&EngineInner, ScriptError> {
        match (self.state, self.inner.as_ref()) {
            (EngineState::Ready, Some(inner)) => Ok(inner),
            (EngineState::Executed, Some(_)) => Err(ScriptError::execution(format!(
                "cannot {}: engine already executed its script",
                operation
            ))),
            _ => Err(ScriptError::engine_init(format!(
                "cannot {}: engine has been disposed",
                operation
            ))),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.state != EngineState::Disposed {
            self.dispose();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Convert a script result into the expected native type
///
/// Integers accept any number and apply the engine's Int32 conversion
/// (fraction dropped, wrapped modulo 2^32, NaN and infinities to 0).
/// Strings accept only strings.
fn coerce(value: &Value<'_>, coercion: Coercion) -> Result<ScriptValue, ScriptError> {
    match coercion {
        Coercion::Integer => {
            if !value.is_number() {
                return Err(ScriptError::coercion(coercion.expected(), value.type_name()));
            }
            value
                .get::<Coerced<i32>>()
                .map(|coerced| ScriptValue::Integer(coerced.0))
                .map_err(|e| ScriptError::coercion(coercion.expected(), &e.to_string()))
        }
        Coercion::String => match value.as_string() {
            Some(s) => s
                .to_string()
                .map(ScriptValue::String)
                .map_err(|e| ScriptError::coercion(coercion.expected(), &e.to_string())),
            None => Err(ScriptError::coercion(coercion.expected(), value.type_name())),
        },
    }
}

/// Build an execution error from the pending exception
fn thrown(ctx: &Ctx<'_>) -> ScriptError {
    let value = ctx.catch();

    let message = value
        .get::<Coerced<String>>()
        .map(|coerced| coerced.0)
        .unwrap_or_else(|_| format!("uncaught {}", value.type_name()));

    let stack = value
        .as_exception()
        .and_then(|exception| exception.stack())
        .filter(|stack| !stack.trim().is_empty());

    match stack {
        Some(stack) => ScriptError::execution(message).with_stack(stack),
        None => ScriptError::execution(message),
    }
}
