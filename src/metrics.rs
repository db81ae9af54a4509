//! Execution metrics for a run.
//!
//! Timing, engine heap usage, and native call counts, collected once per
//! run and logged by the runner.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Execution metrics collected during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    /// Wall time from engine init to coerced result, in microseconds
    pub duration_us: u64,

    /// Engine heap bytes in use after execution
    pub memory_used_bytes: u64,

    /// Bytes allocated through the engine allocator
    pub malloc_bytes: u64,

    /// Live engine objects after execution
    pub object_count: u64,

    /// Native method call counts
    pub host_calls: HashMap<String, u32>,
}

impl ExecutionMetrics {
    /// Create new metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record execution duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_us = duration.as_micros() as u64;
        self
    }

    /// Record engine memory usage
    pub fn with_memory(mut self, used: u64, malloc: u64, objects: u64) -> Self {
        self.memory_used_bytes = used;
        self.malloc_bytes = malloc;
        self.object_count = objects;
        self
    }

    /// Record native method calls
    pub fn with_host_calls(mut self, calls: HashMap<String, u32>) -> Self {
        self.host_calls = calls;
        self
    }

    /// Get total native method calls
    pub fn total_host_calls(&self) -> u32 {
        self.host_calls.values().sum()
    }
}

/// Wall-clock timer for a run
#[derive(Debug, Clone, Copy)]
pub struct ExecutionTimer {
    start: Instant,
}

impl ExecutionTimer {
    /// Start timing
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Convert into metrics carrying the elapsed time
    pub fn into_metrics(self) -> ExecutionMetrics {
        ExecutionMetrics::new().with_duration(self.elapsed())
    }
}
