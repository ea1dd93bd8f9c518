//! Configuration for the debugging tools.

use crate::profile::Profiler;
use crate::trace::{Tracer, TracerConfig};

/// Configuration for tracing and profiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugConfig {
    /// Tracer settings.
    pub tracer: TracerConfig,
    /// Iterations per profiling phase.
    pub profile_iterations: usize,
    /// Print the error summary after a failed resolution.
    pub show_errors: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            tracer: TracerConfig::default(),
            profile_iterations: 1,
            show_errors: false,
        }
    }
}

impl DebugConfig {
    /// Creates a configuration for development: tracing on, errors shown.
    #[must_use]
    pub fn development() -> Self {
        Self {
            tracer: TracerConfig::new().enabled(),
            profile_iterations: 1,
            show_errors: true,
        }
    }

    /// Creates a configuration for profiling: large buffer, more samples.
    #[must_use]
    pub fn profiling() -> Self {
        Self {
            tracer: TracerConfig::new()
                .enabled()
                .with_buffer_size(100_000)
                .with_slowest_count(10),
            profile_iterations: 10,
            show_errors: false,
        }
    }

    /// Builder method to replace the tracer settings.
    #[must_use]
    pub fn with_tracer(mut self, tracer: TracerConfig) -> Self {
        self.tracer = tracer;
        self
    }

    /// Builder method to set tracing on or off.
    #[must_use]
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracer.enabled = enabled;
        self
    }

    /// Builder method to select JSON trace output.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.tracer.json_format = json;
        self
    }

    /// Builder method to set profiling iterations.
    #[must_use]
    pub fn with_profile_iterations(mut self, iterations: usize) -> Self {
        self.profile_iterations = iterations;
        self
    }

    /// Builder method to show error summaries.
    #[must_use]
    pub fn with_show_errors(mut self, show: bool) -> Self {
        self.show_errors = show;
        self
    }

    /// Builds a tracer from this configuration.
    #[must_use]
    pub fn build_tracer(&self) -> Tracer {
        Tracer::new(self.tracer.clone())
    }

    /// Builds a profiler from this configuration.
    #[must_use]
    pub fn build_profiler(&self) -> Profiler {
        Profiler::new().with_iterations(self.profile_iterations)
    }
}
