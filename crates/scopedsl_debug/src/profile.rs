//! Tracing overhead measurement.
//!
//! The profiler resolves a scope twice: once with tracing off (baseline) and
//! once with the tracer enabled (instrumented). The difference is reported
//! as a share of the instrumented time.

use std::time::{Duration, Instant};

use scopedsl_engine::{ActorContext, NoopTracer, ResolutionTracer, ScopeEngine};
use scopedsl_foundation::{EntityManager, EntitySet, Result};
use scopedsl_language::ScopeExpr;
use tracing::debug;

use crate::trace::{OverheadEstimate, Tracer};

/// Result of one profiling run.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileReport {
    /// The instrumented run's result.
    pub result: EntitySet,
    /// Measured overhead (per-iteration averages).
    pub overhead: OverheadEstimate,
    /// Iterations per phase.
    pub iterations: usize,
    /// True if both phases produced the same set.
    pub consistent: bool,
}

/// Measures tracing overhead.
#[derive(Clone, Debug)]
pub struct Profiler {
    iterations: usize,
}

impl Default for Profiler {
    fn default() -> Self {
        Self { iterations: 1 }
    }
}

impl Profiler {
    /// Creates a profiler running one iteration per phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set iterations per phase (at least one).
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Returns iterations per phase.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Profiles a registered scope.
    ///
    /// The tracer is enabled for the instrumented phase and returned to its
    /// previous state afterwards. The estimate is stored on the tracer.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, if any.
    pub fn profile(
        &self,
        engine: &ScopeEngine,
        scope_id: &str,
        actor: &ActorContext,
        entities: &dyn EntityManager,
        tracer: &mut Tracer,
    ) -> Result<ProfileReport> {
        self.measure(tracer, |t| engine.resolve_traced(scope_id, actor, entities, t))
    }

    /// Profiles an ad-hoc expression.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, if any.
    pub fn profile_expr(
        &self,
        engine: &ScopeEngine,
        expr: &ScopeExpr,
        actor: &ActorContext,
        entities: &dyn EntityManager,
        tracer: &mut Tracer,
    ) -> Result<ProfileReport> {
        self.measure(tracer, |t| engine.resolve_expr_traced(expr, actor, entities, t))
    }

    fn measure<F>(&self, tracer: &mut Tracer, mut resolve: F) -> Result<ProfileReport>
    where
        F: FnMut(&mut dyn ResolutionTracer) -> Result<EntitySet>,
    {
        let iterations = self.iterations.max(1);

        let mut noop = NoopTracer;
        let start = Instant::now();
        let mut baseline_result = EntitySet::new();
        for _ in 0..iterations {
            baseline_result = resolve(&mut noop)?;
        }
        let baseline = per_iteration(start.elapsed(), iterations);

        let was_enabled = tracer.is_enabled();
        tracer.enable();
        let start = Instant::now();
        let mut result = Ok(EntitySet::new());
        for _ in 0..iterations {
            result = resolve(&mut *tracer);
            if result.is_err() {
                break;
            }
        }
        let instrumented = per_iteration(start.elapsed(), iterations);
        if !was_enabled {
            tracer.disable();
        }
        let result = result?;

        let overhead = OverheadEstimate::from_runs(baseline, instrumented);
        tracer.set_overhead(overhead);
        debug!(
            baseline = ?baseline,
            instrumented = ?instrumented,
            percent = overhead.percent,
            "profiled resolution"
        );

        Ok(ProfileReport {
            consistent: result == baseline_result,
            result,
            overhead,
            iterations,
        })
    }
}

fn per_iteration(total: Duration, iterations: usize) -> Duration {
    total / u32::try_from(iterations).unwrap_or(u32::MAX)
}
