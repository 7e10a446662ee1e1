//! Reduction tracing hooks.
//!
//! The evaluator reports every non-structural reduction (an application
//! firing, an operator folding, a built-in rule, a merge dispatch) to a
//! [`Tracer`]. The default [`NoopTracer`] makes the hooks free;
//! [`RecordingTracer`] collects the reductions for debugging and tests.

use crate::expr::Expr;

/// Hook invoked on each reduction the evaluator performs.
///
/// `rule` is a stable, slash-separated rule name such as `"app/beta"` or
/// `"op/fold-literals"`; `expr` is the redex before reduction.
pub trait Tracer {
    fn on_reduce(&mut self, rule: &'static str, expr: &Expr) {
        let _ = (rule, expr);
    }
}

/// Does nothing. The default for every engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// One recorded reduction.
#[derive(Debug, Clone)]
pub struct ReduceEvent {
    pub rule: &'static str,
    /// The redex, rendered at recording time.
    pub expr: String,
}

/// Records every reduction, in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<ReduceEvent>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReduceEvent] {
        &self.events
    }

    /// Just the rule names, in firing order.
    pub fn rules(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.rule).collect()
    }
}

impl Tracer for RecordingTracer {
    fn on_reduce(&mut self, rule: &'static str, expr: &Expr) {
        self.events.push(ReduceEvent {
            rule,
            expr: expr.to_string(),
        });
    }
}
