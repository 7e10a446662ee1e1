//! The engine: limits, tracing, and the public semantic operations.
//!
//! An [`Engine`] owns the resource limits and the tracer; each operation
//! runs with a fresh step counter, so one budget bounds one top-level
//! `normalize`/`type_of`/`equivalent` call. The free functions at the bottom
//! are the common case: no limits, no tracing.

use crate::{
    alpha,
    equivalence::equiv,
    error::TypeResult,
    eval::{Closure, EvalCx, Scope, eval},
    expr::SubExpr,
    resource::{EvalResult, ResourceLimits, StepCounter},
    trace::{NoopTracer, Tracer},
    typecheck::infer,
};

/// Runs the semantic operations with configurable limits and tracing.
#[derive(Debug)]
pub struct Engine<T: Tracer = NoopTracer> {
    limits: ResourceLimits,
    tracer: T,
}

impl Engine {
    /// An engine with no limits and no tracing.
    pub fn new() -> Self {
        Self::with_limits(ResourceLimits::UNLIMITED)
    }

    /// An engine with a step budget.
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            limits,
            tracer: NoopTracer,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tracer> Engine<T> {
    /// An engine that reports every reduction to `tracer`.
    pub fn with_tracer(limits: ResourceLimits, tracer: T) -> Self {
        Self { limits, tracer }
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    pub fn into_tracer(self) -> T {
        self.tracer
    }

    /// Full normalization: beta-evaluation followed by alpha-normalization.
    pub fn normalize(&mut self, expr: &SubExpr) -> EvalResult<SubExpr> {
        let reduced = self.beta_normalize(expr)?;
        Ok(alpha::alpha_normalize(&reduced))
    }

    /// Beta-evaluation only; binder names survive.
    pub fn beta_normalize(&mut self, expr: &SubExpr) -> EvalResult<SubExpr> {
        let mut steps = StepCounter::new(self.limits);
        let mut cx = EvalCx {
            steps: &mut steps,
            tracer: &mut self.tracer,
        };
        eval(expr, &Scope::new(), &mut cx)
    }

    /// Alpha-normalization only. Total; no budget applies.
    pub fn alpha_normalize(&self, expr: &SubExpr) -> SubExpr {
        alpha::alpha_normalize(expr)
    }

    /// The type of `expr` under the empty context, beta-evaluated into a
    /// self-contained expression.
    pub fn type_of(&mut self, expr: &SubExpr) -> TypeResult<SubExpr> {
        let mut steps = StepCounter::new(self.limits);
        let mut cx = EvalCx {
            steps: &mut steps,
            tracer: &mut self.tracer,
        };
        let ty = infer(expr, &Scope::new(), &mut cx)?;
        Ok(ty.evaluated(&mut cx)?)
    }

    /// Whether the two expressions are equivalent: equal after beta then
    /// alpha.
    pub fn equivalent(&mut self, a: &SubExpr, b: &SubExpr) -> EvalResult<bool> {
        let mut steps = StepCounter::new(self.limits);
        let mut cx = EvalCx {
            steps: &mut steps,
            tracer: &mut self.tracer,
        };
        equiv(
            &Closure::from_expr(a.clone()),
            &Closure::from_expr(b.clone()),
            &mut cx,
        )
    }
}

/// `α(β(expr))` with no limits.
pub fn normalize(expr: &SubExpr) -> EvalResult<SubExpr> {
    Engine::new().normalize(expr)
}

/// The type of `expr` under the empty context, with no limits.
pub fn type_of(expr: &SubExpr) -> TypeResult<SubExpr> {
    Engine::new().type_of(expr)
}

/// `a ≡ b` with no limits.
pub fn equivalent(a: &SubExpr, b: &SubExpr) -> EvalResult<bool> {
    Engine::new().equivalent(a, b)
}
