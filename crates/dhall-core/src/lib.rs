#![doc = include_str!("../../../README.md")]

mod alpha;
mod builtins;
mod ctx;
mod engine;
mod equivalence;
mod error;
mod eval;
pub mod expr;
mod resource;
mod substitute;
mod trace;
mod typecheck;

pub use crate::{
    builtins::{Builtin, resolve_name},
    ctx::ShadowCtx,
    engine::{Engine, equivalent, normalize, type_of},
    error::{ErrorKind, TypeError, TypeResult},
    expr::{
        Const, Expr, FieldMap, ImportSource, Label, LetBinding, NaiveDouble, OpKind, SubExpr,
        TextChunk,
    },
    resource::{BudgetError, EvalResult, ResourceLimits},
    substitute::substitute,
    trace::{NoopTracer, RecordingTracer, ReduceEvent, Tracer},
};

pub use crate::alpha::alpha_normalize;
