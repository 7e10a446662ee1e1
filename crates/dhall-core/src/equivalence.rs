//! Expression equivalence: equal after beta-evaluation then
//! alpha-normalization.
//!
//! Record and union fields compare as label-keyed sets, which falls out of
//! both the order-insensitive field maps and the canonical label sorting the
//! evaluator performs.

use crate::{
    alpha::alpha_normalize,
    eval::{Closure, EvalCx},
    resource::EvalResult,
};

/// Decides `a ≡ b`, each side interpreted under its own scope.
pub(crate) fn equiv(a: &Closure, b: &Closure, cx: &mut EvalCx<'_>) -> EvalResult<bool> {
    let a = alpha_normalize(&a.evaluated(cx)?);
    let b = alpha_normalize(&b.evaluated(cx)?);
    Ok(a == b)
}
