//! Capture-avoiding substitution.
//!
//! Exposed for tooling: replaces occurrences of a variable with a value,
//! shifting the value's free variables past the binders crossed on the way
//! down so that nothing is captured. The evaluator itself does not use this
//! — it substitutes through closures — but alpha-soundness tests and
//! embedders renaming programmatically do.

use ahash::AHashMap;

use crate::expr::{Expr, Label, LetBinding, SubExpr, rc};

/// Replaces every occurrence of `name@index` (relative to the root of
/// `expr`) with `value`, avoiding capture.
pub fn substitute(name: &Label, index: usize, value: &SubExpr, expr: &SubExpr) -> SubExpr {
    subst(expr, name, index, value, &AHashMap::new())
}

/// `depths` counts the binders crossed so far, per name.
fn subst(
    expr: &SubExpr,
    target: &Label,
    index: usize,
    value: &SubExpr,
    depths: &AHashMap<Label, usize>,
) -> SubExpr {
    let crossed = |name: &Label| depths.get(name).copied().unwrap_or(0);
    match &**expr {
        Expr::Var(name, occ_index) => {
            if name == target && *occ_index == index + crossed(name) {
                shift_free(value, depths, &AHashMap::new())
            } else {
                expr.clone()
            }
        }
        Expr::Lambda(name, param_type, body) => {
            let param_type = subst(param_type, target, index, value, depths);
            let inner = deepen(depths, name);
            rc(Expr::Lambda(
                name.clone(),
                param_type,
                subst(body, target, index, value, &inner),
            ))
        }
        Expr::ForAll(name, param_type, body) => {
            let param_type = subst(param_type, target, index, value, depths);
            let inner = deepen(depths, name);
            rc(Expr::ForAll(
                name.clone(),
                param_type,
                subst(body, target, index, value, &inner),
            ))
        }
        Expr::LetIn(bindings, body) => {
            let mut depths = depths.clone();
            let mut out = Vec::with_capacity(bindings.len());
            for binding in bindings {
                out.push(LetBinding {
                    name: binding.name.clone(),
                    annotation: binding
                        .annotation
                        .as_ref()
                        .map(|t| subst(t, target, index, value, &depths)),
                    value: subst(&binding.value, target, index, value, &depths),
                });
                depths = deepen(&depths, &binding.name);
            }
            rc(Expr::LetIn(out, subst(body, target, index, value, &depths)))
        }
        other => rc(other.map_subexprs(|sub| subst(sub, target, index, value, depths))),
    }
}

fn deepen(depths: &AHashMap<Label, usize>, name: &Label) -> AHashMap<Label, usize> {
    let mut out = depths.clone();
    *out.entry(name.clone()).or_insert(0) += 1;
    out
}

/// Shifts the free variables of `value` by the number of binders the
/// substitution crossed (`outer`), so they keep referring to their original
/// binders. `inner` counts binders inside `value` itself.
fn shift_free(
    value: &SubExpr,
    outer: &AHashMap<Label, usize>,
    inner: &AHashMap<Label, usize>,
) -> SubExpr {
    match &**value {
        Expr::Var(name, index) => {
            let bound_inside = inner.get(name).copied().unwrap_or(0);
            if *index >= bound_inside {
                let shift = outer.get(name).copied().unwrap_or(0);
                rc(Expr::Var(name.clone(), index + shift))
            } else {
                value.clone()
            }
        }
        Expr::Lambda(name, param_type, body) => {
            let param_type = shift_free(param_type, outer, inner);
            let deeper = deepen(inner, name);
            rc(Expr::Lambda(
                name.clone(),
                param_type,
                shift_free(body, outer, &deeper),
            ))
        }
        Expr::ForAll(name, param_type, body) => {
            let param_type = shift_free(param_type, outer, inner);
            let deeper = deepen(inner, name);
            rc(Expr::ForAll(
                name.clone(),
                param_type,
                shift_free(body, outer, &deeper),
            ))
        }
        Expr::LetIn(bindings, body) => {
            let mut inner = inner.clone();
            let mut out = Vec::with_capacity(bindings.len());
            for binding in bindings {
                out.push(LetBinding {
                    name: binding.name.clone(),
                    annotation: binding
                        .annotation
                        .as_ref()
                        .map(|t| shift_free(t, outer, &inner)),
                    value: shift_free(&binding.value, outer, &inner),
                });
                inner = deepen(&inner, &binding.name);
            }
            rc(Expr::LetIn(out, shift_free(body, outer, &inner)))
        }
        other => rc(other.map_subexprs(|sub| shift_free(sub, outer, inner))),
    }
}
