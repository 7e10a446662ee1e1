//! Alpha-normalization.
//!
//! Rewrites every binder's parameter name to the canonical placeholder `_`
//! and every bound occurrence to `_@index`, where the index counts the
//! binders crossed between the occurrence and the binder that introduced it.
//! Free variables are preserved exactly (name and index), so two expressions
//! are alpha-equivalent iff their normalized forms are structurally equal.
//!
//! The renaming context is a [`ShadowCtx`] holding the replacement name per
//! binding; since every binder shadows exactly once, the context's `age`
//! query yields the De Bruijn-style index directly.

use crate::{
    ctx::ShadowCtx,
    expr::{Expr, Label, LetBinding, SubExpr, PLACEHOLDER, rc},
};

/// Rewrites `expr` into alpha-canonical form. Total and idempotent.
pub fn alpha_normalize(expr: &SubExpr) -> SubExpr {
    alpha(expr, &ShadowCtx::new())
}

/// True if the two expressions are alpha-equivalent.
pub(crate) fn alpha_eq(a: &SubExpr, b: &SubExpr) -> bool {
    alpha_normalize(a) == alpha_normalize(b)
}

fn placeholder() -> Label {
    Label::from(PLACEHOLDER)
}

fn alpha(expr: &SubExpr, ctx: &ShadowCtx<Label>) -> SubExpr {
    match &**expr {
        Expr::Var(name, index) => match (ctx.get(name, *index), ctx.age(name, *index)) {
            (Some(replacement), Some(age)) => rc(Expr::Var(replacement.clone(), age)),
            _ => expr.clone(),
        },
        Expr::Lambda(name, param_type, body) => {
            let param_type = alpha(param_type, ctx);
            let inner = ctx.shadow(name.clone(), placeholder());
            rc(Expr::Lambda(placeholder(), param_type, alpha(body, &inner)))
        }
        Expr::ForAll(name, param_type, body) => {
            let param_type = alpha(param_type, ctx);
            let inner = ctx.shadow(name.clone(), placeholder());
            rc(Expr::ForAll(placeholder(), param_type, alpha(body, &inner)))
        }
        Expr::LetIn(bindings, body) => {
            let mut ctx = ctx.clone();
            let mut normalized = Vec::with_capacity(bindings.len());
            for binding in bindings {
                normalized.push(LetBinding {
                    name: placeholder(),
                    annotation: binding.annotation.as_ref().map(|t| alpha(t, &ctx)),
                    value: alpha(&binding.value, &ctx),
                });
                ctx = ctx.shadow(binding.name.clone(), placeholder());
            }
            rc(Expr::LetIn(normalized, alpha(body, &ctx)))
        }
        other => rc(other.map_subexprs(|sub| alpha(sub, ctx))),
    }
}
