//! The built-in registry.
//!
//! Every built-in is a variant of [`Builtin`]; its type, its arity (how many
//! applied arguments it absorbs before its reduction rule may fire) and its
//! reduction rule are the three total functions below. Adding a built-in
//! means adding a variant and one arm to each — the evaluator and the
//! type-checker consult the registry only through these entry points.
//!
//! `True` and `False` are built-in *names*, not tags: [`resolve_name`] maps
//! them straight to boolean literals, the way the original language surface
//! treats them.

use std::str::FromStr;

use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    eval::{EvalCx, Scope, eval},
    expr::{
        Expr, OpKind, SubExpr, TextChunk, app, boolean, builtin, empty_list, lam, list, op, pi,
        rc, var,
    },
    resource::EvalResult,
};

/// Tags for every built-in expression.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum Builtin {
    Sort,
    Kind,
    Type,
    Bool,
    Natural,
    Double,
    Text,
    List,
    Optional,
    #[strum(serialize = "None")]
    None_,
    #[strum(serialize = "List/build")]
    ListBuild,
    #[strum(serialize = "List/fold")]
    ListFold,
    #[strum(serialize = "Double/show")]
    DoubleShow,
}

impl Builtin {
    /// The recorded type of this built-in, or `None` for `Sort`, which has
    /// no type (the top of the universe tower).
    pub fn type_expr(self) -> Option<SubExpr> {
        let t = match self {
            Self::Sort => return None,
            Self::Kind => builtin(Self::Sort),
            Self::Type => builtin(Self::Kind),
            Self::Bool | Self::Natural | Self::Double | Self::Text => builtin(Self::Type),
            Self::List | Self::Optional => pi("_", builtin(Self::Type), builtin(Self::Type)),
            // ∀(a : Type) → Optional a
            Self::None_ => pi(
                "a",
                builtin(Self::Type),
                app(builtin(Self::Optional), var("a")),
            ),
            // ∀(a : Type) → (∀(list : Type) → ∀(cons : a → list → list) →
            //   ∀(nil : list) → list) → List a
            Self::ListBuild => pi(
                "a",
                builtin(Self::Type),
                pi(
                    "_",
                    fold_result_type(),
                    app(builtin(Self::List), var("a")),
                ),
            ),
            // ∀(a : Type) → List a → ∀(list : Type) →
            //   ∀(cons : a → list → list) → ∀(nil : list) → list
            Self::ListFold => pi(
                "a",
                builtin(Self::Type),
                pi("_", app(builtin(Self::List), var("a")), fold_result_type()),
            ),
            Self::DoubleShow => pi("_", builtin(Self::Double), builtin(Self::Text)),
        };
        Some(t)
    }

    /// How many applied arguments the built-in absorbs before its reduction
    /// rule is consulted. Zero means the built-in is never applicable.
    pub fn arity(self) -> usize {
        match self {
            Self::Sort
            | Self::Kind
            | Self::Type
            | Self::Bool
            | Self::Natural
            | Self::Double
            | Self::Text => 0,
            Self::List | Self::Optional | Self::None_ | Self::DoubleShow => 1,
            Self::ListBuild => 2,
            Self::ListFold => 5,
        }
    }
}

/// `∀(list : Type) → ∀(cons : a → list → list) → ∀(nil : list) → list`,
/// with `a` free: the church-encoded list shared by `List/build` and
/// `List/fold`.
fn fold_result_type() -> SubExpr {
    pi(
        "list",
        builtin(Builtin::Type),
        pi(
            "cons",
            pi("_", var("a"), pi("_", var("list"), var("list"))),
            pi("nil", var("list"), var("list")),
        ),
    )
}

/// Fires a saturated built-in application, or declines (`Ok(None)`) when the
/// arguments don't match its rule — the caller then rebuilds a neutral
/// application spine.
pub(crate) fn try_reduce(
    tag: Builtin,
    args: &[SubExpr],
    scope: &Scope,
    cx: &mut EvalCx<'_>,
) -> EvalResult<Option<SubExpr>> {
    match tag {
        Builtin::ListBuild => {
            let [element_type, builder] = args else {
                return Ok(None);
            };
            // Fusion: List/build a (List/fold a xs) collapses to xs.
            if let Expr::App(inner, xs) = &**builder {
                if let Expr::App(head, _) = &**inner {
                    if matches!(&**head, Expr::Builtin(Builtin::ListFold)) {
                        cx.tracer.on_reduce("builtin/build-fold-fusion", builder);
                        return Ok(Some(xs.clone()));
                    }
                }
            }
            let list_type = app(builtin(Builtin::List), element_type.clone());
            let cons = lam(
                "a",
                element_type.clone(),
                lam(
                    "as",
                    list_type.clone(),
                    op(OpKind::ListAppend, list(vec![var("a")]), var("as")),
                ),
            );
            let nil = empty_list(element_type.clone());
            let applied = app(app(app(builder.clone(), list_type), cons), nil);
            cx.tracer.on_reduce("builtin/list-build", builder);
            eval(&applied, scope, cx).map(Some)
        }
        Builtin::ListFold => {
            let [_, target, _, cons, nil] = args else {
                return Ok(None);
            };
            let Expr::ListLiteral(items, _) = &**target else {
                return Ok(None);
            };
            let mut acc = nil.clone();
            for item in items.iter().rev() {
                acc = app(app(cons.clone(), item.clone()), acc);
            }
            cx.tracer.on_reduce("builtin/list-fold", target);
            eval(&acc, scope, cx).map(Some)
        }
        Builtin::DoubleShow => {
            let [arg] = args else {
                return Ok(None);
            };
            let Expr::DoubleLiteral(d) = &**arg else {
                return Ok(None);
            };
            cx.tracer.on_reduce("builtin/double-show", arg);
            let shown = ryu::Buffer::new().format(d.value()).to_owned();
            Ok(Some(rc(Expr::TextLiteral(vec![TextChunk::Lit(shown)]))))
        }
        // Type formers stay applied (`List a` is its own normal form) and
        // constants are inert.
        _ => Ok(None),
    }
}

/// Resolves a surface name the way the parser expects: built-in names map
/// to their tags, `True`/`False` to boolean literals, and anything else to
/// a variable at index 0.
pub fn resolve_name(name: &str) -> SubExpr {
    match name {
        "True" => boolean(true),
        "False" => boolean(false),
        _ => match Builtin::from_str(name) {
            Ok(tag) => builtin(tag),
            Err(_) => var(name),
        },
    }
}
