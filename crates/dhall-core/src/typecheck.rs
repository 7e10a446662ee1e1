//! Bidirectional type inference.
//!
//! `infer` produces the type of an expression under a [`Scope`]: the typing
//! half of the scope answers variable lookups, the value half lets inferred
//! types mention `let`-bound values and applied arguments (dependent
//! function types). The inferred type is returned as a [`Closure`] — a type
//! expression plus the scope needed to interpret it; callers that want a
//! self-contained tree evaluate it.
//!
//! Every judgment that compares types does so with `≡` (beta then alpha then
//! structural equality). Inference charges the same step counter as
//! evaluation, so one budget bounds a whole engine operation.

use ahash::AHashSet;

use crate::{
    alpha::alpha_eq,
    builtins::Builtin,
    equivalence::equiv,
    error::{ErrorKind, TypeError, TypeResult},
    eval::{Closure, EvalCx, Scope, eval},
    expr::{Const, Expr, FieldMap, Label, OpKind, SubExpr, TextChunk, app, builtin, rc},
};

/// The function-kind relation `↝`: in which universe a `∀` lives, given the
/// universes of its parameter type and body, or `Err` if the combination is
/// ill-kinded.
pub(crate) fn function_check(arg: Const, body: Const) -> Result<Const, ()> {
    match (arg, body) {
        (_, Const::Type) => Ok(Const::Type),
        (Const::Kind, Const::Kind) => Ok(Const::Kind),
        (Const::Sort, Const::Kind | Const::Sort) => Ok(Const::Sort),
        _ => Err(()),
    }
}

fn builtin_const(c: Const) -> SubExpr {
    builtin(Builtin::from(c))
}

fn err<T>(kind: ErrorKind, expr: &SubExpr) -> TypeResult<T> {
    Err(TypeError::new(kind, expr.clone()))
}

/// Infers the type of `expr` under `scope`.
pub(crate) fn infer(expr: &SubExpr, scope: &Scope, cx: &mut EvalCx<'_>) -> TypeResult<Closure> {
    cx.steps.tick()?;
    match &**expr {
        Expr::Var(name, index) => {
            // A variable bound to a value has the type of that value,
            // inferred under the scope captured at the binding.
            if let Some(Some(value)) = scope.value(name, *index) {
                let value = value.clone();
                return infer(&value.expr, &value.scope, cx);
            }
            if let Some(Some(annotation)) = scope.type_entry(name, *index) {
                return Ok(annotation.clone());
            }
            err(
                ErrorKind::UnboundVariable {
                    name: name.clone(),
                    index: *index,
                },
                expr,
            )
        }
        Expr::Lambda(name, param_type, body) => {
            let inner = scope
                .bind_type(
                    name.clone(),
                    Some(Closure::new(param_type.clone(), scope.clone())),
                )
                .bind_value(name.clone(), None);
            let body_type = infer(body, &inner, cx)?;
            let body_type_expr = body_type.evaluated(cx)?;
            let pi_type = rc(Expr::ForAll(
                name.clone(),
                param_type.clone(),
                body_type_expr,
            ));
            // The lambda's type must itself be well-kinded.
            infer(&pi_type, scope, cx)?;
            Ok(Closure::new(pi_type, scope.clone()))
        }
        Expr::ForAll(name, param_type, body) => {
            let arg_universe = infer_universe(param_type, scope, cx)?;
            let inner = scope
                .bind_type(
                    name.clone(),
                    Some(Closure::new(param_type.clone(), scope.clone())),
                )
                .bind_value(name.clone(), None);
            let body_universe = infer_universe(body, &inner, cx)?;
            match function_check(arg_universe, body_universe) {
                Ok(universe) => Ok(Closure::from_expr(builtin_const(universe))),
                Err(()) => err(
                    ErrorKind::UniverseMismatch {
                        context: format!(
                            "function check failed for `{arg_universe} ↝ {body_universe}`"
                        ),
                    },
                    expr,
                ),
            }
        }
        Expr::LetIn(bindings, body) => {
            let mut scope = scope.clone();
            for binding in bindings {
                let value_type = infer(&binding.value, &scope, cx)?;
                if let Some(annotation) = &binding.annotation {
                    // The annotation typechecks on its own, then must match.
                    infer(annotation, &scope, cx)?;
                    let annotated = Closure::new(annotation.clone(), scope.clone());
                    if !equiv(&annotated, &value_type, cx)? {
                        return err(
                            ErrorKind::AnnotationMismatch {
                                expected: annotated.evaluated(cx)?,
                                actual: value_type.evaluated(cx)?,
                            },
                            expr,
                        );
                    }
                }
                let value = Closure::new(binding.value.clone(), scope.clone());
                scope = scope
                    .bind_value(binding.name.clone(), Some(value))
                    .bind_type(binding.name.clone(), None);
            }
            infer(body, &scope, cx)
        }
        Expr::App(func, arg) => {
            let func_type = infer(func, scope, cx)?.evaluated(cx)?;
            let Expr::ForAll(name, param_type, body_type) = &*func_type else {
                return err(
                    ErrorKind::NotAFunction {
                        expr: func.clone(),
                        actual_type: func_type.clone(),
                    },
                    expr,
                );
            };
            let arg_type = infer(arg, scope, cx)?;
            let expected = Closure::new(param_type.clone(), scope.clone());
            if !equiv(&expected, &arg_type, cx)? {
                return err(
                    ErrorKind::ArgumentTypeMismatch {
                        expected: param_type.clone(),
                        actual: arg_type.evaluated(cx)?,
                    },
                    expr,
                );
            }
            // The result type sees the argument: ∀ is dependent.
            let bound = scope.bind_value(
                name.clone(),
                Some(Closure::new(arg.clone(), scope.clone())),
            );
            Ok(Closure::new(body_type.clone(), bound))
        }
        Expr::Conditional(cond, then, else_) => {
            let cond_type = infer(cond, scope, cx)?;
            let bool_type = Closure::from_expr(builtin(Builtin::Bool));
            if !equiv(&bool_type, &cond_type, cx)? {
                return err(
                    ErrorKind::AnnotationMismatch {
                        expected: builtin(Builtin::Bool),
                        actual: cond_type.evaluated(cx)?,
                    },
                    expr,
                );
            }
            let then_type = infer(then, scope, cx)?;
            let else_type = infer(else_, scope, cx)?;
            if !equiv(&then_type, &else_type, cx)? {
                return err(
                    ErrorKind::AnnotationMismatch {
                        expected: then_type.evaluated(cx)?,
                        actual: else_type.evaluated(cx)?,
                    },
                    expr,
                );
            }
            Ok(then_type)
        }
        Expr::TypeAnnotation(inner, annotation) => {
            // V4: a bare empty optional is only typeable through its
            // annotation.
            if matches!(&**inner, Expr::OptionalLiteral(None)) {
                infer(annotation, scope, cx)?;
                let norm = eval(annotation, scope, cx)?;
                let is_optional = matches!(
                    &*norm,
                    Expr::App(head, _) if matches!(&**head, Expr::Builtin(Builtin::Optional))
                );
                if !is_optional {
                    return err(ErrorKind::EmptyOptionalWithoutAnnotation, expr);
                }
                return Ok(Closure::new(annotation.clone(), scope.clone()));
            }
            // `Sort` is a valid annotation even though it has no type.
            if annotation.as_const() != Some(Const::Sort) {
                infer(annotation, scope, cx)?;
            }
            let inner_type = infer(inner, scope, cx)?;
            let annotated = Closure::new(annotation.clone(), scope.clone());
            if !equiv(&annotated, &inner_type, cx)? {
                return err(
                    ErrorKind::AnnotationMismatch {
                        expected: annotated.evaluated(cx)?,
                        actual: inner_type.evaluated(cx)?,
                    },
                    expr,
                );
            }
            Ok(annotated)
        }
        Expr::Op(kind, a, b) => infer_op(*kind, a, b, scope, cx, expr),
        Expr::Merge(handlers, union, result_type) => {
            infer_merge(handlers, union, result_type.as_ref(), scope, cx, expr)
        }
        Expr::Select(inner, label) => {
            // Selecting from a union type yields the alternative's
            // constructor.
            let inner_norm = eval(inner, scope, cx)?;
            if let Expr::UnionType(alternatives) = &*inner_norm {
                infer(&inner_norm, scope, cx)?;
                let Some(alt_type) = alternatives.get(label) else {
                    return err(
                        ErrorKind::FieldMissing {
                            label: label.clone(),
                            expr: inner.clone(),
                        },
                        expr,
                    );
                };
                return Ok(Closure::new(
                    rc(Expr::ForAll(
                        Label::from("_"),
                        alt_type.clone(),
                        inner_norm.clone(),
                    )),
                    scope.clone(),
                ));
            }
            let inner_type = infer(inner, scope, cx)?.evaluated(cx)?;
            if let Expr::RecordType(fields) = &*inner_type {
                let Some(field_type) = fields.get(label) else {
                    return err(
                        ErrorKind::FieldMissing {
                            label: label.clone(),
                            expr: inner.clone(),
                        },
                        expr,
                    );
                };
                return Ok(Closure::new(field_type.clone(), scope.clone()));
            }
            err(
                ErrorKind::NotARecord {
                    expr: inner.clone(),
                    actual_type: inner_type,
                },
                expr,
            )
        }
        Expr::Project(inner, labels) => {
            let mut seen = AHashSet::new();
            let duplicates: Vec<Label> = labels
                .iter()
                .filter(|l| !seen.insert((*l).clone()))
                .cloned()
                .collect();
            if !duplicates.is_empty() {
                return err(ErrorKind::DuplicateLabels { labels: duplicates }, expr);
            }
            let inner_type = infer(inner, scope, cx)?.evaluated(cx)?;
            let Expr::RecordType(fields) = &*inner_type else {
                return err(
                    ErrorKind::NotARecord {
                        expr: inner.clone(),
                        actual_type: inner_type.clone(),
                    },
                    expr,
                );
            };
            let mut projected = FieldMap::with_capacity(labels.len());
            for label in labels {
                let Some(field_type) = fields.get(label) else {
                    return err(
                        ErrorKind::FieldMissing {
                            label: label.clone(),
                            expr: inner.clone(),
                        },
                        expr,
                    );
                };
                projected.insert(label.clone(), field_type.clone());
            }
            Ok(Closure::new(rc(Expr::RecordType(projected)), scope.clone()))
        }
        Expr::RecordLiteral(fields) => {
            let mut field_types = FieldMap::with_capacity(fields.len());
            for (label, value) in fields {
                field_types.insert(label.clone(), infer(value, scope, cx)?.evaluated(cx)?);
            }
            let record_type = rc(Expr::RecordType(field_types));
            // The resulting record type must be well-formed (no mixed
            // universes).
            infer(&record_type, scope, cx)?;
            Ok(Closure::new(record_type, scope.clone()))
        }
        Expr::RecordType(fields) => {
            if fields.is_empty() {
                return Ok(Closure::from_expr(builtin_const(Const::Type)));
            }
            let mut universes = Vec::with_capacity(fields.len());
            for (label, field_type) in fields {
                let universe = infer_universe(field_type, scope, cx)?;
                if universe == Const::Sort {
                    // A Sort-level field must be literally `Kind`, which
                    // rules out circular universe references.
                    let norm = eval(field_type, scope, cx)?;
                    if norm.as_const() != Some(Const::Kind) {
                        return err(
                            ErrorKind::UniverseMismatch {
                                context: format!(
                                    "expected `Kind` in record type field `{label}`, but got `{norm}`"
                                ),
                            },
                            expr,
                        );
                    }
                }
                universes.push(universe);
            }
            if universes.iter().all(|u| *u == Const::Type) {
                return Ok(Closure::from_expr(builtin_const(Const::Type)));
            }
            if universes
                .iter()
                .all(|u| matches!(u, Const::Type | Const::Kind))
            {
                return Ok(Closure::from_expr(builtin_const(Const::Sort)));
            }
            err(
                ErrorKind::UniverseMismatch {
                    context: "all record type fields must live in `Type`, or all in `Type` or `Kind`"
                        .to_owned(),
                },
                expr,
            )
        }
        Expr::Union(label, value, alternatives) => {
            if alternatives.contains_key(label) {
                return err(
                    ErrorKind::DuplicateLabels {
                        labels: vec![label.clone()],
                    },
                    expr,
                );
            }
            let value_type = infer(value, scope, cx)?.evaluated(cx)?;
            let mut alts = FieldMap::with_capacity(alternatives.len() + 1);
            alts.insert(label.clone(), value_type);
            for (alt, alt_type) in alternatives {
                alts.insert(alt.clone(), alt_type.clone());
            }
            let union_type = rc(Expr::UnionType(alts));
            infer(&union_type, scope, cx)?;
            Ok(Closure::new(union_type, scope.clone()))
        }
        Expr::UnionType(alternatives) => {
            if alternatives.is_empty() {
                return Ok(Closure::from_expr(builtin_const(Const::Type)));
            }
            let mut shared: Option<Const> = None;
            for (label, alt_type) in alternatives {
                let universe = infer_universe(alt_type, scope, cx)?;
                match shared {
                    None => shared = Some(universe),
                    Some(first) if first != universe => {
                        return err(
                            ErrorKind::UniverseMismatch {
                                context: format!(
                                    "union alternative `{label}` lives in `{universe}`, but earlier alternatives live in `{first}`"
                                ),
                            },
                            expr,
                        );
                    }
                    Some(_) => {}
                }
            }
            Ok(Closure::from_expr(builtin_const(
                shared.unwrap_or(Const::Type),
            )))
        }
        Expr::ListLiteral(items, element_type) => {
            if let Some(first) = items.first() {
                let head_type = infer(first, scope, cx)?;
                let head_type_norm = head_type.evaluated(cx)?;
                check_element_universe(&head_type_norm, scope, cx, expr)?;
                for item in items.iter().skip(1) {
                    let item_type = infer(item, scope, cx)?;
                    if !equiv(&head_type, &item_type, cx)? {
                        return err(
                            ErrorKind::AnnotationMismatch {
                                expected: head_type_norm.clone(),
                                actual: item_type.evaluated(cx)?,
                            },
                            expr,
                        );
                    }
                }
                Ok(Closure::new(
                    app(builtin(Builtin::List), head_type_norm),
                    scope.clone(),
                ))
            } else {
                let Some(element_type) = element_type else {
                    return err(ErrorKind::EmptyListWithoutAnnotation, expr);
                };
                check_element_universe(element_type, scope, cx, expr)?;
                Ok(Closure::new(
                    app(builtin(Builtin::List), element_type.clone()),
                    scope.clone(),
                ))
            }
        }
        Expr::OptionalLiteral(wrapped) => match wrapped {
            Some(inner) => {
                let inner_type = infer(inner, scope, cx)?.evaluated(cx)?;
                check_element_universe(&inner_type, scope, cx, expr)?;
                Ok(Closure::new(
                    app(builtin(Builtin::Optional), inner_type),
                    scope.clone(),
                ))
            }
            None => err(ErrorKind::EmptyOptionalWithoutAnnotation, expr),
        },
        Expr::TextLiteral(chunks) => {
            let text_type = Closure::from_expr(builtin(Builtin::Text));
            for chunk in chunks {
                if let TextChunk::Interp(inner) = chunk {
                    let inner_type = infer(inner, scope, cx)?;
                    if !equiv(&text_type, &inner_type, cx)? {
                        return err(
                            ErrorKind::AnnotationMismatch {
                                expected: builtin(Builtin::Text),
                                actual: inner_type.evaluated(cx)?,
                            },
                            expr,
                        );
                    }
                }
            }
            Ok(text_type)
        }
        Expr::NaturalLiteral(_) => Ok(Closure::from_expr(builtin(Builtin::Natural))),
        Expr::DoubleLiteral(_) => Ok(Closure::from_expr(builtin(Builtin::Double))),
        Expr::BooleanLiteral(_) => Ok(Closure::from_expr(builtin(Builtin::Bool))),
        Expr::Import(_) => err(ErrorKind::UnresolvedImport, expr),
        Expr::Builtin(tag) => match tag.type_expr() {
            Some(t) => Ok(Closure::from_expr(t)),
            None => err(ErrorKind::IllKindedSort, expr),
        },
    }
}

/// Infers the universe a type expression lives in: the type of `expr`,
/// beta-normalized, must be one of the three constants.
fn infer_universe(expr: &SubExpr, scope: &Scope, cx: &mut EvalCx<'_>) -> TypeResult<Const> {
    let ty = infer(expr, scope, cx)?;
    let norm = ty.evaluated(cx)?;
    match norm.as_const() {
        Some(universe) => Ok(universe),
        None => err(
            ErrorKind::UniverseMismatch {
                context: format!("`{norm}` is not a universe"),
            },
            expr,
        ),
    }
}

/// List elements and optional payloads must have types in `Type`.
fn check_element_universe(
    element_type: &SubExpr,
    scope: &Scope,
    cx: &mut EvalCx<'_>,
    whole: &SubExpr,
) -> TypeResult<()> {
    let universe = infer_universe(element_type, scope, cx)?;
    if universe == Const::Type {
        Ok(())
    } else {
        err(
            ErrorKind::UniverseMismatch {
                context: format!(
                    "element type `{element_type}` must live in `Type`, not `{universe}`"
                ),
            },
            whole,
        )
    }
}

/// Requires an operand's type to be the given ground builtin.
fn check_operand(
    operand: &SubExpr,
    expected: Builtin,
    scope: &Scope,
    cx: &mut EvalCx<'_>,
    whole: &SubExpr,
) -> TypeResult<()> {
    let operand_type = infer(operand, scope, cx)?;
    let expected_type = Closure::from_expr(builtin(expected));
    if equiv(&expected_type, &operand_type, cx)? {
        Ok(())
    } else {
        err(
            ErrorKind::AnnotationMismatch {
                expected: builtin(expected),
                actual: operand_type.evaluated(cx)?,
            },
            whole,
        )
    }
}

/// `List a` shape: the inert application of the `List` builtin.
fn list_element(t: &SubExpr) -> Option<&SubExpr> {
    if let Expr::App(head, element) = &**t {
        if matches!(&**head, Expr::Builtin(Builtin::List)) {
            return Some(element);
        }
    }
    None
}

fn infer_op(
    kind: OpKind,
    a: &SubExpr,
    b: &SubExpr,
    scope: &Scope,
    cx: &mut EvalCx<'_>,
    whole: &SubExpr,
) -> TypeResult<Closure> {
    match kind {
        OpKind::Plus | OpKind::Times => {
            check_operand(a, Builtin::Natural, scope, cx, whole)?;
            check_operand(b, Builtin::Natural, scope, cx, whole)?;
            Ok(Closure::from_expr(builtin(Builtin::Natural)))
        }
        OpKind::And | OpKind::Or | OpKind::Equal | OpKind::NotEqual => {
            check_operand(a, Builtin::Bool, scope, cx, whole)?;
            check_operand(b, Builtin::Bool, scope, cx, whole)?;
            Ok(Closure::from_expr(builtin(Builtin::Bool)))
        }
        OpKind::TextAppend => {
            check_operand(a, Builtin::Text, scope, cx, whole)?;
            check_operand(b, Builtin::Text, scope, cx, whole)?;
            Ok(Closure::from_expr(builtin(Builtin::Text)))
        }
        OpKind::ListAppend => {
            let a_type = infer(a, scope, cx)?.evaluated(cx)?;
            let b_type = infer(b, scope, cx)?.evaluated(cx)?;
            if list_element(&a_type).is_none() {
                return err(
                    ErrorKind::NotAList {
                        expr: a.clone(),
                        actual_type: a_type.clone(),
                    },
                    whole,
                );
            }
            if list_element(&b_type).is_none() {
                return err(
                    ErrorKind::NotAList {
                        expr: b.clone(),
                        actual_type: b_type.clone(),
                    },
                    whole,
                );
            }
            if !alpha_eq(&a_type, &b_type) {
                return err(
                    ErrorKind::ArgumentTypeMismatch {
                        expected: a_type.clone(),
                        actual: b_type.clone(),
                    },
                    whole,
                );
            }
            Ok(Closure::new(a_type, scope.clone()))
        }
        OpKind::Combine | OpKind::Prefer => {
            let a_type = infer(a, scope, cx)?.evaluated(cx)?;
            let Expr::RecordType(a_fields) = &*a_type else {
                return err(
                    ErrorKind::NotARecord {
                        expr: a.clone(),
                        actual_type: a_type.clone(),
                    },
                    whole,
                );
            };
            let b_type = infer(b, scope, cx)?.evaluated(cx)?;
            let Expr::RecordType(b_fields) = &*b_type else {
                return err(
                    ErrorKind::NotARecord {
                        expr: b.clone(),
                        actual_type: b_type.clone(),
                    },
                    whole,
                );
            };
            let merged = if kind == OpKind::Combine {
                combined_record_type(a_fields, b_fields, whole)?
            } else {
                // Right-biased: the right operand's fields win.
                let mut out = a_fields.clone();
                for (label, field_type) in b_fields {
                    out.insert(label.clone(), field_type.clone());
                }
                out
            };
            let merged = rc(Expr::RecordType(merged));
            infer(&merged, scope, cx)?;
            Ok(Closure::new(merged, scope.clone()))
        }
        OpKind::CombineTypes => {
            let a_norm = eval(a, scope, cx)?;
            let Expr::RecordType(a_fields) = &*a_norm else {
                return err(
                    ErrorKind::NotARecord {
                        expr: a.clone(),
                        actual_type: a_norm.clone(),
                    },
                    whole,
                );
            };
            let b_norm = eval(b, scope, cx)?;
            let Expr::RecordType(b_fields) = &*b_norm else {
                return err(
                    ErrorKind::NotARecord {
                        expr: b.clone(),
                        actual_type: b_norm.clone(),
                    },
                    whole,
                );
            };
            let merged = rc(Expr::RecordType(combined_record_type(
                a_fields, b_fields, whole,
            )?));
            let universe = infer_universe(&merged, scope, cx)?;
            Ok(Closure::from_expr(builtin_const(universe)))
        }
        // Imports are resolved before type-checking; the left alternative
        // is the one that remains.
        OpKind::ImportAlt => infer(a, scope, cx),
    }
}

/// Recursive merge of two record types; a label carried by both sides must
/// be a record type on both sides.
fn combined_record_type(
    a: &FieldMap,
    b: &FieldMap,
    whole: &SubExpr,
) -> TypeResult<FieldMap> {
    let mut out = FieldMap::with_capacity(a.len() + b.len());
    for (label, ta) in a {
        let merged = match b.get(label) {
            Some(tb) => match (&**ta, &**tb) {
                (Expr::RecordType(ma), Expr::RecordType(mb)) => {
                    rc(Expr::RecordType(combined_record_type(ma, mb, whole)?))
                }
                _ => {
                    return err(
                        ErrorKind::FieldCollision {
                            label: label.clone(),
                        },
                        whole,
                    );
                }
            },
            None => ta.clone(),
        };
        out.insert(label.clone(), merged);
    }
    for (label, tb) in b {
        if !a.contains_key(label) {
            out.insert(label.clone(), tb.clone());
        }
    }
    Ok(out)
}

fn infer_merge(
    handlers: &SubExpr,
    union: &SubExpr,
    result_type: Option<&SubExpr>,
    scope: &Scope,
    cx: &mut EvalCx<'_>,
    whole: &SubExpr,
) -> TypeResult<Closure> {
    let handlers_type = infer(handlers, scope, cx)?.evaluated(cx)?;
    let Expr::RecordType(handler_fields) = &*handlers_type else {
        return err(
            ErrorKind::NotARecord {
                expr: handlers.clone(),
                actual_type: handlers_type.clone(),
            },
            whole,
        );
    };
    let union_type = infer(union, scope, cx)?.evaluated(cx)?;
    let Expr::UnionType(alternatives) = &*union_type else {
        return err(
            ErrorKind::NotAUnion {
                expr: union.clone(),
                actual_type: union_type.clone(),
            },
            whole,
        );
    };

    let mut handler_labels: Vec<Label> = handler_fields.keys().cloned().collect();
    let mut union_labels: Vec<Label> = alternatives.keys().cloned().collect();
    handler_labels.sort();
    union_labels.sort();
    if handler_labels != union_labels {
        return err(
            ErrorKind::UnionHandlersMismatch {
                union_labels,
                handler_labels,
            },
            whole,
        );
    }

    let mut output: Option<Closure> = None;
    if let Some(annotation) = result_type {
        infer(annotation, scope, cx)?;
        output = Some(Closure::new(annotation.clone(), scope.clone()));
    }

    for (label, alt_type) in alternatives {
        let Some(handler_type) = handler_fields.get(label) else {
            continue; // label sets were just checked equal
        };
        let Expr::ForAll(_, param_type, out_type) = &**handler_type else {
            return err(
                ErrorKind::NotAFunction {
                    expr: rc(Expr::Select(handlers.clone(), label.clone())),
                    actual_type: handler_type.clone(),
                },
                whole,
            );
        };
        let expected_input = Closure::new(alt_type.clone(), scope.clone());
        let actual_input = Closure::new(param_type.clone(), scope.clone());
        if !equiv(&expected_input, &actual_input, cx)? {
            return err(
                ErrorKind::ArgumentTypeMismatch {
                    expected: alt_type.clone(),
                    actual: param_type.clone(),
                },
                whole,
            );
        }
        let handler_output = Closure::new(out_type.clone(), scope.clone());
        if let Some(previous) = &output {
            if !equiv(previous, &handler_output, cx)? {
                return err(
                    ErrorKind::AnnotationMismatch {
                        expected: previous.evaluated(cx)?,
                        actual: handler_output.evaluated(cx)?,
                    },
                    whole,
                );
            }
        }
        output = Some(handler_output);
    }

    match output {
        Some(output) => Ok(output),
        None => err(ErrorKind::EmptyMergeWithoutAnnotation, whole),
    }
}
