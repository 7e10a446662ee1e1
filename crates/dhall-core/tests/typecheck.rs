//! Type inference under the empty context.

use dhall_core::{Builtin, OpKind, TextChunk, expr::*, type_of};
use pretty_assertions::assert_eq;

fn ty(e: &SubExpr) -> SubExpr {
    type_of(e).unwrap()
}

fn nat() -> SubExpr {
    builtin(Builtin::Natural)
}

// =============================================================================
// 1. Functions and universes
// =============================================================================

/// The polymorphic identity: ∀(a : Type) → ∀(x : a) → a.
#[test]
fn identity_function() {
    let e = lam("a", builtin(Builtin::Type), lam("x", var("a"), var("x")));
    let expected = pi("a", builtin(Builtin::Type), pi("x", var("a"), var("a")));
    assert_eq!(ty(&e), expected);
}

/// Dependent result types see the applied argument.
#[test]
fn application_instantiates_dependent_type() {
    // (λ(a : Type) → λ(x : a) → x) Natural 5 : Natural
    let id = lam("a", builtin(Builtin::Type), lam("x", var("a"), var("x")));
    let e = app(app(id, nat()), natural(5));
    assert_eq!(ty(&e), nat());
}

/// ∀(a : Kind) → a lives in Sort; ∀(a : Type) → a lives in Type.
#[test]
fn forall_universes() {
    let e = pi("a", builtin(Builtin::Kind), var("a"));
    assert_eq!(ty(&e), builtin(Builtin::Sort));
    let e = pi("a", builtin(Builtin::Type), var("a"));
    assert_eq!(ty(&e), builtin(Builtin::Type));
}

/// The universe tower: Type : Kind : Sort, and Sort is untypeable.
#[test]
fn universe_tower() {
    assert_eq!(ty(&builtin(Builtin::Type)), builtin(Builtin::Kind));
    assert_eq!(ty(&builtin(Builtin::Kind)), builtin(Builtin::Sort));
    assert!(type_of(&builtin(Builtin::Sort)).is_err());
}

/// `Kind : Sort` is typeable through an explicit Sort annotation, even
/// though Sort itself has no type.
#[test]
fn sort_annotation_is_allowed() {
    let e = annot(builtin(Builtin::Kind), builtin(Builtin::Sort));
    assert_eq!(ty(&e), builtin(Builtin::Sort));
}

// =============================================================================
// 2. Let bindings and annotations
// =============================================================================

/// Let-bound functions are usable at several argument types.
#[test]
fn let_bound_function_applies() {
    let id = lam("a", builtin(Builtin::Type), lam("x", var("a"), var("x")));
    let e = let_in(
        vec![let_binding("id", None, id)],
        app(app(var("id"), nat()), natural(5)),
    );
    assert_eq!(ty(&e), nat());
}

/// A matching let annotation is accepted.
#[test]
fn let_annotation_checks() {
    let e = let_in(
        vec![let_binding("x", Some(nat()), natural(1))],
        op(OpKind::Plus, var("x"), natural(1)),
    );
    assert_eq!(ty(&e), nat());
}

/// Annotations round-trip: `(e : T) : T`.
#[test]
fn annotation_round_trip() {
    let e = annot(natural(1), nat());
    assert_eq!(ty(&e), nat());
}

/// The annotation only needs to be equivalent, not identical: a beta redex
/// that normalizes to `Natural` annotates a natural.
#[test]
fn annotation_up_to_equivalence() {
    let redex = app(
        lam("a", builtin(Builtin::Type), var("a")),
        nat(),
    );
    let e = annot(natural(1), redex);
    assert!(type_of(&e).is_ok());
}

// =============================================================================
// 3. Records, unions, projections
// =============================================================================

#[test]
fn record_literal_types_fieldwise() {
    let e = record_lit([("n", natural(1)), ("b", boolean(true))]);
    assert_eq!(
        ty(&e),
        record_type([("b", builtin(Builtin::Bool)), ("n", nat())])
    );
}

/// Record types of Type-level fields live in Type; mixed Type/Kind fields
/// lift the record type to Sort.
#[test]
fn record_type_universes() {
    let e = record_type([("x", nat())]);
    assert_eq!(ty(&e), builtin(Builtin::Type));
    let e = record_type([("x", nat()), ("t", builtin(Builtin::Type))]);
    assert_eq!(ty(&e), builtin(Builtin::Sort));
    let e = record_type([]);
    assert_eq!(ty(&e), builtin(Builtin::Type));
}

#[test]
fn select_from_record() {
    let e = select(record_lit([("a", natural(1)), ("b", boolean(true))]), "b");
    assert_eq!(ty(&e), builtin(Builtin::Bool));
}

/// Selecting from a union type yields the constructor's function type.
#[test]
fn select_from_union_type_is_constructor() {
    let ut = union_type([("L", nat()), ("R", builtin(Builtin::Bool))]);
    let constructor_type = ty(&select(ut.clone(), "L"));
    let expected = pi("_", nat(), union_type([("L", nat()), ("R", builtin(Builtin::Bool))]));
    assert_eq!(constructor_type, expected);
}

#[test]
fn project_builds_record_type() {
    let e = project(
        record_lit([("a", natural(1)), ("b", boolean(true)), ("c", text("t"))]),
        &["a", "c"],
    );
    assert_eq!(
        ty(&e),
        record_type([("a", nat()), ("c", builtin(Builtin::Text))])
    );
}

/// A union literal's type includes the inhabited alternative and the rest.
#[test]
fn union_literal_type() {
    let e = union_lit("L", natural(1), [("R", builtin(Builtin::Bool))]);
    assert_eq!(
        ty(&e),
        union_type([("L", nat()), ("R", builtin(Builtin::Bool))])
    );
}

#[test]
fn union_type_universe() {
    let e = union_type([("L", nat()), ("R", builtin(Builtin::Bool))]);
    assert_eq!(ty(&e), builtin(Builtin::Type));
    assert_eq!(ty(&union_type([])), builtin(Builtin::Type));
}

// =============================================================================
// 4. Merge
// =============================================================================

/// A merge of a handler record over an abstract union argument.
#[test]
fn merge_type_through_lambda() {
    let handlers = record_lit([
        ("L", lam("n", nat(), boolean(true))),
        ("R", lam("b", builtin(Builtin::Bool), var("b"))),
    ]);
    let u_type = union_type([("L", nat()), ("R", builtin(Builtin::Bool))]);
    let e = lam("u", u_type.clone(), merge(handlers, var("u"), None));
    assert_eq!(ty(&e), pi("u", u_type, builtin(Builtin::Bool)));
}

/// A result-type annotation on a merge is checked and returned.
#[test]
fn merge_with_annotation() {
    let handlers = record_lit([("L", lam("n", nat(), var("n")))]);
    let u = app(select(union_type([("L", nat())]), "L"), natural(1));
    let e = merge(handlers, u, Some(nat()));
    assert_eq!(ty(&e), nat());
}

// =============================================================================
// 5. Lists, optionals, text
// =============================================================================

#[test]
fn list_literal_types() {
    assert_eq!(ty(&list(vec![natural(1), natural(2)])), list_type(nat()));
    assert_eq!(ty(&empty_list(nat())), list_type(nat()));
}

#[test]
fn optional_types() {
    assert_eq!(ty(&optional_some(natural(1))), optional_type(nat()));
    let e = annot(optional_none(), optional_type(nat()));
    assert_eq!(ty(&e), optional_type(nat()));
}

/// Interpolated chunks must be Text; the literal is Text.
#[test]
fn text_with_interpolation() {
    let e = lam(
        "x",
        builtin(Builtin::Text),
        text_chunks(vec![
            TextChunk::Lit("a".to_owned()),
            TextChunk::Interp(var("x")),
        ]),
    );
    assert_eq!(
        ty(&e),
        pi("x", builtin(Builtin::Text), builtin(Builtin::Text))
    );
}

// =============================================================================
// 6. Operators
// =============================================================================

#[test]
fn operator_types() {
    assert_eq!(ty(&op(OpKind::Plus, natural(1), natural(2))), nat());
    assert_eq!(ty(&op(OpKind::Times, natural(1), natural(2))), nat());
    assert_eq!(
        ty(&op(OpKind::And, boolean(true), boolean(false))),
        builtin(Builtin::Bool)
    );
    assert_eq!(
        ty(&op(OpKind::Equal, boolean(true), boolean(false))),
        builtin(Builtin::Bool)
    );
    assert_eq!(
        ty(&op(OpKind::TextAppend, text("a"), text("b"))),
        builtin(Builtin::Text)
    );
    assert_eq!(
        ty(&op(
            OpKind::ListAppend,
            list(vec![natural(1)]),
            empty_list(nat())
        )),
        list_type(nat())
    );
}

#[test]
fn combine_types_of_records() {
    let a = record_lit([("x", natural(1))]);
    let b = record_lit([("y", boolean(true))]);
    assert_eq!(
        ty(&op(OpKind::Combine, a.clone(), b.clone())),
        record_type([("x", nat()), ("y", builtin(Builtin::Bool))])
    );
    assert_eq!(
        ty(&op(OpKind::Prefer, a, b)),
        record_type([("x", nat()), ("y", builtin(Builtin::Bool))])
    );
}

/// `⩓` of two record types has the merged record type's universe.
#[test]
fn combine_types_operator_universe() {
    let a = record_type([("x", nat())]);
    let b = record_type([("y", builtin(Builtin::Bool))]);
    assert_eq!(ty(&op(OpKind::CombineTypes, a, b)), builtin(Builtin::Type));
}

/// `?` types as its left alternative.
#[test]
fn import_alt_types_as_left() {
    let e = op(OpKind::ImportAlt, natural(1), import("./x.dhall"));
    assert_eq!(ty(&e), nat());
}

// =============================================================================
// 7. Built-ins
// =============================================================================

#[test]
fn builtin_types() {
    assert_eq!(ty(&nat()), builtin(Builtin::Type));
    assert_eq!(ty(&boolean(true)), builtin(Builtin::Bool));
    assert_eq!(ty(&natural(1)), nat());
    assert_eq!(ty(&double(1.5)), builtin(Builtin::Double));
    assert_eq!(ty(&text("x")), builtin(Builtin::Text));
    assert_eq!(
        ty(&builtin(Builtin::List)),
        pi("_", builtin(Builtin::Type), builtin(Builtin::Type))
    );
    assert_eq!(
        ty(&builtin(Builtin::DoubleShow)),
        pi("_", builtin(Builtin::Double), builtin(Builtin::Text))
    );
    assert_eq!(ty(&app(builtin(Builtin::List), nat())), builtin(Builtin::Type));
}

/// `None` is the polymorphic empty optional.
#[test]
fn none_builtin_type() {
    assert_eq!(
        ty(&app(builtin(Builtin::None_), nat())),
        optional_type(nat())
    );
}

/// The type of an applied `List/fold` chain comes out right.
#[test]
fn list_fold_applied_type() {
    let e = app(
        app(builtin(Builtin::ListFold), nat()),
        list(vec![natural(1)]),
    );
    let expected = pi(
        "list",
        builtin(Builtin::Type),
        pi(
            "cons",
            pi("_", nat(), pi("_", var("list"), var("list"))),
            pi("nil", var("list"), var("list")),
        ),
    );
    assert_eq!(ty(&e), expected);
}
