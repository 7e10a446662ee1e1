//! End-to-end normalization behavior: `normalize(e) = α(β(e))`.
//!
//! Normalized output always carries `_` binder names; tests that inspect
//! binders therefore compare against `_`-named expectations.

use dhall_core::{Builtin, OpKind, TextChunk, expr::*, normalize};
use pretty_assertions::assert_eq;

fn norm(e: &SubExpr) -> SubExpr {
    normalize(e).unwrap()
}

// =============================================================================
// 1. Core reduction: application, let, if, annotation
// =============================================================================

/// `(λ(x : Natural) → x + 1) 41` reduces to `42`.
#[test]
fn beta_reduction_with_operator() {
    let e = app(
        lam(
            "x",
            builtin(Builtin::Natural),
            op(OpKind::Plus, var("x"), natural(1)),
        ),
        natural(41),
    );
    assert_eq!(norm(&e), natural(42));
}

/// `if True then "y" else "n"` selects the then-branch.
#[test]
fn conditional_selects_on_literal() {
    let e = if_then_else(boolean(true), text("y"), text("n"));
    assert_eq!(norm(&e), text("y"));
}

/// A conditional with alpha-equal branches collapses even when the
/// condition is abstract.
#[test]
fn conditional_collapses_equal_branches() {
    let e = if_then_else(var("p"), natural(1), natural(1));
    assert_eq!(norm(&e), natural(1));
}

/// A stuck conditional rebuilds with evaluated arguments.
#[test]
fn conditional_stuck_on_abstract_condition() {
    let e = if_then_else(var("p"), natural(1), op(OpKind::Plus, natural(1), natural(1)));
    assert_eq!(norm(&e), if_then_else(var("p"), natural(1), natural(2)));
}

/// Let bindings substitute and disappear; later bindings see earlier ones.
#[test]
fn let_bindings_substitute_sequentially() {
    let e = let_in(
        vec![
            let_binding("x", None, natural(2)),
            let_binding("y", None, op(OpKind::Times, var("x"), natural(3))),
        ],
        op(OpKind::Plus, var("x"), var("y")),
    );
    assert_eq!(norm(&e), natural(8));
}

/// A shadowing let binding refers to the outer one in its own value.
#[test]
fn let_shadowing_resolves_to_outer_value() {
    let e = let_in(
        vec![
            let_binding("x", None, natural(1)),
            let_binding("x", None, op(OpKind::Plus, var("x"), natural(1))),
        ],
        var("x"),
    );
    assert_eq!(norm(&e), natural(2));
}

/// Type annotations erase under evaluation.
#[test]
fn annotation_erases() {
    let e = annot(natural(5), builtin(Builtin::Natural));
    assert_eq!(norm(&e), natural(5));
}

/// Substitution is capture-avoiding: a bound value is evaluated under the
/// scope captured when it was bound, so a later binding of the same name
/// cannot capture it.
#[test]
fn closures_prevent_value_capture() {
    // let x = 1 let f = λ(y : Natural) → x let x = 2 in f 0
    // Dynamic scoping would yield 2; the captured scope yields 1.
    let e = let_in(
        vec![
            let_binding("x", None, natural(1)),
            let_binding("f", None, lam("y", builtin(Builtin::Natural), var("x"))),
            let_binding("x", None, natural(2)),
        ],
        app(var("f"), natural(0)),
    );
    assert_eq!(norm(&e), natural(1));
}

// =============================================================================
// 2. Operators
// =============================================================================

#[test]
fn natural_arithmetic_folds() {
    assert_eq!(norm(&op(OpKind::Plus, natural(40), natural(2))), natural(42));
    assert_eq!(norm(&op(OpKind::Times, natural(6), natural(7))), natural(42));
}

/// Boolean operators apply literal, absorption and idempotence laws.
#[test]
fn boolean_laws() {
    assert_eq!(norm(&op(OpKind::Or, boolean(true), var("p"))), boolean(true));
    assert_eq!(norm(&op(OpKind::Or, boolean(false), var("p"))), var("p"));
    assert_eq!(norm(&op(OpKind::Or, var("p"), boolean(true))), boolean(true));
    assert_eq!(norm(&op(OpKind::And, boolean(true), var("p"))), var("p"));
    assert_eq!(norm(&op(OpKind::And, var("p"), boolean(false))), boolean(false));
    // x && x → x, up to alpha-equivalence
    assert_eq!(norm(&op(OpKind::And, var("p"), var("p"))), var("p"));
}

#[test]
fn equality_operators_fold() {
    assert_eq!(norm(&op(OpKind::Equal, boolean(true), var("p"))), var("p"));
    assert_eq!(norm(&op(OpKind::NotEqual, boolean(false), var("p"))), var("p"));
    assert_eq!(norm(&op(OpKind::Equal, var("p"), var("p"))), boolean(true));
    assert_eq!(
        norm(&op(OpKind::Equal, boolean(false), boolean(false))),
        boolean(true)
    );
}

#[test]
fn list_append_concatenates_literals() {
    let e = op(
        OpKind::ListAppend,
        list(vec![natural(1)]),
        list(vec![natural(2), natural(3)]),
    );
    assert_eq!(norm(&e), list(vec![natural(1), natural(2), natural(3)]));
}

/// Appending an empty literal is the identity on either side, even when the
/// other side is abstract.
#[test]
fn list_append_empty_identity() {
    let empty = empty_list(builtin(Builtin::Natural));
    assert_eq!(norm(&op(OpKind::ListAppend, empty.clone(), var("xs"))), var("xs"));
    assert_eq!(norm(&op(OpKind::ListAppend, var("xs"), empty)), var("xs"));
}

#[test]
fn text_append_merges_chunks() {
    let e = op(OpKind::TextAppend, text("foo"), text("bar"));
    assert_eq!(norm(&e), text("foobar"));
}

/// `∧` merges records recursively.
#[test]
fn combine_merges_recursively() {
    let a = record_lit([("top", record_lit([("left", natural(1))]))]);
    let b = record_lit([("top", record_lit([("right", natural(2))]))]);
    let expected = record_lit([(
        "top",
        record_lit([("left", natural(1)), ("right", natural(2))]),
    )]);
    assert_eq!(norm(&op(OpKind::Combine, a, b)), norm(&expected));
}

/// `⫽` is right-biased and does not recurse.
#[test]
fn prefer_is_right_biased() {
    let a = record_lit([("x", natural(1)), ("y", natural(2))]);
    let b = record_lit([("x", natural(9))]);
    let expected = record_lit([("x", natural(9)), ("y", natural(2))]);
    assert_eq!(norm(&op(OpKind::Prefer, a, b)), norm(&expected));
}

/// `⩓` merges record types recursively.
#[test]
fn combine_types_merges_record_types() {
    let a = record_type([("x", builtin(Builtin::Natural))]);
    let b = record_type([("y", builtin(Builtin::Bool))]);
    let expected = record_type([("x", builtin(Builtin::Natural)), ("y", builtin(Builtin::Bool))]);
    assert_eq!(norm(&op(OpKind::CombineTypes, a, b)), norm(&expected));
}

/// `?` resolves to its left alternative; imports were resolved earlier.
#[test]
fn import_alt_keeps_left() {
    let e = op(OpKind::ImportAlt, natural(1), import("./fallback.dhall"));
    assert_eq!(norm(&e), natural(1));
}

// =============================================================================
// 3. Records, unions, projections
// =============================================================================

/// Record fields come out sorted by label: field order never matters.
#[test]
fn record_fields_canonically_sorted() {
    let a = record_lit([("b", natural(2)), ("a", natural(1))]);
    let b = record_lit([("a", natural(1)), ("b", natural(2))]);
    assert_eq!(norm(&a), norm(&b));
    assert_eq!(norm(&a).to_string(), "{ a = 1, b = 2 }");
}

#[test]
fn union_alternatives_canonically_sorted() {
    let t = union_type([("R", builtin(Builtin::Bool)), ("L", builtin(Builtin::Natural))]);
    assert_eq!(norm(&t).to_string(), "< L : Natural | R : Bool >");
}

#[test]
fn select_projects_record_field() {
    let e = select(record_lit([("a", natural(1)), ("b", natural(2))]), "b");
    assert_eq!(norm(&e), natural(2));
}

/// Selecting an alternative from a union type yields its constructor, and
/// applying the constructor builds the union value.
#[test]
fn select_on_union_type_yields_constructor() {
    let ut = union_type([("L", builtin(Builtin::Natural)), ("R", builtin(Builtin::Bool))]);
    let constructor = norm(&select(ut.clone(), "L"));
    let expected = lam(
        "_",
        builtin(Builtin::Natural),
        union_lit("L", var("_"), [("R", builtin(Builtin::Bool))]),
    );
    assert_eq!(constructor, expected);

    let applied = norm(&app(select(ut, "L"), natural(3)));
    assert_eq!(
        applied,
        union_lit("L", natural(3), [("R", builtin(Builtin::Bool))])
    );
}

#[test]
fn project_builds_sub_record() {
    let e = project(
        record_lit([("a", natural(1)), ("b", natural(2)), ("c", natural(3))]),
        &["c", "a"],
    );
    assert_eq!(norm(&e), norm(&record_lit([("a", natural(1)), ("c", natural(3))])));
}

// =============================================================================
// 4. Merge
// =============================================================================

/// Merge dispatches through a union constructor to the matching handler.
#[test]
fn merge_dispatches_matching_handler() {
    let handlers = record_lit([
        ("Left", lam("x", builtin(Builtin::Natural), var("x"))),
        (
            "Right",
            lam(
                "x",
                builtin(Builtin::Natural),
                op(OpKind::Times, var("x"), natural(2)),
            ),
        ),
    ]);
    let ut = union_type([
        ("Left", builtin(Builtin::Natural)),
        ("Right", builtin(Builtin::Natural)),
    ]);
    let e = merge(handlers, app(select(ut, "Right"), natural(3)), None);
    assert_eq!(norm(&e), natural(6));
}

/// Merge of an abstract union rebuilds with evaluated parts.
#[test]
fn merge_stuck_on_abstract_union() {
    let handlers = record_lit([("L", lam("x", builtin(Builtin::Natural), var("x")))]);
    let e = merge(handlers.clone(), var("u"), None);
    assert_eq!(
        norm(&e),
        merge(
            record_lit([("L", lam("_", builtin(Builtin::Natural), var("_")))]),
            var("u"),
            None
        )
    );
}

// =============================================================================
// 5. Text interpolation
// =============================================================================

/// Interpolations that evaluate to text splice into the surrounding chunks.
#[test]
fn text_interpolation_splices() {
    let e = let_in(
        vec![let_binding("x", None, text("b"))],
        text_chunks(vec![
            TextChunk::Lit("a".to_owned()),
            TextChunk::Interp(var("x")),
            TextChunk::Lit("c".to_owned()),
        ]),
    );
    assert_eq!(norm(&e), text("abc"));
}

/// A literal that is exactly one abstract interpolation unwraps.
#[test]
fn text_single_interpolation_unwraps() {
    let e = text_chunks(vec![TextChunk::Interp(var("x"))]);
    assert_eq!(norm(&e), var("x"));
}

// =============================================================================
// 6. Built-ins
// =============================================================================

#[test]
fn double_show_renders_canonical_form() {
    let e = app(builtin(Builtin::DoubleShow), double(3.5));
    assert_eq!(norm(&e), text("3.5"));
}

/// `List/fold` performs the canonical right fold on a literal list.
#[test]
fn list_fold_folds_right() {
    let cons = lam(
        "x",
        builtin(Builtin::Natural),
        lam(
            "acc",
            builtin(Builtin::Natural),
            op(OpKind::Plus, var("x"), var("acc")),
        ),
    );
    let e = app(
        app(
            app(
                app(
                    app(builtin(Builtin::ListFold), builtin(Builtin::Natural)),
                    list(vec![natural(1), natural(2), natural(3)]),
                ),
                builtin(Builtin::Natural),
            ),
            cons,
        ),
        natural(0),
    );
    assert_eq!(norm(&e), natural(6));
}

/// `List/build` applies its builder to the real cons and nil.
#[test]
fn list_build_constructs_literal() {
    // λ(list : Type) → λ(cons : Natural → list → list) → λ(nil : list) →
    //   cons 1 (cons 2 nil)
    let builder = lam(
        "list",
        builtin(Builtin::Type),
        lam(
            "cons",
            pi(
                "_",
                builtin(Builtin::Natural),
                pi("_", var("list"), var("list")),
            ),
            lam(
                "nil",
                var("list"),
                app(
                    app(var("cons"), natural(1)),
                    app(app(var("cons"), natural(2)), var("nil")),
                ),
            ),
        ),
    );
    let e = app(app(builtin(Builtin::ListBuild), builtin(Builtin::Natural)), builder);
    assert_eq!(norm(&e), list(vec![natural(1), natural(2)]));
}

/// `List/build a (List/fold a xs)` fuses to `xs`.
#[test]
fn build_fold_fusion() {
    let fold_xs = app(
        app(builtin(Builtin::ListFold), builtin(Builtin::Natural)),
        var("xs"),
    );
    let e = app(
        app(builtin(Builtin::ListBuild), builtin(Builtin::Natural)),
        fold_xs,
    );
    assert_eq!(norm(&e), var("xs"));
}

/// `None T` and `List T` are their own normal forms.
#[test]
fn inert_builtin_applications() {
    let none_nat = app(builtin(Builtin::None_), builtin(Builtin::Natural));
    assert_eq!(norm(&none_nat), none_nat);
    let list_nat = app(builtin(Builtin::List), builtin(Builtin::Natural));
    assert_eq!(norm(&list_nat), list_nat);
}

/// Unresolved imports pass through evaluation untouched.
#[test]
fn imports_are_inert() {
    let e = import("https://example.com/a.dhall");
    assert_eq!(norm(&e), e);
}
