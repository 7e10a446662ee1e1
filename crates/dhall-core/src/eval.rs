//! Beta-evaluation.
//!
//! Full normalization: subterms under binders are reduced too, and `let`
//! bindings disappear entirely. Substitution is capture-avoiding through
//! closures — a bound value carries the scope that was in effect when it was
//! bound, and is always evaluated under that snapshot rather than under the
//! scope of the occurrence. A variable bound with no value (a lambda or
//! forall parameter) is returned unchanged; a free variable likewise.
//!
//! Evaluation never fails on any input, well-typed or not, except by
//! exhausting the step budget. On ill-typed input it simply leaves redexes
//! stuck (a `merge` of a non-union rebuilds as a `merge`, and so on); the
//! type-checker is the place where those inputs are rejected.
//!
//! Record literals, record types and union types come out with their fields
//! sorted by label, so structural equality on normalized trees decides
//! equivalence.

use std::rc::Rc;

use crate::{
    alpha::alpha_eq,
    builtins,
    ctx::ShadowCtx,
    expr::{Expr, FieldMap, Label, OpKind, SubExpr, TextChunk, boolean, rc},
    resource::{EvalResult, StepCounter},
    trace::Tracer,
};

/// An expression together with the scope it must be evaluated under.
#[derive(Debug, Clone)]
pub(crate) struct Closure {
    pub expr: SubExpr,
    pub scope: Scope,
}

impl Closure {
    pub fn new(expr: SubExpr, scope: Scope) -> Self {
        Self { expr, scope }
    }

    pub fn from_expr(expr: SubExpr) -> Self {
        Self {
            expr,
            scope: Scope::new(),
        }
    }

    pub fn evaluated(&self, cx: &mut EvalCx<'_>) -> EvalResult<SubExpr> {
        eval(&self.expr, &self.scope, cx)
    }
}

/// A context entry: `Some` is a substitutable value (with its captured
/// scope), `None` marks a name as bound with no value — a lambda or forall
/// parameter, opaque during evaluation.
pub(crate) type Binding = Option<Closure>;

/// The pair of contexts threaded through evaluation and inference: `values`
/// for substitution, `types` for the typing judgments. Evaluation reads only
/// the value half. Cloning is two `Rc` bumps.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    values: Rc<ShadowCtx<Binding>>,
    types: Rc<ShadowCtx<Binding>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_value(&self, name: Label, binding: Binding) -> Self {
        Self {
            values: Rc::new(self.values.shadow(name, binding)),
            types: Rc::clone(&self.types),
        }
    }

    /// Stacks a whole context of value bindings on top of the current ones,
    /// newest innermost. Used to bind a `let` group in one step.
    pub fn bind_values(&self, bindings: &ShadowCtx<Binding>) -> Self {
        Self {
            values: Rc::new(self.values.join(bindings)),
            types: Rc::clone(&self.types),
        }
    }

    pub fn bind_type(&self, name: Label, binding: Binding) -> Self {
        Self {
            values: Rc::clone(&self.values),
            types: Rc::new(self.types.shadow(name, binding)),
        }
    }

    pub fn value(&self, name: &Label, index: usize) -> Option<&Binding> {
        self.values.get(name, index)
    }

    pub fn type_entry(&self, name: &Label, index: usize) -> Option<&Binding> {
        self.types.get(name, index)
    }
}

/// Mutable evaluation state: the step counter and the tracer, shared by
/// evaluation and inference within one engine operation.
pub(crate) struct EvalCx<'a> {
    pub steps: &'a mut StepCounter,
    pub tracer: &'a mut dyn Tracer,
}

/// Reduces `expr` to beta-normal form under `scope`.
pub(crate) fn eval(expr: &SubExpr, scope: &Scope, cx: &mut EvalCx<'_>) -> EvalResult<SubExpr> {
    cx.steps.tick()?;
    match &**expr {
        Expr::Var(name, index) => match scope.value(name, *index) {
            Some(Some(closure)) => {
                cx.tracer.on_reduce("var/substitute", expr);
                let Closure { expr: value, scope: captured } = closure.clone();
                eval(&value, &captured, cx)
            }
            // Bound with no value, or free: inert either way.
            _ => Ok(expr.clone()),
        },
        Expr::Lambda(name, param_type, body) => {
            let param_type = eval(param_type, scope, cx)?;
            let inner = scope.bind_value(name.clone(), None);
            let body = eval(body, &inner, cx)?;
            Ok(rc(Expr::Lambda(name.clone(), param_type, body)))
        }
        Expr::ForAll(name, param_type, body) => {
            let param_type = eval(param_type, scope, cx)?;
            let inner = scope.bind_value(name.clone(), None);
            let body = eval(body, &inner, cx)?;
            Ok(rc(Expr::ForAll(name.clone(), param_type, body)))
        }
        Expr::LetIn(bindings, body) => {
            // Collect the bindings into their own context, each value
            // closing over the scope extended with the bindings before it,
            // then stack the whole group onto the current scope.
            let mut let_values: ShadowCtx<Binding> = ShadowCtx::new();
            for binding in bindings {
                let seen = scope.bind_values(&let_values);
                let_values = let_values.shadow(
                    binding.name.clone(),
                    Some(Closure::new(binding.value.clone(), seen)),
                );
            }
            cx.tracer.on_reduce("let/substitute", expr);
            eval(body, &scope.bind_values(&let_values), cx)
        }
        Expr::App(func, arg) => {
            let func = eval(func, scope, cx)?;
            let arg = eval(arg, scope, cx)?;
            apply(func, arg, scope, cx)
        }
        Expr::Conditional(cond, then, else_) => {
            let cond = eval(cond, scope, cx)?;
            if let Expr::BooleanLiteral(b) = &*cond {
                cx.tracer.on_reduce("if/select", expr);
                return eval(if *b { then } else { else_ }, scope, cx);
            }
            let then = eval(then, scope, cx)?;
            let else_ = eval(else_, scope, cx)?;
            if alpha_eq(&then, &else_) {
                cx.tracer.on_reduce("if/collapse", expr);
                return Ok(then);
            }
            Ok(rc(Expr::Conditional(cond, then, else_)))
        }
        Expr::TypeAnnotation(inner, _) => {
            cx.tracer.on_reduce("annot/erase", expr);
            eval(inner, scope, cx)
        }
        // Import resolution is an earlier, external pass; by the time an
        // expression is evaluated the left alternative is authoritative.
        Expr::Op(OpKind::ImportAlt, a, _) => {
            cx.tracer.on_reduce("op/import-alt", expr);
            eval(a, scope, cx)
        }
        Expr::Op(kind, a, b) => {
            let a = eval(a, scope, cx)?;
            let b = eval(b, scope, cx)?;
            reduce_op(*kind, a, b, cx)
        }
        Expr::Merge(handlers, union, result_type) => {
            let handlers = eval(handlers, scope, cx)?;
            let union = eval(union, scope, cx)?;
            if let Expr::Union(label, value, _) = &*union {
                if let Expr::RecordLiteral(fields) = &*handlers {
                    if let Some(handler) = fields.get(label) {
                        cx.tracer.on_reduce("merge/dispatch", expr);
                        return apply(handler.clone(), value.clone(), scope, cx);
                    }
                }
            }
            let result_type = result_type
                .as_ref()
                .map(|t| eval(t, scope, cx))
                .transpose()?;
            Ok(rc(Expr::Merge(handlers, union, result_type)))
        }
        Expr::Select(inner, label) => {
            let inner = eval(inner, scope, cx)?;
            match &*inner {
                Expr::RecordLiteral(fields) => {
                    if let Some(value) = fields.get(label) {
                        cx.tracer.on_reduce("select/field", expr);
                        return Ok(value.clone());
                    }
                    Ok(rc(Expr::Select(inner.clone(), label.clone())))
                }
                // Selecting an alternative out of a union type yields the
                // constructor for that alternative.
                Expr::UnionType(alternatives) => {
                    if let Some(alt_type) = alternatives.get(label) {
                        let mut others = alternatives.clone();
                        others.shift_remove(label);
                        cx.tracer.on_reduce("select/constructor", expr);
                        return Ok(rc(Expr::Lambda(
                            Label::from("_"),
                            alt_type.clone(),
                            rc(Expr::Union(
                                label.clone(),
                                rc(Expr::Var(Label::from("_"), 0)),
                                others,
                            )),
                        )));
                    }
                    Ok(rc(Expr::Select(inner.clone(), label.clone())))
                }
                _ => Ok(rc(Expr::Select(inner, label.clone()))),
            }
        }
        Expr::Project(inner, labels) => {
            let inner = eval(inner, scope, cx)?;
            if let Expr::RecordLiteral(fields) = &*inner {
                let projected: Option<FieldMap> = labels
                    .iter()
                    .map(|l| fields.get(l).map(|v| (l.clone(), v.clone())))
                    .collect();
                if let Some(mut projected) = projected {
                    projected.sort_keys();
                    cx.tracer.on_reduce("project/record", expr);
                    return Ok(rc(Expr::RecordLiteral(projected)));
                }
            }
            Ok(rc(Expr::Project(inner, labels.clone())))
        }
        Expr::RecordLiteral(fields) => {
            let mut out = FieldMap::with_capacity(fields.len());
            for (label, value) in fields {
                out.insert(label.clone(), eval(value, scope, cx)?);
            }
            out.sort_keys();
            Ok(rc(Expr::RecordLiteral(out)))
        }
        Expr::RecordType(fields) => {
            let mut out = FieldMap::with_capacity(fields.len());
            for (label, value) in fields {
                out.insert(label.clone(), eval(value, scope, cx)?);
            }
            out.sort_keys();
            Ok(rc(Expr::RecordType(out)))
        }
        Expr::Union(label, value, alternatives) => {
            let value = eval(value, scope, cx)?;
            let mut alts = FieldMap::with_capacity(alternatives.len());
            for (alt, alt_type) in alternatives {
                alts.insert(alt.clone(), eval(alt_type, scope, cx)?);
            }
            alts.sort_keys();
            Ok(rc(Expr::Union(label.clone(), value, alts)))
        }
        Expr::UnionType(alternatives) => {
            let mut alts = FieldMap::with_capacity(alternatives.len());
            for (alt, alt_type) in alternatives {
                alts.insert(alt.clone(), eval(alt_type, scope, cx)?);
            }
            alts.sort_keys();
            Ok(rc(Expr::UnionType(alts)))
        }
        Expr::ListLiteral(items, element_type) => {
            if items.is_empty() {
                let element_type = element_type
                    .as_ref()
                    .map(|t| eval(t, scope, cx))
                    .transpose()?;
                Ok(rc(Expr::ListLiteral(Vec::new(), element_type)))
            } else {
                let items = items
                    .iter()
                    .map(|item| eval(item, scope, cx))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(rc(Expr::ListLiteral(items, None)))
            }
        }
        Expr::OptionalLiteral(wrapped) => {
            let wrapped = wrapped.as_ref().map(|w| eval(w, scope, cx)).transpose()?;
            Ok(rc(Expr::OptionalLiteral(wrapped)))
        }
        Expr::TextLiteral(chunks) => {
            let mut out: Vec<TextChunk> = Vec::new();
            for chunk in chunks {
                match chunk {
                    TextChunk::Lit(_) => push_chunk(&mut out, chunk),
                    TextChunk::Interp(inner) => {
                        let inner = eval(inner, scope, cx)?;
                        if let Expr::TextLiteral(spliced) = &*inner {
                            cx.tracer.on_reduce("text/splice", expr);
                            for c in spliced {
                                push_chunk(&mut out, c);
                            }
                        } else {
                            out.push(TextChunk::Interp(inner));
                        }
                    }
                }
            }
            Ok(finish_text(out))
        }
        Expr::NaturalLiteral(_)
        | Expr::DoubleLiteral(_)
        | Expr::BooleanLiteral(_)
        | Expr::Import(_)
        | Expr::Builtin(_) => Ok(expr.clone()),
    }
}

/// Applies an evaluated function to an evaluated argument: beta-reduction
/// for lambdas, the registry for saturated built-ins, a neutral application
/// otherwise.
pub(crate) fn apply(
    func: SubExpr,
    arg: SubExpr,
    scope: &Scope,
    cx: &mut EvalCx<'_>,
) -> EvalResult<SubExpr> {
    if let Expr::Lambda(name, _, body) = &*func {
        cx.tracer.on_reduce("app/beta", &func);
        let bound = Closure::new(arg, scope.clone());
        let inner = scope.bind_value(name.clone(), Some(bound));
        return eval(&body.clone(), &inner, cx);
    }
    let (head, mut args) = spine(&func);
    if let Expr::Builtin(tag) = &**head {
        let tag = *tag;
        args.push(arg.clone());
        if args.len() == tag.arity() {
            if let Some(reduced) = builtins::try_reduce(tag, &args, scope, cx)? {
                return Ok(reduced);
            }
        }
    }
    Ok(rc(Expr::App(func, arg)))
}

/// Flattens an application spine: `f a b c` becomes `(f, [a, b, c])`.
fn spine(expr: &SubExpr) -> (&SubExpr, Vec<SubExpr>) {
    let mut head = expr;
    let mut args = Vec::new();
    while let Expr::App(func, arg) = &**head {
        args.push(arg.clone());
        head = func;
    }
    args.reverse();
    (head, args)
}

fn reduce_op(kind: OpKind, a: SubExpr, b: SubExpr, cx: &mut EvalCx<'_>) -> EvalResult<SubExpr> {
    let reduced = match kind {
        OpKind::Plus | OpKind::Times => reduce_natural(kind, &a, &b),
        OpKind::And | OpKind::Or => reduce_boolean(kind, &a, &b),
        OpKind::Equal | OpKind::NotEqual => reduce_equality(kind, &a, &b),
        OpKind::ListAppend => reduce_list_append(&a, &b),
        OpKind::TextAppend => reduce_text_append(&a, &b),
        OpKind::Combine | OpKind::Prefer | OpKind::CombineTypes => {
            reduce_record_merge(kind, &a, &b)
        }
        OpKind::ImportAlt => None,
    };
    match reduced {
        Some(out) => {
            cx.tracer.on_reduce("op/fold", &Expr::Op(kind, a, b));
            Ok(out)
        }
        None => Ok(rc(Expr::Op(kind, a, b))),
    }
}

fn reduce_natural(kind: OpKind, a: &SubExpr, b: &SubExpr) -> Option<SubExpr> {
    let (Expr::NaturalLiteral(m), Expr::NaturalLiteral(n)) = (&**a, &**b) else {
        return None;
    };
    let value = match kind {
        OpKind::Plus => m + n,
        OpKind::Times => m * n,
        _ => return None,
    };
    Some(rc(Expr::NaturalLiteral(value)))
}

fn reduce_boolean(kind: OpKind, a: &SubExpr, b: &SubExpr) -> Option<SubExpr> {
    // `x && x → x` and `x || x → x`, up to alpha-equivalence.
    let absorbing = matches!(kind, OpKind::Or);
    if let Expr::BooleanLiteral(lit) = &**a {
        return Some(if *lit == absorbing { a.clone() } else { b.clone() });
    }
    if let Expr::BooleanLiteral(lit) = &**b {
        return Some(if *lit == absorbing { b.clone() } else { a.clone() });
    }
    if alpha_eq(a, b) {
        return Some(a.clone());
    }
    None
}

fn reduce_equality(kind: OpKind, a: &SubExpr, b: &SubExpr) -> Option<SubExpr> {
    let identity = matches!(kind, OpKind::Equal);
    if let Expr::BooleanLiteral(lit) = &**a {
        if *lit == identity {
            return Some(b.clone());
        }
    }
    if let Expr::BooleanLiteral(lit) = &**b {
        if *lit == identity {
            return Some(a.clone());
        }
    }
    if alpha_eq(a, b) {
        return Some(boolean(identity));
    }
    None
}

fn reduce_list_append(a: &SubExpr, b: &SubExpr) -> Option<SubExpr> {
    if let Expr::ListLiteral(items, _) = &**a {
        if items.is_empty() {
            return Some(b.clone());
        }
    }
    if let Expr::ListLiteral(items, _) = &**b {
        if items.is_empty() {
            return Some(a.clone());
        }
    }
    if let (Expr::ListLiteral(xs, _), Expr::ListLiteral(ys, _)) = (&**a, &**b) {
        let items = xs.iter().chain(ys).cloned().collect();
        return Some(rc(Expr::ListLiteral(items, None)));
    }
    None
}

fn reduce_text_append(a: &SubExpr, b: &SubExpr) -> Option<SubExpr> {
    if let Expr::TextLiteral(chunks) = &**a {
        if chunks.is_empty() {
            return Some(b.clone());
        }
    }
    if let Expr::TextLiteral(chunks) = &**b {
        if chunks.is_empty() {
            return Some(a.clone());
        }
    }
    let (Expr::TextLiteral(xs), Expr::TextLiteral(ys)) = (&**a, &**b) else {
        return None;
    };
    let mut out = Vec::with_capacity(xs.len() + ys.len());
    for chunk in xs.iter().chain(ys) {
        push_chunk(&mut out, chunk);
    }
    Some(finish_text(out))
}

fn reduce_record_merge(kind: OpKind, a: &SubExpr, b: &SubExpr) -> Option<SubExpr> {
    match (kind, &**a, &**b) {
        (OpKind::Combine, Expr::RecordLiteral(ma), Expr::RecordLiteral(mb)) => {
            if ma.is_empty() {
                return Some(b.clone());
            }
            if mb.is_empty() {
                return Some(a.clone());
            }
            Some(rc(Expr::RecordLiteral(merge_fields(kind, ma, mb))))
        }
        (OpKind::CombineTypes, Expr::RecordType(ma), Expr::RecordType(mb)) => {
            if ma.is_empty() {
                return Some(b.clone());
            }
            if mb.is_empty() {
                return Some(a.clone());
            }
            Some(rc(Expr::RecordType(merge_fields(kind, ma, mb))))
        }
        (OpKind::Prefer, Expr::RecordLiteral(ma), Expr::RecordLiteral(mb)) => {
            if ma.is_empty() {
                return Some(b.clone());
            }
            if mb.is_empty() {
                return Some(a.clone());
            }
            let mut out = ma.clone();
            for (label, value) in mb {
                out.insert(label.clone(), value.clone());
            }
            out.sort_keys();
            Some(rc(Expr::RecordLiteral(out)))
        }
        (OpKind::Prefer, _, _) if alpha_eq(a, b) => Some(a.clone()),
        _ => None,
    }
}

/// Recursive merge of record fields; colliding non-record values are left as
/// a stuck operator node (the type-checker rejects such inputs).
fn merge_fields(kind: OpKind, a: &FieldMap, b: &FieldMap) -> FieldMap {
    let mut out = FieldMap::with_capacity(a.len() + b.len());
    for (label, va) in a {
        let merged = match b.get(label) {
            Some(vb) => merge_values(kind, va, vb),
            None => va.clone(),
        };
        out.insert(label.clone(), merged);
    }
    for (label, vb) in b {
        if !a.contains_key(label) {
            out.insert(label.clone(), vb.clone());
        }
    }
    out.sort_keys();
    out
}

fn merge_values(kind: OpKind, a: &SubExpr, b: &SubExpr) -> SubExpr {
    match (kind, &**a, &**b) {
        (OpKind::Combine, Expr::RecordLiteral(ma), Expr::RecordLiteral(mb)) => {
            rc(Expr::RecordLiteral(merge_fields(kind, ma, mb)))
        }
        (OpKind::CombineTypes, Expr::RecordType(ma), Expr::RecordType(mb)) => {
            rc(Expr::RecordType(merge_fields(kind, ma, mb)))
        }
        _ => rc(Expr::Op(kind, a.clone(), b.clone())),
    }
}

/// Appends a chunk, dropping empty literals and merging adjacent ones.
fn push_chunk(out: &mut Vec<TextChunk>, chunk: &TextChunk) {
    match chunk {
        TextChunk::Lit(s) if s.is_empty() => {}
        TextChunk::Lit(s) => {
            if let Some(TextChunk::Lit(last)) = out.last_mut() {
                last.push_str(s);
            } else {
                out.push(TextChunk::Lit(s.clone()));
            }
        }
        TextChunk::Interp(e) => out.push(TextChunk::Interp(e.clone())),
    }
}

/// A text literal that is exactly one interpolation collapses to the
/// interpolated expression.
fn finish_text(chunks: Vec<TextChunk>) -> SubExpr {
    if chunks.len() == 1 {
        if let TextChunk::Interp(inner) = &chunks[0] {
            return inner.clone();
        }
    }
    rc(Expr::TextLiteral(chunks))
}
