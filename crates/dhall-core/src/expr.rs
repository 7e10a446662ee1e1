//! The Dhall expression AST.
//!
//! One closed sum over every expression form the engine understands. Values
//! are immutable: subexpressions are reference-counted ([`SubExpr`]) and
//! every pass (alpha-normalization, beta-evaluation, substitution, type
//! inference) produces new trees instead of mutating existing ones.
//!
//! The external parser is expected to produce values of this type through
//! the constructor helpers at the bottom of this module, upholding the
//! structural invariants (unique record/union labels, annotated empty
//! lists). The engine re-checks the invariants that matter at typing time
//! but never panics on a malformed tree.

use std::{borrow::Borrow, fmt, rc::Rc};

use indexmap::IndexMap;
use num_bigint::BigUint;
use strum::{Display, EnumString, IntoStaticStr};

use crate::builtins::Builtin;

/// A reference-counted subexpression.
pub type SubExpr = Rc<Expr>;

/// Ordered label → expression map for records and unions.
///
/// Insertion order is preserved (source order until evaluation sorts
/// canonically) and equality is order-insensitive, which matches Dhall's
/// records-are-sets semantics.
pub type FieldMap = IndexMap<Label, SubExpr>;

/// The canonical replacement name bound variables get during
/// alpha-normalization.
pub const PLACEHOLDER: &str = "_";

/// A variable name or record/union label.
///
/// Cheap to clone; compares, orders and hashes as its string content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(Rc<str>);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(Rc::from(s))
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(Rc::from(s.as_str()))
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Double with bitwise equality, so `NaN == NaN` and `-0.0 != 0.0`.
#[derive(Debug, Copy, Clone)]
pub struct NaiveDouble(f64);

impl NaiveDouble {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for NaiveDouble {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for NaiveDouble {}

impl From<f64> for NaiveDouble {
    fn from(x: f64) -> Self {
        Self(x)
    }
}

impl From<NaiveDouble> for f64 {
    fn from(x: NaiveDouble) -> f64 {
        x.0
    }
}

impl fmt::Display for NaiveDouble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ryu::Buffer::new().format(self.0))
    }
}

/// One segment of a text literal: literal characters or an interpolated
/// expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextChunk {
    Lit(String),
    Interp(SubExpr),
}

/// Binary operators.
///
/// The strum serialization is the Dhall surface token, used by `Display`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum OpKind {
    /// `x || y`
    #[strum(serialize = "||")]
    Or,
    /// `x + y`
    #[strum(serialize = "+")]
    Plus,
    /// `x ++ y`
    #[strum(serialize = "++")]
    TextAppend,
    /// `x # y`
    #[strum(serialize = "#")]
    ListAppend,
    /// `x && y`
    #[strum(serialize = "&&")]
    And,
    /// `x ∧ y` — recursive record merge
    #[strum(serialize = "∧")]
    Combine,
    /// `x ⫽ y` — right-biased record merge
    #[strum(serialize = "⫽")]
    Prefer,
    /// `x ⩓ y` — recursive record *type* merge
    #[strum(serialize = "⩓")]
    CombineTypes,
    /// `x * y`
    #[strum(serialize = "*")]
    Times,
    /// `x == y`
    #[strum(serialize = "==")]
    Equal,
    /// `x != y`
    #[strum(serialize = "!=")]
    NotEqual,
    /// `x ? y` — import alternative
    #[strum(serialize = "?")]
    ImportAlt,
}

/// Constants of the universe tower `Type : Kind : Sort`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum Const {
    Type,
    Kind,
    Sort,
}

impl From<Const> for Builtin {
    fn from(c: Const) -> Self {
        match c {
            Const::Type => Self::Type,
            Const::Kind => Self::Kind,
            Const::Sort => Self::Sort,
        }
    }
}

/// One `let name : annotation = value` binding. The annotation is optional;
/// later bindings in the same `let` see all earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetBinding {
    pub name: Label,
    pub annotation: Option<SubExpr>,
    pub value: SubExpr,
}

/// An unresolved import. Import resolution is an external pass that runs
/// before this engine; the source is opaque here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource(pub String);

/// A Dhall expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A variable occurrence `name@index`; index 0 is the innermost
    /// enclosing binder of that name.
    Var(Label, usize),
    /// `λ(x : A) → b`
    Lambda(Label, SubExpr, SubExpr),
    /// `∀(x : A) → B` — dependent function type.
    ForAll(Label, SubExpr, SubExpr),
    /// `let x = v let y = w in b` — sequential bindings.
    LetIn(Vec<LetBinding>, SubExpr),
    /// `f a`
    App(SubExpr, SubExpr),
    /// `if c then t else e`
    Conditional(SubExpr, SubExpr, SubExpr),
    /// `e : T`
    TypeAnnotation(SubExpr, SubExpr),
    /// `a <op> b`
    Op(OpKind, SubExpr, SubExpr),
    /// `merge handlers union : T`
    Merge(SubExpr, SubExpr, Option<SubExpr>),
    /// `e.label`
    Select(SubExpr, Label),
    /// `e.{ a, b }`
    Project(SubExpr, Vec<Label>),
    /// `{ a = 1, b = 2 }`
    RecordLiteral(FieldMap),
    /// `{ a : Natural, b : Bool }`
    RecordType(FieldMap),
    /// `< label = value | alt : T | … >` — an inhabited union.
    Union(Label, SubExpr, FieldMap),
    /// `< alt : T | … >`
    UnionType(FieldMap),
    /// `[x, y]`, or `[] : List T` (the element type is present iff the
    /// literal is empty).
    ListLiteral(Vec<SubExpr>, Option<SubExpr>),
    /// `Some x`, or an empty optional (which only types inside an
    /// annotation).
    OptionalLiteral(Option<SubExpr>),
    NaturalLiteral(BigUint),
    DoubleLiteral(NaiveDouble),
    /// Text with interpolation: `"a${x}b"`.
    TextLiteral(Vec<TextChunk>),
    BooleanLiteral(bool),
    /// An unresolved import; inert here, rejected by the type-checker.
    Import(ImportSource),
    Builtin(Builtin),
}

impl Expr {
    /// If this expression is a universe constant, which one.
    pub fn as_const(&self) -> Option<Const> {
        match self {
            Self::Builtin(Builtin::Type) => Some(Const::Type),
            Self::Builtin(Builtin::Kind) => Some(Const::Kind),
            Self::Builtin(Builtin::Sort) => Some(Const::Sort),
            _ => None,
        }
    }

    /// Rebuilds this node with `f` applied to every direct subexpression.
    ///
    /// Purely structural: binders are not tracked, so passes that care about
    /// scope (alpha-normalization, substitution) must handle the binding
    /// variants themselves and use this only for the rest.
    pub fn map_subexprs(&self, mut f: impl FnMut(&SubExpr) -> SubExpr) -> Self {
        match self {
            Self::Var(..)
            | Self::NaturalLiteral(_)
            | Self::DoubleLiteral(_)
            | Self::BooleanLiteral(_)
            | Self::Import(_)
            | Self::Builtin(_) => self.clone(),
            Self::Lambda(x, t, b) => Self::Lambda(x.clone(), f(t), f(b)),
            Self::ForAll(x, t, b) => Self::ForAll(x.clone(), f(t), f(b)),
            Self::LetIn(bindings, body) => Self::LetIn(
                bindings
                    .iter()
                    .map(|b| LetBinding {
                        name: b.name.clone(),
                        annotation: b.annotation.as_ref().map(&mut f),
                        value: f(&b.value),
                    })
                    .collect(),
                f(body),
            ),
            Self::App(a, b) => Self::App(f(a), f(b)),
            Self::Conditional(c, t, e) => Self::Conditional(f(c), f(t), f(e)),
            Self::TypeAnnotation(e, t) => Self::TypeAnnotation(f(e), f(t)),
            Self::Op(kind, a, b) => Self::Op(*kind, f(a), f(b)),
            Self::Merge(h, u, t) => Self::Merge(f(h), f(u), t.as_ref().map(&mut f)),
            Self::Select(e, l) => Self::Select(f(e), l.clone()),
            Self::Project(e, labels) => Self::Project(f(e), labels.clone()),
            Self::RecordLiteral(fields) => {
                Self::RecordLiteral(fields.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            }
            Self::RecordType(fields) => {
                Self::RecordType(fields.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            }
            Self::Union(label, value, alts) => Self::Union(
                label.clone(),
                f(value),
                alts.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
            ),
            Self::UnionType(alts) => {
                Self::UnionType(alts.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            }
            Self::ListLiteral(items, t) => {
                Self::ListLiteral(items.iter().map(&mut f).collect(), t.as_ref().map(&mut f))
            }
            Self::OptionalLiteral(wrapped) => Self::OptionalLiteral(wrapped.as_ref().map(&mut f)),
            Self::TextLiteral(chunks) => Self::TextLiteral(
                chunks
                    .iter()
                    .map(|c| match c {
                        TextChunk::Lit(s) => TextChunk::Lit(s.clone()),
                        TextChunk::Interp(e) => TextChunk::Interp(f(e)),
                    })
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name, 0) => write!(f, "{name}"),
            Self::Var(name, index) => write!(f, "{name}@{index}"),
            Self::Lambda(x, t, b) => write!(f, "λ({x} : {t}) → {b}"),
            Self::ForAll(x, t, b) => write!(f, "∀({x} : {t}) → {b}"),
            Self::LetIn(bindings, body) => {
                for b in bindings {
                    match &b.annotation {
                        Some(t) => write!(f, "let {} : {} = {} ", b.name, t, b.value)?,
                        None => write!(f, "let {} = {} ", b.name, b.value)?,
                    }
                }
                write!(f, "in {body}")
            }
            Self::App(a, b) => write!(f, "({a} {b})"),
            Self::Conditional(c, t, e) => write!(f, "if {c} then {t} else {e}"),
            Self::TypeAnnotation(e, t) => write!(f, "{e} : {t}"),
            Self::Op(kind, a, b) => write!(f, "({a} {kind} {b})"),
            Self::Merge(h, u, None) => write!(f, "merge {h} {u}"),
            Self::Merge(h, u, Some(t)) => write!(f, "merge {h} {u} : {t}"),
            Self::Select(e, l) => write!(f, "{e}.{l}"),
            Self::Project(e, labels) => {
                write!(f, "{e}.{{ ")?;
                for (i, l) in labels.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{l}")?;
                }
                write!(f, " }}")
            }
            Self::RecordLiteral(fields) if fields.is_empty() => write!(f, "{{=}}"),
            Self::RecordLiteral(fields) => {
                write!(f, "{{ ")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                write!(f, " }}")
            }
            Self::RecordType(fields) if fields.is_empty() => write!(f, "{{}}"),
            Self::RecordType(fields) => {
                write!(f, "{{ ")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} : {v}")?;
                }
                write!(f, " }}")
            }
            Self::Union(label, value, alts) => {
                write!(f, "< {label} = {value}")?;
                for (k, v) in alts {
                    write!(f, " | {k} : {v}")?;
                }
                write!(f, " >")
            }
            Self::UnionType(alts) if alts.is_empty() => write!(f, "<>"),
            Self::UnionType(alts) => {
                write!(f, "< ")?;
                for (i, (k, v)) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{k} : {v}")?;
                }
                write!(f, " >")
            }
            Self::ListLiteral(items, element_type) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")?;
                if let Some(t) = element_type {
                    write!(f, " : List {t}")?;
                }
                Ok(())
            }
            Self::OptionalLiteral(Some(x)) => write!(f, "Some {x}"),
            Self::OptionalLiteral(None) => write!(f, "None"),
            Self::NaturalLiteral(n) => write!(f, "{n}"),
            Self::DoubleLiteral(d) => write!(f, "{d}"),
            Self::TextLiteral(chunks) => {
                write!(f, "\"")?;
                for chunk in chunks {
                    match chunk {
                        TextChunk::Lit(s) => {
                            for c in s.chars() {
                                match c {
                                    '"' => write!(f, "\\\"")?,
                                    '\\' => write!(f, "\\\\")?,
                                    '\n' => write!(f, "\\n")?,
                                    _ => write!(f, "{c}")?,
                                }
                            }
                        }
                        TextChunk::Interp(e) => write!(f, "${{{e}}}")?,
                    }
                }
                write!(f, "\"")
            }
            Self::BooleanLiteral(true) => write!(f, "True"),
            Self::BooleanLiteral(false) => write!(f, "False"),
            Self::Import(ImportSource(source)) => write!(f, "{source}"),
            Self::Builtin(b) => write!(f, "{b}"),
        }
    }
}

// Constructor helpers. The external parser produces AST values through
// these; tests and embedders use them directly.

pub fn rc(e: Expr) -> SubExpr {
    Rc::new(e)
}

pub fn var(name: &str) -> SubExpr {
    rc(Expr::Var(Label::from(name), 0))
}

pub fn var_at(name: &str, index: usize) -> SubExpr {
    rc(Expr::Var(Label::from(name), index))
}

pub fn lam(name: &str, param_type: SubExpr, body: SubExpr) -> SubExpr {
    rc(Expr::Lambda(Label::from(name), param_type, body))
}

pub fn pi(name: &str, param_type: SubExpr, body: SubExpr) -> SubExpr {
    rc(Expr::ForAll(Label::from(name), param_type, body))
}

pub fn let_binding(name: &str, annotation: Option<SubExpr>, value: SubExpr) -> LetBinding {
    LetBinding {
        name: Label::from(name),
        annotation,
        value,
    }
}

pub fn let_in(bindings: Vec<LetBinding>, body: SubExpr) -> SubExpr {
    rc(Expr::LetIn(bindings, body))
}

pub fn app(func: SubExpr, arg: SubExpr) -> SubExpr {
    rc(Expr::App(func, arg))
}

pub fn if_then_else(cond: SubExpr, then: SubExpr, else_: SubExpr) -> SubExpr {
    rc(Expr::Conditional(cond, then, else_))
}

pub fn annot(expr: SubExpr, annotation: SubExpr) -> SubExpr {
    rc(Expr::TypeAnnotation(expr, annotation))
}

pub fn op(kind: OpKind, a: SubExpr, b: SubExpr) -> SubExpr {
    rc(Expr::Op(kind, a, b))
}

pub fn merge(handlers: SubExpr, union: SubExpr, result_type: Option<SubExpr>) -> SubExpr {
    rc(Expr::Merge(handlers, union, result_type))
}

pub fn select(expr: SubExpr, label: &str) -> SubExpr {
    rc(Expr::Select(expr, Label::from(label)))
}

pub fn project(expr: SubExpr, labels: &[&str]) -> SubExpr {
    rc(Expr::Project(
        expr,
        labels.iter().copied().map(Label::from).collect(),
    ))
}

pub fn record_lit<'a>(fields: impl IntoIterator<Item = (&'a str, SubExpr)>) -> SubExpr {
    rc(Expr::RecordLiteral(
        fields
            .into_iter()
            .map(|(k, v)| (Label::from(k), v))
            .collect(),
    ))
}

pub fn record_type<'a>(fields: impl IntoIterator<Item = (&'a str, SubExpr)>) -> SubExpr {
    rc(Expr::RecordType(
        fields
            .into_iter()
            .map(|(k, v)| (Label::from(k), v))
            .collect(),
    ))
}

pub fn union_lit<'a>(
    label: &str,
    value: SubExpr,
    alternatives: impl IntoIterator<Item = (&'a str, SubExpr)>,
) -> SubExpr {
    rc(Expr::Union(
        Label::from(label),
        value,
        alternatives
            .into_iter()
            .map(|(k, v)| (Label::from(k), v))
            .collect(),
    ))
}

pub fn union_type<'a>(alternatives: impl IntoIterator<Item = (&'a str, SubExpr)>) -> SubExpr {
    rc(Expr::UnionType(
        alternatives
            .into_iter()
            .map(|(k, v)| (Label::from(k), v))
            .collect(),
    ))
}

pub fn list(items: Vec<SubExpr>) -> SubExpr {
    rc(Expr::ListLiteral(items, None))
}

pub fn empty_list(element_type: SubExpr) -> SubExpr {
    rc(Expr::ListLiteral(Vec::new(), Some(element_type)))
}

pub fn optional_some(wrapped: SubExpr) -> SubExpr {
    rc(Expr::OptionalLiteral(Some(wrapped)))
}

pub fn optional_none() -> SubExpr {
    rc(Expr::OptionalLiteral(None))
}

pub fn natural(n: u64) -> SubExpr {
    rc(Expr::NaturalLiteral(BigUint::from(n)))
}

pub fn double(x: f64) -> SubExpr {
    rc(Expr::DoubleLiteral(NaiveDouble::from(x)))
}

pub fn text(s: &str) -> SubExpr {
    if s.is_empty() {
        rc(Expr::TextLiteral(Vec::new()))
    } else {
        rc(Expr::TextLiteral(vec![TextChunk::Lit(s.to_owned())]))
    }
}

pub fn text_chunks(chunks: Vec<TextChunk>) -> SubExpr {
    rc(Expr::TextLiteral(chunks))
}

pub fn boolean(b: bool) -> SubExpr {
    rc(Expr::BooleanLiteral(b))
}

pub fn builtin(b: Builtin) -> SubExpr {
    rc(Expr::Builtin(b))
}

pub fn import(source: &str) -> SubExpr {
    rc(Expr::Import(ImportSource(source.to_owned())))
}

/// `List T` as the inert application of the `List` builtin.
pub fn list_type(element_type: SubExpr) -> SubExpr {
    app(builtin(Builtin::List), element_type)
}

/// `Optional T` as the inert application of the `Optional` builtin.
pub fn optional_type(wrapped: SubExpr) -> SubExpr {
    app(builtin(Builtin::Optional), wrapped)
}
