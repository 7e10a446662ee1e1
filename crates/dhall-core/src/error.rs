//! Type-inference errors.
//!
//! Every failure mode of the engine surfaces as a [`TypeError`] from the
//! top-level `type_of`; nothing is recovered internally. Alpha-normalization
//! never fails, and beta-evaluation fails only by exhausting the step budget
//! ([`BudgetError`], converted into [`ErrorKind::StepBudgetExceeded`] when it
//! crosses into inference).

use std::fmt;

use crate::{
    expr::{Label, SubExpr},
    resource::BudgetError,
};

/// Result alias for type inference.
pub type TypeResult<T> = Result<T, TypeError>;

/// What went wrong.
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// A free variable reached the type-checker.
    UnboundVariable { name: Label, index: usize },
    /// An annotation (or a context requiring a specific type) does not match
    /// the inferred type.
    AnnotationMismatch { expected: SubExpr, actual: SubExpr },
    /// Application whose head is not a function.
    NotAFunction { expr: SubExpr, actual_type: SubExpr },
    /// Application whose argument has the wrong type.
    ArgumentTypeMismatch { expected: SubExpr, actual: SubExpr },
    /// `Select`/`Merge` addressed a label the record or union does not have.
    FieldMissing { label: Label, expr: SubExpr },
    /// Duplicate labels where uniqueness is required.
    DuplicateLabels { labels: Vec<Label> },
    /// `merge` handlers and union alternatives disagree on labels.
    UnionHandlersMismatch {
        union_labels: Vec<Label>,
        handler_labels: Vec<Label>,
    },
    /// The function-kind check failed, or a record type mixes universes.
    UniverseMismatch { context: String },
    /// `merge` with no handlers needs a result-type annotation.
    EmptyMergeWithoutAnnotation,
    /// An empty optional literal needs an enclosing annotation.
    EmptyOptionalWithoutAnnotation,
    /// An empty list literal reached the engine without its element type.
    EmptyListWithoutAnnotation,
    /// Field access or projection on something that is not a record.
    NotARecord { expr: SubExpr, actual_type: SubExpr },
    /// `merge` on something that is not a union.
    NotAUnion { expr: SubExpr, actual_type: SubExpr },
    /// `#` on operands that are not lists of one element type.
    NotAList { expr: SubExpr, actual_type: SubExpr },
    /// Recursive record merge hit two non-record values under one label.
    FieldCollision { label: Label },
    /// An unresolved import reached the type-checker; resolution is an
    /// external pass that must run first.
    UnresolvedImport,
    /// `Sort` has no type.
    IllKindedSort,
    /// The step budget ran out. Fatal.
    StepBudgetExceeded { limit: u64 },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundVariable { name, index: 0 } => {
                write!(f, "unbound variable `{name}`")
            }
            Self::UnboundVariable { name, index } => {
                write!(f, "unbound variable `{name}@{index}`")
            }
            Self::AnnotationMismatch { expected, actual } => write!(
                f,
                "annotation `{expected}` doesn't match expression type `{actual}`"
            ),
            Self::NotAFunction { expr, actual_type } => write!(
                f,
                "couldn't apply non-function `{expr}` of type `{actual_type}`"
            ),
            Self::ArgumentTypeMismatch { expected, actual } => write!(
                f,
                "function expects argument of type `{expected}`, but got `{actual}`"
            ),
            Self::FieldMissing { label, expr } => {
                write!(f, "`{expr}` has no field `{label}`")
            }
            Self::DuplicateLabels { labels } => {
                write!(f, "duplicate labels:")?;
                for l in labels {
                    write!(f, " `{l}`")?;
                }
                Ok(())
            }
            Self::UnionHandlersMismatch {
                union_labels,
                handler_labels,
            } => {
                write!(f, "merge handlers [")?;
                for (i, l) in handler_labels.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "`{l}`")?;
                }
                write!(f, "] don't cover union alternatives [")?;
                for (i, l) in union_labels.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "`{l}`")?;
                }
                write!(f, "]")
            }
            Self::UniverseMismatch { context } => write!(f, "{context}"),
            Self::EmptyMergeWithoutAnnotation => {
                write!(f, "empty merge expression without type annotation")
            }
            Self::EmptyOptionalWithoutAnnotation => {
                write!(f, "empty optional literal without type annotation")
            }
            Self::EmptyListWithoutAnnotation => {
                write!(f, "empty list literal without element type annotation")
            }
            Self::NotARecord { expr, actual_type } => {
                write!(f, "`{expr}` of type `{actual_type}` is not a record")
            }
            Self::NotAUnion { expr, actual_type } => {
                write!(f, "`{expr}` of type `{actual_type}` is not a union")
            }
            Self::NotAList { expr, actual_type } => {
                write!(f, "`{expr}` of type `{actual_type}` is not a list")
            }
            Self::FieldCollision { label } => {
                write!(f, "field `{label}` collides on non-record values")
            }
            Self::UnresolvedImport => {
                write!(f, "unresolved import; imports must be resolved before type-checking")
            }
            Self::IllKindedSort => {
                write!(f, "it's impossible to infer type of `Sort`")
            }
            Self::StepBudgetExceeded { limit } => {
                write!(f, "step budget exceeded: limit {limit}")
            }
        }
    }
}

/// A type-inference failure, carrying the expression that was being
/// inferred when it was raised.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub kind: ErrorKind,
    /// The offending expression; absent only for budget exhaustion, which
    /// has no single culprit.
    pub expr: Option<SubExpr>,
}

impl TypeError {
    pub(crate) fn new(kind: ErrorKind, expr: SubExpr) -> Self {
        Self {
            kind,
            expr: Some(expr),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(expr) = &self.expr {
            write!(f, "\n\twhen type-infering `{expr}`")?;
        }
        Ok(())
    }
}

impl std::error::Error for TypeError {}

impl From<BudgetError> for TypeError {
    fn from(err: BudgetError) -> Self {
        Self {
            kind: ErrorKind::StepBudgetExceeded { limit: err.limit },
            expr: None,
        }
    }
}
