use std::fmt;

use serde::Serialize;

use crate::span::Span;
use super::env::Ctx;

/// Every category of semantic problem the checker can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    // Structural
    UndefinedSuperclass,
    CyclicHierarchy,
    DuplicateClass,
    // Initialization
    UseBeforeInit,
    // Inference-time
    AssignmentSubtypeViolation,
    ArgumentCountMismatch,
    ArgumentSubtypeViolation,
    MethodNotFound,
    FieldNotFound,
    ReturnSubtypeViolation,
    ConditionNotBoolean,
    UnknownType,
    UnknownVariable,
    // Post-hoc structural
    MissingInheritedField,
    DuplicateMethod,
    InvalidOverride,
}

impl ErrorKind {
    /// Fatal kinds stop the pipeline instead of being collected.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::UndefinedSuperclass
                | ErrorKind::CyclicHierarchy
                | ErrorKind::DuplicateClass
                | ErrorKind::UseBeforeInit
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UndefinedSuperclass => "UndefinedSuperclass",
            ErrorKind::CyclicHierarchy => "CyclicHierarchy",
            ErrorKind::DuplicateClass => "DuplicateClass",
            ErrorKind::UseBeforeInit => "UseBeforeInit",
            ErrorKind::AssignmentSubtypeViolation => "AssignmentSubtypeViolation",
            ErrorKind::ArgumentCountMismatch => "ArgumentCountMismatch",
            ErrorKind::ArgumentSubtypeViolation => "ArgumentSubtypeViolation",
            ErrorKind::MethodNotFound => "MethodNotFound",
            ErrorKind::FieldNotFound => "FieldNotFound",
            ErrorKind::ReturnSubtypeViolation => "ReturnSubtypeViolation",
            ErrorKind::ConditionNotBoolean => "ConditionNotBoolean",
            ErrorKind::UnknownType => "UnknownType",
            ErrorKind::UnknownVariable => "UnknownVariable",
            ErrorKind::MissingInheritedField => "MissingInheritedField",
            ErrorKind::DuplicateMethod => "DuplicateMethod",
            ErrorKind::InvalidOverride => "InvalidOverride",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem found while building the hierarchy or inferring
/// types. Collected, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip)]
    pub span: Span,
    pub class: String,
    /// `None` for constructor bodies and top-level statements.
    pub method: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span, ctx: &Ctx) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            class: ctx.class.clone(),
            method: ctx.method.clone(),
        }
    }

    /// A diagnostic attached to a class as a whole.
    pub fn in_class(kind: ErrorKind, message: impl Into<String>, span: Span, class: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            class: class.to_string(),
            method: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "[{}] {}.{}: {}", self.kind, self.class, method, self.message),
            None => write!(f, "[{}] {}: {}", self.kind, self.class, self.message),
        }
    }
}
