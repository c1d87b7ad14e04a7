use crate::span::Span;
use crate::typeck::errors::{Diagnostic, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("Hierarchy error: {msg}")]
    Hierarchy { kind: ErrorKind, msg: String, span: Span },

    #[error("Initialization error: {msg}")]
    Init { msg: String, span: Span },

    #[error("Type error: {msg}")]
    Type { msg: String, span: Span },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },

    #[error("I/O error: {msg}")]
    Io { msg: String, path: PathBuf },
}

impl CompileError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn hierarchy(kind: ErrorKind, msg: impl Into<String>, span: Span) -> Self {
        Self::Hierarchy { kind, msg: msg.into(), span }
    }

    pub fn init(msg: impl Into<String>, span: Span) -> Self {
        Self::Init { msg: msg.into(), span }
    }

    pub fn type_err(msg: impl Into<String>, span: Span) -> Self {
        Self::Type { msg: msg.into(), span }
    }

    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    pub fn io(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Io { msg: msg.into(), path }
    }

    /// The error category this failure belongs to, when it has one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CompileError::Hierarchy { kind, .. } => Some(*kind),
            CompileError::Init { .. } => Some(ErrorKind::UseBeforeInit),
            _ => None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Syntax { span, .. }
            | CompileError::Hierarchy { span, .. }
            | CompileError::Init { span, .. }
            | CompileError::Type { span, .. } => Some(*span),
            CompileError::Config { .. } | CompileError::Io { .. } => None,
        }
    }
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(source: &str, filename: &str, err: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        CompileError::Syntax { msg, span }
        | CompileError::Hierarchy { msg, span, .. }
        | CompileError::Init { msg, span }
        | CompileError::Type { msg, span } => {
            let kind_str = match err {
                CompileError::Syntax { .. } => "syntax".to_string(),
                CompileError::Hierarchy { kind, .. } => kind.to_string(),
                CompileError::Init { .. } => ErrorKind::UseBeforeInit.to_string(),
                _ => "type".to_string(),
            };
            // Whole-program failures carry no location.
            if *span == Span::dummy() {
                eprintln!("error[{kind_str}] {filename}: {msg}");
                return;
            }
            let _ = Report::build(ReportKind::Error, (), span.start)
                .with_message(format!("{kind_str} error in {filename}"))
                .with_label(Label::new(span.range()).with_message(msg))
                .finish()
                .eprint(Source::from(source));
        }
        CompileError::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        CompileError::Io { msg, path } => {
            eprintln!("error[io]: {msg}");
            eprintln!("  --> {}", path.display());
        }
    }
}

/// Render a recoverable inference diagnostic.
pub fn render_diagnostic(source: &str, filename: &str, diag: &Diagnostic) {
    use ariadne::{Label, Report, ReportKind, Source};

    let location = match &diag.method {
        Some(method) => format!("{}.{}", diag.class, method),
        None => diag.class.clone(),
    };
    let _ = Report::build(ReportKind::Error, (), diag.span.start)
        .with_code(diag.kind.to_string())
        .with_message(format!("{} ({filename}: {location})", diag.message))
        .with_label(Label::new(diag.span.range()).with_message(&diag.message))
        .finish()
        .eprint(Source::from(source));
}
