// Error types for the template engine

use crate::span::{LineTable, Span};
use std::fmt;

/// Classification of every error the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Preprocessor,
    Parse,
    UndefinedType,
    UndefinedVariable,
    UndefinedFunction,
    UndefinedMember,
    RedefinedVariable,
    RedefinedFunction,
    RedefinedType,
    TypeMismatch,
    OutOfRangeIndex,
    GlobalInFunctionBody,
    MissingReturn,
    ReturnOutsideFunction,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    DivisionByZero,
    AssignmentToConstant,
    AssignmentToFileVariable,
    TemplateAborted,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Preprocessor => "preprocessor error",
            ErrorKind::Parse => "parse error",
            ErrorKind::UndefinedType => "undefined type",
            ErrorKind::UndefinedVariable => "undefined variable",
            ErrorKind::UndefinedFunction => "undefined function",
            ErrorKind::UndefinedMember => "undefined member",
            ErrorKind::RedefinedVariable => "variable redefined",
            ErrorKind::RedefinedFunction => "function redefined",
            ErrorKind::RedefinedType => "type redefined",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::OutOfRangeIndex => "index out of range",
            ErrorKind::GlobalInFunctionBody => "global declaration in function body",
            ErrorKind::MissingReturn => "missing return",
            ErrorKind::ReturnOutsideFunction => "return outside function",
            ErrorKind::BreakOutsideLoop => "break outside loop",
            ErrorKind::ContinueOutsideLoop => "continue outside loop",
            ErrorKind::DivisionByZero => "division by zero",
            ErrorKind::AssignmentToConstant => "assignment to constant",
            ErrorKind::AssignmentToFileVariable => "assignment to file variable",
            ErrorKind::TemplateAborted => "template aborted",
            ErrorKind::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single user-facing error type. Errors raised from template code
/// carry the original `(file, line)` resolved through the line table.
#[derive(Debug, Clone)]
pub struct TemplateError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl TemplateError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn with_location(
        kind: ErrorKind,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            file: Some(file.into()),
            line: Some(line),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => {
                write!(f, "{}:{}: {}: {}", file, line, self.kind.as_str(), self.message)
            }
            _ => write!(f, "{}: {}", self.kind.as_str(), self.message),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Internal error carrying a stream span instead of a resolved location.
/// The lexer and parser raise these; the engine resolves them against the
/// preprocessor's line table before they reach the embedder.
#[derive(Debug, Clone)]
pub(crate) struct SpannedError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl SpannedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn resolve(self, table: &LineTable) -> TemplateError {
        match table.locate(self.span.start) {
            Some(loc) => TemplateError::with_location(self.kind, self.message, loc.file, loc.line),
            None => TemplateError::new(self.kind, self.message),
        }
    }
}
