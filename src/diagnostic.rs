use std::fmt;

use thiserror::Error;

use crate::token::{Span, Spanned};

/// An unrecoverable condition: the pipeline itself is broken, as opposed to the
/// program under analysis.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("cannot lex an empty source text")]
    EmptySource,
    #[error("the parser received an empty token stream")]
    EmptyTokenStream,
    #[error("{kind} `{name}` was pushed twice into scope {depth}")]
    DuplicateSymbol {
        kind: SymbolKind,
        name: Box<str>,
        depth: usize,
    },
    #[error("the global scope cannot be popped")]
    PopGlobalScope,
    #[error("standard library header for `{namespace}` is malformed: {reason}")]
    MalformedStdlib {
        namespace: Box<str>,
        reason: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Datatype,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::Datatype => "datatype",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Lexer,
    Parser,
    Analyzer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Lexer => "lexical",
            Stage::Parser => "syntax",
            Stage::Analyzer => "semantic",
        })
    }
}

/// Implemented by each stage's error enum.
pub trait ErrorCode: fmt::Display {
    const STAGE: Stage;

    /// Stable identifier of the error kind, e.g. `L001`.
    fn code(&self) -> &'static str;
}

/// The uniform error record handed to command line and editor surfaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub code: &'static str,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub span: Span,
}

impl<E: ErrorCode> From<&Spanned<E>> for Diagnostic {
    fn from(Spanned { inner, span }: &Spanned<E>) -> Self {
        Diagnostic {
            stage: E::STAGE,
            code: inner.code(),
            message: inner.to_string(),
            line: span.line,
            column: span.column,
            span: *span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} error {}: {}",
            self.line, self.column, self.stage, self.code, self.message
        )
    }
}

/// The output of a stage together with every error it accumulated.
///
/// A non-empty error list means `value` may contain placeholder nodes.
#[derive(Debug)]
pub struct Staged<T, E> {
    pub value: T,
    pub errors: Vec<Spanned<E>>,
}

impl<T, E> Staged<T, E> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Splits off the value, turning the errors into [`Diagnostic`]s.
    pub fn into_parts(self) -> (T, Vec<Diagnostic>)
    where
        E: ErrorCode,
    {
        let diagnostics = self.errors.iter().map(Diagnostic::from).collect();
        (self.value, diagnostics)
    }
}

/// Formats errors as `line:column: message`, the shape used throughout tests.
#[cfg(test)]
pub(crate) fn format_errors<E: fmt::Display>(errors: &[Spanned<E>]) -> Vec<String> {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.span, e.inner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CommentStyle, lexer};

    #[test]
    fn test_into_parts_converts_every_error() {
        let lexed = lexer::lex("int x = -. \"open", CommentStyle::MarkerRun).unwrap();
        let (tokens, diagnostics) = lexed.into_parts();
        assert!(tokens.last().unwrap().is_eof());

        let codes: Vec<_> = diagnostics.iter().map(|d| (d.stage, d.code)).collect();
        assert_eq!(codes, [(Stage::Lexer, "L002"), (Stage::Lexer, "L001")]);
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 8));
    }
}
