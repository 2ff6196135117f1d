use tracing::debug;

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The analyzer takes an AST, registers its declarations, resolves every name
/// against the scope stack and checks the declared types, producing the IR.
pub mod analyzer;

/// Builtin namespaces, preloaded before user code is analyzed.
pub mod stdlib;

pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod ir;
pub mod scope;
pub mod token;
pub mod types;
pub mod util;

pub use crate::{
    analyzer::Ir,
    config::{CommentStyle, Config},
    diagnostic::{Diagnostic, Fault},
};

/// The outcome of running every stage over one source text.
#[derive(Debug)]
pub struct Checked {
    /// The analyzed program. If there are diagnostics, it may be incomplete.
    pub ir: Ir,
    /// Every error, grouped by stage in pipeline order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Checked {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns the IR only if no stage reported an error.
    pub fn into_ir(self) -> Result<Ir, Vec<Diagnostic>> {
        if self.diagnostics.is_empty() {
            Ok(self.ir)
        } else {
            Err(self.diagnostics)
        }
    }
}

/// Lexes, parses and analyzes `src`.
///
/// Stages do not stop at the first error: the analyzer also runs over a
/// partially parsed program, so that a single run reports as much as possible.
pub fn check(src: &str, config: &Config) -> Result<Checked, Fault> {
    let (tokens, mut diagnostics) = lexer::lex(src, config.comment_style)?.into_parts();

    let (program, errors) = parser::parse_program(tokens)?.into_parts();
    diagnostics.extend(errors);

    let (ir, errors) = analyzer::analyze(program)?.into_parts();
    diagnostics.extend(errors);

    debug!(diagnostics = diagnostics.len(), "checked source");
    Ok(Checked { ir, diagnostics })
}
