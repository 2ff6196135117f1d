use std::io::Write;

use crate::token::Token;

pub mod tree;

/// Prints one token per line as `line:column kind literal`, trivia included.
pub fn print_tokens(w: &mut impl Write, tokens: &[Token]) -> std::io::Result<()> {
    for token in tokens {
        let (span, kind) = (token.span.to_string(), token.kind.to_string());
        writeln!(w, "{span:<8}{kind:<20}{:?}", token.literal)?;
    }
    Ok(())
}
