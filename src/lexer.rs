use thiserror::Error;
use tracing::debug;

use crate::{
    config::CommentStyle,
    diagnostic::{ErrorCode, Fault, Stage, Staged},
    token::{Span, Spanned, Token, TokenKind, KEYWORDS},
    util::IterExt,
};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

pub const COMMENT_MARKER: char = '#';

pub type Lexed = Staged<Vec<Token>, Error>;

/// Lexes the entire source, up to and including the [`TokenKind::Eof`] token.
///
/// Fails only if the source is empty.
pub fn lex(src: &str, style: CommentStyle) -> Result<Lexed, Fault> {
    if src.is_empty() {
        return Err(Fault::EmptySource);
    }
    let mut lexer = Lexer::new(src, style);
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY.min(src.len() + 1));
    tokens.extend(lexer.by_ref().through(Token::is_eof));
    let errors = lexer.into_errors();
    debug!(tokens = tokens.len(), errors = errors.len(), "lexed source");
    Ok(Staged {
        value: tokens,
        errors,
    })
}

/// Lexer states. The dispatcher picks one from the current character, and the
/// state's scan routine consumes one maximal run, producing one token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Start,
    Whitespace,
    Integer,
    String,
    Comment,
}

/// The Fern lexer.
///
/// This is an infinite iterator: once the input is exhausted it keeps on
/// yielding [`TokenKind::Eof`]. Use [`IterExt::through`] to stop.
pub struct Lexer<'src> {
    src: &'src str,
    style: CommentStyle,
    cursor: usize,
    line: u32,
    column: u32,
    /// Start of the token being scanned.
    mark: Span,
    errors: Vec<Spanned<Error>>,
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        Some(self.next_token())
    }
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str, style: CommentStyle) -> Lexer<'src> {
        Lexer {
            src,
            style,
            cursor: 0,
            line: 1,
            column: 0,
            mark: Span::new(0, 0, 1, 0),
            errors: Vec::new(),
        }
    }

    pub fn into_errors(self) -> Vec<Spanned<Error>> {
        self.errors
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.mark();
        let Some(current) = self.peek() else {
            return self.produce(TokenKind::Eof, "");
        };
        match self.dispatch(current) {
            State::Start => self.start(),
            State::Whitespace => self.whitespace(),
            State::Integer => self.integer(),
            State::String => self.string(),
            State::Comment => self.comment(),
        }
    }

    fn dispatch(&self, current: char) -> State {
        match current {
            c if c.is_whitespace() => State::Whitespace,
            '"' => State::String,
            COMMENT_MARKER => State::Comment,
            // `->` and the subtraction operator `-(`
            '-' if matches!(self.peek_second(), Some('>' | '(')) => State::Start,
            '-' | '0'..='9' => State::Integer,
            _ => State::Start,
        }
    }

    /// Scans punctuation, operators, keywords and identifiers.
    fn start(&mut self) -> Token {
        use TokenKind::*;
        let kind = match self.advance() {
            None => Eof,
            Some('(') => LParen,
            Some(')') => RParen,
            Some('{') => LBrace,
            Some('}') => RBrace,
            Some('[') => LBracket,
            Some(']') => RBracket,
            Some(',') => Comma,
            Some('.') => Dot,
            Some(':') => match self.peek() {
                Some(':') => self.advance_with(DoubleColon),
                _ => Colon,
            },
            Some('-') => match self.peek() {
                Some('>') => self.advance_with(Arrow),
                _ => Operator,
            },
            Some('+' | '*' | '/' | '=') => Operator,
            Some(c) if is_identifier_start(c) => return self.identifier_or_keyword(),
            Some(_) => Illegal,
        };
        self.produce_text(kind)
    }

    fn identifier_or_keyword(&mut self) -> Token {
        while self.peek().is_some_and(is_identifier_suffix) {
            self.advance();
        }
        let kind = KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.produce_text(kind)
    }

    fn whitespace(&mut self) -> Token {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.produce_text(TokenKind::Whitespace)
    }

    /// Scans `-?[0-9]+`. A lone `-` is reported, but still produces an
    /// integer token holding whatever was scanned.
    fn integer(&mut self) -> Token {
        let negative = self.peek() == Some('-');
        if negative {
            self.advance();
        }
        let mut digits = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            digits += 1;
        }
        if digits == 0 {
            let minus = Span { len: 1, ..self.mark };
            self.error(minus, Error::InvalidNegativeInteger);
        }
        self.produce_text(TokenKind::Int)
    }

    /// Scans a string up to the next double quote. There are no escape
    /// sequences.
    fn string(&mut self) -> Token {
        assert_eq!(self.advance(), Some('"'));
        let content_lo = self.cursor;
        loop {
            match self.advance() {
                Some('"') => {
                    let content = &self.src[content_lo..self.cursor - 1];
                    return self.produce(TokenKind::String, content);
                }
                Some(_) => (),
                None => {
                    self.error(self.span(), Error::UnclosedString);
                    let content = &self.src[content_lo..];
                    return self.produce(TokenKind::String, content);
                }
            }
        }
    }

    fn comment(&mut self) -> Token {
        while self.peek() == Some(COMMENT_MARKER) {
            self.advance();
        }
        if self.style == CommentStyle::Line {
            while !matches!(self.peek(), Some('\n') | None) {
                self.advance();
            }
        }
        self.produce_text(TokenKind::Comment)
    }
}

impl<'src> Lexer<'src> {
    /// Starts a new token mark at the cursor.
    fn mark(&mut self) {
        self.mark = Span::new(self.cursor, 0, self.line, self.column);
    }

    /// Returns the next character and advances, keeping track of the line and
    /// column.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing.
    fn peek(&self) -> Option<char> {
        self.src[self.cursor..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.cursor..].chars().nth(1)
    }

    /// Returns the span from the mark to the cursor.
    fn span(&self) -> Span {
        Span {
            len: u32::try_from(self.cursor - self.mark.lo).expect("token too long"),
            ..self.mark
        }
    }

    /// Returns the text from the mark to the cursor.
    fn substr(&self) -> &'src str {
        &self.src[self.mark.lo..self.cursor]
    }

    fn produce_text(&self, kind: TokenKind) -> Token {
        self.produce(kind, self.substr())
    }

    fn produce(&self, kind: TokenKind, literal: &str) -> Token {
        Token::new(kind, literal, self.span())
    }

    fn error(&mut self, span: Span, error: Error) {
        self.errors.push(span.wrap(error));
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_suffix(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unclosed string literal")]
    UnclosedString,
    #[error("`-` must be followed by at least one digit")]
    InvalidNegativeInteger,
}

impl ErrorCode for Error {
    const STAGE: Stage = Stage::Lexer;

    fn code(&self) -> &'static str {
        match self {
            Error::UnclosedString => "L001",
            Error::InvalidNegativeInteger => "L002",
        }
    }
}

/// Literal conversions used by the parser.
pub mod extract {
    use std::str::ParseBoolError;
    use std::num::ParseIntError;

    use super::*;

    pub fn int(token: &Token) -> Result<i64, ParseIntError> {
        debug_assert_eq!(token.kind, TokenKind::Int);
        token.literal.parse()
    }

    pub fn bool(token: &Token) -> Result<bool, ParseBoolError> {
        debug_assert_eq!(token.kind, TokenKind::Bool);
        token.literal.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::format_errors;
    use pretty_assertions::assert_eq;

    fn lex_marker(src: &str) -> Lexed {
        lex(src, CommentStyle::MarkerRun).expect("non-empty source")
    }

    fn summarize(tokens: &[Token]) -> Vec<(TokenKind, &str, u32, u32)> {
        tokens
            .iter()
            .map(|t| (t.kind, &*t.literal, t.line(), t.column()))
            .collect()
    }

    #[test]
    fn tests_with_positions() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "fun f() -> int, bool {}" => [
                (Fun, "fun", 1, 0),
                (Whitespace, " ", 1, 3),
                (Identifier, "f", 1, 4),
                (LParen, "(", 1, 5),
                (RParen, ")", 1, 6),
                (Whitespace, " ", 1, 7),
                (Arrow, "->", 1, 8),
                (Whitespace, " ", 1, 10),
                (KwInt, "int", 1, 11),
                (Comma, ",", 1, 14),
                (Whitespace, " ", 1, 15),
                (KwBool, "bool", 1, 16),
                (Whitespace, " ", 1, 20),
                (LBrace, "{", 1, 21),
                (RBrace, "}", 1, 22),
                (Eof, "", 1, 23),
            ],
            "1 -23 007" => [
                (Int, "1", 1, 0),
                (Whitespace, " ", 1, 1),
                (Int, "-23", 1, 2),
                (Whitespace, " ", 1, 5),
                (Int, "007", 1, 6),
                (Eof, "", 1, 9),
            ],
            "+(1, 2) -(a) lt(x, 3) not(true)" => [
                (Operator, "+", 1, 0),
                (LParen, "(", 1, 1),
                (Int, "1", 1, 2),
                (Comma, ",", 1, 3),
                (Whitespace, " ", 1, 4),
                (Int, "2", 1, 5),
                (RParen, ")", 1, 6),
                (Whitespace, " ", 1, 7),
                (Operator, "-", 1, 8),
                (LParen, "(", 1, 9),
                (Identifier, "a", 1, 10),
                (RParen, ")", 1, 11),
                (Whitespace, " ", 1, 12),
                (Operator, "lt", 1, 13),
                (LParen, "(", 1, 15),
                (Identifier, "x", 1, 16),
                (Comma, ",", 1, 17),
                (Whitespace, " ", 1, 18),
                (Int, "3", 1, 19),
                (RParen, ")", 1, 20),
                (Whitespace, " ", 1, 21),
                (Operator, "not", 1, 22),
                (LParen, "(", 1, 25),
                (Bool, "true", 1, 26),
                (RParen, ")", 1, 30),
                (Eof, "", 1, 31),
            ],
            "String::concat(\"a\", \"b c\")." => [
                (Identifier, "String", 1, 0),
                (DoubleColon, "::", 1, 6),
                (Identifier, "concat", 1, 8),
                (LParen, "(", 1, 14),
                (String, "a", 1, 15),
                (Comma, ",", 1, 18),
                (Whitespace, " ", 1, 19),
                (String, "b c", 1, 20),
                (RParen, ")", 1, 25),
                (Dot, ".", 1, 26),
                (Eof, "", 1, 27),
            ],
            "int x = 1.\n  x = 2." => [
                (KwInt, "int", 1, 0),
                (Whitespace, " ", 1, 3),
                (Identifier, "x", 1, 4),
                (Whitespace, " ", 1, 5),
                (Operator, "=", 1, 6),
                (Whitespace, " ", 1, 7),
                (Int, "1", 1, 8),
                (Dot, ".", 1, 9),
                (Whitespace, "\n  ", 1, 10),
                (Identifier, "x", 2, 2),
                (Whitespace, " ", 2, 3),
                (Operator, "=", 2, 4),
                (Whitespace, " ", 2, 5),
                (Int, "2", 2, 6),
                (Dot, ".", 2, 7),
                (Eof, "", 2, 8),
            ],
            "listof Point p_1 = [] $" => [
                (ListOf, "listof", 1, 0),
                (Whitespace, " ", 1, 6),
                (Identifier, "Point", 1, 7),
                (Whitespace, " ", 1, 12),
                (Identifier, "p_1", 1, 13),
                (Whitespace, " ", 1, 16),
                (Operator, "=", 1, 17),
                (Whitespace, " ", 1, 18),
                (LBracket, "[", 1, 19),
                (RBracket, "]", 1, 20),
                (Whitespace, " ", 1, 21),
                (Illegal, "$", 1, 22),
                (Eof, "", 1, 23),
            ],
            "## note" => [
                (Comment, "##", 1, 0),
                (Whitespace, " ", 1, 2),
                (Identifier, "note", 1, 3),
                (Eof, "", 1, 7),
            ],
        });

        for (input, expected) in cases {
            let lexed = lex_marker(input);
            assert!(lexed.is_clean(), "{input:?}: {:?}", lexed.errors);
            assert_eq!(summarize(&lexed.value), *expected, "{input:?}");
        }
    }

    #[test]
    fn test_line_comments() {
        use TokenKind::*;
        let lexed = lex("# a whole line\nx", CommentStyle::Line).unwrap();
        assert_eq!(
            summarize(&lexed.value),
            [
                (Comment, "# a whole line", 1, 0),
                (Whitespace, "\n", 1, 14),
                (Identifier, "x", 2, 0),
                (Eof, "", 2, 1),
            ]
        );
    }

    #[test]
    fn test_lone_minus_is_reported_at_the_minus() {
        let lexed = lex_marker("x\n  - 1");
        assert_eq!(
            format_errors(&lexed.errors),
            ["2:2: `-` must be followed by at least one digit"]
        );
        let minus = &lexed.value[2];
        assert_eq!((minus.kind, &*minus.literal), (TokenKind::Int, "-"));
    }

    #[test]
    fn test_unclosed_string_keeps_partial_content() {
        let lexed = lex_marker("\"abc\ndef");
        assert_eq!(format_errors(&lexed.errors), ["1:0: unclosed string literal"]);
        assert_eq!(&*lexed.value[0].literal, "abc\ndef");
        assert_eq!(lexed.value[0].kind, TokenKind::String);
        assert!(lexed.value[1].is_eof());
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new("a", CommentStyle::MarkerRun);
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Identifier);
        for _ in 0..3 {
            let token = lexer.next().unwrap();
            assert!(token.is_eof());
            assert_eq!(token.span.lo, 1);
        }
    }

    #[test]
    fn test_exactly_one_eof() {
        for src in ["a", " ", "\"", "-", "fun main() { return 1. }", "#", "é ü"] {
            let lexed = lex_marker(src);
            let eofs = lexed.value.iter().filter(|t| t.is_eof()).count();
            assert_eq!(eofs, 1, "{src:?}");
            assert!(lexed.value.last().unwrap().is_eof());
        }
    }

    #[test]
    fn test_round_trip() {
        let src = "## header\nfun main() {\n  Stdout::println(\"hi\"). # tail\n  int x = -3.\n}\n";
        for style in [CommentStyle::MarkerRun, CommentStyle::Line] {
            let lexed = lex(src, style).unwrap();
            let all: String = lexed.value.iter().map(|t| t.text(src)).collect();
            assert_eq!(all, src);

            let comments: Vec<_> = lexed
                .value
                .iter()
                .filter(|t| t.kind == TokenKind::Comment)
                .map(|t| t.span)
                .collect();
            let mut without_comments = String::from(src);
            for span in comments.iter().rev() {
                without_comments.replace_range(span.lo..span.hi(), "");
            }
            let code: String = lexed
                .value
                .iter()
                .filter(|t| t.kind != TokenKind::Comment)
                .map(|t| t.text(src))
                .collect();
            assert_eq!(code, without_comments);
        }
    }

    #[test]
    fn test_empty_source_is_a_fault() {
        assert_eq!(
            lex("", CommentStyle::MarkerRun).unwrap_err(),
            Fault::EmptySource
        );
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $lit:expr, $line:expr, $col:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                {
                    let tokens: Vec<(TokenKind, &str, u32, u32)> =
                        vec![$(($kind, $lit, $line, $col)),*];
                    tokens
                },
            )),*]
        }};
    }
    use cases;
}
