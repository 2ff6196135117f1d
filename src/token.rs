use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The token's value. For strings this is the content between the quotes;
    /// for every other kind it is the scanned text itself.
    pub literal: Box<str>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<Box<str>>, span: Span) -> Token {
        Token {
            kind,
            literal: literal.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }

    /// Returns the exact source text this token was scanned from.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        self.span.substr(src)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {:?}, {})", self.kind, self.literal, self.span)
    }
}

/// Source region of a token or node.
///
/// `lo` and `len` are byte offsets into the source; `line` (1-based) and
/// `column` (0-based) locate the first character.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub lo: usize,
    pub len: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(lo: usize, len: u32, line: u32, column: u32) -> Span {
        Span {
            lo,
            len,
            line,
            column,
        }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span starting at `self` and ending at the end of `other`.
    pub fn to(self, other: Span) -> Span {
        let hi = other.hi().max(self.hi());
        Span {
            len: u32::try_from(hi - self.lo).expect("span too long"),
            ..self
        }
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { inner, span: self }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, {}..{})", self.lo, self.hi())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub inner: T,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Fun,
    Datatype,
    If,
    ElseIf,
    Else,
    Loop,
    Block,
    End,
    Return,
    Break,
    Continue,
    ListOf,

    KwInt,
    KwString,
    KwBool,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    /// Statement terminator.
    Dot,
    Colon,
    /// `::`
    DoubleColon,
    /// `->`
    Arrow,

    /// `+ - * / = and or not lt gt lte gte`, told apart by the parser.
    Operator,

    Identifier,
    Int,
    String,
    Bool,

    Whitespace,
    Comment,
    Illegal,
    Eof,
}

impl TokenKind {
    /// Tokens the parser never looks at.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Whether this token may start a type.
    pub fn starts_type(self) -> bool {
        matches!(
            self,
            TokenKind::ListOf | TokenKind::KwInt | TokenKind::KwString | TokenKind::KwBool
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Fun => "`fun`",
            Datatype => "`datatype`",
            If => "`if`",
            ElseIf => "`elseif`",
            Else => "`else`",
            Loop => "`loop`",
            Block => "`block`",
            End => "`end`",
            Return => "`return`",
            Break => "`break`",
            Continue => "`continue`",
            ListOf => "`listof`",
            KwInt => "`int`",
            KwString => "`string`",
            KwBool => "`bool`",
            LParen => "`(`",
            RParen => "`)`",
            LBrace => "`{`",
            RBrace => "`}`",
            LBracket => "`[`",
            RBracket => "`]`",
            Comma => "`,`",
            Dot => "`.`",
            Colon => "`:`",
            DoubleColon => "`::`",
            Arrow => "`->`",
            Operator => "operator",
            Identifier => "identifier",
            Int => "integer",
            String => "string",
            Bool => "boolean",
            Whitespace => "whitespace",
            Comment => "comment",
            Illegal => "illegal character",
            Eof => "end of input",
        };
        f.write_str(s)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "fun" => TokenKind::Fun,
    "datatype" => TokenKind::Datatype,
    "if" => TokenKind::If,
    "elseif" => TokenKind::ElseIf,
    "else" => TokenKind::Else,
    "loop" => TokenKind::Loop,
    "block" => TokenKind::Block,
    "end" => TokenKind::End,
    "return" => TokenKind::Return,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "listof" => TokenKind::ListOf,
    "int" => TokenKind::KwInt,
    "string" => TokenKind::KwString,
    "bool" => TokenKind::KwBool,
    "true" => TokenKind::Bool,
    "false" => TokenKind::Bool,
    "and" => TokenKind::Operator,
    "or" => TokenKind::Operator,
    "not" => TokenKind::Operator,
    "lt" => TokenKind::Operator,
    "gt" => TokenKind::Operator,
    "lte" => TokenKind::Operator,
    "gte" => TokenKind::Operator,
};
