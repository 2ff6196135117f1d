use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        Block, Branch, DatatypeDecl, Expr, ExprKind, FieldInit, FunDecl, Ident, IfChain, Operator,
        Param, Program, Scalar, Statement, StatementKind, TypeName, VarDecl,
    },
    diagnostic::{ErrorCode, Fault, Stage, Staged},
    lexer::extract,
    token::{Span, Spanned, Token, TokenKind},
};

type Result<T, E = ()> = std::result::Result<T, E>;

pub type Parsed = Staged<Program, Error>;

/// Parses a complete token sequence, as produced by [`crate::lexer::lex`].
///
/// Always produces a program. If errors were recorded, missing values are
/// [`ExprKind::Dummy`] placeholders and other failed statements are absent.
pub fn parse_program(tokens: Vec<Token>) -> Result<Parsed, Fault> {
    let mut p = Parser::new(tokens)?;
    let program = p.parse_program();
    debug!(
        statements = program.statements.len(),
        errors = p.errors.len(),
        "parsed program"
    );
    Ok(Staged {
        value: program,
        errors: p.errors,
    })
}

const TYPE_START: &[TokenKind] = &[
    TokenKind::KwInt,
    TokenKind::KwString,
    TokenKind::KwBool,
    TokenKind::Identifier,
];

const BLOCK_START: &[TokenKind] = &[TokenKind::LBrace, TokenKind::Block];

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    errors: Vec<Spanned<Error>>,
}

impl Parser {
    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::with_capacity(16);
        while self.except([]) {
            _ = self.synchronize(
                &[TokenKind::Dot],
                &[TokenKind::Fun, TokenKind::Datatype],
                |p| p.parse_statement(true, &mut statements),
            );
        }
        Program { statements }
    }

    /// Parses one statement into `out`. A chained variable declaration pushes
    /// one statement per declared name.
    fn parse_statement(&mut self, top_level: bool, out: &mut Vec<Statement>) -> Result<()> {
        let current = self.peek();
        let (kind, span) = (current.kind, current.span);
        match kind {
            TokenKind::Fun | TokenKind::Datatype if !top_level => {
                // Parse it anyway, so recovery resumes after its body.
                if kind == TokenKind::Fun {
                    self.parse_fun_decl()?;
                } else {
                    self.parse_datatype_decl()?;
                }
                self.error(span.wrap(Error::NestedDeclaration { keyword: kind }));
            }
            TokenKind::Fun => out.push(self.parse_fun_decl()?),
            TokenKind::Datatype => out.push(self.parse_datatype_decl()?),
            TokenKind::If => out.push(self.parse_if()?),
            TokenKind::Loop => out.push(self.parse_loop()?),
            TokenKind::LBrace | TokenKind::Block => {
                let block = self.parse_block()?;
                out.push(Statement {
                    span: block.span,
                    kind: StatementKind::Block(block),
                });
            }
            TokenKind::Return => out.push(self.parse_return()?),
            TokenKind::Break | TokenKind::Continue => out.push(self.parse_loop_control()?),
            kind if kind.starts_type() => self.parse_var_decl(out)?,
            TokenKind::Identifier => {
                let next = self.lookahead(1);
                match next.kind {
                    TokenKind::Identifier => self.parse_var_decl(out)?,
                    TokenKind::Operator if &*next.literal == "=" => {
                        out.push(self.parse_reassign()?);
                    }
                    TokenKind::LParen | TokenKind::DoubleColon => {
                        out.push(self.parse_call_statement()?);
                    }
                    found => {
                        let error = Error::UnexpectedAny {
                            expected: Box::from([
                                TokenKind::Identifier,
                                TokenKind::Operator,
                                TokenKind::LParen,
                                TokenKind::DoubleColon,
                            ]),
                            found,
                        };
                        self.error(next.span.wrap(error));
                        return Err(());
                    }
                }
            }
            found => {
                self.error(span.wrap(Error::ExpectedStatement { found }));
                return Err(());
            }
        }
        Ok(())
    }

    fn parse_fun_decl(&mut self) -> Result<Statement> {
        let start = self.consume(TokenKind::Fun)?;
        let name = self.parse_ident()?;
        self.consume(TokenKind::LParen)?;
        let params = self.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_param)?;
        self.consume(TokenKind::RParen)?;

        let mut returns = Vec::new();
        if self.take(TokenKind::Arrow) {
            loop {
                returns.push(self.parse_type()?);
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
        }

        let body = self.parse_block()?;
        Ok(Statement {
            span: start.span.to(body.span),
            kind: StatementKind::FunDecl(FunDecl {
                name,
                params,
                returns,
                body,
            }),
        })
    }

    fn parse_datatype_decl(&mut self) -> Result<Statement> {
        let start = self.consume(TokenKind::Datatype)?;
        let name = self.parse_ident()?;
        self.consume(TokenKind::LBrace)?;
        let fields = self.parse_list(TokenKind::RBrace, TokenKind::Comma, Parser::parse_param)?;
        let end = self.consume(TokenKind::RBrace)?;
        Ok(Statement {
            span: start.span.to(end.span),
            kind: StatementKind::DatatypeDecl(DatatypeDecl { name, fields }),
        })
    }

    fn parse_param(&mut self) -> Result<Param> {
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        Ok(Param { ty, name })
    }

    fn parse_type(&mut self) -> Result<TypeName> {
        let start = self.peek().span;
        let is_list = self.take(TokenKind::ListOf);
        let token = self.consume_any(TYPE_START)?;
        let scalar = match token.kind {
            TokenKind::KwInt => Scalar::Int,
            TokenKind::KwString => Scalar::String,
            TokenKind::KwBool => Scalar::Bool,
            _ => Scalar::Datatype(token.literal),
        };
        Ok(TypeName {
            scalar,
            is_list,
            span: start.to(token.span),
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: token.literal,
            span: token.span,
        })
    }

    /// Parses `{ statement* }` or `block statement* end`.
    fn parse_block(&mut self) -> Result<Block> {
        let open = self.consume_any(BLOCK_START)?;
        let close = match open.kind {
            TokenKind::LBrace => TokenKind::RBrace,
            _ => TokenKind::End,
        };

        let mut statements = Vec::new();
        while self.except([close]) {
            _ = self.synchronize(&[TokenKind::Dot], &[close], |p| {
                p.parse_statement(false, &mut statements)
            });
        }

        if self.is(TokenKind::Eof) {
            let eof = self.peek().span;
            self.error(open.span.wrap(Error::UnterminatedBlock { close }));
            return Ok(Block {
                statements,
                span: open.span.to(eof),
            });
        }
        let end = self.consume(close)?;
        Ok(Block {
            statements,
            span: open.span.to(end.span),
        })
    }

    /// Parses `type name = value` followed by any number of `, name = value`.
    fn parse_var_decl(&mut self, out: &mut Vec<Statement>) -> Result<()> {
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        self.consume_assign()?;
        let value = self.parse_value()?;
        out.push(Statement {
            span: ty.span.to(value.span),
            kind: StatementKind::VarDecl(VarDecl {
                ty: ty.clone(),
                name,
                value,
            }),
        });

        while self.take(TokenKind::Comma) {
            let name = self.parse_ident()?;
            self.consume_assign()?;
            let value = self.parse_value()?;
            out.push(Statement {
                span: name.span.to(value.span),
                kind: StatementKind::SubsequentVarDecl(VarDecl {
                    ty: ty.clone(),
                    name,
                    value,
                }),
            });
        }

        self.consume(TokenKind::Dot)?;
        Ok(())
    }

    fn parse_reassign(&mut self) -> Result<Statement> {
        let target = self.parse_ident()?;
        self.consume_assign()?;
        let value = self.parse_value()?;
        let end = self.consume(TokenKind::Dot)?;
        Ok(Statement {
            span: target.span.to(end.span),
            kind: StatementKind::Reassign { target, value },
        })
    }

    fn parse_if(&mut self) -> Result<Statement> {
        let start = self.consume(TokenKind::If)?;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        let mut end = body.span;
        let mut branches = vec![Branch { condition, body }];

        while self.take(TokenKind::ElseIf) {
            let condition = self.parse_condition()?;
            let body = self.parse_block()?;
            end = body.span;
            branches.push(Branch { condition, body });
        }

        let otherwise = if self.take(TokenKind::Else) {
            let body = self.parse_block()?;
            end = body.span;
            Some(body)
        } else {
            None
        };

        Ok(Statement {
            span: start.span.to(end),
            kind: StatementKind::If(IfChain {
                branches,
                otherwise,
            }),
        })
    }

    fn parse_loop(&mut self) -> Result<Statement> {
        let start = self.consume(TokenKind::Loop)?;
        let condition = if BLOCK_START.contains(&self.peek().kind) {
            None
        } else {
            Some(self.parse_condition()?)
        };
        let body = self.parse_block()?;
        Ok(Statement {
            span: start.span.to(body.span),
            kind: StatementKind::Loop { condition, body },
        })
    }

    fn parse_return(&mut self) -> Result<Statement> {
        let start = self.consume(TokenKind::Return)?;
        let mut values = Vec::new();
        if !self.is(TokenKind::Dot) {
            loop {
                values.push(self.parse_value()?);
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.consume(TokenKind::Dot)?;
        Ok(Statement {
            span: start.span.to(end.span),
            kind: StatementKind::Return(values),
        })
    }

    fn parse_loop_control(&mut self) -> Result<Statement> {
        let keyword = self.consume_any(&[TokenKind::Break, TokenKind::Continue])?;
        let end = self.consume(TokenKind::Dot)?;
        let kind = match keyword.kind {
            TokenKind::Break => StatementKind::Break,
            _ => StatementKind::Continue,
        };
        Ok(Statement {
            span: keyword.span.to(end.span),
            kind,
        })
    }

    fn parse_call_statement(&mut self) -> Result<Statement> {
        let call = self.parse_expr()?;
        debug_assert!(matches!(
            call.kind,
            ExprKind::Call { .. } | ExprKind::NamespacedCall { .. }
        ));
        let end = self.consume(TokenKind::Dot)?;
        Ok(Statement {
            span: call.span.to(end.span),
            kind: StatementKind::Call(call),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expression(true)
    }

    /// Parses the value of a declaration, reassignment or return. A value
    /// missing right before its `.` or `,` is replaced by a dummy, so the
    /// statement survives.
    fn parse_value(&mut self) -> Result<Expr> {
        let start = self.peek().span;
        match self.parse_expr() {
            Ok(expr) => Ok(expr),
            Err(()) if self.is(TokenKind::Dot) || self.is(TokenKind::Comma) => {
                Ok(Expr::dummy(start))
            }
            Err(()) => Err(()),
        }
    }

    /// Parses the condition of an `if`, `elseif` or `loop`, where a `{` opens
    /// the body rather than a datatype literal.
    fn parse_condition(&mut self) -> Result<Expr> {
        self.parse_expression(false)
    }

    fn parse_expression(&mut self, datatype_literals: bool) -> Result<Expr> {
        let current = self.peek();
        let (found, span) = (current.kind, current.span);
        let starts_expression = matches!(
            found,
            TokenKind::Int
                | TokenKind::String
                | TokenKind::Bool
                | TokenKind::Identifier
                | TokenKind::Operator
                | TokenKind::LBracket
        );
        if !starts_expression {
            self.error(span.wrap(Error::ExpectedExpression { found }));
            return Err(());
        }

        let token = self.advance();
        let (kind, span) = match token.kind {
            TokenKind::Int => (ExprKind::Int(self.convert_int(&token)), token.span),
            TokenKind::Bool => (ExprKind::Bool(self.convert_bool(&token)), token.span),
            TokenKind::String => (ExprKind::String(token.literal), token.span),

            // List: [ expr, ... ]
            TokenKind::LBracket => {
                let items =
                    self.parse_list(TokenKind::RBracket, TokenKind::Comma, Parser::parse_expr)?;
                let end = self.consume(TokenKind::RBracket)?;
                (ExprKind::List(items), token.span.to(end.span))
            }

            // Prefix operator application: op( expr, ... )
            TokenKind::Operator => {
                let Some(op) = Operator::from_literal(&token.literal) else {
                    let error = Error::UnknownOperator {
                        literal: token.literal,
                    };
                    self.error(token.span.wrap(error));
                    return Err(());
                };
                let (operands, end) = self.parse_args()?;
                (ExprKind::Prefix { op, operands }, token.span.to(end))
            }

            TokenKind::Identifier => {
                let ident = Ident {
                    name: token.literal,
                    span: token.span,
                };
                match self.peek().kind {
                    // Call: f( expr, ... )
                    TokenKind::LParen => {
                        let (args, end) = self.parse_args()?;
                        let span = ident.span.to(end);
                        let call = ExprKind::Call {
                            function: ident,
                            args,
                        };
                        (call, span)
                    }
                    // Namespaced call: Ns::f( expr, ... )
                    TokenKind::DoubleColon => {
                        self.advance();
                        let function = self.parse_ident()?;
                        let (args, end) = self.parse_args()?;
                        let span = ident.span.to(end);
                        let call = ExprKind::NamespacedCall {
                            namespace: ident,
                            function,
                            args,
                        };
                        (call, span)
                    }
                    // Datatype literal: Name{ field: expr, ... }
                    TokenKind::LBrace if datatype_literals => {
                        self.advance();
                        let fields = self.parse_list(
                            TokenKind::RBrace,
                            TokenKind::Comma,
                            Parser::parse_field_init,
                        )?;
                        let end = self.consume(TokenKind::RBrace)?;
                        let span = ident.span.to(end.span);
                        (ExprKind::Datatype { name: ident, fields }, span)
                    }
                    _ => {
                        let span = ident.span;
                        (ExprKind::Id(ident), span)
                    }
                }
            }

            _ => unreachable!("checked above"),
        };

        Ok(Expr { kind, span })
    }

    /// Parses a parenthesized argument list, returning the span of the `)`.
    fn parse_args(&mut self) -> Result<(Vec<Expr>, Span)> {
        self.consume(TokenKind::LParen)?;
        let args = self.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_expr)?;
        let end = self.consume(TokenKind::RParen)?;
        Ok((args, end.span))
    }

    fn parse_field_init(&mut self) -> Result<FieldInit> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::Colon)?;
        let value = self.parse_expr()?;
        Ok(FieldInit { name, value })
    }

    /// Parses `item (delim item)*` until `end_delim` is found. Does **NOT**
    /// consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        while self.except([end_delim]) {
            let item = self.synchronize(&[separator], &[end_delim], |p| parse_item(p))?;
            items.push(item);

            // After consuming an item, we must consume the separator.
            if !self.take(separator) {
                if self.is(end_delim) || self.is(TokenKind::Eof) {
                    // If, however, it is not present, then we check if the end
                    // delimiter is current. If so, we can stop. At the end of
                    // input the caller reports the missing delimiter.
                    break;
                }
                // However, if the current token is not the separator nor
                // the end delimiter, we must return an error.
                let c = self.peek();
                let (found, span) = (c.kind, c.span);
                let error = Error::UnexpectedAny {
                    found,
                    expected: Box::from([separator, end_delim]),
                };
                self.error(span.wrap(error));
            }
        }

        let next = self.peek();
        assert!(next.kind == end_delim || next.kind == TokenKind::Eof);
        Ok(items)
    }

    /// Converts an integer literal, recording an error and yielding zero if it
    /// is malformed.
    fn convert_int(&mut self, token: &Token) -> i64 {
        extract::int(token).unwrap_or_else(|_| {
            let error = Error::InvalidInt {
                literal: token.literal.clone(),
            };
            self.error(token.span.wrap(error));
            0
        })
    }

    fn convert_bool(&mut self, token: &Token) -> bool {
        extract::bool(token).unwrap_or_else(|_| {
            let error = Error::InvalidBool {
                literal: token.literal.clone(),
            };
            self.error(token.span.wrap(error));
            false
        })
    }
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Result<Parser, Fault> {
        let Some(last) = tokens.last() else {
            return Err(Fault::EmptyTokenStream);
        };
        if !last.is_eof() {
            let span = Span::new(last.span.hi(), 0, last.span.line, last.span.column);
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        let mut p = Parser {
            tokens,
            cursor: 0,
            errors: Vec::with_capacity(8),
        };
        p.skip_trivia();
        Ok(p)
    }

    fn error(&mut self, error: Spanned<Error>) {
        self.errors.push(error);
    }

    /// Moves the cursor past trivia. Illegal characters are reported here, so
    /// that each one is reported exactly once.
    fn skip_trivia(&mut self) {
        loop {
            let token = &self.tokens[self.cursor];
            match token.kind {
                kind if kind.is_trivia() => {}
                TokenKind::Illegal => {
                    let error = Error::IllegalCharacter {
                        found: token.literal.clone(),
                    };
                    self.errors.push(token.span.wrap(error));
                }
                _ => break,
            }
            self.cursor += 1;
        }
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    /// Returns the `n`-th significant token after the current one, without
    /// advancing.
    fn lookahead(&self, n: usize) -> Token {
        let eof = &self.tokens[self.tokens.len() - 1];
        self.tokens[self.cursor..]
            .iter()
            .filter(|t| !t.kind.is_trivia() && t.kind != TokenKind::Illegal)
            .nth(n)
            .unwrap_or(eof)
            .clone()
    }

    /// Returns the current token and advances, skipping any trivia. Never
    /// moves past the final `Eof`.
    fn advance(&mut self) -> Token {
        let c = self.peek().clone();
        if !c.is_eof() {
            self.cursor += 1;
            self.skip_trivia();
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        if self.is(expect) {
            Ok(self.advance())
        } else {
            let c = self.peek();
            let (found, span) = (c.kind, c.span);
            let error = Error::Unexpected {
                found,
                expected: expect,
            };
            self.error(span.wrap(error));
            Err(())
        }
    }

    /// Advances if the current token matches any of the provided tokens,
    /// returning it. If not, records an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token> {
        if expect.contains(&self.peek().kind) {
            return Ok(self.advance());
        }
        let c = self.peek();
        let (found, span) = (c.kind, c.span);
        let error = Error::UnexpectedAny {
            found,
            expected: Box::from(expect),
        };
        self.error(span.wrap(error));
        Err(())
    }

    /// Consumes the `=` operator of declarations and reassignments.
    fn consume_assign(&mut self) -> Result<Token> {
        let c = self.peek();
        if c.kind == TokenKind::Operator && &*c.literal == "=" {
            return Ok(self.advance());
        }
        let (found, span) = (c.kind, c.span);
        self.error(span.wrap(Error::ExpectedAssign { found }));
        Err(())
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek().kind;
        if c == TokenKind::Eof {
            return false;
        }
        except.into_iter().all(|e| c != e)
    }

    fn synchronize<T>(
        &mut self,
        cont_cond: &[TokenKind],
        stop_cond: &[TokenKind],
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<T> {
        'outer: loop {
            if let Ok(val) = f(self) {
                break Ok(val);
            }
            // In the case of an error, try to advance until find a token
            // specified in `cont_cond` (in which case we retry) or in
            // `stop_cond` (in which case we stop).
            loop {
                let c = self.peek().kind;
                // Check whether must stop
                if c == TokenKind::Eof || stop_cond.contains(&c) {
                    break 'outer Err(());
                }
                // The token advancement must be AFTER stopping. If we break
                // out, the caller should advance (to follow the convention).
                self.advance();
                // Check whether can retry. Retrying right before a stop token
                // would only report it again.
                if cont_cond.contains(&c) {
                    let next = self.peek().kind;
                    if next != TokenKind::Eof && !stop_cond.contains(&next) {
                        continue 'outer;
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("expected {expected}, but got {found}")]
    Unexpected {
        found: TokenKind,
        expected: TokenKind,
    },
    #[error("expected one of {}, but got {found}", join_kinds(.expected))]
    UnexpectedAny {
        found: TokenKind,
        expected: Box<[TokenKind]>,
    },
    #[error("expected `=`, but got {found}")]
    ExpectedAssign { found: TokenKind },
    #[error("expected a statement, but got {found}")]
    ExpectedStatement { found: TokenKind },
    #[error("expected an expression, but got {found}")]
    ExpectedExpression { found: TokenKind },
    #[error("{keyword} declarations are only allowed at the top level")]
    NestedDeclaration { keyword: TokenKind },
    #[error("unterminated block, expected {close} before the end of input")]
    UnterminatedBlock { close: TokenKind },
    #[error("`{literal}` is not a valid integer")]
    InvalidInt { literal: Box<str> },
    #[error("`{literal}` is not a valid boolean")]
    InvalidBool { literal: Box<str> },
    #[error("unknown operator `{literal}`")]
    UnknownOperator { literal: Box<str> },
    #[error("illegal character `{found}`")]
    IllegalCharacter { found: Box<str> },
}

fn join_kinds(kinds: &[TokenKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ErrorCode for Error {
    const STAGE: Stage = Stage::Parser;

    fn code(&self) -> &'static str {
        match self {
            Error::Unexpected { .. } => "P001",
            Error::UnexpectedAny { .. } => "P002",
            Error::ExpectedAssign { .. } => "P003",
            Error::ExpectedStatement { .. } => "P004",
            Error::ExpectedExpression { .. } => "P005",
            Error::NestedDeclaration { .. } => "P006",
            Error::UnterminatedBlock { .. } => "P007",
            Error::InvalidInt { .. } => "P008",
            Error::InvalidBool { .. } => "P009",
            Error::UnknownOperator { .. } => "P010",
            Error::IllegalCharacter { .. } => "P011",
        }
    }
}
