// program      ::= item* EOF
// item         ::= fun_decl | datatype_decl | statement
// fun_decl     ::= 'fun' ID '(' [param (',' param)*] ')' ['->' type (',' type)*] block
// datatype_decl::= 'datatype' ID '{' [param (',' param)*] '}'
// param        ::= type ID
// type         ::= ['listof'] ('int' | 'string' | 'bool' | ID)
// block        ::= '{' statement* '}'
//                | 'block' statement* 'end'
// statement    ::= type ID '=' expr (',' ID '=' expr)* '.'
//                | ID '=' expr '.'
//                | 'if' expr block ('elseif' expr block)* ['else' block]
//                | 'loop' [expr] block
//                | block
//                | 'return' [expr (',' expr)*] '.'
//                | call '.'
//                | 'break' '.'
//                | 'continue' '.'
// call         ::= ID '(' [expr (',' expr)*] ')'
//                | ID '::' ID '(' [expr (',' expr)*] ')'
// expr         ::= INT | STRING | BOOL | ID
//                | call
//                | '[' [expr (',' expr)*] ']'
//                | ID '{' [ID ':' expr (',' ID ':' expr)*] '}'
//                | OP '(' [expr (',' expr)*] ')'
// OP           ::= '+' | '-' | '*' | '/' | '=' | and | or | not | lt | gt | lte | gte

use std::fmt;

use crate::{token::Span, types::TypeTag};

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementKind {
    FunDecl(FunDecl),
    DatatypeDecl(DatatypeDecl),
    VarDecl(VarDecl),
    /// A declaration chained after another one with `,`, sharing its type.
    SubsequentVarDecl(VarDecl),
    Reassign {
        target: Ident,
        value: Expr,
    },
    If(IfChain),
    Loop {
        condition: Option<Expr>,
        body: Block,
    },
    Block(Block),
    Return(Vec<Expr>),
    /// A call evaluated for its effects. Always holds a call expression.
    Call(Expr),
    Break,
    Continue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    pub returns: Vec<TypeName>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatatypeDecl {
    pub name: Ident,
    pub fields: Vec<Param>,
}

/// A `type name` pair, used by parameters and datatype fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub ty: TypeName,
    pub name: Ident,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub ty: TypeName,
    pub name: Ident,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfChain {
    /// The `if` branch followed by every `elseif` branch. Never empty.
    pub branches: Vec<Branch>,
    pub otherwise: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn dummy(span: Span) -> Expr {
        Expr {
            kind: ExprKind::Dummy,
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Int(i64),
    String(Box<str>),
    Bool(bool),
    Id(Ident),
    Datatype {
        name: Ident,
        fields: Vec<FieldInit>,
    },
    Prefix {
        op: Operator,
        operands: Vec<Expr>,
    },
    Call {
        function: Ident,
        args: Vec<Expr>,
    },
    NamespacedCall {
        namespace: Ident,
        function: Ident,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
    /// Placeholder left where an expression failed to parse.
    Dummy,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Expr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    And,
    Or,
    Not,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl Operator {
    pub fn from_literal(literal: &str) -> Option<Operator> {
        let op = match literal {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "=" => Operator::Eq,
            "and" => Operator::And,
            "or" => Operator::Or,
            "not" => Operator::Not,
            "lt" => Operator::Lt,
            "gt" => Operator::Gt,
            "lte" => Operator::Lte,
            "gte" => Operator::Gte,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Eq => "=",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Gte => "gte",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scalar {
    Int,
    String,
    Bool,
    Datatype(Box<str>),
}

impl Scalar {
    pub fn name(&self) -> &str {
        match self {
            Scalar::Int => "int",
            Scalar::String => "string",
            Scalar::Bool => "bool",
            Scalar::Datatype(name) => name,
        }
    }
}

/// A declared type: a scalar, or a list of a scalar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeName {
    pub scalar: Scalar,
    pub is_list: bool,
    pub span: Span,
}

impl TypeName {
    pub fn tag(&self) -> TypeTag {
        if self.is_list {
            TypeTag::list_of(self.scalar.name())
        } else {
            TypeTag::scalar(self.scalar.name())
        }
    }

    /// The datatype this type refers to, if any.
    pub fn datatype(&self) -> Option<&str> {
        match &self.scalar {
            Scalar::Datatype(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list {
            write!(f, "listof ")?;
        }
        f.write_str(self.scalar.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Box<str>,
    pub span: Span,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
