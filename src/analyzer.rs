use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        Block, DatatypeDecl, Expr, ExprKind, FieldInit, FunDecl, Ident, Operator, Program,
        Statement, StatementKind, TypeName, VarDecl,
    },
    diagnostic::{ErrorCode, Fault, Stage, Staged},
    ir::{IrDatatype, IrFunction, IrVariable},
    scope::{ScopeStack, SymbolTable},
    stdlib::Stdlib,
    token::{Span, Spanned},
    types::TypeTag,
};

type Result<T, E = Fault> = std::result::Result<T, E>;

pub type Analyzed = Staged<Ir, Error>;

/// The analyzed program: the tree, plus every global declaration.
#[derive(Debug)]
pub struct Ir {
    pub program: Program,
    pub globals: SymbolTable,
}

/// Analyzes `program` with a freshly loaded standard library.
pub fn analyze(program: Program) -> Result<Analyzed> {
    Analyzer::new()?.analyze(program)
}

pub struct Analyzer {
    stdlib: Stdlib,
    scopes: ScopeStack,
    errors: Vec<Spanned<Error>>,
    /// Return types of the function being analyzed, if any.
    returns: Option<Vec<TypeTag>>,
    loop_depth: usize,
}

impl Analyzer {
    pub fn new() -> Result<Analyzer> {
        Ok(Analyzer::with_stdlib(Stdlib::load()?))
    }

    pub fn with_stdlib(stdlib: Stdlib) -> Analyzer {
        Analyzer {
            stdlib,
            scopes: ScopeStack::new(),
            errors: Vec::with_capacity(8),
            returns: None,
            loop_depth: 0,
        }
    }

    pub fn analyze(mut self, program: Program) -> Result<Analyzed> {
        self.register_signatures(&program)?;
        self.check_statements(&program.statements)?;

        let globals = self.scopes.into_global();
        debug!(
            functions = globals.functions().count(),
            datatypes = globals.datatypes().count(),
            variables = globals.variables().count(),
            errors = self.errors.len(),
            "analyzed program"
        );
        Ok(Staged {
            value: Ir { program, globals },
            errors: self.errors,
        })
    }

    /// First pass: records every top-level function and datatype in the
    /// global scope, so that they may be used before their declaration.
    fn register_signatures(&mut self, program: &Program) -> Result<()> {
        for statement in &program.statements {
            match &statement.kind {
                StatementKind::FunDecl(decl) => {
                    let name = &decl.name;
                    if let Some(first) = self.scopes.lookup_function(&name.name) {
                        let error = Error::DuplicateFunction {
                            name: name.name.clone(),
                            first: first.span,
                        };
                        self.error(name.span, error);
                        continue;
                    }
                    let function = IrFunction::new(&name.name, decl, statement.span);
                    self.scopes.declare_function(function)?;
                }
                StatementKind::DatatypeDecl(decl) => {
                    let name = &decl.name;
                    if let Some(first) = self.scopes.lookup_datatype(&name.name) {
                        let error = Error::DuplicateDatatype {
                            name: name.name.clone(),
                            first: first.span,
                        };
                        self.error(name.span, error);
                        continue;
                    }
                    self.scopes
                        .declare_datatype(IrDatatype::new(decl, statement.span))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_statements(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.check_statement(statement)?;
        }
        Ok(())
    }

    fn check_statement(&mut self, statement: &Statement) -> Result<()> {
        match &statement.kind {
            StatementKind::FunDecl(decl) => self.check_fun_decl(decl)?,
            StatementKind::DatatypeDecl(decl) => self.check_datatype_decl(decl),
            StatementKind::VarDecl(decl) | StatementKind::SubsequentVarDecl(decl) => {
                self.check_var_decl(decl, statement.span)?;
            }
            StatementKind::Reassign { target, value } => self.check_reassign(target, value),
            StatementKind::If(chain) => {
                for branch in &chain.branches {
                    self.check_condition(&branch.condition);
                    self.check_scoped_block(&branch.body)?;
                }
                if let Some(otherwise) = &chain.otherwise {
                    self.check_scoped_block(otherwise)?;
                }
            }
            StatementKind::Loop { condition, body } => {
                if let Some(condition) = condition {
                    self.check_condition(condition);
                }
                self.loop_depth += 1;
                let result = self.check_scoped_block(body);
                self.loop_depth -= 1;
                result?;
            }
            StatementKind::Block(block) => self.check_scoped_block(block)?,
            StatementKind::Return(values) => self.check_return(values, statement.span),
            StatementKind::Call(call) => {
                self.check_call(call);
            }
            StatementKind::Break | StatementKind::Continue => {
                if self.loop_depth == 0 {
                    let keyword = match statement.kind {
                        StatementKind::Break => "break",
                        _ => "continue",
                    };
                    self.error(statement.span, Error::LoopControlOutsideLoop { keyword });
                }
            }
        }
        Ok(())
    }

    fn check_fun_decl(&mut self, decl: &FunDecl) -> Result<()> {
        let mut returns = Vec::with_capacity(decl.returns.len());
        for ty in &decl.returns {
            self.check_type(ty);
            returns.push(ty.tag());
        }

        self.scopes.push();
        for param in &decl.params {
            let ty = self.check_type(&param.ty).unwrap_or_else(|| param.ty.tag());
            self.declare_variable(&param.name, ty, None)?;
        }

        // Loops do not extend into nested bodies.
        let outer_returns = self.returns.replace(returns);
        let outer_loop_depth = std::mem::take(&mut self.loop_depth);
        let result = self.check_statements(&decl.body.statements);
        self.returns = outer_returns;
        self.loop_depth = outer_loop_depth;
        result?;

        self.scopes.pop()
    }

    fn check_datatype_decl(&mut self, decl: &DatatypeDecl) {
        let mut seen: Vec<&str> = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            self.check_type(&field.ty);
            if seen.contains(&&*field.name.name) {
                let error = Error::DuplicateField {
                    datatype: decl.name.name.clone(),
                    field: field.name.name.clone(),
                };
                self.error(field.name.span, error);
            } else {
                seen.push(&field.name.name);
            }
        }
    }

    fn check_var_decl(&mut self, decl: &VarDecl, span: Span) -> Result<()> {
        let declared = self.check_type(&decl.ty);
        // The initializer is checked before the name is in scope.
        let actual = self.check_expr(&decl.value);
        if let Some(expected) = &declared {
            self.expect(expected, &actual, decl.value.span);
        }
        let ty = declared.unwrap_or_else(|| decl.ty.tag());
        let variable = IrVariable {
            name: decl.name.name.clone(),
            ty,
            value: Some(decl.value.clone()),
            span,
        };
        self.declare(variable, decl.name.span)
    }

    fn check_reassign(&mut self, target: &Ident, value: &Expr) {
        let actual = self.check_expr(value);
        let Some(variable) = self.scopes.lookup_variable(&target.name) else {
            let error = Error::UndeclaredVariable {
                name: target.name.clone(),
            };
            self.error(target.span, error);
            return;
        };
        let expected = variable.ty.clone();
        self.expect(&expected, &actual, value.span);
    }

    fn check_return(&mut self, values: &[Expr], span: Span) {
        let actual: Vec<_> = values.iter().map(|v| self.check_expr(v)).collect();
        let Some(expected) = self.returns.clone() else {
            self.error(span, Error::ReturnOutsideFunction);
            return;
        };
        if expected.len() != actual.len() {
            let error = Error::ReturnCount {
                expected: expected.len(),
                actual: actual.len(),
            };
            self.error(span, error);
            return;
        }
        for ((expected, actual), value) in expected.iter().zip(&actual).zip(values) {
            self.expect(expected, actual, value.span);
        }
    }

    fn check_condition(&mut self, condition: &Expr) {
        let actual = self.check_expr(condition);
        self.expect(&TypeTag::bool(), &actual, condition.span);
    }

    fn check_scoped_block(&mut self, block: &Block) -> Result<()> {
        self.scopes.push();
        self.check_statements(&block.statements)?;
        self.scopes.pop()
    }

    /// Checks that a declared type exists, returning its tag if so.
    fn check_type(&mut self, ty: &TypeName) -> Option<TypeTag> {
        if let Some(name) = ty.datatype() {
            if self.scopes.lookup_datatype(name).is_none() {
                let error = Error::UndeclaredDatatype { name: name.into() };
                self.error(ty.span, error);
                return None;
            }
        }
        Some(ty.tag())
    }

    fn declare_variable(&mut self, name: &Ident, ty: TypeTag, value: Option<Expr>) -> Result<()> {
        let variable = IrVariable {
            name: name.name.clone(),
            ty,
            value,
            span: name.span,
        };
        self.declare(variable, name.span)
    }

    /// Declares a variable in the current scope, unless the name is taken
    /// there. Shadowing a variable of an outer scope is fine.
    fn declare(&mut self, variable: IrVariable, name_span: Span) -> Result<()> {
        if let Some(first) = self.scopes.current().variable(&variable.name) {
            let error = Error::DuplicateVariable {
                name: variable.name.clone(),
                first: first.span,
            };
            self.error(name_span, error);
            return Ok(());
        }
        self.scopes.declare_variable(variable)
    }

    /// Infers the type of an expression used as a single value.
    fn check_expr(&mut self, expr: &Expr) -> Inferred {
        match &expr.kind {
            ExprKind::Int(_) => Inferred::Known(TypeTag::int()),
            ExprKind::String(_) => Inferred::Known(TypeTag::string()),
            ExprKind::Bool(_) => Inferred::Known(TypeTag::bool()),
            ExprKind::Id(ident) => match self.scopes.lookup_variable(&ident.name) {
                Some(variable) => Inferred::Known(variable.ty.clone()),
                None => {
                    let error = Error::UndeclaredVariable {
                        name: ident.name.clone(),
                    };
                    self.error(ident.span, error);
                    Inferred::Unknown
                }
            },
            ExprKind::Datatype { name, fields } => self.check_datatype_literal(name, fields),
            ExprKind::Prefix { op, operands } => self.check_operator(*op, operands, expr.span),
            ExprKind::Call { .. } | ExprKind::NamespacedCall { .. } => {
                let Some((function, mut returns)) = self.check_call(expr) else {
                    return Inferred::Unknown;
                };
                if returns.len() == 1 {
                    return returns.pop().map_or(Inferred::Unknown, Inferred::Known);
                }
                let error = Error::NotSingleValue {
                    function,
                    count: returns.len(),
                };
                self.error(expr.span, error);
                Inferred::Unknown
            }
            ExprKind::List(items) => self.check_list(items),
            ExprKind::Dummy => Inferred::Unknown,
        }
    }

    /// Resolves a call and checks its arguments. Returns the function's
    /// display name and its return types, if it was found.
    fn check_call(&mut self, call: &Expr) -> Option<(Box<str>, Vec<TypeTag>)> {
        let (resolved, args) = match &call.kind {
            ExprKind::Call { function, args } => {
                let resolved = match self.scopes.lookup_function(&function.name) {
                    Some(f) => Some((function.name.clone(), f.takes.clone(), f.returns.clone())),
                    None => {
                        let error = Error::UndeclaredFunction {
                            name: function.name.clone(),
                        };
                        self.error(function.span, error);
                        None
                    }
                };
                (resolved, args)
            }
            ExprKind::NamespacedCall {
                namespace,
                function,
                args,
            } => {
                let name: Box<str> = format!("{namespace}::{function}").into();
                let resolved = if !self.stdlib.has_namespace(&namespace.name) {
                    let error = Error::UnknownNamespace {
                        namespace: namespace.name.clone(),
                    };
                    self.error(namespace.span, error);
                    None
                } else if let Some(f) = self.stdlib.get_func(&namespace.name, &function.name) {
                    Some((name, f.takes.clone(), f.returns.clone()))
                } else {
                    self.error(function.span, Error::UndeclaredFunction { name });
                    None
                };
                (resolved, args)
            }
            _ => unreachable!("not a call"),
        };

        let actual: Vec<_> = args.iter().map(|arg| self.check_expr(arg)).collect();
        let (name, takes, returns) = resolved?;
        if takes.len() == actual.len() {
            for ((expected, actual), arg) in takes.iter().zip(&actual).zip(args) {
                self.expect(expected, actual, arg.span);
            }
        } else {
            let error = Error::ArgumentCount {
                function: name.clone(),
                expected: takes.len(),
                actual: actual.len(),
            };
            self.error(call.span, error);
        }
        Some((name, returns))
    }

    fn check_operator(&mut self, op: Operator, operands: &[Expr], span: Span) -> Inferred {
        let actual: Vec<_> = operands.iter().map(|o| self.check_expr(o)).collect();

        let (arity, operand, result) = match op {
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div => {
                (Arity::AtLeastOne, Some(TypeTag::int()), TypeTag::int())
            }
            Operator::And | Operator::Or => {
                (Arity::AtLeastOne, Some(TypeTag::bool()), TypeTag::bool())
            }
            Operator::Not => (Arity::One, Some(TypeTag::bool()), TypeTag::bool()),
            Operator::Lt | Operator::Gt | Operator::Lte | Operator::Gte => {
                (Arity::Two, Some(TypeTag::int()), TypeTag::bool())
            }
            // Any type, as long as both sides agree.
            Operator::Eq => (Arity::Two, None, TypeTag::bool()),
        };

        if !arity.accepts(actual.len()) {
            let error = Error::OperatorArity {
                op,
                expected: arity,
                actual: actual.len(),
            };
            self.error(span, error);
        } else if let Some(operand) = operand {
            for (actual, expr) in actual.iter().zip(operands) {
                self.expect(&operand, actual, expr.span);
            }
        } else if let (Inferred::Known(lhs), rhs) = (&actual[0], &actual[1]) {
            let lhs = lhs.clone();
            self.expect(&lhs, rhs, operands[1].span);
        }

        Inferred::Known(result)
    }

    /// Lists hold scalars of a single type.
    fn check_list(&mut self, items: &[Expr]) -> Inferred {
        let mut element: Option<TypeTag> = None;
        let mut unknown = false;
        for item in items {
            let ty = match self.check_expr(item) {
                Inferred::Known(ty) => ty,
                Inferred::EmptyList => {
                    self.error(item.span, Error::NestedList);
                    continue;
                }
                Inferred::Unknown => {
                    unknown = true;
                    continue;
                }
            };
            if ty.is_list() {
                self.error(item.span, Error::NestedList);
                continue;
            }
            match &element {
                None => element = Some(ty),
                Some(expected) => {
                    let expected = expected.clone();
                    self.expect(&expected, &Inferred::Known(ty), item.span);
                }
            }
        }
        match element {
            Some(element) => Inferred::Known(TypeTag::list_of(element.as_str())),
            None if unknown => Inferred::Unknown,
            None => Inferred::EmptyList,
        }
    }

    fn check_datatype_literal(&mut self, name: &Ident, fields: &[FieldInit]) -> Inferred {
        let Some(datatype) = self.scopes.lookup_datatype(&name.name).cloned() else {
            let error = Error::UndeclaredDatatype {
                name: name.name.clone(),
            };
            self.error(name.span, error);
            for field in fields {
                self.check_expr(&field.value);
            }
            return Inferred::Unknown;
        };

        let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
        for field in fields {
            let actual = self.check_expr(&field.value);
            let field_name = &*field.name.name;
            let Some(expected) = datatype.field(field_name) else {
                let error = Error::UnknownField {
                    datatype: datatype.name.clone(),
                    field: field_name.into(),
                };
                self.error(field.name.span, error);
                continue;
            };
            if seen.contains(&field_name) {
                let error = Error::DuplicateField {
                    datatype: datatype.name.clone(),
                    field: field_name.into(),
                };
                self.error(field.name.span, error);
                continue;
            }
            seen.push(field_name);
            self.expect(expected, &actual, field.value.span);
        }

        for (_, field) in &datatype.fields {
            if !seen.contains(&&**field) {
                let error = Error::MissingField {
                    datatype: datatype.name.clone(),
                    field: field.clone(),
                };
                self.error(name.span, error);
            }
        }

        Inferred::Known(TypeTag::scalar(&datatype.name))
    }

    /// Records a mismatch unless `actual` fits `expected`.
    fn expect(&mut self, expected: &TypeTag, actual: &Inferred, span: Span) {
        let fits = match actual {
            Inferred::Known(actual) => actual == expected,
            Inferred::EmptyList => expected.is_list(),
            Inferred::Unknown => true,
        };
        if !fits {
            let error = Error::TypeMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            };
            self.error(span, error);
        }
    }

    fn error(&mut self, span: Span, error: Error) {
        self.errors.push(span.wrap(error));
    }
}

/// The type an expression was found to have.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inferred {
    Known(TypeTag),
    /// `[]`, which fits any list type.
    EmptyList,
    /// Could not be determined because of an earlier error. Fits anything, so
    /// that one mistake is reported once.
    Unknown,
}

impl fmt::Display for Inferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inferred::Known(ty) => write!(f, "{ty}"),
            Inferred::EmptyList => f.write_str("list"),
            Inferred::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// Number of operands an operator takes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    AtLeastOne,
    One,
    Two,
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::AtLeastOne => count >= 1,
            Arity::One => count == 1,
            Arity::Two => count == 2,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arity::AtLeastOne => "at least one operand",
            Arity::One => "exactly one operand",
            Arity::Two => "exactly two operands",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("function `{name}` is already declared at {first}")]
    DuplicateFunction { name: Box<str>, first: Span },
    #[error("datatype `{name}` is already declared at {first}")]
    DuplicateDatatype { name: Box<str>, first: Span },
    #[error("variable `{name}` is already declared in this scope at {first}")]
    DuplicateVariable { name: Box<str>, first: Span },
    #[error("field `{field}` of `{datatype}` is given more than once")]
    DuplicateField { datatype: Box<str>, field: Box<str> },
    #[error("function `{name}` is not declared")]
    UndeclaredFunction { name: Box<str> },
    #[error("datatype `{name}` is not declared")]
    UndeclaredDatatype { name: Box<str> },
    #[error("variable `{name}` is not declared")]
    UndeclaredVariable { name: Box<str> },
    #[error("unknown namespace `{namespace}`")]
    UnknownNamespace { namespace: Box<str> },
    #[error("datatype `{datatype}` has no field `{field}`")]
    UnknownField { datatype: Box<str>, field: Box<str> },
    #[error("missing field `{field}` of `{datatype}`")]
    MissingField { datatype: Box<str>, field: Box<str> },
    #[error("expected `{expected}`, but got `{actual}`")]
    TypeMismatch { expected: TypeTag, actual: Inferred },
    #[error("`{function}` takes {expected} argument(s), but {actual} were given")]
    ArgumentCount {
        function: Box<str>,
        expected: usize,
        actual: usize,
    },
    #[error("`{op}` takes {expected}, but {actual} were given")]
    OperatorArity {
        op: Operator,
        expected: Arity,
        actual: usize,
    },
    #[error("expected {expected} return value(s), but got {actual}")]
    ReturnCount { expected: usize, actual: usize },
    #[error("`return` outside of a function")]
    ReturnOutsideFunction,
    #[error("`{keyword}` outside of a loop")]
    LoopControlOutsideLoop { keyword: &'static str },
    #[error("`{function}` returns {count} values, but a single value is expected")]
    NotSingleValue { function: Box<str>, count: usize },
    #[error("lists cannot be nested")]
    NestedList,
}

impl ErrorCode for Error {
    const STAGE: Stage = Stage::Analyzer;

    fn code(&self) -> &'static str {
        match self {
            Error::DuplicateFunction { .. } => "A001",
            Error::DuplicateDatatype { .. } => "A002",
            Error::DuplicateVariable { .. } => "A003",
            Error::DuplicateField { .. } => "A004",
            Error::UndeclaredFunction { .. } => "A005",
            Error::UndeclaredDatatype { .. } => "A006",
            Error::UndeclaredVariable { .. } => "A007",
            Error::UnknownNamespace { .. } => "A008",
            Error::UnknownField { .. } => "A009",
            Error::MissingField { .. } => "A010",
            Error::TypeMismatch { .. } => "A011",
            Error::ArgumentCount { .. } => "A012",
            Error::OperatorArity { .. } => "A013",
            Error::ReturnCount { .. } => "A014",
            Error::ReturnOutsideFunction => "A015",
            Error::LoopControlOutsideLoop { .. } => "A016",
            Error::NotSingleValue { .. } => "A017",
            Error::NestedList => "A018",
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{config::Config, util::test_utils::tree_tests};

    fn analyze_clean(src: &str) -> Ir {
        let checked = crate::check(src, &Config::default()).unwrap();
        checked
            .into_ir()
            .unwrap_or_else(|diagnostics| panic!("{diagnostics:#?}"))
    }

    #[test]
    fn test_multiple_return_signature() {
        let ir = analyze_clean("fun f() -> int, bool { return 1, true. }");
        let f = ir.globals.function("f").unwrap();
        assert_eq!(&*f.name, "f");
        assert!(f.takes.is_empty());
        assert_eq!(f.returns, [TypeTag::int(), TypeTag::bool()]);
        assert_eq!((f.takes_count(), f.returns_count()), (0, 2));
    }

    #[test]
    fn test_list_type_tags() {
        let ir = analyze_clean("fun g(listof int nx) -> listof string {}");
        let g = ir.globals.function("g").unwrap();
        assert_eq!(g.takes, ["list-int"]);
        assert_eq!(g.returns, ["list-string"]);
        for tag in g.takes.iter().chain(&g.returns) {
            assert_eq!(&TypeTag::parse(tag.as_str()), tag);
        }
    }

    #[test]
    fn test_duplicate_function_keeps_the_first() {
        let src = "
            fun a() -> int { return 1. }
            fun a() -> bool { return true. }
            int x = a().
        ";
        let lexed = crate::lexer::lex(src, Default::default()).unwrap();
        let parsed = crate::parser::parse_program(lexed.value).unwrap();
        let analyzed = analyze(parsed.value).unwrap();

        assert_eq!(analyzed.errors.len(), 1);
        let error = &analyzed.errors[0];
        assert_eq!(error.inner.code(), "A001");
        assert!(error.inner.to_string().contains("`a` is already declared"));

        let a = analyzed.value.globals.function("a").unwrap();
        assert_eq!(a.returns, [TypeTag::int()]);
        let x = analyzed.value.globals.variable("x").unwrap();
        assert_eq!(x.ty, TypeTag::int());
    }

    tree_tests!(
        use analyzer;

        fn test_signatures() {
            let program = "fun f() -> int, bool { return 1, true. }";
            let tree_ok = "function f() -> int, bool (1:0)";
        }

        fn test_list_signatures() {
            let program = "fun g(listof int nx) -> listof string {}";
            let tree_ok = "function g(list-int) -> list-string (1:0)";
        }

        fn test_identical_duplicate_function() {
            let program = "
                fun a() -> int { return 1. }
                fun a() -> int { return 1. }
                int x = a().
            ";
            let tree_error = "
                function a() -> int (2:16)
                variable int x (4:16)
            ";
            let expected_errors = &["3:20: function `a` is already declared at 2:16"];
        }

        fn test_lookup_is_innermost_first() {
            let program = r#"
                int x = 1.
                fun f() {
                  string x = "shadow".
                  int y = x.
                }
            "#;
            let tree_error = "
                function f() (3:16)
                variable int x (2:16)
            ";
            let expected_errors = &["5:26: expected `int`, but got `string`"];
        }

        fn test_redeclaration_in_the_same_scope() {
            let program = "
                int x = 1.
                bool x = true.
            ";
            let tree_error = "variable int x (2:16)";
            let expected_errors = &["3:21: variable `x` is already declared in this scope at 2:16"];
        }

        fn test_shadowing_in_a_nested_block() {
            let program = "
                int x = 1.
                { int x = 2. }
                block bool x = true. end
            ";
            let tree_ok = "variable int x (2:16)";
        }

        fn test_branch_and_loop_scopes_end_with_their_bodies() {
            let program = "
                fun f() {
                  if true { int t = 1. } elseif false { int v = 2. } else { int u = 3. }
                  loop { int w = 4. break. }
                  loop false { int l = 5. }
                  block int b = 6. end
                  int z = +(t, v, u, w, l, b).
                }
            ";
            let tree_error = "function f() (2:16)";
            let expected_errors = &[
                "7:28: variable `t` is not declared",
                "7:31: variable `v` is not declared",
                "7:34: variable `u` is not declared",
                "7:37: variable `w` is not declared",
                "7:40: variable `l` is not declared",
                "7:43: variable `b` is not declared",
            ];
        }

        fn test_chained_declarations_share_the_type() {
            let program = r#"
                int a = 1, b = 2, c = "3".
            "#;
            let tree_error = "
                variable int a (2:16)
                variable int b (2:27)
                variable int c (2:34)
            ";
            let expected_errors = &[r#"2:38: expected `int`, but got `string`"#];
        }

        fn test_undeclared_names() {
            let program = r#"
                fun main() {
                  Stdout::println(greeting).
                  int n = missing(1).
                  Foo::bar().
                  String::nope("a").
                  Point p = Point{x: 1}.
                }
            "#;
            let tree_error = "function main() (2:16)";
            let expected_errors = &[
                "3:34: variable `greeting` is not declared",
                "4:26: function `missing` is not declared",
                "5:18: unknown namespace `Foo`",
                "6:26: function `String::nope` is not declared",
                "7:18: datatype `Point` is not declared",
                "7:28: datatype `Point` is not declared",
            ];
        }

        fn test_calls_and_datatype_literals() {
            let program = r#"
                datatype Point { int x, int y }
                fun make(int x, int y) -> Point { return Point{x: x, y: y}. }
                fun pair() -> int, int { return 1, 2. }
                fun main() {
                  Point p = make(1, 2).
                  Point q = make(1).
                  int n = pair().
                  string s = Math::pow(2, "3").
                  Point r = Point{x: 1, z: 2, x: 3}.
                }
            "#;
            let tree_error = "
                function make(int, int) -> Point (3:16)
                function pair() -> int, int (4:16)
                function main() (5:16)
                datatype Point { int x, int y } (2:16)
            ";
            let expected_errors = &[
                "7:28: `make` takes 2 argument(s), but 1 were given",
                "8:26: `pair` returns 2 values, but a single value is expected",
                "9:42: expected `int`, but got `string`",
                "9:29: expected `string`, but got `int`",
                "10:40: datatype `Point` has no field `z`",
                "10:46: field `x` of `Point` is given more than once",
                "10:28: missing field `y` of `Point`",
            ];
        }

        fn test_operators_conditions_and_lists() {
            let program = r#"
                fun main() -> bool {
                  int a = +(1, 2, 3).
                  bool b = and(lt(a, 10), not(false)).
                  bool c = =("x", 1).
                  int d = not(1, 2).
                  listof int xs = [1, 2, "three"].
                  listof int ys = [[1]].
                  listof string zs = [].
                  if a { return b. }
                  loop lte(a, 0) { a = -(a, 1). }
                  return c.
                }
            "#;
            let tree_error = "function main() -> bool (2:16)";
            let expected_errors = &[
                "5:34: expected `string`, but got `int`",
                "6:26: `not` takes exactly one operand, but 2 were given",
                "6:26: expected `int`, but got `bool`",
                "7:41: expected `int`, but got `string`",
                "8:35: lists cannot be nested",
                "10:21: expected `bool`, but got `int`",
            ];
        }

        fn test_return_and_loop_control_placement() {
            let program = "
                return 1.
                break.
                fun f() -> int, string {
                  loop { continue. }
                  return 1.
                }
            ";
            let tree_error = "function f() -> int, string (4:16)";
            let expected_errors = &[
                "2:16: `return` outside of a function",
                "3:16: `break` outside of a loop",
                "6:18: expected 2 return value(s), but got 1",
            ];
        }

        fn test_functions_see_globals_declared_before_them() {
            let program = "
                fun show() { Stdout::println(String::from_int(counter)). }
                int counter = 0.
                fun main() { show(). counter = 1. }
            ";
            let tree_error = "
                function show() (2:16)
                function main() (4:16)
                variable int counter (3:16)
            ";
            let expected_errors = &["2:62: variable `counter` is not declared"];
        }

        fn test_datatype_declarations() {
            let program = "
                datatype Line { Point a, Point b, int a }
                datatype Point { int x }
                datatype Line { int len }
            ";
            let tree_error = "
                datatype Line { Point a, Point b, int a } (2:16)
                datatype Point { int x } (3:16)
            ";
            let expected_errors = &[
                "4:25: datatype `Line` is already declared at 2:16",
                "2:54: field `a` of `Line` is given more than once",
            ];
        }

        fn test_analysis_continues_over_a_partial_tree() {
            let program = "
                int x = .
                fun main() { int y = true. }
            ";
            let tree_error = "
                function main() (3:16)
                variable int x (2:16)
            ";
            let expected_errors = &[
                "2:24: expected an expression, but got `.`",
                "3:37: expected `int`, but got `bool`",
            ];
        }

        fn test_standard_library_calls() {
            let program = r#"
                fun main() {
                  listof int xs = List::replace_int([1, 2], 0, 5).
                  string s = String::concat("n = ", String::from_int(Math::sqrt(16))).
                  int i = Int::from_string(s).
                  Stdout::println(s).
                }
            "#;
            let tree_ok = "function main() (2:16)";
        }
    );
}
