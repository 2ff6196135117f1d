//! Signatures of the builtin namespaces.
//!
//! Each namespace is described by a header written in the surface language,
//! where every function is named `Namespace_name` and has an empty body. The
//! headers go through the same lexer and parser as user code.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::StatementKind,
    config::CommentStyle,
    diagnostic::{Fault, SymbolKind},
    ir::IrFunction,
    lexer, parser,
};

pub const HEADERS: &[(&str, &str)] = &[
    (
        "Stdout",
        "fun Stdout_println(string s) {}
         fun Stdout_print(string s) {}
        ",
    ),
    (
        "Math",
        "fun Math_mod(int a, int b) -> int {}
         fun Math_pow(int base, int exponent) -> int {}
         fun Math_sqrt(int n) -> int {}
        ",
    ),
    (
        "String",
        "fun String_from_int(int n) -> string {}
         fun String_from_bool(bool b) -> string {}
         fun String_concat(string a, string b) -> string {}
         fun String_index(string s, string needle) -> int {}
        ",
    ),
    (
        "Int",
        "fun Int_from_string(string s) -> int {}
        ",
    ),
    (
        "List",
        "fun List_replace_int(listof int xs, int at, int value) -> listof int {}
         fun List_replace_string(listof string xs, int at, string value) -> listof string {}
         fun List_replace_bool(listof bool xs, int at, bool value) -> listof bool {}
        ",
    ),
];

/// Per-namespace function tables.
#[derive(Debug, Default)]
pub struct Stdlib {
    namespaces: HashMap<Box<str>, HashMap<Box<str>, IrFunction>>,
}

impl Stdlib {
    /// Builds the tables from [`HEADERS`].
    pub fn load() -> Result<Stdlib, Fault> {
        let src: String = HEADERS.iter().map(|(_, header)| *header).collect();

        let lexed = lexer::lex(&src, CommentStyle::MarkerRun)?;
        if let Some(error) = lexed.errors.first() {
            return Err(malformed(header_at(error.span.lo), error.inner.to_string()));
        }
        let parsed = parser::parse_program(lexed.value)?;
        if let Some(error) = parsed.errors.first() {
            return Err(malformed(header_at(error.span.lo), error.inner.to_string()));
        }

        let mut stdlib = Stdlib::default();
        for statement in &parsed.value.statements {
            let StatementKind::FunDecl(decl) = &statement.kind else {
                let namespace = header_at(statement.span.lo);
                return Err(malformed(namespace, "only functions may be declared".into()));
            };
            let Some((namespace, name)) = decl.name.name.split_once('_') else {
                let namespace = header_at(statement.span.lo);
                let reason = format!("`{}` has no namespace prefix", decl.name);
                return Err(malformed(namespace, reason));
            };
            let function = IrFunction::new(name, decl, statement.span);
            stdlib.add_func(namespace, name, function)?;
        }

        debug!(
            namespaces = stdlib.namespaces.len(),
            functions = stdlib.namespaces.values().map(HashMap::len).sum::<usize>(),
            "loaded standard library"
        );
        Ok(stdlib)
    }

    pub fn get_func(&self, namespace: &str, name: &str) -> Option<&IrFunction> {
        self.namespaces.get(namespace)?.get(name)
    }

    /// Registers `function` as `namespace::name`, creating the namespace if
    /// needed. Registering a name twice is a fault.
    pub fn add_func(
        &mut self,
        namespace: &str,
        name: &str,
        function: IrFunction,
    ) -> Result<(), Fault> {
        let table = self.namespaces.entry(namespace.into()).or_default();
        if table.contains_key(name) {
            return Err(Fault::DuplicateSymbol {
                kind: SymbolKind::Function,
                name: format!("{namespace}::{name}").into(),
                depth: 0,
            });
        }
        table.insert(name.into(), function);
        Ok(())
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }
}

fn malformed(namespace: &str, reason: String) -> Fault {
    Fault::MalformedStdlib {
        namespace: namespace.into(),
        reason,
    }
}

/// Finds the header containing the byte `offset` of the concatenated source.
fn header_at(offset: usize) -> &'static str {
    let mut end = 0;
    for &(namespace, header) in HEADERS {
        end += header.len();
        if offset < end {
            return namespace;
        }
    }
    HEADERS[HEADERS.len() - 1].0
}
