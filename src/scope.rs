use std::collections::{hash_map::Entry, HashMap};

use tracing::trace;

use crate::{
    diagnostic::{Fault, SymbolKind},
    ir::{IrDatatype, IrFunction, IrVariable},
};

/// Names declared in one scope. Each kind of symbol has its own namespace, and
/// names are unique within it: inserting a name twice is rejected.
#[derive(Debug, Default)]
pub struct SymbolTable {
    variables: HashMap<Box<str>, IrVariable>,
    functions: HashMap<Box<str>, IrFunction>,
    datatypes: HashMap<Box<str>, IrDatatype>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn variable(&self, name: &str) -> Option<&IrVariable> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.get(name)
    }

    pub fn datatype(&self, name: &str) -> Option<&IrDatatype> {
        self.datatypes.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &IrVariable> {
        self.variables.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &IrFunction> {
        self.functions.values()
    }

    pub fn datatypes(&self) -> impl Iterator<Item = &IrDatatype> {
        self.datatypes.values()
    }

    /// Inserts the variable unless its name is taken. Returns whether it was
    /// inserted.
    pub fn insert_variable(&mut self, variable: IrVariable) -> bool {
        insert(&mut self.variables, variable.name.clone(), variable)
    }

    pub fn insert_function(&mut self, function: IrFunction) -> bool {
        insert(&mut self.functions, function.name.clone(), function)
    }

    pub fn insert_datatype(&mut self, datatype: IrDatatype) -> bool {
        insert(&mut self.datatypes, datatype.name.clone(), datatype)
    }
}

fn insert<T>(map: &mut HashMap<Box<str>, T>, name: Box<str>, value: T) -> bool {
    match map.entry(name) {
        Entry::Occupied(_) => false,
        Entry::Vacant(entry) => {
            entry.insert(value);
            true
        }
    }
}

#[derive(Debug, Default)]
pub struct Scope {
    pub table: SymbolTable,
}

/// The stack of open scopes.
///
/// Index 0 is the global scope, which always exists. Functions and datatypes
/// live there exclusively; variables go to the innermost scope.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack {
            scopes: vec![Scope::default()],
        }
    }

    /// Number of open scopes, counting the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
        trace!(depth = self.depth(), "pushed scope");
    }

    pub fn pop(&mut self) -> Result<(), Fault> {
        if self.scopes.len() == 1 {
            return Err(Fault::PopGlobalScope);
        }
        self.scopes.pop();
        trace!(depth = self.depth(), "popped scope");
        Ok(())
    }

    pub fn global(&self) -> &SymbolTable {
        &self.scopes[0].table
    }

    pub fn current(&self) -> &SymbolTable {
        &self.current_scope().table
    }

    fn current_scope(&self) -> &Scope {
        self.scopes.last().unwrap_or(&self.scopes[0])
    }

    /// Declares a function in the global scope. The caller must have checked
    /// that the name is free.
    pub fn declare_function(&mut self, function: IrFunction) -> Result<(), Fault> {
        let name = function.name.clone();
        if !self.scopes[0].table.insert_function(function) {
            return Err(duplicate(SymbolKind::Function, name, 0));
        }
        trace!(%name, "declared function");
        Ok(())
    }

    /// Declares a datatype in the global scope. The caller must have checked
    /// that the name is free.
    pub fn declare_datatype(&mut self, datatype: IrDatatype) -> Result<(), Fault> {
        let name = datatype.name.clone();
        if !self.scopes[0].table.insert_datatype(datatype) {
            return Err(duplicate(SymbolKind::Datatype, name, 0));
        }
        trace!(%name, "declared datatype");
        Ok(())
    }

    /// Declares a variable in the innermost scope. The caller must have
    /// checked that the name is free there.
    pub fn declare_variable(&mut self, variable: IrVariable) -> Result<(), Fault> {
        let depth = self.scopes.len() - 1;
        let name = variable.name.clone();
        if !self.scopes[depth].table.insert_variable(variable) {
            return Err(duplicate(SymbolKind::Variable, name, depth));
        }
        trace!(%name, depth, "declared variable");
        Ok(())
    }

    /// Finds a variable, searching from the innermost scope outwards, so inner
    /// declarations shadow outer ones.
    pub fn lookup_variable(&self, name: &str) -> Option<&IrVariable> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.table.variable(name))
    }

    pub fn lookup_function(&self, name: &str) -> Option<&IrFunction> {
        self.global().function(name)
    }

    pub fn lookup_datatype(&self, name: &str) -> Option<&IrDatatype> {
        self.global().datatype(name)
    }

    /// Consumes the stack, keeping only the global symbol table.
    pub fn into_global(mut self) -> SymbolTable {
        debug_assert_eq!(self.scopes.len(), 1, "unbalanced scopes");
        self.scopes.swap_remove(0).table
    }
}

fn duplicate(kind: SymbolKind, name: Box<str>, depth: usize) -> Fault {
    Fault::DuplicateSymbol { kind, name, depth }
}
