//! Resolved declarations, as recorded by the analyzer in the symbol tables.

use crate::{
    ast::{Block, DatatypeDecl, Expr, FunDecl},
    token::Span,
    types::TypeTag,
};

/// A function signature together with its body.
#[derive(Clone, Debug, PartialEq)]
pub struct IrFunction {
    pub name: Box<str>,
    /// Parameter type tags, in declaration order.
    pub takes: Vec<TypeTag>,
    /// Return type tags, in declaration order.
    pub returns: Vec<TypeTag>,
    pub body: Block,
    pub span: Span,
}

impl IrFunction {
    /// Builds the signature of `decl`, registered under `name`.
    pub fn new(name: &str, decl: &FunDecl, span: Span) -> IrFunction {
        IrFunction {
            name: name.into(),
            takes: decl.params.iter().map(|p| p.ty.tag()).collect(),
            returns: decl.returns.iter().map(|r| r.tag()).collect(),
            body: decl.body.clone(),
            span,
        }
    }

    pub fn takes_count(&self) -> usize {
        self.takes.len()
    }

    pub fn returns_count(&self) -> usize {
        self.returns.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrDatatype {
    pub name: Box<str>,
    /// `(type, name)` pairs, in declaration order.
    pub fields: Vec<(TypeTag, Box<str>)>,
    pub span: Span,
}

impl IrDatatype {
    pub fn new(decl: &DatatypeDecl, span: Span) -> IrDatatype {
        IrDatatype {
            name: decl.name.name.clone(),
            fields: decl
                .fields
                .iter()
                .map(|f| (f.ty.tag(), f.name.name.clone()))
                .collect(),
            span,
        }
    }

    /// Returns the type of the first field called `name`.
    pub fn field(&self, name: &str) -> Option<&TypeTag> {
        self.fields
            .iter()
            .find_map(|(ty, field)| (&**field == name).then_some(ty))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrVariable {
    pub name: Box<str>,
    pub ty: TypeTag,
    /// The initializer; parameters have none.
    pub value: Option<Expr>,
    pub span: Span,
}
