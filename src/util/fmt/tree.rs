use std::io::Write;

use crate::{
    analyzer::Ir,
    ast::*,
    ir::{IrDatatype, IrFunction, IrVariable},
};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(w: &mut impl Write, program: &Program) -> std::io::Result<()> {
    for statement in &program.statements {
        print_statement(w, 0, statement)?;
    }
    Ok(())
}

pub fn print_statement(w: &mut impl Write, i: usize, stmt: &Statement) -> std::io::Result<()> {
    let span = stmt.span;
    match &stmt.kind {
        StatementKind::FunDecl(FunDecl {
            name,
            params,
            returns,
            body,
        }) => {
            sp(w, i)?;
            write!(w, "fun {name}(")?;
            for (idx, param) in params.iter().enumerate() {
                if idx > 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{} {}", param.ty, param.name)?;
            }
            write!(w, ")")?;
            for (idx, ty) in returns.iter().enumerate() {
                let sep = if idx == 0 { " -> " } else { ", " };
                write!(w, "{sep}{ty}")?;
            }
            writeln!(w, " ({span})")?;
            for statement in &body.statements {
                print_statement(w, i + 1, statement)?;
            }
        }
        StatementKind::DatatypeDecl(DatatypeDecl { name, fields }) => {
            sp(w, i)?;
            writeln!(w, "datatype {name} ({span})")?;
            for field in fields {
                sp(w, i + 1)?;
                writeln!(w, "field {} {}", field.ty, field.name)?;
            }
        }
        StatementKind::VarDecl(decl) => {
            sp(w, i)?;
            writeln!(w, "var {} {} ({span})", decl.ty, decl.name)?;
            print_expr(w, i + 1, &decl.value)?;
        }
        StatementKind::SubsequentVarDecl(decl) => {
            sp(w, i)?;
            writeln!(w, "chained var {} {} ({span})", decl.ty, decl.name)?;
            print_expr(w, i + 1, &decl.value)?;
        }
        StatementKind::Reassign { target, value } => {
            sp(w, i)?;
            writeln!(w, "reassign {target} ({span})")?;
            print_expr(w, i + 1, value)?;
        }
        StatementKind::If(IfChain {
            branches,
            otherwise,
        }) => {
            sp(w, i)?;
            writeln!(w, "if ({span})")?;
            for branch in branches {
                sp(w, i + 1)?;
                writeln!(w, "branch")?;
                print_expr(w, i + 2, &branch.condition)?;
                print_block(w, i + 2, &branch.body)?;
            }
            if let Some(otherwise) = otherwise {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_block(w, i + 2, otherwise)?;
            }
        }
        StatementKind::Loop { condition, body } => {
            sp(w, i)?;
            writeln!(w, "loop ({span})")?;
            if let Some(condition) = condition {
                print_expr(w, i + 1, condition)?;
            }
            print_block(w, i + 1, body)?;
        }
        StatementKind::Block(block) => print_block(w, i, block)?,
        StatementKind::Return(values) => {
            sp(w, i)?;
            writeln!(w, "return ({span})")?;
            for value in values {
                print_expr(w, i + 1, value)?;
            }
        }
        StatementKind::Call(call) => print_expr(w, i, call)?,
        StatementKind::Break => {
            sp(w, i)?;
            writeln!(w, "break ({span})")?;
        }
        StatementKind::Continue => {
            sp(w, i)?;
            writeln!(w, "continue ({span})")?;
        }
    }
    Ok(())
}

fn print_block(w: &mut impl Write, i: usize, block: &Block) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "block ({})", block.span)?;
    for statement in &block.statements {
        print_statement(w, i + 1, statement)?;
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Int(val) => {
            writeln!(w, "int {val} ({span})")?;
        }
        ExprKind::String(val) => {
            writeln!(w, "string {val:?} ({span})")?;
        }
        ExprKind::Bool(val) => {
            writeln!(w, "bool {val} ({span})")?;
        }
        ExprKind::Id(ident) => {
            writeln!(w, "ident {ident} ({span})")?;
        }
        ExprKind::Datatype { name, fields } => {
            writeln!(w, "datatype {name} ({span})")?;
            for field in fields {
                sp(w, i + 1)?;
                writeln!(w, "field {}", field.name)?;
                print_expr(w, i + 2, &field.value)?;
            }
        }
        ExprKind::Prefix { op, operands } => {
            writeln!(w, "prefix {op} ({span})")?;
            for operand in operands {
                print_expr(w, i + 1, operand)?;
            }
        }
        ExprKind::Call { function, args } => {
            writeln!(w, "call {function} ({span})")?;
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
        ExprKind::NamespacedCall {
            namespace,
            function,
            args,
        } => {
            writeln!(w, "call {namespace}::{function} ({span})")?;
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
        ExprKind::List(items) => {
            writeln!(w, "list ({span})")?;
            for item in items {
                print_expr(w, i + 1, item)?;
            }
        }
        ExprKind::Dummy => {
            writeln!(w, "dummy ({span})")?;
        }
    }
    Ok(())
}

pub fn print_ir_string(ir: &Ir) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_ir(&mut buf, ir).unwrap();
    String::from_utf8(buf).unwrap()
}

/// Prints the global declarations, each group in source order.
pub fn print_ir(w: &mut impl Write, ir: &Ir) -> std::io::Result<()> {
    let mut functions: Vec<_> = ir.globals.functions().collect();
    functions.sort_by_key(|f| f.span.lo);
    for function in functions {
        print_function(w, function)?;
    }

    let mut datatypes: Vec<_> = ir.globals.datatypes().collect();
    datatypes.sort_by_key(|d| d.span.lo);
    for datatype in datatypes {
        print_datatype(w, datatype)?;
    }

    let mut variables: Vec<_> = ir.globals.variables().collect();
    variables.sort_by_key(|v| v.span.lo);
    for variable in variables {
        print_variable(w, variable)?;
    }
    Ok(())
}

fn print_function(w: &mut impl Write, function: &IrFunction) -> std::io::Result<()> {
    write!(w, "function {}(", function.name)?;
    for (idx, ty) in function.takes.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{ty}")?;
    }
    write!(w, ")")?;
    for (idx, ty) in function.returns.iter().enumerate() {
        let sep = if idx == 0 { " -> " } else { ", " };
        write!(w, "{sep}{ty}")?;
    }
    writeln!(w, " ({})", function.span)
}

fn print_datatype(w: &mut impl Write, datatype: &IrDatatype) -> std::io::Result<()> {
    write!(w, "datatype {} {{", datatype.name)?;
    for (idx, (ty, name)) in datatype.fields.iter().enumerate() {
        let sep = if idx == 0 { " " } else { ", " };
        write!(w, "{sep}{ty} {name}")?;
    }
    if !datatype.fields.is_empty() {
        write!(w, " ")?;
    }
    writeln!(w, "}} ({})", datatype.span)
}

fn print_variable(w: &mut impl Write, variable: &IrVariable) -> std::io::Result<()> {
    writeln!(w, "variable {} {} ({})", variable.ty, variable.name, variable.span)
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
