//! Statement AST nodes.

use std::fmt;

use crate::ast::expr::Expr;

/// A whole program: the top-level statement list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// A braced statement list: function bodies and conditional branches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{ ")?;
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", stmt)?;
        }
        write!(f, " }}")
    }
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Variable binding: let x = expr;
    Let { name: String, value: Expr },

    /// Return statement: return expr;
    Return(Expr),

    /// Expression statement: expr;
    Expression(Expr),
}

impl Stmt {
    pub fn let_binding(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Let {
            name: name.into(),
            value,
        }
    }

    pub fn return_value(value: Expr) -> Self {
        Stmt::Return(value)
    }

    pub fn expression(expr: Expr) -> Self {
        Stmt::Expression(expr)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Let { .. } => "Let",
            Stmt::Return(_) => "Return",
            Stmt::Expression(_) => "Expression",
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {}", name, value),
            Stmt::Return(value) => write!(f, "return {}", value),
            Stmt::Expression(expr) => write!(f, "{}", expr),
        }
    }
}
