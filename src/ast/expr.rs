//! Expression AST nodes.

use std::fmt;
use std::rc::Rc;

use crate::ast::stmt::Block;

/// All expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable reference: foo
    Identifier(String),
    /// Integer literal: 42
    IntLiteral(i64),
    /// Boolean literal: true, false
    BoolLiteral(bool),
    /// String literal: "hello"
    StringLiteral(String),

    /// Unary operation: -x, !x
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },

    /// Binary operation: a + b
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },

    /// Conditional: if (cond) { ... } else { ... }
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },

    /// Function literal: fn(a, b) { ... }
    ///
    /// The body is shared so that every closure created from this literal
    /// points at the same block instead of copying it.
    Function {
        parameters: Vec<String>,
        body: Rc<Block>,
    },

    /// Function call: foo(a, b)
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// Array literal: [1, 2, 3]
    Array(Vec<Expr>),

    /// Index access: arr[index], hash[key]
    Index { object: Box<Expr>, index: Box<Expr> },

    /// Hash literal: {"key": value, ...}, pairs in source order
    Hash(Vec<(Expr, Expr)>),
}

impl Expr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::IntLiteral(value)
    }

    pub fn bool(value: bool) -> Self {
        Expr::BoolLiteral(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::StringLiteral(value.into())
    }

    pub fn unary(operator: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn if_else(condition: Expr, consequence: Block, alternative: Option<Block>) -> Self {
        Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        }
    }

    pub fn function<S: Into<String>>(parameters: impl IntoIterator<Item = S>, body: Block) -> Self {
        Expr::Function {
            parameters: parameters.into_iter().map(Into::into).collect(),
            body: Rc::new(body),
        }
    }

    pub fn call(callee: Expr, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Expr::Array(elements)
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
        }
    }

    pub fn hash(pairs: Vec<(Expr, Expr)>) -> Self {
        Expr::Hash(pairs)
    }

    /// Short node name, used by execution tracing.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Identifier(_) => "Identifier",
            Expr::IntLiteral(_) => "IntLiteral",
            Expr::BoolLiteral(_) => "BoolLiteral",
            Expr::StringLiteral(_) => "StringLiteral",
            Expr::Unary { .. } => "Unary",
            Expr::Binary { .. } => "Binary",
            Expr::If { .. } => "If",
            Expr::Function { .. } => "Function",
            Expr::Call { .. } => "Call",
            Expr::Array(_) => "Array",
            Expr::Index { .. } => "Index",
            Expr::Hash(_) => "Hash",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::IntLiteral(n) => write!(f, "{}", n),
            Expr::BoolLiteral(b) => write!(f, "{}", b),
            Expr::StringLiteral(s) => write!(f, "{:?}", s),
            Expr::Unary { operator, operand } => write!(f, "({}{})", operator, operand),
            Expr::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::Function { parameters, body } => {
                write!(f, "fn({}) {}", parameters.join(", "), body)
            }
            Expr::Call { callee, arguments } => {
                write!(f, "{}(", callee)?;
                write_joined(f, arguments)?;
                write!(f, ")")
            }
            Expr::Array(elements) => {
                write!(f, "[")?;
                write_joined(f, elements)?;
                write!(f, "]")
            }
            Expr::Index { object, index } => write!(f, "({}[{}])", object, index),
            Expr::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Less,
    Greater,
    Equal,
    NotEqual,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Subtract => write!(f, "-"),
            BinaryOp::Multiply => write!(f, "*"),
            BinaryOp::Divide => write!(f, "/"),
            BinaryOp::Less => write!(f, "<"),
            BinaryOp::Greater => write!(f, ">"),
            BinaryOp::Equal => write!(f, "=="),
            BinaryOp::NotEqual => write!(f, "!="),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}
