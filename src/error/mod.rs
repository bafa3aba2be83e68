//! Error types for the bytecode VM and the crate as a whole.
//!
//! The tree-walking evaluator reports failures as `Value::Error` inside the
//! normal value channel; only the VM aborts through `Result`.

use thiserror::Error;

use crate::bytecode::instruction::OpCode;

/// Errors that abort a VM run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("stack overflow")]
    StackOverflow,

    #[error("unsupported types for binary operation: {left} {op:?} {right}")]
    UnsupportedTypes {
        op: OpCode,
        left: &'static str,
        right: &'static str,
    },

    #[error("unsupported operator for string: {0:?}")]
    UnsupportedStringOperator(OpCode),

    #[error("unknown operator: {left} {op:?} {right}")]
    UnknownOperator {
        op: OpCode,
        left: &'static str,
        right: &'static str,
    },

    #[error("unsupported type for negation: {0}")]
    UnsupportedNegation(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),

    #[error("index operator not supported: {0}")]
    IndexNotSupported(&'static str),

    #[error("calling non-function and non-built-in: {0}")]
    NotCallable(&'static str),

    #[error("wrong number of arguments: want={expected}, got={got}")]
    WrongArity { expected: usize, got: usize },

    #[error("not a function: {0}")]
    NotAFunction(&'static str),

    #[error("unknown builtin index {0}")]
    UnknownBuiltin(usize),

    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
}

impl VmError {
    pub fn unsupported_types(op: OpCode, left: &'static str, right: &'static str) -> Self {
        Self::UnsupportedTypes { op, left, right }
    }

    pub fn unknown_operator(op: OpCode, left: &'static str, right: &'static str) -> Self {
        Self::UnknownOperator { op, left, right }
    }

    pub fn wrong_arity(expected: usize, got: usize) -> Self {
        Self::WrongArity { expected, got }
    }
}

/// A unified error type for embedders driving either engine.
#[derive(Debug, Error)]
pub enum MonkeyError {
    #[error("Runtime error: {0}")]
    Vm(#[from] VmError),

    /// An evaluator result that ended in an error value.
    #[error("Evaluation error: {0}")]
    Eval(String),
}
