//! monkey-core: the runtime core of a small dynamically-typed scripting
//! language.
//!
//! This is the library root that exports all modules.
//!
//! # Execution Modes
//!
//! Two engines give programs their meaning and agree on every observable
//! behavior:
//! - **Tree-walk interpreter**: evaluates an [`ast::Program`] directly
//!   against an environment chain
//! - **Bytecode VM**: executes the instruction stream and constant pool a
//!   compiler produces
//!
//! Lexing, parsing and compilation live outside this crate.

// Allow some clippy lints that are stylistic and not critical
#![allow(clippy::module_inception)]
#![allow(clippy::new_without_default)]
#![allow(clippy::len_zero)]

pub mod ast;
pub mod bytecode;
pub mod config;
pub mod error;
pub mod interpreter;

#[cfg(test)]
mod conformance;

use bytecode::{Bytecode, VM};
use config::RuntimeConfig;
use error::MonkeyError;
use interpreter::{Env, Environment, Interpreter, Value};

/// Evaluate a program in a fresh top-level environment.
pub fn run_program(program: &ast::Program) -> Result<Value, MonkeyError> {
    run_program_in(program, &Environment::shared())
}

/// Evaluate a program against an existing environment, so bindings carry
/// over from one program to the next.
///
/// Tracing follows `MONKEY_TRACE`.
pub fn run_program_in(program: &ast::Program, env: &Env) -> Result<Value, MonkeyError> {
    let interpreter = Interpreter::with_config(RuntimeConfig::from_env());
    match interpreter.evaluate(program, env) {
        Value::Error(message) => Err(MonkeyError::Eval(message.to_string())),
        value => Ok(value),
    }
}

/// Execute bytecode on a fresh VM and return the last popped value.
pub fn run_bytecode(bytecode: Bytecode) -> Result<Value, MonkeyError> {
    run_bytecode_with_disassembly(bytecode, false)
}

/// Execute bytecode, optionally printing its disassembly first.
pub fn run_bytecode_with_disassembly(
    bytecode: Bytecode,
    disassemble: bool,
) -> Result<Value, MonkeyError> {
    if disassemble {
        bytecode::print_disassembly(&bytecode);
        println!("---");
    }

    let mut vm = VM::new(bytecode).with_config(RuntimeConfig::from_env());
    vm.run()?;
    Ok(vm.last_popped().clone())
}

/// Execute bytecode over globals from an earlier run and hand them back
/// alongside the last popped value.
pub fn run_bytecode_with_globals(
    bytecode: Bytecode,
    globals: Vec<Value>,
) -> Result<(Value, Vec<Value>), MonkeyError> {
    let mut vm = VM::with_globals(bytecode, globals).with_config(RuntimeConfig::from_env());
    vm.run()?;
    let result = vm.last_popped().clone();
    Ok((result, vm.into_globals()))
}

/// Disassemble bytecode to a string.
pub fn disassemble(bytecode: &Bytecode) -> String {
    bytecode::disassemble_bytecode(bytecode)
}
