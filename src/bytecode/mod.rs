//! Bytecode module: the instruction wire format and the virtual machine.
//!
//! Compilation from the AST happens outside this crate; the VM consumes the
//! instruction stream and constant pool a compiler hands over.
//!
//! # Architecture
//!
//! - `instruction`: OpCode definitions, operand widths, encoding and decoding
//! - `chunk`: Instruction streams, compiled functions and closures
//! - `vm`: Stack-based virtual machine for executing bytecode
//! - `disassembler`: Debug output for bytecode inspection

pub mod chunk;
pub mod disassembler;
pub mod instruction;
pub mod vm;

pub use chunk::{Bytecode, Closure, CompiledFunction, Instructions};
pub use disassembler::{disassemble_bytecode, disassemble_instructions, print_disassembly};
pub use instruction::{make, read_operands, read_u16, read_u8, OpCode};
pub use vm::{VMResult, GLOBALS_SIZE, STACK_SIZE, VM};
