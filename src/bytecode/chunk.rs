//! Instruction streams, compiled functions and the bytecode bundle the VM
//! consumes.

use std::fmt;
use std::rc::Rc;

use crate::bytecode::disassembler::disassemble_instructions;
use crate::bytecode::instruction::{make, OpCode};
use crate::interpreter::value::Value;

/// A flat stream of encoded instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Instructions {
    /// The raw bytecode.
    pub code: Vec<u8>,
}

impl Instructions {
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    /// Concatenate already-encoded instructions (see [`make`]).
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            code: parts.into_iter().flatten().collect(),
        }
    }

    /// Append one instruction and return the offset it starts at.
    pub fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        let position = self.code.len();
        self.code.extend(make(op, operands));
        position
    }

    /// Re-encode the single-operand instruction at `position` with a new
    /// operand, e.g. to back-patch a jump target once it is known.
    ///
    /// Panics if `position` does not start a single-operand instruction.
    pub fn change_operand(&mut self, position: usize, operand: usize) {
        let op = match OpCode::from_u8(self.code[position]) {
            Some(op) if op.operand_widths().len() == 1 => op,
            _ => panic!("no single-operand instruction at offset {}", position),
        };
        let replacement = make(op, &[operand]);
        self.code[position..position + replacement.len()].copy_from_slice(&replacement);
    }

    /// Offset the next emitted instruction will start at.
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(code: Vec<u8>) -> Self {
        Self { code }
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&disassemble_instructions(self))
    }
}

/// Output of the external compiler: the top-level stream and its constants.
#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

impl Bytecode {
    pub fn new(instructions: Instructions, constants: Vec<Value>) -> Self {
        Self {
            instructions,
            constants,
        }
    }
}

/// A compiled function body (bytecode representation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    /// Local slots reserved on the stack when a frame is entered,
    /// parameters included.
    pub num_locals: usize,
    pub num_parameters: usize,
}

impl CompiledFunction {
    pub fn new(instructions: Instructions, num_locals: usize, num_parameters: usize) -> Self {
        Self {
            instructions,
            num_locals,
            num_parameters,
        }
    }
}

/// A compiled function paired with the free variables it captured.
#[derive(Debug, Clone)]
pub struct Closure {
    pub function: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

impl Closure {
    pub fn new(function: Rc<CompiledFunction>) -> Self {
        Self {
            function,
            free: Vec::new(),
        }
    }

    pub fn with_free(function: Rc<CompiledFunction>, free: Vec<Value>) -> Self {
        Self { function, free }
    }
}
