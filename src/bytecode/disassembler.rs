//! Bytecode disassembler for debugging.

use std::fmt::{self, Write};

use crate::bytecode::chunk::{Bytecode, Instructions};
use crate::bytecode::instruction::{read_operands, OpCode};
use crate::interpreter::value::Value;

/// Disassemble an instruction stream, one instruction per line.
pub fn disassemble_instructions(instructions: &Instructions) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write_instructions(&mut output, instructions, None);
    output
}

/// Disassemble a whole bytecode bundle: the top-level stream with constant
/// annotations, followed by every compiled function in the constant pool.
pub fn disassemble_bytecode(bytecode: &Bytecode) -> String {
    let mut output = String::new();
    let _ = write_bytecode(&mut output, bytecode);
    output
}

fn write_bytecode(output: &mut String, bytecode: &Bytecode) -> fmt::Result {
    writeln!(output, "== <main> ==")?;
    write_instructions(output, &bytecode.instructions, Some(bytecode.constants.as_slice()))?;

    for (index, constant) in bytecode.constants.iter().enumerate() {
        if let Value::CompiledFunction(function) = constant {
            writeln!(output)?;
            writeln!(
                output,
                "== constant {} (params: {}, locals: {}) ==",
                index, function.num_parameters, function.num_locals
            )?;
            write_instructions(output, &function.instructions, Some(bytecode.constants.as_slice()))?;
        }
    }

    Ok(())
}

/// Write every instruction of `instructions` to `output`.
pub fn write_instructions<W: Write>(
    output: &mut W,
    instructions: &Instructions,
    constants: Option<&[Value]>,
) -> fmt::Result {
    let mut offset = 0;
    while offset < instructions.code.len() {
        offset = write_instruction(output, instructions, offset, constants)?;
    }
    Ok(())
}

/// Write a single instruction and return the offset of the next one.
pub fn write_instruction<W: Write>(
    output: &mut W,
    instructions: &Instructions,
    offset: usize,
    constants: Option<&[Value]>,
) -> Result<usize, fmt::Error> {
    let byte = instructions.code[offset];
    let opcode = match OpCode::from_u8(byte) {
        Some(op) => op,
        None => {
            writeln!(output, "{:04} Unknown opcode {}", offset, byte)?;
            return Ok(offset + 1);
        }
    };

    let (operands, read) = read_operands(opcode, &instructions.code[offset + 1..]);

    write!(output, "{:04} {:?}", offset, opcode)?;
    for operand in &operands {
        write!(output, " {}", operand)?;
    }

    match (opcode, constants) {
        (OpCode::Constant | OpCode::Closure, Some(pool)) => {
            if let Some(constant) = pool.get(operands[0]) {
                write!(output, " ({})", constant_str(constant))?;
            }
        }
        _ => {}
    }
    writeln!(output)?;

    Ok(offset + 1 + read)
}

/// Convert a constant to a display string.
fn constant_str(constant: &Value) -> String {
    match constant {
        Value::String(s) => {
            if s.chars().count() > 20 {
                let head: String = s.chars().take(20).collect();
                format!("\"{}...\"", head)
            } else {
                format!("{:?}", s)
            }
        }
        Value::CompiledFunction(f) => format!("<compiled fn/{}>", f.num_parameters),
        other => other.to_string(),
    }
}

/// Print disassembly to stdout.
pub fn print_disassembly(bytecode: &Bytecode) {
    print!("{}", disassemble_bytecode(bytecode));
}
