//! Bytecode instruction definitions and the operand wire format.
//!
//! Every instruction is a one-byte opcode followed by zero or more operands.
//! Operands are unsigned big-endian integers whose widths are fixed per
//! opcode. The external compiler and the VM must agree on these widths.

/// Opcodes for the bytecode virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ============ Constants & Stack ============
    /// Load a constant from the constant pool: CONSTANT <index:u16>
    Constant = 0,
    /// Pop the top value from the stack
    Pop,
    /// Push true onto the stack
    True,
    /// Push false onto the stack
    False,
    /// Push null onto the stack
    Null,

    // ============ Arithmetic ============
    /// Add two values: a + b
    Add,
    /// Subtract two values: a - b
    Sub,
    /// Multiply two values: a * b
    Mul,
    /// Divide two values: a / b
    Div,

    // ============ Comparison ============
    /// Equal: a == b
    Equal,
    /// Not equal: a != b
    NotEqual,
    /// Greater than: a > b (the compiler swaps operands for <)
    Greater,

    // ============ Unary ============
    /// Negate an integer: -a
    Minus,
    /// Logical not: !a
    Bang,

    // ============ Control Flow ============
    /// Jump if falsy (pops the condition): JUMP_NOT_TRUTHY <target:u16>
    JumpNotTruthy,
    /// Unconditional jump: JUMP <target:u16>
    Jump,

    // ============ Variables ============
    /// Read a global slot: GET_GLOBAL <slot:u16>
    GetGlobal,
    /// Pop into a global slot: SET_GLOBAL <slot:u16>
    SetGlobal,
    /// Read a frame-relative local slot: GET_LOCAL <slot:u8>
    GetLocal,
    /// Pop into a frame-relative local slot: SET_LOCAL <slot:u8>
    SetLocal,
    /// Push a builtin function: GET_BUILTIN <index:u8>
    GetBuiltin,
    /// Push a captured free variable: GET_FREE <index:u8>
    GetFree,

    // ============ Collections ============
    /// Build an array from the top values: ARRAY <count:u16>
    Array,
    /// Build a hash from the top key/value values: HASH <count:u16>
    Hash,
    /// Get element by index: obj[index]
    Index,

    // ============ Functions & Calls ============
    /// Call the value below the arguments: CALL <arg_count:u8>
    Call,
    /// Return the top of stack from the current function
    ReturnValue,
    /// Return null from the current function
    Return,
    /// Create a closure: CLOSURE <const_index:u16> <free_count:u8>
    Closure,
    /// Push the closure currently executing
    CurrentClosure,
}

/// Every opcode, in discriminant order.
const ALL_OPCODES: [OpCode; 30] = [
    OpCode::Constant,
    OpCode::Pop,
    OpCode::True,
    OpCode::False,
    OpCode::Null,
    OpCode::Add,
    OpCode::Sub,
    OpCode::Mul,
    OpCode::Div,
    OpCode::Equal,
    OpCode::NotEqual,
    OpCode::Greater,
    OpCode::Minus,
    OpCode::Bang,
    OpCode::JumpNotTruthy,
    OpCode::Jump,
    OpCode::GetGlobal,
    OpCode::SetGlobal,
    OpCode::GetLocal,
    OpCode::SetLocal,
    OpCode::GetBuiltin,
    OpCode::GetFree,
    OpCode::Array,
    OpCode::Hash,
    OpCode::Index,
    OpCode::Call,
    OpCode::ReturnValue,
    OpCode::Return,
    OpCode::Closure,
    OpCode::CurrentClosure,
];

impl OpCode {
    /// Widths in bytes of each operand that follows this opcode.
    pub fn operand_widths(self) -> &'static [usize] {
        match self {
            OpCode::Pop
            | OpCode::True
            | OpCode::False
            | OpCode::Null
            | OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Equal
            | OpCode::NotEqual
            | OpCode::Greater
            | OpCode::Minus
            | OpCode::Bang
            | OpCode::Index
            | OpCode::ReturnValue
            | OpCode::Return
            | OpCode::CurrentClosure => &[],

            OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetBuiltin
            | OpCode::GetFree
            | OpCode::Call => &[1],

            OpCode::Constant
            | OpCode::JumpNotTruthy
            | OpCode::Jump
            | OpCode::GetGlobal
            | OpCode::SetGlobal
            | OpCode::Array
            | OpCode::Hash => &[2],

            OpCode::Closure => &[2, 1],
        }
    }

    /// Total number of operand bytes for this opcode.
    pub fn operand_size(self) -> usize {
        self.operand_widths().iter().sum()
    }

    /// Convert from u8 to OpCode.
    pub fn from_u8(byte: u8) -> Option<OpCode> {
        ALL_OPCODES.get(byte as usize).copied()
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

/// Encode one instruction.
///
/// Operands wider than their slot are truncated to the slot width.
pub fn make(op: OpCode, operands: &[usize]) -> Vec<u8> {
    let widths = op.operand_widths();
    let mut instruction = Vec::with_capacity(1 + op.operand_size());
    instruction.push(op as u8);

    for (operand, width) in operands.iter().zip(widths) {
        match *width {
            2 => instruction.extend_from_slice(&(*operand as u16).to_be_bytes()),
            1 => instruction.push(*operand as u8),
            _ => unreachable!("operand widths are 1 or 2 bytes"),
        }
    }

    instruction
}

/// Decode the operands of `op` from the bytes that follow it.
///
/// Returns the operands and the number of bytes consumed.
pub fn read_operands(op: OpCode, bytes: &[u8]) -> (Vec<usize>, usize) {
    let widths = op.operand_widths();
    let mut operands = Vec::with_capacity(widths.len());
    let mut offset = 0;

    for width in widths {
        match *width {
            2 => operands.push(read_u16(&bytes[offset..]) as usize),
            1 => operands.push(read_u8(&bytes[offset..]) as usize),
            _ => unreachable!("operand widths are 1 or 2 bytes"),
        }
        offset += width;
    }

    (operands, offset)
}

/// Read a big-endian u16 from the start of `bytes`.
pub fn read_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Read a u8 from the start of `bytes`.
pub fn read_u8(bytes: &[u8]) -> u8 {
    bytes[0]
}
