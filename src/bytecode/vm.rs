//! Stack-based virtual machine for executing bytecode.

use std::rc::Rc;

use colored::Colorize;

use crate::bytecode::chunk::{Bytecode, Closure, CompiledFunction};
use crate::bytecode::disassembler::write_instruction;
use crate::bytecode::instruction::{read_u16, OpCode};
use crate::config::RuntimeConfig;
use crate::error::VmError;
use crate::interpreter::builtins;
use crate::interpreter::value::{new_hash_pairs, HashPair, Value};

/// Operand stack capacity.
pub const STACK_SIZE: usize = 2048;
/// Number of global slots.
pub const GLOBALS_SIZE: usize = 65536;

/// Result type for VM operations.
pub type VMResult<T> = Result<T, VmError>;

/// A call frame representing a function invocation.
#[derive(Debug, Clone)]
struct CallFrame {
    /// The closure being executed
    closure: Rc<Closure>,
    /// Instruction pointer (offset into the closure's instructions)
    ip: usize,
    /// First stack slot owned by this frame: its first argument
    base_pointer: usize,
}

impl CallFrame {
    fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    fn at_end(&self) -> bool {
        self.ip >= self.closure.function.instructions.len()
    }
}

/// The bytecode virtual machine.
pub struct VM {
    constants: Vec<Value>,
    /// The value stack, preallocated to `STACK_SIZE`
    stack: Vec<Value>,
    /// Next free slot; the top of stack is `stack[sp - 1]`
    sp: usize,
    globals: Vec<Value>,
    frames: Vec<CallFrame>,
    config: RuntimeConfig,
}

impl VM {
    /// Create a VM with fresh globals.
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_globals(bytecode, vec![Value::NULL; GLOBALS_SIZE])
    }

    /// Create a VM over globals left behind by an earlier run.
    pub fn with_globals(bytecode: Bytecode, mut globals: Vec<Value>) -> Self {
        if globals.len() < GLOBALS_SIZE {
            globals.resize(GLOBALS_SIZE, Value::NULL);
        }

        let main = CompiledFunction::new(bytecode.instructions, 0, 0);
        let main_closure = Rc::new(Closure::new(Rc::new(main)));

        Self {
            constants: bytecode.constants,
            stack: vec![Value::NULL; STACK_SIZE],
            sp: 0,
            globals,
            frames: vec![CallFrame::new(main_closure, 0)],
            config: RuntimeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// The value most recently popped. Pops leave their slot intact, so the
    /// result of a top-level expression statement can be read here after a
    /// run. A run that ends with the stack full has popped nothing, so this
    /// is `null`.
    pub fn last_popped(&self) -> &Value {
        self.stack.get(self.sp).unwrap_or(&Value::NULL)
    }

    /// Current top of stack, if any.
    pub fn stack_top(&self) -> Option<&Value> {
        if self.sp == 0 {
            None
        } else {
            Some(&self.stack[self.sp - 1])
        }
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Hand the globals back for the next run.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// Execute until the top-level instruction stream is exhausted.
    ///
    /// Stops at the first error; effects up to that point are kept and the
    /// VM cannot be resumed.
    pub fn run(&mut self) -> VMResult<()> {
        while !self.current_frame().at_end() {
            let ip = self.current_frame().ip;
            let byte = self.read_u8();
            let op = OpCode::from_u8(byte).ok_or(VmError::UnknownOpcode(byte))?;

            if self.config.trace {
                self.trace(ip);
            }

            match op {
                OpCode::Constant => {
                    let index = self.read_u16() as usize;
                    let constant = self.constants[index].clone();
                    self.push(constant)?;
                }

                OpCode::Pop => {
                    self.pop();
                }

                OpCode::True => self.push(Value::TRUE)?,
                OpCode::False => self.push(Value::FALSE)?,
                OpCode::Null => self.push(Value::NULL)?,

                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    self.execute_binary_operation(op)?;
                }

                OpCode::Equal | OpCode::NotEqual | OpCode::Greater => {
                    self.execute_comparison(op)?;
                }

                OpCode::Bang => {
                    let operand = self.pop();
                    self.push(Value::from_bool(!operand.is_truthy()))?;
                }

                OpCode::Minus => match self.pop() {
                    Value::Integer(n) => self.push(Value::Integer(n.wrapping_neg()))?,
                    other => return Err(VmError::UnsupportedNegation(other.type_name())),
                },

                OpCode::Jump => {
                    let target = self.read_u16() as usize;
                    self.current_frame_mut().ip = target;
                }

                OpCode::JumpNotTruthy => {
                    let target = self.read_u16() as usize;
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.current_frame_mut().ip = target;
                    }
                }

                OpCode::SetGlobal => {
                    let slot = self.read_u16() as usize;
                    self.globals[slot] = self.pop();
                }

                OpCode::GetGlobal => {
                    let slot = self.read_u16() as usize;
                    let value = self.globals[slot].clone();
                    self.push(value)?;
                }

                OpCode::SetLocal => {
                    let slot = self.read_u8() as usize;
                    let base_pointer = self.current_frame().base_pointer;
                    self.stack[base_pointer + slot] = self.pop();
                }

                OpCode::GetLocal => {
                    let slot = self.read_u8() as usize;
                    let base_pointer = self.current_frame().base_pointer;
                    let value = self.stack[base_pointer + slot].clone();
                    self.push(value)?;
                }

                OpCode::GetBuiltin => {
                    let index = self.read_u8() as usize;
                    let builtin = builtins::get(index).ok_or(VmError::UnknownBuiltin(index))?;
                    self.push(Value::BuiltIn(builtin))?;
                }

                OpCode::GetFree => {
                    let index = self.read_u8() as usize;
                    let value = self.current_frame().closure.free[index].clone();
                    self.push(value)?;
                }

                OpCode::CurrentClosure => {
                    let closure = Rc::clone(&self.current_frame().closure);
                    self.push(Value::Closure(closure))?;
                }

                OpCode::Array => {
                    let count = self.read_u16() as usize;
                    let start = self.sp - count;
                    let elements = self.stack[start..self.sp].to_vec();
                    self.sp = start;
                    self.push(Value::array(elements))?;
                }

                OpCode::Hash => {
                    let count = self.read_u16() as usize;
                    let start = self.sp - count;
                    let hash = self.build_hash(start, self.sp)?;
                    self.sp = start;
                    self.push(hash)?;
                }

                OpCode::Index => {
                    let index = self.pop();
                    let object = self.pop();
                    self.execute_index(object, index)?;
                }

                OpCode::Call => {
                    let argc = self.read_u8() as usize;
                    self.execute_call(argc)?;
                }

                OpCode::ReturnValue => {
                    let value = self.pop();
                    let Some(frame) = self.pop_frame() else {
                        // A top-level return ends the program with `value`
                        // as the last popped slot.
                        self.finish_main();
                        continue;
                    };
                    self.sp = frame.base_pointer - 1;
                    self.push(value)?;
                }

                OpCode::Return => {
                    let Some(frame) = self.pop_frame() else {
                        self.finish_main();
                        continue;
                    };
                    self.sp = frame.base_pointer - 1;
                    self.push(Value::NULL)?;
                }

                OpCode::Closure => {
                    let const_index = self.read_u16() as usize;
                    let num_free = self.read_u8() as usize;
                    self.push_closure(const_index, num_free)?;
                }
            }
        }

        Ok(())
    }

    fn current_frame(&self) -> &CallFrame {
        self.frames.last().expect("No call frame")
    }

    fn current_frame_mut(&mut self) -> &mut CallFrame {
        self.frames.last_mut().expect("No call frame")
    }

    /// Leave the current function. The top-level frame is never popped.
    fn pop_frame(&mut self) -> Option<CallFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Move the top-level cursor past the end of its stream.
    fn finish_main(&mut self) {
        let frame = self.current_frame_mut();
        frame.ip = frame.closure.function.instructions.len();
    }

    fn read_u8(&mut self) -> u8 {
        let frame = self.current_frame_mut();
        let byte = frame.closure.function.instructions.code[frame.ip];
        frame.ip += 1;
        byte
    }

    fn read_u16(&mut self) -> u16 {
        let frame = self.current_frame_mut();
        let value = read_u16(&frame.closure.function.instructions.code[frame.ip..]);
        frame.ip += 2;
        value
    }

    fn push(&mut self, value: Value) -> VMResult<()> {
        if self.sp >= STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    /// Underflow is not checked and the slot is not cleared.
    fn pop(&mut self) -> Value {
        let value = self.stack[self.sp - 1].clone();
        self.sp -= 1;
        value
    }

    fn execute_binary_operation(&mut self, op: OpCode) -> VMResult<()> {
        let right = self.pop();
        let left = self.pop();

        match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => {
                let result = match op {
                    OpCode::Add => a.wrapping_add(*b),
                    OpCode::Sub => a.wrapping_sub(*b),
                    OpCode::Mul => a.wrapping_mul(*b),
                    _ => {
                        if *b == 0 {
                            return Err(VmError::DivisionByZero);
                        }
                        a.wrapping_div(*b)
                    }
                };
                self.push(Value::Integer(result))
            }
            (Value::String(a), Value::String(b)) => {
                if op != OpCode::Add {
                    return Err(VmError::UnsupportedStringOperator(op));
                }
                self.push(Value::string(format!("{}{}", a, b)))
            }
            _ => Err(VmError::unsupported_types(
                op,
                left.type_name(),
                right.type_name(),
            )),
        }
    }

    fn execute_comparison(&mut self, op: OpCode) -> VMResult<()> {
        let right = self.pop();
        let left = self.pop();

        let result = match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => match op {
                OpCode::Equal => a == b,
                OpCode::NotEqual => a != b,
                _ => a > b,
            },
            (Value::Integer(_), _) | (_, Value::Integer(_)) => {
                return Err(VmError::unsupported_types(
                    op,
                    left.type_name(),
                    right.type_name(),
                ));
            }
            _ => match op {
                OpCode::Equal => left.is_identical(&right),
                OpCode::NotEqual => !left.is_identical(&right),
                _ => {
                    return Err(VmError::unknown_operator(
                        op,
                        left.type_name(),
                        right.type_name(),
                    ));
                }
            },
        };

        self.push(Value::from_bool(result))
    }

    fn execute_index(&mut self, object: Value, index: Value) -> VMResult<()> {
        let element = match (&object, &index) {
            (Value::Array(elements), Value::Integer(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| elements.get(i))
                .cloned()
                .unwrap_or(Value::NULL),
            (Value::Hash(pairs), key) => {
                let hash_key = key
                    .to_hash_key()
                    .ok_or(VmError::UnusableHashKey(key.type_name()))?;
                pairs
                    .get(&hash_key)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Value::NULL)
            }
            _ => return Err(VmError::IndexNotSupported(object.type_name())),
        };

        self.push(element)
    }

    /// Build a hash from the alternating key/value slots in `start..end`.
    fn build_hash(&self, start: usize, end: usize) -> VMResult<Value> {
        let mut pairs = new_hash_pairs();

        for slot in (start..end).step_by(2) {
            let key = self.stack[slot].clone();
            let value = self.stack[slot + 1].clone();
            let hash_key = key
                .to_hash_key()
                .ok_or(VmError::UnusableHashKey(key.type_name()))?;
            pairs.insert(hash_key, HashPair { key, value });
        }

        Ok(Value::hash(pairs))
    }

    /// The callee sits just below its `argc` arguments.
    fn execute_call(&mut self, argc: usize) -> VMResult<()> {
        let callee = self.stack[self.sp - 1 - argc].clone();

        match callee {
            Value::Closure(closure) => self.call_closure(closure, argc),
            Value::BuiltIn(builtin) => {
                let result = builtin.call(&self.stack[self.sp - argc..self.sp]);
                self.sp = self.sp - argc - 1;
                self.push(result)
            }
            other => Err(VmError::NotCallable(other.type_name())),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, argc: usize) -> VMResult<()> {
        let function = &closure.function;
        if argc != function.num_parameters {
            return Err(VmError::wrong_arity(function.num_parameters, argc));
        }

        let base_pointer = self.sp - argc;
        let frame_top = base_pointer + function.num_locals;
        if frame_top > STACK_SIZE {
            return Err(VmError::StackOverflow);
        }

        self.frames.push(CallFrame::new(closure, base_pointer));
        self.sp = frame_top;
        Ok(())
    }

    fn push_closure(&mut self, const_index: usize, num_free: usize) -> VMResult<()> {
        let function = match &self.constants[const_index] {
            Value::CompiledFunction(function) => Rc::clone(function),
            other => return Err(VmError::NotAFunction(other.type_name())),
        };

        let start = self.sp - num_free;
        let free = self.stack[start..self.sp].to_vec();
        self.sp = start;

        self.push(Value::Closure(Rc::new(Closure::with_free(function, free))))
    }

    fn trace(&self, ip: usize) {
        let frame = self.current_frame();
        let mut line = String::new();
        if write_instruction(
            &mut line,
            &frame.closure.function.instructions,
            ip,
            Some(self.constants.as_slice()),
        )
        .is_ok()
        {
            eprintln!(
                "{}",
                format!("[depth {} sp {}] {}", self.frames.len(), self.sp, line.trim_end()).cyan()
            );
        }
    }
}
