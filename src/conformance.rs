//! Cross-engine conformance tests.
//!
//! Each scenario is written twice, once as an AST for the evaluator and once
//! as the bytecode a compiler would emit for it, and both results are
//! compared. `a < b` is compiled as `b > a`, the way the instruction set
//! expects.

use std::rc::Rc;

use proptest::prelude::*;
use pretty_assertions::assert_eq;

use crate::ast::{BinaryOp, Block, Expr, Program, Stmt, UnaryOp};
use crate::bytecode::chunk::{Bytecode, CompiledFunction, Instructions};
use crate::bytecode::instruction::{make, OpCode};
use crate::bytecode::vm::VM;
use crate::error::VmError;
use crate::interpreter::environment::Environment;
use crate::interpreter::executor::evaluate;
use crate::interpreter::value::Value;

// ============================================================================
// Shared programs
// ============================================================================

/// `let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } }; fib(n);`
pub(crate) fn fib_program(n: i64) -> Program {
    let recurse = |k| {
        Expr::call(
            Expr::identifier("fib"),
            vec![Expr::binary(Expr::identifier("n"), BinaryOp::Subtract, Expr::int(k))],
        )
    };
    let body = Block::new(vec![Stmt::expression(Expr::if_else(
        Expr::binary(Expr::identifier("n"), BinaryOp::Less, Expr::int(2)),
        Block::new(vec![Stmt::expression(Expr::identifier("n"))]),
        Some(Block::new(vec![Stmt::expression(Expr::binary(
            recurse(1),
            BinaryOp::Add,
            recurse(2),
        ))])),
    ))]);

    Program::new(vec![
        Stmt::let_binding("fib", Expr::function(["n"], body)),
        Stmt::expression(Expr::call(Expr::identifier("fib"), vec![Expr::int(n)])),
    ])
}

/// The bytecode for [`fib_program`], with `fib` in global slot 0.
pub(crate) fn fib_bytecode(n: i64) -> Bytecode {
    // constants: 0 => 1, 1 => 2, 2 => fib, 3 => n
    let mut body = Instructions::new();
    body.emit(OpCode::Constant, &[1]);
    body.emit(OpCode::GetLocal, &[0]);
    body.emit(OpCode::Greater, &[]);
    let jump_not_truthy = body.emit(OpCode::JumpNotTruthy, &[9999]);
    body.emit(OpCode::GetLocal, &[0]);
    let jump = body.emit(OpCode::Jump, &[9999]);

    let alternative = body.current_offset();
    body.change_operand(jump_not_truthy, alternative);
    for constant in [0, 1] {
        body.emit(OpCode::GetGlobal, &[0]);
        body.emit(OpCode::GetLocal, &[0]);
        body.emit(OpCode::Constant, &[constant]);
        body.emit(OpCode::Sub, &[]);
        body.emit(OpCode::Call, &[1]);
    }
    body.emit(OpCode::Add, &[]);

    let end = body.current_offset();
    body.change_operand(jump, end);
    body.emit(OpCode::ReturnValue, &[]);

    let fib = CompiledFunction::new(body, 1, 1);
    let main = Instructions::concat(vec![
        make(OpCode::Closure, &[2, 0]),
        make(OpCode::SetGlobal, &[0]),
        make(OpCode::GetGlobal, &[0]),
        make(OpCode::Constant, &[3]),
        make(OpCode::Call, &[1]),
        make(OpCode::Pop, &[]),
    ]);

    Bytecode::new(
        main,
        vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::CompiledFunction(Rc::new(fib)),
            Value::Integer(n),
        ],
    )
}

// ============================================================================
// Helpers
// ============================================================================

fn eval(statements: Vec<Stmt>) -> Value {
    evaluate(&Program::new(statements), &Environment::shared())
}

fn eval_expr(expr: Expr) -> Value {
    eval(vec![Stmt::expression(expr)])
}

fn run_vm(instructions: Vec<Vec<u8>>, constants: Vec<Value>) -> Result<Value, VmError> {
    let mut vm = VM::new(Bytecode::new(Instructions::concat(instructions), constants));
    vm.run()?;
    Ok(vm.last_popped().clone())
}

fn function_constant(instructions: Vec<Vec<u8>>, num_locals: usize, num_parameters: usize) -> Value {
    Value::CompiledFunction(Rc::new(CompiledFunction::new(
        Instructions::concat(instructions),
        num_locals,
        num_parameters,
    )))
}

fn eval_binary(a: i64, op: BinaryOp, b: i64) -> Value {
    eval_expr(Expr::binary(Expr::int(a), op, Expr::int(b)))
}

fn vm_binary(a: i64, op: BinaryOp, b: i64) -> Value {
    let (opcode, constants) = match op {
        BinaryOp::Add => (OpCode::Add, [a, b]),
        BinaryOp::Subtract => (OpCode::Sub, [a, b]),
        BinaryOp::Multiply => (OpCode::Mul, [a, b]),
        BinaryOp::Divide => (OpCode::Div, [a, b]),
        BinaryOp::Less => (OpCode::Greater, [b, a]),
        BinaryOp::Greater => (OpCode::Greater, [a, b]),
        BinaryOp::Equal => (OpCode::Equal, [a, b]),
        BinaryOp::NotEqual => (OpCode::NotEqual, [a, b]),
    };

    run_vm(
        vec![
            make(OpCode::Constant, &[0]),
            make(OpCode::Constant, &[1]),
            make(opcode, &[]),
            make(OpCode::Pop, &[]),
        ],
        constants.iter().map(|n| Value::Integer(*n)).collect(),
    )
    .expect("integer operation failed in the VM")
}

const ALL_BINARY_OPS: [BinaryOp; 8] = [
    BinaryOp::Add,
    BinaryOp::Subtract,
    BinaryOp::Multiply,
    BinaryOp::Divide,
    BinaryOp::Less,
    BinaryOp::Greater,
    BinaryOp::Equal,
    BinaryOp::NotEqual,
];

// ============================================================================
// Integer arithmetic and comparison
// ============================================================================

proptest! {
    #[test]
    fn test_integer_operations_agree(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(b != 0);
        for op in ALL_BINARY_OPS {
            prop_assert_eq!(eval_binary(a, op, b), vm_binary(a, op, b), "{} {} {}", a, op, b);
        }
    }

    #[test]
    fn test_small_integer_operations_agree(a in -100i64..100, b in -100i64..100) {
        prop_assume!(b != 0);
        for op in ALL_BINARY_OPS {
            prop_assert_eq!(eval_binary(a, op, b), vm_binary(a, op, b), "{} {} {}", a, op, b);
        }
    }
}

#[test]
fn test_overflow_edges_agree() {
    let edges = [
        (i64::MAX, 1),
        (i64::MIN, -1),
        (i64::MIN, 1),
        (i64::MAX, i64::MAX),
        (i64::MIN, i64::MIN),
    ];

    for (a, b) in edges {
        for op in ALL_BINARY_OPS {
            assert_eq!(eval_binary(a, op, b), vm_binary(a, op, b), "{} {} {}", a, op, b);
        }
    }
}

// ============================================================================
// Truthiness
// ============================================================================

#[test]
fn test_double_bang_normalizes_truthiness() {
    let not_not = |expr| Expr::unary(UnaryOp::Not, Expr::unary(UnaryOp::Not, expr));
    let bang_bang = || vec![make(OpCode::Bang, &[]), make(OpCode::Bang, &[]), make(OpCode::Pop, &[])];
    let with_prefix = |prefix: Vec<u8>| {
        let mut instructions = vec![prefix];
        instructions.extend(bang_bang());
        instructions
    };
    let null_expr = Expr::if_else(Expr::bool(false), Block::default(), None);
    let empty_function = function_constant(vec![make(OpCode::Return, &[])], 0, 0);

    let cases = vec![
        (
            Expr::int(0),
            with_prefix(make(OpCode::Constant, &[0])),
            vec![Value::Integer(0)],
            true,
        ),
        (
            Expr::string(""),
            with_prefix(make(OpCode::Constant, &[0])),
            vec![Value::string("")],
            true,
        ),
        (
            Expr::array(vec![]),
            with_prefix(make(OpCode::Array, &[0])),
            vec![],
            true,
        ),
        (
            Expr::hash(vec![]),
            with_prefix(make(OpCode::Hash, &[0])),
            vec![],
            true,
        ),
        (
            Expr::function(Vec::<&str>::new(), Block::default()),
            with_prefix(make(OpCode::Closure, &[0, 0])),
            vec![empty_function],
            true,
        ),
        (Expr::bool(true), with_prefix(make(OpCode::True, &[])), vec![], true),
        (Expr::bool(false), with_prefix(make(OpCode::False, &[])), vec![], false),
        (null_expr, with_prefix(make(OpCode::Null, &[])), vec![], false),
    ];

    for (expr, instructions, constants, expected) in cases {
        let label = expr.to_string();
        assert_eq!(eval_expr(not_not(expr)), Value::from_bool(expected), "{}", label);
        assert_eq!(
            run_vm(instructions, constants),
            Ok(Value::from_bool(expected)),
            "{}",
            label
        );
    }
}

// ============================================================================
// Indexing
// ============================================================================

#[test]
fn test_out_of_range_index_is_null() {
    for n in 0..6usize {
        let elements: Vec<Expr> = (0..n as i64).map(Expr::int).collect();

        for index in [n as i64, -1] {
            let expr = Expr::index(Expr::array(elements.clone()), Expr::int(index));
            assert_eq!(eval_expr(expr), Value::NULL, "len {} index {}", n, index);

            let mut instructions: Vec<Vec<u8>> =
                (0..n).map(|_| make(OpCode::Constant, &[0])).collect();
            instructions.push(make(OpCode::Array, &[n]));
            instructions.push(make(OpCode::Constant, &[1]));
            instructions.push(make(OpCode::Index, &[]));
            instructions.push(make(OpCode::Pop, &[]));

            assert_eq!(
                run_vm(instructions, vec![Value::Integer(0), Value::Integer(index)]),
                Ok(Value::NULL),
                "len {} index {}",
                n,
                index
            );
        }
    }
}

// ============================================================================
// Hashes
// ============================================================================

#[test]
fn test_duplicate_hash_key_overwrites_value_in_place() {
    // {"a": 1, "b": 2, "a": 3}
    let expr = Expr::hash(vec![
        (Expr::string("a"), Expr::int(1)),
        (Expr::string("b"), Expr::int(2)),
        (Expr::string("a"), Expr::int(3)),
    ]);
    let evaluated = eval_expr(expr);

    let executed = run_vm(
        vec![
            make(OpCode::Constant, &[0]),
            make(OpCode::Constant, &[1]),
            make(OpCode::Constant, &[2]),
            make(OpCode::Constant, &[3]),
            make(OpCode::Constant, &[0]),
            make(OpCode::Constant, &[4]),
            make(OpCode::Hash, &[6]),
            make(OpCode::Pop, &[]),
        ],
        vec![
            Value::string("a"),
            Value::Integer(1),
            Value::string("b"),
            Value::Integer(2),
            Value::Integer(3),
        ],
    )
    .expect("hash literal failed in the VM");

    assert_eq!(evaluated.to_string(), "{a: 3, b: 2}");
    assert_eq!(evaluated, executed);
}

#[test]
fn test_hash_keys_of_different_types_stay_distinct() {
    // {1: "int", true: "bool", "1": "str"}
    let expr = Expr::hash(vec![
        (Expr::int(1), Expr::string("int")),
        (Expr::bool(true), Expr::string("bool")),
        (Expr::string("1"), Expr::string("str")),
    ]);
    let evaluated = eval_expr(expr);

    let executed = run_vm(
        vec![
            make(OpCode::Constant, &[0]),
            make(OpCode::Constant, &[1]),
            make(OpCode::True, &[]),
            make(OpCode::Constant, &[2]),
            make(OpCode::Constant, &[3]),
            make(OpCode::Constant, &[4]),
            make(OpCode::Hash, &[6]),
            make(OpCode::Pop, &[]),
        ],
        vec![
            Value::Integer(1),
            Value::string("int"),
            Value::string("bool"),
            Value::string("1"),
            Value::string("str"),
        ],
    )
    .expect("hash literal failed in the VM");

    assert_eq!(evaluated.to_string(), "{1: int, true: bool, 1: str}");
    assert_eq!(evaluated, executed);
}

// ============================================================================
// Closures
// ============================================================================

#[test]
fn test_closure_ignores_shadowing_in_a_deeper_frame() {
    // let x = 1; let f = fn() { x }; let g = fn() { let x = 2; f() }; g();
    let program = vec![
        Stmt::let_binding("x", Expr::int(1)),
        Stmt::let_binding(
            "f",
            Expr::function(
                Vec::<&str>::new(),
                Block::new(vec![Stmt::expression(Expr::identifier("x"))]),
            ),
        ),
        Stmt::let_binding(
            "g",
            Expr::function(
                Vec::<&str>::new(),
                Block::new(vec![
                    Stmt::let_binding("x", Expr::int(2)),
                    Stmt::expression(Expr::call(Expr::identifier("f"), vec![])),
                ]),
            ),
        ),
        Stmt::expression(Expr::call(Expr::identifier("g"), vec![])),
    ];
    assert_eq!(eval(program), Value::Integer(1));

    // globals: 0 => x, 1 => f, 2 => g
    let f = function_constant(
        vec![make(OpCode::GetGlobal, &[0]), make(OpCode::ReturnValue, &[])],
        0,
        0,
    );
    let g = function_constant(
        vec![
            make(OpCode::Constant, &[3]),
            make(OpCode::SetLocal, &[0]),
            make(OpCode::GetGlobal, &[1]),
            make(OpCode::Call, &[0]),
            make(OpCode::ReturnValue, &[]),
        ],
        1,
        0,
    );
    let executed = run_vm(
        vec![
            make(OpCode::Constant, &[0]),
            make(OpCode::SetGlobal, &[0]),
            make(OpCode::Closure, &[1, 0]),
            make(OpCode::SetGlobal, &[1]),
            make(OpCode::Closure, &[2, 0]),
            make(OpCode::SetGlobal, &[2]),
            make(OpCode::GetGlobal, &[2]),
            make(OpCode::Call, &[0]),
            make(OpCode::Pop, &[]),
        ],
        vec![Value::Integer(1), f, g, Value::Integer(2)],
    );
    assert_eq!(executed, Ok(Value::Integer(1)));
}

#[test]
fn test_closure_sees_rebinding_in_the_same_frame() {
    // let x = 1; let f = fn() { x }; let x = 2; f();
    let program = vec![
        Stmt::let_binding("x", Expr::int(1)),
        Stmt::let_binding(
            "f",
            Expr::function(
                Vec::<&str>::new(),
                Block::new(vec![Stmt::expression(Expr::identifier("x"))]),
            ),
        ),
        Stmt::let_binding("x", Expr::int(2)),
        Stmt::expression(Expr::call(Expr::identifier("f"), vec![])),
    ];
    assert_eq!(eval(program), Value::Integer(2));
}

// ============================================================================
// Error propagation
// ============================================================================

#[test]
fn test_type_error_halts_both_engines() {
    // 1 + "a"; let y = 5;
    let env = Environment::shared();
    let program = Program::new(vec![
        Stmt::expression(Expr::binary(Expr::int(1), BinaryOp::Add, Expr::string("a"))),
        Stmt::let_binding("y", Expr::int(5)),
    ]);
    assert_eq!(
        evaluate(&program, &env),
        Value::error("type mismatch: INTEGER + STRING")
    );
    assert_eq!(env.borrow().get("y"), None);

    let mut vm = VM::new(Bytecode::new(
        Instructions::concat(vec![
            make(OpCode::Constant, &[0]),
            make(OpCode::Constant, &[1]),
            make(OpCode::Add, &[]),
            make(OpCode::Pop, &[]),
            make(OpCode::Constant, &[2]),
            make(OpCode::SetGlobal, &[0]),
        ]),
        vec![Value::Integer(1), Value::string("a"), Value::Integer(5)],
    ));
    assert_eq!(
        vm.run(),
        Err(VmError::unsupported_types(OpCode::Add, "INTEGER", "STRING"))
    );
    assert_eq!(vm.globals()[0], Value::NULL);
}

#[test]
fn test_division_by_zero_is_reported_by_both_engines() {
    assert_eq!(
        eval_binary(10, BinaryOp::Divide, 0),
        Value::error("division by zero")
    );
    assert_eq!(
        run_vm(
            vec![
                make(OpCode::Constant, &[0]),
                make(OpCode::Constant, &[1]),
                make(OpCode::Div, &[]),
            ],
            vec![Value::Integer(10), Value::Integer(0)],
        ),
        Err(VmError::DivisionByZero)
    );
}

// ============================================================================
// Globals and end-to-end programs
// ============================================================================

#[test]
fn test_globals_survive_between_runs() {
    let mut first = VM::new(Bytecode::new(
        Instructions::concat(vec![make(OpCode::Constant, &[0]), make(OpCode::SetGlobal, &[0])]),
        vec![Value::Integer(5)],
    ));
    first.run().expect("first run failed");

    let mut second = VM::with_globals(
        Bytecode::new(
            Instructions::concat(vec![make(OpCode::GetGlobal, &[0]), make(OpCode::Pop, &[])]),
            vec![],
        ),
        first.into_globals(),
    );
    second.run().expect("second run failed");
    assert_eq!(second.last_popped(), &Value::Integer(5));
}

#[test]
fn test_fibonacci_agrees() {
    assert_eq!(eval(fib_program(10).statements), Value::Integer(55));

    let mut vm = VM::new(fib_bytecode(10));
    vm.run().expect("fib failed in the VM");
    assert_eq!(vm.last_popped(), &Value::Integer(55));

    for n in 0..12 {
        let mut vm = VM::new(fib_bytecode(n));
        vm.run().expect("fib failed in the VM");
        assert_eq!(
            evaluate(&fib_program(n), &Environment::shared()),
            vm.last_popped().clone(),
            "fib({})",
            n
        );
    }
}
