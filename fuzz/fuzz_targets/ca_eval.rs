#![no_main]

use hlasm_core::ca::{eval, Environment, EvalContext};
use hlasm_core::ca::values::SetValueKind;
use hlasm_core::external_fn::{Arity, ExternalFunctionType};
use hlasm_core::{ExternalFunction, ExternalFunctionRegistry};
use hlasm_syntax::ca::{BinOp, Expr, SetValue};
use libfuzzer_sys::fuzz_target;
use std::cell::RefCell;
use text_size::{TextRange, TextSize};

const MAX_DEPTH: u32 = 6;
const MAX_NODES: u32 = 64;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    nodes: u32,
}

impl<'a> Cursor<'a> {
    fn next_byte(&mut self) -> u8 {
        let b = self.bytes.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        b
    }

    fn name(&mut self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_byte() % 4)
    }
}

fn dummy_range() -> TextRange {
    TextRange::new(TextSize::from(0), TextSize::from(0))
}

fn build_expr(cur: &mut Cursor<'_>, depth: u32) -> Expr {
    cur.nodes += 1;
    if depth >= MAX_DEPTH || cur.nodes >= MAX_NODES {
        return Expr::IntLit { value: i32::from(cur.next_byte()), range: dummy_range() };
    }
    match cur.next_byte() % 9 {
        0 => Expr::IntLit { value: i32::from(cur.next_byte()), range: dummy_range() },
        1 => Expr::StrLit { value: cur.name("S").into(), range: dummy_range() },
        2 => {
            let has_subscript = cur.next_byte() % 2 == 0;
            Expr::Var {
                name: cur.name("VAR").into(),
                subscript: has_subscript.then(|| Box::new(build_expr(cur, depth + 1))),
                range: dummy_range(),
            }
        }
        3 => Expr::Not { operand: Box::new(build_expr(cur, depth + 1)), range: dummy_range() },
        4 => Expr::Neg { operand: Box::new(build_expr(cur, depth + 1)), range: dummy_range() },
        5 => {
            const OPS: [BinOp; 13] = [
                BinOp::Add,
                BinOp::Sub,
                BinOp::Mul,
                BinOp::Div,
                BinOp::Concat,
                BinOp::Eq,
                BinOp::Ne,
                BinOp::Lt,
                BinOp::Le,
                BinOp::Gt,
                BinOp::Ge,
                BinOp::And,
                BinOp::Or,
            ];
            let op = OPS[usize::from(cur.next_byte()) % OPS.len()];
            Expr::Binary {
                op,
                lhs: Box::new(build_expr(cur, depth + 1)),
                rhs: Box::new(build_expr(cur, depth + 1)),
                range: dummy_range(),
            }
        }
        6 => {
            let name = if cur.next_byte() % 2 == 0 { "FUZZFN".to_string() } else { "FUZZCFN".to_string() };
            let argc = cur.next_byte() % 3;
            let args = (0..argc).map(|_| build_expr(cur, depth + 1)).collect();
            Expr::Call { name: name.into(), args, range: dummy_range() }
        }
        7 => Expr::Substring {
            base: Box::new(build_expr(cur, depth + 1)),
            start: Box::new(build_expr(cur, depth + 1)),
            length: Box::new(build_expr(cur, depth + 1)),
            range: dummy_range(),
        },
        8 => Expr::DupFactor {
            count: Box::new(build_expr(cur, depth + 1)),
            value: Box::new(build_expr(cur, depth + 1)),
            range: dummy_range(),
        },
        _ => unreachable!(),
    }
}

fn build_env() -> Environment {
    let mut env = Environment::new();
    env.declare_scalar("VAR0", SetValueKind::Arithmetic);
    env.declare_scalar("VAR1", SetValueKind::Boolean);
    env.declare_scalar("VAR2", SetValueKind::Character);
    env.declare_array("VAR3", SetValueKind::Arithmetic, 3);
    env
}

fn build_registry() -> ExternalFunctionRegistry {
    let mut registry = ExternalFunctionRegistry::new();
    let _ = registry.register("FUZZFN", ExternalFunction::new(ExternalFunctionType::Arithmetic, Arity::exact(1), |_bundle| None));
    let _ = registry.register("FUZZCFN", ExternalFunction::new(ExternalFunctionType::Character, Arity::exact(1), |_bundle| None));
    registry
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = Cursor { bytes: data, pos: 0, nodes: 0 };
    let expr = build_expr(&mut cursor, 0);
    let env = build_env();
    let externals = build_registry();
    let diagnostics = RefCell::new(Vec::new());
    let ctx = EvalContext { env: &env, externals: &externals, diagnostics: &diagnostics };

    if let Ok(value) = eval(&expr, &ctx) {
        match value {
            SetValue::Character(s) => assert!(s.len() <= hlasm_core::ca::eval::MAX_STR_SIZE),
            SetValue::Arithmetic(_) | SetValue::Boolean(_) => {}
        }
    }
});
