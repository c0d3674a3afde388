// SPDX-License-Identifier: MIT

//! The closed set of accumulator update operators plus a named-method
//! escape hatch (spec section 4.4, grounded on `accumulate.py`'s
//! `_update_accumulator`'s `op` string dispatch: `+ - * / < > & |`, falling
//! back to `getattr(value, op)(delta)` for anything else).

use bndl_core::BndlError;
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccumOp {
    Add,
    Sub,
    Mul,
    Div,
    ShiftLeft,
    ShiftRight,
    And,
    Or,
    /// A method name looked up in a [`crate::registry::NamedOpRegistry`] at
    /// apply time, replacing the original's `getattr` dynamic dispatch.
    Named(String),
}

impl AccumOp {
    /// The wire code matching the original's single-character operators;
    /// named ops are sent as their method name verbatim.
    pub fn code(&self) -> String {
        match self {
            AccumOp::Add => "+".into(),
            AccumOp::Sub => "-".into(),
            AccumOp::Mul => "*".into(),
            AccumOp::Div => "/".into(),
            AccumOp::ShiftLeft => "<".into(),
            AccumOp::ShiftRight => ">".into(),
            AccumOp::And => "&".into(),
            AccumOp::Or => "|".into(),
            AccumOp::Named(name) => name.clone(),
        }
    }

    pub fn from_code(code: &str) -> AccumOp {
        match code {
            "+" => AccumOp::Add,
            "-" => AccumOp::Sub,
            "*" => AccumOp::Mul,
            "/" => AccumOp::Div,
            "<" => AccumOp::ShiftLeft,
            ">" => AccumOp::ShiftRight,
            "&" => AccumOp::And,
            "|" => AccumOp::Or,
            other => AccumOp::Named(other.to_string()),
        }
    }

    /// True for the eight built-in arithmetic/bitwise operators, false for
    /// `Named`.
    pub fn is_fixed(&self) -> bool {
        !matches!(self, AccumOp::Named(_))
    }
}

/// Apply one of the eight fixed operators to a JSON number, matching the
/// original's in-place `+= -= *= /= <<= >>= &= |=` on `accumulator.value`.
pub fn apply_fixed(op: &AccumOp, current: &Value, delta: &Value) -> Result<Value, BndlError> {
    let (Value::Number(a), Value::Number(b)) = (current, delta) else {
        return Err(BndlError::TaskFailure(format!("accumulator op {:?} needs numeric operands", op)));
    };

    match op {
        AccumOp::Add | AccumOp::Sub | AccumOp::Mul | AccumOp::Div => {
            let a = float_of(a);
            let b = float_of(b);
            let result = match op {
                AccumOp::Add => a + b,
                AccumOp::Sub => a - b,
                AccumOp::Mul => a * b,
                AccumOp::Div => a / b,
                _ => unreachable!(),
            };
            Ok(Number::from_f64(result).map(Value::Number).unwrap_or(Value::Null))
        }
        AccumOp::ShiftLeft | AccumOp::ShiftRight | AccumOp::And | AccumOp::Or => {
            let a = int_of(a)?;
            let b = int_of(b)?;
            let result = match op {
                AccumOp::ShiftLeft => a << b,
                AccumOp::ShiftRight => a >> b,
                AccumOp::And => a & b,
                AccumOp::Or => a | b,
                _ => unreachable!(),
            };
            Ok(Value::Number(Number::from(result)))
        }
        AccumOp::Named(_) => unreachable!("apply_fixed only called for fixed ops"),
    }
}

fn float_of(n: &Number) -> f64 {
    n.as_f64().unwrap_or(0.0)
}

fn int_of(n: &Number) -> Result<i64, BndlError> {
    n.as_i64().ok_or_else(|| BndlError::TaskFailure(format!("expected an integer, got {n}")))
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
