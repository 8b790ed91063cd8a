//! The function set available to expressions.
//!
//! Each operator is described by a static `Operator` record holding its name, its arity and a
//! pure function over its ordered arguments. Nodes only ever store the `OperatorId` pointing into
//! the `OPERATORS` table.

use super::expr::gen::Arity;
use std::fmt;

/// A named function with a fixed number of arguments.
pub struct Operator {
    /// The name used when displaying expressions.
    pub name: &'static str,
    /// The exact number of arguments the function expects.
    pub arity: usize,
    /// Apply the function to its evaluated arguments.
    ///
    /// `args.len()` is always equal to `arity`.
    pub apply: fn(&[i64]) -> i64,
}

/// Identifies one of the operators within the `OPERATORS` table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperatorId {
    Add,
    Multiply,
    If,
    IsGreater,
    Subtract,
}

/// The registry of all operators, indexed by `OperatorId`.
pub static OPERATORS: [Operator; 5] = [
    Operator { name: "add", arity: 2, apply: add },
    Operator { name: "multiply", arity: 2, apply: multiply },
    Operator { name: "if", arity: 3, apply: if_then_else },
    Operator { name: "isgreater", arity: 2, apply: is_greater },
    Operator { name: "subtract", arity: 2, apply: subtract },
];

impl OperatorId {
    /// Every operator, in registry order.
    pub const ALL: [OperatorId; 5] = [
        OperatorId::Add,
        OperatorId::Multiply,
        OperatorId::If,
        OperatorId::IsGreater,
        OperatorId::Subtract,
    ];

    /// The registry entry for this operator.
    pub fn operator(self) -> &'static Operator {
        &OPERATORS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.operator().name
    }

    /// Apply the operator to the given arguments.
    ///
    /// Callers must ensure `args.len() == self.arity()`.
    pub fn apply(self, args: &[i64]) -> i64 {
        (self.operator().apply)(args)
    }
}

impl Arity for OperatorId {
    fn arity(&self) -> usize {
        self.operator().arity
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Operator fns. Arithmetic wraps on overflow.

fn add(args: &[i64]) -> i64 {
    args[0].wrapping_add(args[1])
}

fn subtract(args: &[i64]) -> i64 {
    args[0].wrapping_sub(args[1])
}

fn multiply(args: &[i64]) -> i64 {
    args[0].wrapping_mul(args[1])
}

fn if_then_else(args: &[i64]) -> i64 {
    if args[0] > 0 {
        args[1]
    } else {
        args[2]
    }
}

fn is_greater(args: &[i64]) -> i64 {
    if args[0] > args[1] {
        1
    } else {
        0
    }
}
