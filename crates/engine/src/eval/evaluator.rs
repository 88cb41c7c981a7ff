// Sempred - Semantic Predicate Evaluator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Evaluation of predicate expression trees.
//!
//! The evaluator is a direct tree walk. It performs no coercions: booleans
//! and numbers never mix, `&&`/`||` want booleans on both sides, and a
//! predicate root that does not produce a boolean is a type error.

use std::sync::Arc;

use sempred_common::{Callable, Value};
use tracing::trace;

use super::resolver::{BindingContext, BindingResolver, ResolvedNode};
use crate::{
    expr::{BinaryOp, ExpressionNode, Literal, UnaryOp},
    EvaluationResult, PredicateError, PredicateResult,
};

#[derive(Debug, Clone, Copy)]
enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy)]
enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy)]
enum LogicalOp {
    And,
    Or,
}

enum OpClass {
    Arithmetic(ArithmeticOp),
    Comparison(ComparisonOp),
    Logical(LogicalOp),
}

fn classify(op: BinaryOp) -> OpClass {
    match op {
        BinaryOp::Or => OpClass::Logical(LogicalOp::Or),
        BinaryOp::And => OpClass::Logical(LogicalOp::And),
        BinaryOp::Eq => OpClass::Comparison(ComparisonOp::Eq),
        BinaryOp::Ne => OpClass::Comparison(ComparisonOp::Ne),
        BinaryOp::Lt => OpClass::Comparison(ComparisonOp::Lt),
        BinaryOp::Le => OpClass::Comparison(ComparisonOp::Le),
        BinaryOp::Gt => OpClass::Comparison(ComparisonOp::Gt),
        BinaryOp::Ge => OpClass::Comparison(ComparisonOp::Ge),
        BinaryOp::Add => OpClass::Arithmetic(ArithmeticOp::Add),
        BinaryOp::Sub => OpClass::Arithmetic(ArithmeticOp::Sub),
        BinaryOp::Mul => OpClass::Arithmetic(ArithmeticOp::Mul),
        BinaryOp::Div => OpClass::Arithmetic(ArithmeticOp::Div),
        BinaryOp::Rem => OpClass::Arithmetic(ArithmeticOp::Rem),
    }
}

/// Evaluates expression trees against one binding context.
#[derive(Debug)]
pub struct PredicateEvaluator<'c, C: ?Sized> {
    resolver: BindingResolver<'c, C>,
}

impl<'c, C: BindingContext + ?Sized> PredicateEvaluator<'c, C> {
    /// Create an evaluator reading bindings from `context`.
    pub fn new(context: &'c C) -> Self {
        Self { resolver: BindingResolver::new(context) }
    }

    /// Evaluate `node` as a predicate.
    pub fn evaluate(&self, node: &ExpressionNode) -> EvaluationResult {
        match self.evaluate_expression(node)? {
            Value::Bool(result) => {
                trace!(%node, result, "evaluated predicate");
                Ok(result)
            }
            other => Err(PredicateError::type_error(format!(
                "predicate must produce a boolean, found {} {other}",
                other.kind()
            ))),
        }
    }

    /// Evaluate `node` to whatever value it produces.
    pub fn evaluate_value(&self, node: &ExpressionNode) -> PredicateResult<Value> {
        self.evaluate_expression(node)
    }

    fn evaluate_expression(&self, node: &ExpressionNode) -> PredicateResult<Value> {
        match self.resolver.resolve(node)? {
            ResolvedNode::Literal(literal) => Ok(literal_value(literal)),
            ResolvedNode::Value(value) => Ok(value.clone()),
            ResolvedNode::Call { name, callable, args } => {
                self.evaluate_function_call(name, callable, args)
            }
            ResolvedNode::Unary { op: UnaryOp::Not, operand } => self.evaluate_logical_not(operand),
            ResolvedNode::Unary { op: UnaryOp::Neg, operand } => self.evaluate_unary_minus(operand),
            ResolvedNode::Binary { op, lhs, rhs } => self.evaluate_binary(op, lhs, rhs),
        }
    }

    fn evaluate_function_call(
        &self,
        name: &str,
        callable: &Arc<dyn Callable>,
        args: &[ExpressionNode],
    ) -> PredicateResult<Value> {
        let values =
            args.iter().map(|arg| self.evaluate_expression(arg)).collect::<PredicateResult<Vec<_>>>()?;

        callable
            .call(&values)
            .map_err(|source| PredicateError::CallFailed { name: name.to_string(), source })
    }

    /// Evaluate a binary node together with the binary nodes on its left spine.
    ///
    /// Left-associative chains like `a || b || c` are folded in a loop, so
    /// evaluation recurses only into right operands.
    fn evaluate_binary(
        &self,
        op: BinaryOp,
        lhs: &ExpressionNode,
        rhs: &ExpressionNode,
    ) -> PredicateResult<Value> {
        let mut spine = vec![(op, rhs)];
        let mut leftmost = lhs;
        while let ExpressionNode::Binary { op, lhs, rhs } = leftmost {
            spine.push((*op, rhs.as_ref()));
            leftmost = lhs.as_ref();
        }

        let mut acc = self.evaluate_expression(leftmost)?;
        for (op, rhs) in spine.into_iter().rev() {
            acc = match classify(op) {
                OpClass::Logical(op) => self.evaluate_logical(acc, rhs, op)?,
                OpClass::Comparison(op) => {
                    let right = self.evaluate_expression(rhs)?;
                    Value::Bool(apply_comparison_op(&acc, &right, op)?)
                }
                OpClass::Arithmetic(op) => {
                    let right = self.evaluate_expression(rhs)?;
                    apply_arithmetic_op(acc, right, op)?
                }
            };
        }
        Ok(acc)
    }

    fn evaluate_logical(
        &self,
        left: Value,
        rhs: &ExpressionNode,
        op: LogicalOp,
    ) -> PredicateResult<Value> {
        let symbol = op.symbol();
        let left = expect_bool(left, symbol)?;

        // Short-circuit: the right operand is neither resolved nor evaluated.
        match (op, left) {
            (LogicalOp::And, false) => return Ok(Value::Bool(false)),
            (LogicalOp::Or, true) => return Ok(Value::Bool(true)),
            _ => {}
        }

        let right = expect_bool(self.evaluate_expression(rhs)?, symbol)?;
        Ok(Value::Bool(right))
    }

    fn evaluate_logical_not(&self, operand: &ExpressionNode) -> PredicateResult<Value> {
        let value = expect_bool(self.evaluate_expression(operand)?, "!")?;
        Ok(Value::Bool(!value))
    }

    fn evaluate_unary_minus(&self, operand: &ExpressionNode) -> PredicateResult<Value> {
        match self.evaluate_expression(operand)? {
            Value::Int(value) => value
                .checked_neg()
                .map(Value::Int)
                .ok_or(PredicateError::ArithmeticOverflow { operator: "-" }),
            Value::Float(value) => Ok(Value::Float(-value)),
            other => Err(PredicateError::type_error(format!(
                "operator `-` expects a number, found {}",
                other.kind()
            ))),
        }
    }
}

impl ArithmeticOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

impl ComparisonOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl LogicalOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Bool(value) => Value::Bool(*value),
        Literal::Int(value) => Value::Int(*value),
        Literal::Float(value) => Value::Float(*value),
        Literal::Str(value) => Value::Str(value.clone()),
    }
}

fn expect_bool(value: Value, operator: &str) -> PredicateResult<bool> {
    match value {
        Value::Bool(value) => Ok(value),
        other => Err(PredicateError::type_error(format!(
            "operator `{operator}` expects a boolean, found {}",
            other.kind()
        ))),
    }
}

fn mismatch(operator: &str, left: &Value, right: &Value) -> PredicateError {
    PredicateError::type_error(format!(
        "operator `{operator}` cannot be applied to {} and {}",
        left.kind(),
        right.kind()
    ))
}

/// Apply a comparison. Integer pairs compare exactly; any float operand
/// compares both sides as `f64`.
fn apply_comparison_op(left: &Value, right: &Value, op: ComparisonOp) -> PredicateResult<bool> {
    let equal = match (left, right) {
        (Value::Int(l), Value::Int(r)) => {
            return Ok(match op {
                ComparisonOp::Eq => l == r,
                ComparisonOp::Ne => l != r,
                ComparisonOp::Lt => l < r,
                ComparisonOp::Le => l <= r,
                ComparisonOp::Gt => l > r,
                ComparisonOp::Ge => l >= r,
            });
        }
        (l, r) if l.is_number() && r.is_number() => {
            let (Some(l), Some(r)) = (l.as_f64(), r.as_f64()) else {
                return Err(mismatch(op.symbol(), left, right));
            };
            return Ok(match op {
                ComparisonOp::Eq => l == r,
                ComparisonOp::Ne => l != r,
                ComparisonOp::Lt => l < r,
                ComparisonOp::Le => l <= r,
                ComparisonOp::Gt => l > r,
                ComparisonOp::Ge => l >= r,
            });
        }
        (Value::Str(l), Value::Str(r)) => l == r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        _ => return Err(mismatch(op.symbol(), left, right)),
    };

    match op {
        ComparisonOp::Eq => Ok(equal),
        ComparisonOp::Ne => Ok(!equal),
        _ => Err(PredicateError::type_error(format!(
            "operator `{}` expects numbers, found {}",
            op.symbol(),
            left.kind()
        ))),
    }
}

/// Apply an arithmetic operator. Two integers use checked `i64` arithmetic with
/// truncating division; a float on either side switches to `f64`.
fn apply_arithmetic_op(left: Value, right: Value, op: ArithmeticOp) -> PredicateResult<Value> {
    let overflow = PredicateError::ArithmeticOverflow { operator: op.symbol() };

    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => {
            let (l, r) = (*l, *r);
            if r == 0 && matches!(op, ArithmeticOp::Div | ArithmeticOp::Rem) {
                return Err(PredicateError::DivisionByZero);
            }
            let result = match op {
                ArithmeticOp::Add => l.checked_add(r),
                ArithmeticOp::Sub => l.checked_sub(r),
                ArithmeticOp::Mul => l.checked_mul(r),
                ArithmeticOp::Div => l.checked_div(r),
                ArithmeticOp::Rem => l.checked_rem(r),
            };
            result.map(Value::Int).ok_or(overflow)
        }
        (Value::Str(l), Value::Str(r)) if matches!(op, ArithmeticOp::Add) => {
            Ok(Value::Str(format!("{l}{r}")))
        }
        _ => {
            let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
                return Err(mismatch(op.symbol(), &left, &right));
            };
            if r == 0.0 && matches!(op, ArithmeticOp::Div | ArithmeticOp::Rem) {
                return Err(PredicateError::DivisionByZero);
            }
            let result = match op {
                ArithmeticOp::Add => l + r,
                ArithmeticOp::Sub => l - r,
                ArithmeticOp::Mul => l * r,
                ArithmeticOp::Div => l / r,
                ArithmeticOp::Rem => l % r,
            };
            if result.is_finite() {
                Ok(Value::Float(result))
            } else {
                Err(overflow)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
        sync::Arc,
    };

    use sempred_common::CallError;

    use super::*;
    use crate::expr::parse;

    type Context = HashMap<String, Value>;

    fn eval_in(text: &str, ctx: &Context) -> EvaluationResult {
        PredicateEvaluator::new(ctx).evaluate(&parse(text).unwrap())
    }

    fn eval(text: &str) -> EvaluationResult {
        eval_in(text, &Context::new())
    }

    fn value_of(text: &str) -> PredicateResult<Value> {
        PredicateEvaluator::new(&Context::new()).evaluate_value(&parse(text).unwrap())
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("1 < 2"), Ok(true));
        assert_eq!(eval("2 <= 2"), Ok(true));
        assert_eq!(eval("3 > 4"), Ok(false));
        assert_eq!(eval("1 == 1.0"), Ok(true));
        assert_eq!(eval("2.5 >= 3"), Ok(false));
        assert_eq!(eval("'a' == \"a\""), Ok(true));
        assert_eq!(eval("'a' != 'b'"), Ok(true));
        assert_eq!(eval("true == !false"), Ok(true));
    }

    #[test]
    fn test_comparison_type_errors() {
        assert!(matches!(eval("\"a\" == 1"), Err(PredicateError::TypeError { .. })));
        assert!(matches!(eval("true == 1"), Err(PredicateError::TypeError { .. })));
        assert!(matches!(eval("'a' < 'b'"), Err(PredicateError::TypeError { .. })));
        assert!(matches!(eval("true < false"), Err(PredicateError::TypeError { .. })));
    }

    #[test]
    fn test_logical_operators_require_booleans() {
        assert_eq!(eval("true && !false"), Ok(true));
        assert_eq!(eval("false || false"), Ok(false));
        assert!(matches!(eval("1 && true"), Err(PredicateError::TypeError { .. })));
        assert!(matches!(eval("true && 1"), Err(PredicateError::TypeError { .. })));
        assert!(matches!(eval("!0"), Err(PredicateError::TypeError { .. })));
    }

    #[test]
    fn test_short_circuit_skips_resolution() {
        assert_eq!(eval("false && undefined_fn()"), Ok(false));
        assert_eq!(eval("true || missing > 1"), Ok(true));
        assert_eq!(
            eval("1 < 2 && unknown"),
            Err(PredicateError::UnresolvedIdentifier { name: "unknown".into() })
        );
    }

    #[test]
    fn test_short_circuit_skips_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let ctx = Context::from([(
            "tick".to_string(),
            Value::function("tick", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Bool(true))
            }),
        )]);

        assert_eq!(eval_in("false && tick()", &ctx), Ok(false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(eval_in("true && tick()", &ctx), Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_long_or_chain() {
        let terms: Vec<_> = (0..1000).map(|i| format!("k == {i}")).collect();
        let tree = parse(&terms.join(" || ")).unwrap();

        let hit = Context::from([("k".to_string(), Value::Int(999))]);
        assert_eq!(PredicateEvaluator::new(&hit).evaluate(&tree), Ok(true));
        let miss = Context::from([("k".to_string(), Value::Int(1000))]);
        assert_eq!(PredicateEvaluator::new(&miss).evaluate(&tree), Ok(false));
    }

    #[test]
    fn test_chains_fold_left_to_right() {
        assert_eq!(value_of("1 - 2 - 3"), Ok(Value::Int(-4)));
        assert_eq!(value_of("100 / 10 / 5 * 3"), Ok(Value::Int(6)));
        assert_eq!(eval("false && missing || true"), Ok(true));
        assert_eq!(eval("true || missing && other"), Ok(true));
        assert_eq!(value_of("1 / 0 + missing"), Err(PredicateError::DivisionByZero));
        assert_eq!(
            value_of("missing + 1 / 0"),
            Err(PredicateError::UnresolvedIdentifier { name: "missing".into() })
        );
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(value_of("7 / 2"), Ok(Value::Int(3)));
        assert_eq!(value_of("-7 / 2"), Ok(Value::Int(-3)));
        assert_eq!(value_of("-7 % 3"), Ok(Value::Int(-1)));
        assert_eq!(value_of("2 + 3 * 4"), Ok(Value::Int(14)));
        assert_eq!(value_of("(2 + 3) * 4"), Ok(Value::Int(20)));
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(value_of("7 / 2.0"), Ok(Value::Float(3.5)));
        assert_eq!(value_of("1.5 + 1"), Ok(Value::Float(2.5)));
        assert_eq!(value_of("-.5"), Ok(Value::Float(-0.5)));
        assert_eq!(value_of("5.5 % 2"), Ok(Value::Float(1.5)));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(value_of("'ab' + \"cd\""), Ok(Value::from("abcd")));
        assert!(matches!(value_of("'ab' - 'a'"), Err(PredicateError::TypeError { .. })));
        assert!(matches!(value_of("'ab' + 1"), Err(PredicateError::TypeError { .. })));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("5 % 0 == 0"), Err(PredicateError::DivisionByZero));
        assert_eq!(value_of("5 % 0"), Err(PredicateError::DivisionByZero));
        assert_eq!(value_of("1 / 0"), Err(PredicateError::DivisionByZero));
        assert_eq!(value_of("1.0 / 0"), Err(PredicateError::DivisionByZero));
        assert_eq!(value_of("1 % 0.0"), Err(PredicateError::DivisionByZero));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            value_of("9223372036854775807 + 1"),
            Err(PredicateError::ArithmeticOverflow { operator: "+" })
        );
        assert_eq!(
            value_of("-9223372036854775807 - 2"),
            Err(PredicateError::ArithmeticOverflow { operator: "-" })
        );
        assert_eq!(
            value_of("1e308 * 10"),
            Err(PredicateError::ArithmeticOverflow { operator: "*" })
        );
    }

    #[test]
    fn test_non_boolean_root_is_type_error() {
        let err = eval("1 + 1").unwrap_err();
        assert!(matches!(err, PredicateError::TypeError { .. }));
        assert!(err.to_string().contains("found number 2"), "{err}");
    }

    #[test]
    fn test_identifiers_and_calls() {
        let ctx = Context::from([
            ("x".to_string(), Value::Int(5)),
            ("limit".to_string(), Value::Float(4.5)),
            (
                "max".to_string(),
                Value::function("max", |args| match args {
                    [Value::Int(a), Value::Int(b)] => Ok(Value::Int(*a.max(b))),
                    _ => Err(CallError::Arity { expected: 2, found: args.len() }),
                }),
            ),
            ("blends".to_string(), Value::constant_function(true)),
        ]);

        assert_eq!(eval_in("x > limit", &ctx), Ok(true));
        assert_eq!(eval_in("max(x, 9) == 9", &ctx), Ok(true));
        assert_eq!(eval_in("blends()", &ctx), Ok(true));
        assert_eq!(
            eval_in("max(x) == 1", &ctx),
            Err(PredicateError::CallFailed {
                name: "max".into(),
                source: CallError::Arity { expected: 2, found: 1 },
            })
        );
        assert!(matches!(eval_in("x(1)", &ctx), Err(PredicateError::TypeError { .. })));
    }

    #[test]
    fn test_rebinding_changes_result() {
        let tree = parse("x > 7").unwrap();
        let mut ctx = Context::from([("x".to_string(), Value::Int(5))]);
        assert_eq!(PredicateEvaluator::new(&ctx).evaluate(&tree), Ok(false));

        ctx.insert("x".to_string(), Value::Int(10));
        assert_eq!(PredicateEvaluator::new(&ctx).evaluate(&tree), Ok(true));
    }
}
