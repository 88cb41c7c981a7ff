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

//! Resolution of free names against a binding context.
//!
//! Resolution happens at evaluation time, never at parse time: the same tree
//! can resolve in one context and fail in another. A missing name is always an
//! [`PredicateError::UnresolvedIdentifier`], never an implicit `false`.

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
    sync::Arc,
};

use sempred_common::{Callable, Value};

use crate::{
    expr::{BinaryOp, ExpressionNode, Literal, UnaryOp},
    PredicateError, PredicateResult,
};

/// Source of identifier bindings.
///
/// Implemented for session snapshots and for plain maps, so hosts can evaluate
/// predicates against whatever they already keep their variables in.
pub trait BindingContext {
    /// The value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl<S: BuildHasher> BindingContext for HashMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl BindingContext for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<C: BindingContext + ?Sized> BindingContext for &C {
    fn lookup(&self, name: &str) -> Option<&Value> {
        (**self).lookup(name)
    }
}

/// A node after its free name has been looked up.
#[derive(Debug)]
pub enum ResolvedNode<'a> {
    /// An identifier and the value bound to it.
    Value(&'a Value),
    /// A call whose name is bound to a callable.
    Call {
        /// Function name as written
        name: &'a str,
        /// The bound function
        callable: &'a Arc<dyn Callable>,
        /// Unevaluated argument expressions
        args: &'a [ExpressionNode],
    },
    /// A literal, which has nothing to resolve.
    Literal(&'a Literal),
    /// A unary operator over an unresolved operand.
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand expression
        operand: &'a ExpressionNode,
    },
    /// A binary operator over unresolved operands.
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: &'a ExpressionNode,
        /// Right operand
        rhs: &'a ExpressionNode,
    },
}

/// Looks names up in one binding context.
#[derive(Debug)]
pub struct BindingResolver<'c, C: ?Sized> {
    context: &'c C,
}

// Manual impls: deriving would require `C: Clone`.
impl<C: ?Sized> Clone for BindingResolver<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for BindingResolver<'_, C> {}

impl<'c, C: BindingContext + ?Sized> BindingResolver<'c, C> {
    /// Create a resolver over `context`.
    pub fn new(context: &'c C) -> Self {
        Self { context }
    }

    /// The value bound to `name`.
    fn lookup_value(&self, name: &str) -> PredicateResult<&'c Value> {
        self.context
            .lookup(name)
            .ok_or_else(|| PredicateError::UnresolvedIdentifier { name: name.to_string() })
    }

    /// The callable bound to `name`; a non-callable binding is a type error.
    fn lookup_callable(&self, name: &str) -> PredicateResult<&'c Arc<dyn Callable>> {
        match self.lookup_value(name)? {
            Value::Callable(callable) => Ok(callable),
            other => Err(PredicateError::type_error(format!(
                "`{name}` is bound to a {} and cannot be called",
                other.kind()
            ))),
        }
    }

    /// Resolve the free name of `node`, if it has one.
    ///
    /// Operands are not resolved: the evaluator resolves them one by one, so a
    /// short-circuited operand never needs a binding.
    pub fn resolve<'a>(&self, node: &'a ExpressionNode) -> PredicateResult<ResolvedNode<'a>>
    where
        'c: 'a,
    {
        match node {
            ExpressionNode::Identifier(name) => self.lookup_value(name).map(ResolvedNode::Value),
            ExpressionNode::Call { name, args } => Ok(ResolvedNode::Call {
                name: name.as_str(),
                callable: self.lookup_callable(name)?,
                args: args.as_slice(),
            }),
            ExpressionNode::Literal(literal) => Ok(ResolvedNode::Literal(literal)),
            ExpressionNode::Unary { op, operand } => {
                Ok(ResolvedNode::Unary { op: *op, operand: operand.as_ref() })
            }
            ExpressionNode::Binary { op, lhs, rhs } => {
                Ok(ResolvedNode::Binary { op: *op, lhs: lhs.as_ref(), rhs: rhs.as_ref() })
            }
        }
    }
}

/// Resolve `node` against `context`.
pub fn resolve<'a, C: BindingContext + ?Sized>(
    node: &'a ExpressionNode,
    context: &'a C,
) -> PredicateResult<ResolvedNode<'a>> {
    BindingResolver::new(context).resolve(node)
}

/// Free names of `node` that `context` does not bind, in sorted order.
pub fn unresolved_identifiers<'a, C: BindingContext + ?Sized>(
    node: &'a ExpressionNode,
    context: &C,
) -> Vec<&'a str> {
    node.free_identifiers().into_iter().filter(|name| context.lookup(name).is_none()).collect()
}
