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

//! Abstract syntax tree for predicate expressions.

use std::collections::BTreeSet;

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `true` or `false`
    Bool(bool),
    /// Integer literal; always non-negative when produced by the parser
    Int(i64),
    /// Finite floating literal
    Float(f64),
    /// String literal with escapes already decoded
    Str(String),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

impl UnaryOp {
    /// Source symbol of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
        }
    }
}

/// Infix operators, all left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

/// Binding strength of prefix operators, above every infix operator.
pub(crate) const UNARY_PRECEDENCE: u8 = 7;

impl BinaryOp {
    /// Every operator, lowest precedence first.
    pub const ALL: [Self; 13] = [
        Self::Or,
        Self::And,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Rem,
    ];

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne => 3,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::Rem => 6,
        }
    }

    /// Source symbol of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

/// A node of a predicate expression tree.
///
/// Nodes own their children, so an AST is always a finite tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Constant value
    Literal(Literal),
    /// Free name, resolved against the binding context at evaluation time
    Identifier(String),
    /// Prefix operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<ExpressionNode>,
    },
    /// Infix operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<ExpressionNode>,
        /// Right operand
        rhs: Box<ExpressionNode>,
    },
    /// Call of a bound function: `name(args...)`
    Call {
        /// Function name, resolved against the binding context
        name: String,
        /// Argument expressions, evaluated left to right
        args: Vec<ExpressionNode>,
    },
}

impl ExpressionNode {
    /// Build a unary node.
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary { op, operand: Box::new(operand) }
    }

    /// Build a binary node.
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    /// Build an identifier node.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Build a call node.
    pub fn call(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call { name: name.into(), args }
    }

    /// Nesting depth of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_) | Self::Identifier(_) => 1,
            Self::Unary { operand, .. } => 1 + operand.depth(),
            Self::Binary { lhs, rhs, .. } => 1 + lhs.depth().max(rhs.depth()),
            Self::Call { args, .. } => 1 + args.iter().map(Self::depth).max().unwrap_or(0),
        }
    }

    /// Every free name referenced by the tree: variables and called functions.
    pub fn free_identifiers(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::Identifier(name) => {
                names.insert(name.as_str());
            }
            Self::Unary { operand, .. } => operand.collect_identifiers(names),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(names);
                rhs.collect_identifiers(names);
            }
            Self::Call { name, args } => {
                names.insert(name.as_str());
                for arg in args {
                    arg.collect_identifiers(names);
                }
            }
        }
    }

    /// Binding strength of this node when printed, used to place parentheses.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { .. } => UNARY_PRECEDENCE,
            Self::Literal(_) | Self::Identifier(_) | Self::Call { .. } => u8::MAX,
        }
    }
}

impl From<Literal> for ExpressionNode {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}
