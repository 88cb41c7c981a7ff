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

//! Predicate expression language: tokens, syntax tree, parser and printer.
//!
//! The accepted language is a small side-effect free C-like subset: literals,
//! identifiers, calls of bound functions, `!` and unary `-`, arithmetic,
//! comparisons and the short-circuit logical operators.

pub mod ast;
mod lexer;
mod parser;
mod printer;

pub use ast::{BinaryOp, ExpressionNode, Literal, UnaryOp};
pub use parser::{parse, MAX_NESTING_DEPTH, MAX_TREE_DEPTH};
