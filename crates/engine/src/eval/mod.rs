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

//! Predicate evaluation.
//!
//! Evaluation combines two pieces:
//!
//! - [`resolver`] looks free identifiers and function names up in a
//!   [`BindingContext`]
//! - [`evaluator`] walks the expression tree and applies the operators
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use sempred_engine::{expr::parse, eval::PredicateEvaluator};
//!
//! let bindings = HashMap::from([("version".to_string(), Value::Int(9))]);
//! let tree = parse("version >= 8")?;
//! assert!(PredicateEvaluator::new(&bindings).evaluate(&tree)?);
//! ```

pub mod evaluator;
pub mod resolver;

pub use evaluator::PredicateEvaluator;
pub use resolver::{
    resolve, unresolved_identifiers, BindingContext, BindingResolver, ResolvedNode,
};

use crate::{expr::ExpressionNode, EvaluationResult};

/// Evaluate `node` as a predicate against `context`.
pub fn evaluate<C: BindingContext + ?Sized>(node: &ExpressionNode, context: &C) -> EvaluationResult {
    PredicateEvaluator::new(context).evaluate(node)
}
