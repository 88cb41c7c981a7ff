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

//! Sempred Engine - semantic predicate evaluation for grammar debugging
//!
//! Grammars for parser generators guard alternatives with semantic predicates:
//! small host-language boolean expressions such as `{ version < 1000 }?`. When a
//! grammar is debugged by interpretation, no generated parser exists that could
//! run those expressions. This crate parses the common C-like subset of such
//! predicates and evaluates it against bindings supplied by the debug session.
//!
//! # Components
//!
//! - [`expr`] - predicate expression parser and printer
//! - [`eval`] - identifier resolution and tree evaluation
//! - [`registry`] - predicates of one loaded grammar, addressed by handle
//! - [`session`] - bindings and decisions of one debug run
//! - [`config`] - evaluation settings
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = PredicateRegistry::new("Expr.g4");
//! registry.register_text("expr", 0, "{ version < 1000 }?");
//!
//! let mut session = EvaluationSession::new(Arc::new(registry), PredicateConfig::default());
//! session.set_binding("version", 999);
//! assert!(session.decide("expr", 0).value);
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod expr;
pub mod registry;
pub mod session;

pub use config::*;
pub use error::*;
pub use registry::*;
pub use session::*;
