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

//! Sempred Common - Shared functionality for Sempred components
//!
//! This crate provides the pieces shared by the predicate engine and its front
//! ends: the runtime value model, predicate source descriptions, predicate text
//! normalization, environment variable names and logging setup.

/// Common types used throughout Sempred, including values and predicate sources
pub mod types;

/// Environment variable names read by Sempred components
pub mod env;
/// Normalization of predicate text extracted from grammars
pub mod expression;
/// Logging setup and utilities for consistent logging across Sempred components
pub mod logging;

pub use expression::*;
pub use logging::*;
pub use types::*;
