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

//! Failure taxonomy for predicate parsing and evaluation.
//!
//! Every failure except [`PredicateError::StaleHandle`] is recoverable: it is
//! returned to the caller as a value, the session is left untouched, and the
//! grammar interpreter falls back to its default branch. A stale handle means the
//! caller kept handles across a grammar reload, which is a programming error.

use sempred_common::{CallError, PredicateLocation};
use thiserror::Error;

use crate::PredicateHandle;

/// Malformed predicate text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at offset {offset}: {message}")]
pub struct ParseError {
    /// Character offset (not byte offset) of the offending input.
    pub offset: usize,
    /// Description of what was expected or found.
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }
}

/// Errors that can occur while resolving or evaluating a predicate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredicateError {
    /// The predicate text is outside the supported expression subset.
    #[error(transparent)]
    ParseFailure(#[from] ParseError),

    /// A name is not bound in the current context.
    #[error("unresolved identifier `{name}`")]
    UnresolvedIdentifier {
        /// The missing name
        name: String,
    },

    /// Operand kinds do not fit an operator, or the predicate is not boolean.
    #[error("type error: {message}")]
    TypeError {
        /// Description of the mismatch
        message: String,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer overflow, or a floating result that is not finite.
    #[error("arithmetic overflow in `{operator}`")]
    ArithmeticOverflow {
        /// Operator symbol
        operator: &'static str,
    },

    /// A bound callable reported a failure.
    #[error("call to `{name}` failed: {source}")]
    CallFailed {
        /// Function name as written in the predicate
        name: String,
        /// Failure reported by the callable
        #[source]
        source: CallError,
    },

    /// No predicate is registered at the requested location.
    #[error("no predicate registered at {location}")]
    UnknownPredicate {
        /// The requested location
        location: PredicateLocation,
    },

    /// The handle belongs to a registry that has since been rebuilt.
    #[error("stale predicate handle {handle}")]
    StaleHandle {
        /// The offending handle
        handle: PredicateHandle,
    },
}

impl PredicateError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError { message: message.into() }
    }

    /// Whether the error signals a registry/session lifetime mismatch.
    ///
    /// Callers must not fall back on fatal errors; they have to refresh their
    /// handles from the current registry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StaleHandle { .. })
    }

    /// Whether the error is a permanent property of the predicate text.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::ParseFailure(_))
    }
}

/// Result type for predicate operations.
pub type PredicateResult<T> = Result<T, PredicateError>;

/// Outcome of evaluating one predicate: a boolean or a failure descriptor.
pub type EvaluationResult = PredicateResult<bool>;
