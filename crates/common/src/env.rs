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

//! Environment variable name constants for Sempred configuration.
//!
//! These constants are the single source of truth for environment variable names
//! read by the engine and the command-line front end.
//!
//! # Environment Variables
//!
//! - [`SEMPRED_CONFIG`] - Path of the predicate configuration file
//! - [`SEMPRED_PREDICATES`] - Forces predicate evaluation on or off

/// Environment variable naming the predicate configuration file.
///
/// # Default
///
/// When not set, `sempred.toml` in the working directory is used if it exists,
/// otherwise built-in defaults apply.
///
/// # Examples
///
/// ```bash
/// SEMPRED_CONFIG=~/grammars/debug.toml sempred run predicates.toml
/// ```
///
/// # Related
///
/// The CLI argument `--config` takes precedence over this variable.
pub const SEMPRED_CONFIG: &str = "SEMPRED_CONFIG";

/// Environment variable forcing semantic predicate evaluation on or off.
///
/// # Values
///
/// - `on`, `true`, `1` - Evaluate predicates
/// - `off`, `false`, `0` - Never evaluate; decisions use the configured disabled value
///
/// Any other value is ignored with a warning. The variable overrides the `enabled`
/// setting of the configuration file.
///
/// # Examples
///
/// ```bash
/// SEMPRED_PREDICATES=off sempred run predicates.toml
/// ```
pub const SEMPRED_PREDICATES: &str = "SEMPRED_PREDICATES";
