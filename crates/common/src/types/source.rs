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

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    str::FromStr,
};

use eyre::{eyre, Error, Result};
use serde::{Deserialize, Serialize};

use crate::normalize_predicate;

/// Identifies a predicate-guarded decision point in a grammar.
///
/// Predicates are numbered per rule in order of appearance, which is also how the
/// grammar interpreter reports them when it reaches a decision point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateLocation {
    /// Name of the rule containing the predicate.
    pub rule_name: String,
    /// Zero-based index of the predicate within the rule.
    pub occurrence_index: usize,
}

impl PredicateLocation {
    /// Creates a new location.
    pub fn new(rule_name: impl Into<String>, occurrence_index: usize) -> Self {
        Self { rule_name: rule_name.into(), occurrence_index }
    }
}

impl Display for PredicateLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rule_name, self.occurrence_index)
    }
}

impl FromStr for PredicateLocation {
    type Err = Error;

    /// Parses a location in the format `<rule>:<index>`.
    fn from_str(s: &str) -> Result<Self> {
        let (rule, index) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| eyre!("Invalid predicate location. Expected <rule>:<index>, got: {s}"))?;
        let rule = rule.trim();
        if rule.is_empty() {
            return Err(eyre!("Predicate location has an empty rule name: {s}"));
        }
        let occurrence_index =
            index.trim().parse::<usize>().map_err(|e| eyre!("Invalid occurrence index: {e}"))?;
        Ok(Self::new(rule, occurrence_index))
    }
}

/// A semantic predicate as extracted from a loaded grammar.
///
/// Sources are created when a grammar is loaded and never change afterwards. Two
/// sources with identical text at different locations are distinct predicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredicateSource {
    /// Grammar file the predicate was extracted from.
    pub grammar_file: PathBuf,
    /// Name of the rule containing the predicate.
    pub rule_name: String,
    /// Zero-based index of the predicate within the rule.
    pub occurrence_index: usize,
    /// Normalized expression text.
    pub text: String,
}

impl PredicateSource {
    /// Creates a predicate source, normalizing its text.
    ///
    /// The text may still carry the grammar's `{ ... }?` predicate wrapper.
    pub fn new(
        grammar_file: impl AsRef<Path>,
        rule_name: impl Into<String>,
        occurrence_index: usize,
        text: &str,
    ) -> Self {
        Self {
            grammar_file: grammar_file.as_ref().to_path_buf(),
            rule_name: rule_name.into(),
            occurrence_index,
            text: normalize_predicate(text),
        }
    }

    /// The decision point this predicate guards.
    pub fn location(&self) -> PredicateLocation {
        PredicateLocation::new(self.rule_name.clone(), self.occurrence_index)
    }
}

impl Display for PredicateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{} {{{}}}?",
            self.grammar_file.display(),
            self.rule_name,
            self.occurrence_index,
            self.text
        )
    }
}
