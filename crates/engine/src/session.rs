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

//! Evaluation session of one debug run.
//!
//! A session holds the current variable bindings and the registry of the loaded
//! grammar. The grammar interpreter updates bindings as it parses and asks the
//! session for a decision whenever it reaches a predicate-guarded alternative.
//!
//! Bindings live in a persistent map: [`EvaluationSession::get_bindings`] hands
//! out an immutable snapshot without copying, and later updates never show up in
//! snapshots taken earlier.

use std::sync::Arc;

use itertools::Itertools;
use rpds::HashTrieMapSync;
use sempred_common::{PredicateLocation, Value};
use tracing::{debug, info, trace, warn};

use crate::{
    eval::{evaluate, BindingContext},
    EvaluationResult, PredicateConfig, PredicateError, PredicateHandle, PredicateRegistry,
};

/// Immutable view of the bindings at one point of a debug run.
#[derive(Debug, Clone, Default)]
pub struct BindingSnapshot {
    bindings: HashTrieMapSync<String, Value>,
}

impl BindingSnapshot {
    /// Value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.size()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.keys().map(String::as_str).sorted().collect()
    }
}

impl BindingContext for BindingSnapshot {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// How a decision was reached.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// The predicate was evaluated.
    Evaluated,
    /// Evaluation is disabled; the configured disabled value was used.
    Disabled,
    /// Evaluation failed; the configured fallback value was used.
    Fallback(PredicateError),
}

/// Answer to "does the predicate at this decision point hold?".
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateDecision {
    /// The decision point
    pub location: PredicateLocation,
    /// Whether the guarded alternative is viable
    pub value: bool,
    /// How `value` was obtained
    pub outcome: DecisionOutcome,
}

impl PredicateDecision {
    /// Whether the value comes from the fallback setting.
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, DecisionOutcome::Fallback(_))
    }

    /// The evaluation failure behind a fallback decision.
    pub fn error(&self) -> Option<&PredicateError> {
        match &self.outcome {
            DecisionOutcome::Fallback(err) => Some(err),
            _ => None,
        }
    }
}

/// Bindings and predicates of one debug run.
#[derive(Debug)]
pub struct EvaluationSession {
    registry: Arc<PredicateRegistry>,
    config: PredicateConfig,
    bindings: BindingSnapshot,
}

impl EvaluationSession {
    /// Start a session over the predicates of a loaded grammar.
    pub fn new(registry: Arc<PredicateRegistry>, config: PredicateConfig) -> Self {
        info!(
            "Starting evaluation session for {} ({} predicates, generation {}, evaluation {})",
            registry.grammar_file().display(),
            registry.len(),
            registry.generation(),
            if config.enabled { "enabled" } else { "disabled" },
        );
        Self { registry, config, bindings: BindingSnapshot::default() }
    }

    /// Registry of the currently loaded grammar.
    pub fn registry(&self) -> &Arc<PredicateRegistry> {
        &self.registry
    }

    /// Active configuration.
    pub fn config(&self) -> &PredicateConfig {
        &self.config
    }

    /// Turn predicate evaluation on or off for the rest of the run.
    pub fn set_enabled(&mut self, enabled: bool) {
        debug!("Predicate evaluation enabled={enabled}");
        self.config.enabled = enabled;
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn set_binding(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        trace!("Binding {name} = {value}");
        self.bindings.bindings.insert_mut(name, value);
    }

    /// Remove a binding. Returns whether `name` was bound.
    pub fn remove_binding(&mut self, name: &str) -> bool {
        self.bindings.bindings.remove_mut(name)
    }

    /// Remove every binding.
    pub fn clear_bindings(&mut self) {
        self.bindings = BindingSnapshot::default();
    }

    /// Snapshot of the current bindings.
    pub fn get_bindings(&self) -> BindingSnapshot {
        self.bindings.clone()
    }

    /// Evaluate a registered predicate against the current bindings.
    pub fn evaluate_predicate(&self, handle: PredicateHandle) -> EvaluationResult {
        let tree = self.registry.lookup(handle)?;
        evaluate(&tree, &self.bindings)
    }

    /// Evaluate the predicate guarding a decision point.
    pub fn evaluate_at(&self, rule_name: &str, occurrence_index: usize) -> EvaluationResult {
        let location = PredicateLocation::new(rule_name, occurrence_index);
        let handle = self
            .registry
            .find_location(&location)
            .ok_or(PredicateError::UnknownPredicate { location })?;
        self.evaluate_predicate(handle)
    }

    /// Decide a predicate-guarded alternative.
    ///
    /// Never fails: a disabled session answers with `disabled_value`, and a failed
    /// evaluation answers with `fallback_value` and reports the failure.
    pub fn decide(&self, rule_name: &str, occurrence_index: usize) -> PredicateDecision {
        let location = PredicateLocation::new(rule_name, occurrence_index);

        if !self.config.enabled {
            return PredicateDecision {
                location,
                value: self.config.disabled_value,
                outcome: DecisionOutcome::Disabled,
            };
        }

        match self.evaluate_at(rule_name, occurrence_index) {
            Ok(value) => PredicateDecision { location, value, outcome: DecisionOutcome::Evaluated },
            Err(err) => {
                warn!(
                    "Predicate at {location} failed ({err}); falling back to {}",
                    self.config.fallback_value
                );
                PredicateDecision {
                    location,
                    value: self.config.fallback_value,
                    outcome: DecisionOutcome::Fallback(err),
                }
            }
        }
    }

    /// Swap in the registry of a reloaded grammar. Handles issued by the previous
    /// registry become stale; bindings are kept.
    pub fn reload_grammar(&mut self, registry: Arc<PredicateRegistry>) {
        info!(
            "Reloading grammar {} (generation {} -> {})",
            registry.grammar_file().display(),
            self.registry.generation(),
            registry.generation()
        );
        self.registry = registry;
    }
}

impl Drop for EvaluationSession {
    fn drop(&mut self) {
        debug!(
            "Ending evaluation session for {} with {} bindings",
            self.registry.grammar_file().display(),
            self.bindings.len()
        );
    }
}
