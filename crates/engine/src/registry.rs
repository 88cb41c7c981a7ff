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

//! Registry of the predicates of one loaded grammar.
//!
//! Predicates are stored in an arena and addressed by [`PredicateHandle`]s. Each
//! registry carries a process-unique generation, and every handle remembers the
//! generation that issued it, so a handle that outlives a grammar reload is
//! detected instead of silently addressing a different predicate.
//!
//! Expression trees are parsed lazily on first lookup and cached per slot. A parse
//! failure is cached as well: a predicate that does not parse never will.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use once_cell::sync::OnceCell;
use sempred_common::{PredicateLocation, PredicateSource};
use tracing::{debug, warn};

use crate::{
    expr::{parse, ExpressionNode},
    ParseError, PredicateError, PredicateResult,
};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Stable reference to a registered predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateHandle {
    generation: u64,
    index: usize,
}

impl PredicateHandle {
    /// Generation of the registry that issued this handle.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Arena slot within that registry.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for PredicateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@gen{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    source: PredicateSource,
    tree: OnceCell<Result<Arc<ExpressionNode>, ParseError>>,
}

/// Predicates of one grammar load, indexed by handle and by location.
#[derive(Debug)]
pub struct PredicateRegistry {
    generation: u64,
    grammar_file: PathBuf,
    slots: Vec<Slot>,
    locations: HashMap<PredicateLocation, usize>,
}

impl PredicateRegistry {
    /// Create an empty registry with a fresh generation.
    pub fn new(grammar_file: impl AsRef<Path>) -> Self {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let grammar_file = grammar_file.as_ref().to_path_buf();
        debug!("Created predicate registry generation {generation} for {}", grammar_file.display());
        Self { generation, grammar_file, slots: Vec::new(), locations: HashMap::new() }
    }

    /// Generation of this registry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Grammar file this registry was built for.
    pub fn grammar_file(&self) -> &Path {
        &self.grammar_file
    }

    /// Number of registered predicates.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no predicate has been registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Register a predicate and return its handle.
    ///
    /// The text is not parsed until the first [`lookup`](Self::lookup). If the
    /// location already has a predicate, it is re-pointed to the new one; the old
    /// handle stays valid.
    ///
    /// Locations are keyed by rule and occurrence only. A source from another
    /// grammar file is kept as given, with a warning.
    pub fn register(&mut self, source: PredicateSource) -> PredicateHandle {
        let index = self.slots.len();
        let location = source.location();

        if source.grammar_file != self.grammar_file {
            warn!(
                "Predicate at {location} comes from {}, but this registry holds {}",
                source.grammar_file.display(),
                self.grammar_file.display()
            );
        }

        if let Some(previous) = self.locations.insert(location.clone(), index) {
            warn!(
                "Predicate at {location} registered twice (slots {previous} and {index}); \
                 the later registration wins"
            );
        }
        debug!("Registered predicate {source} in slot {index}");

        self.slots.push(Slot { source, tree: OnceCell::new() });
        PredicateHandle { generation: self.generation, index }
    }

    /// Register predicate text found in this registry's grammar file.
    pub fn register_text(
        &mut self,
        rule_name: impl Into<String>,
        occurrence_index: usize,
        text: &str,
    ) -> PredicateHandle {
        let source = PredicateSource::new(&self.grammar_file, rule_name, occurrence_index, text);
        self.register(source)
    }

    fn slot(&self, handle: PredicateHandle) -> PredicateResult<&Slot> {
        if handle.generation != self.generation {
            return Err(PredicateError::StaleHandle { handle });
        }
        self.slots.get(handle.index).ok_or(PredicateError::StaleHandle { handle })
    }

    /// The expression tree of a predicate, parsing it on first use.
    pub fn lookup(&self, handle: PredicateHandle) -> PredicateResult<Arc<ExpressionNode>> {
        let slot = self.slot(handle)?;
        let cached = slot.tree.get_or_init(|| match parse(&slot.source.text) {
            Ok(tree) => {
                debug!("Parsed predicate {handle} at {}: {tree}", slot.source.location());
                Ok(Arc::new(tree))
            }
            Err(err) => {
                warn!("Predicate {} does not parse: {err}", slot.source);
                Err(err)
            }
        });

        match cached {
            Ok(tree) => Ok(Arc::clone(tree)),
            Err(err) => Err(err.clone().into()),
        }
    }

    /// Handle of the predicate guarding a decision point.
    pub fn find(&self, rule_name: &str, occurrence_index: usize) -> Option<PredicateHandle> {
        self.find_location(&PredicateLocation::new(rule_name, occurrence_index))
    }

    /// Handle of the predicate registered at `location`.
    pub fn find_location(&self, location: &PredicateLocation) -> Option<PredicateHandle> {
        self.locations
            .get(location)
            .map(|&index| PredicateHandle { generation: self.generation, index })
    }

    /// Source of a registered predicate.
    pub fn source(&self, handle: PredicateHandle) -> PredicateResult<&PredicateSource> {
        self.slot(handle).map(|slot| &slot.source)
    }

    /// Every handle, in registration order.
    pub fn handles(&self) -> impl Iterator<Item = PredicateHandle> + '_ {
        (0..self.slots.len()).map(|index| PredicateHandle { generation: self.generation, index })
    }

    /// Parse every predicate and return those that fail.
    pub fn parse_failures(&self) -> Vec<(PredicateHandle, ParseError)> {
        self.handles()
            .filter_map(|handle| match self.lookup(handle) {
                Err(PredicateError::ParseFailure(err)) => Some((handle, err)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PredicateRegistry {
        PredicateRegistry::new("Expr.g4")
    }

    #[test]
    fn test_generations_are_unique() {
        let a = registry();
        let b = registry();
        assert_ne!(a.generation(), b.generation());
    }

    #[test]
    fn test_lazy_parse_and_cache() {
        let mut reg = registry();
        let handle = reg.register_text("expr", 0, "{ version < 1000 }?");
        assert!(reg.slots[0].tree.get().is_none());

        let first = reg.lookup(handle).unwrap();
        let second = reg.lookup(handle).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.to_string(), "version < 1000");
    }

    #[test]
    fn test_parse_failure_is_cached() {
        let mut reg = registry();
        let handle = reg.register_text("expr", 0, "x = 1");

        let first = reg.lookup(handle).unwrap_err();
        assert!(first.is_parse_failure());
        for _ in 0..3 {
            assert_eq!(reg.lookup(handle).unwrap_err(), first);
        }
        assert_eq!(reg.parse_failures().len(), 1);
    }

    #[test]
    fn test_identical_text_at_different_locations() {
        let mut reg = registry();
        let a = reg.register_text("stat", 0, "ready");
        let b = reg.register_text("expr", 1, "ready");
        assert_ne!(a, b);
        assert!(!Arc::ptr_eq(&reg.lookup(a).unwrap(), &reg.lookup(b).unwrap()));
        assert_eq!(reg.find("stat", 0), Some(a));
        assert_eq!(reg.find("expr", 1), Some(b));
        assert_eq!(reg.find("expr", 0), None);
    }

    #[test]
    fn test_stale_handle() {
        let mut old = registry();
        let handle = old.register_text("expr", 0, "true");

        let mut rebuilt = registry();
        rebuilt.register_text("expr", 0, "true");

        let err = rebuilt.lookup(handle).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err, PredicateError::StaleHandle { handle });
        assert!(rebuilt.source(handle).is_err());
    }

    #[test]
    fn test_duplicate_location_repoints() {
        let mut reg = registry();
        let first = reg.register_text("expr", 0, "a");
        let second = reg.register_text("expr", 0, "b");

        assert_eq!(reg.find("expr", 0), Some(second));
        assert_eq!(reg.source(first).unwrap().text, "a");
        assert_eq!(reg.handles().collect::<Vec<_>>(), vec![first, second]);
    }

    #[test]
    fn test_source_from_other_grammar_is_kept() {
        let mut reg = registry();
        let handle = reg.register(PredicateSource::new("Other.g4", "expr", 0, "ready"));

        assert_eq!(reg.find("expr", 0), Some(handle));
        let source = reg.source(handle).unwrap();
        assert_eq!(source.grammar_file, PathBuf::from("Other.g4"));
        assert_eq!(reg.grammar_file(), Path::new("Expr.g4"));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PredicateRegistry>();
    }
}
