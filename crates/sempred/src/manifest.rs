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

//! Predicate manifests.
//!
//! A manifest lists the predicates of one grammar and the bindings to decide
//! them with:
//!
//! ```toml
//! grammar = "Expr.g4"
//!
//! [[predicates]]
//! rule = "stat"
//! occurrence = 0
//! text = "{ version < 1000 }?"
//!
//! [bindings]
//! version = 999
//!
//! [functions]
//! doesItBlend = true
//! ```
//!
//! Functions are stubs: each name is bound to a callable that ignores its
//! arguments and returns the given value.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use eyre::{bail, Result, WrapErr};
use sempred_common::Value;
use sempred_engine::PredicateRegistry;
use serde::Deserialize;
use tracing::debug;

/// One predicate of the grammar.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredicateEntry {
    /// Rule containing the predicate
    pub rule: String,
    /// Index of the predicate within the rule
    pub occurrence: usize,
    /// Predicate text as written in the grammar
    pub text: String,
}

/// Predicates and bindings of a debug scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Grammar file the predicates come from
    pub grammar: PathBuf,
    /// Predicates in grammar order
    #[serde(default)]
    pub predicates: Vec<PredicateEntry>,
    /// Variables visible to the predicates
    #[serde(default)]
    pub bindings: BTreeMap<String, toml::Value>,
    /// Constant stand-ins for host functions
    #[serde(default)]
    pub functions: BTreeMap<String, toml::Value>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let manifest: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest as TOML: {}", path.display()))?;

        debug!(
            "Loaded manifest {} with {} predicates for {}",
            path.display(),
            manifest.predicates.len(),
            manifest.grammar.display()
        );
        Ok(manifest)
    }

    /// Build the predicate registry of the manifest's grammar.
    pub fn registry(&self) -> PredicateRegistry {
        let mut registry = PredicateRegistry::new(&self.grammar);
        for entry in &self.predicates {
            registry.register_text(entry.rule.clone(), entry.occurrence, &entry.text);
        }
        registry
    }

    /// Every binding, functions included, as runtime values.
    pub fn binding_values(&self) -> Result<BTreeMap<String, Value>> {
        let mut values = BTreeMap::new();
        for (name, value) in &self.bindings {
            values.insert(name.clone(), scalar_value(name, value)?);
        }
        for (name, value) in &self.functions {
            if values.contains_key(name) {
                bail!("`{name}` is declared both as a binding and as a function");
            }
            values.insert(name.clone(), Value::constant_function(scalar_value(name, value)?));
        }
        Ok(values)
    }
}

fn scalar_value(name: &str, value: &toml::Value) -> Result<Value> {
    match value {
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Integer(i) => Ok(Value::Int(*i)),
        toml::Value::Float(f) if f.is_finite() => Ok(Value::Float(*f)),
        toml::Value::String(s) => Ok(Value::Str(s.clone())),
        other => bail!(
            "`{name}` must be a boolean, a number or a string, found {}",
            other.type_str()
        ),
    }
}
