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

//! `sempred run`

use std::{path::Path, sync::Arc};

use eyre::{bail, Result, WrapErr};
use itertools::Itertools;
use sempred_common::PredicateLocation;
use sempred_engine::{DecisionOutcome, EvaluationSession, PredicateConfig};

use crate::manifest::Manifest;

/// Decide the predicates of a manifest, or only the one at `at`.
pub fn run_manifest(path: &Path, at: Option<&str>, config: PredicateConfig) -> Result<()> {
    let manifest = Manifest::load(path)?;
    let registry = Arc::new(manifest.registry());

    let locations: Vec<PredicateLocation> = match at {
        Some(at) => {
            let location: PredicateLocation =
                at.parse().wrap_err_with(|| format!("Invalid --at value `{at}`"))?;
            if registry.find_location(&location).is_none() {
                bail!("No predicate registered at {location}");
            }
            vec![location]
        }
        None => registry
            .handles()
            .filter_map(|handle| registry.source(handle).ok().map(|source| source.location()))
            .unique()
            .collect(),
    };

    let mut session = EvaluationSession::new(registry, config);
    for (name, value) in manifest.binding_values()? {
        session.set_binding(name, value);
    }

    for location in &locations {
        let decision = session.decide(&location.rule_name, location.occurrence_index);
        match &decision.outcome {
            DecisionOutcome::Evaluated => println!("{location}  {}", decision.value),
            DecisionOutcome::Disabled => println!("{location}  {}  (disabled)", decision.value),
            DecisionOutcome::Fallback(err) => {
                println!("{location}  {}  (fallback: {err})", decision.value)
            }
        }
    }
    Ok(())
}
