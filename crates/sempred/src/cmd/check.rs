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

//! `sempred check`

use std::path::Path;

use eyre::{bail, Result};
use sempred_engine::{eval::unresolved_identifiers, PredicateError};
use tracing::info;

use super::render_parse_error;
use crate::manifest::Manifest;

/// Parse every predicate of a manifest, reporting parse failures and names the
/// manifest does not bind. Fails if any predicate does not parse.
pub fn check_manifest(path: &Path) -> Result<()> {
    let manifest = Manifest::load(path)?;
    let registry = manifest.registry();
    let bindings = manifest.binding_values()?;
    info!("Checking {} predicates of {}", registry.len(), manifest.grammar.display());

    let mut failures = 0;
    let mut unbound = 0;
    for handle in registry.handles() {
        let source = registry.source(handle)?;
        let location = source.location();

        match registry.lookup(handle) {
            Ok(tree) => {
                let missing = unresolved_identifiers(&tree, &bindings);
                if missing.is_empty() {
                    println!("ok      {location}  {tree}");
                } else {
                    unbound += 1;
                    println!("unbound {location}  {tree}  (unbound: {})", missing.join(", "));
                }
            }
            Err(PredicateError::ParseFailure(err)) => {
                failures += 1;
                println!("error   {location}  {}", render_parse_error(&source.text, &err));
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!(
        "{} predicate(s): {failures} failed to parse, {unbound} with unbound names",
        registry.len()
    );
    if failures > 0 {
        bail!("{failures} predicate(s) failed to parse");
    }
    Ok(())
}
