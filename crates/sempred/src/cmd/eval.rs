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

//! `sempred eval`

use std::{collections::HashMap, fs, path::Path};

use eyre::{bail, eyre, Result, WrapErr};
use sempred_common::{normalize_predicate, Value};
use sempred_engine::{eval::PredicateEvaluator, expr::parse};
use tracing::debug;

use super::render_parse_error;
use crate::EvalArgs;

/// Evaluate one expression and print the result.
pub fn eval_expression(args: &EvalArgs) -> Result<()> {
    let text = normalize_predicate(&args.expression);
    let tree = parse(&text).map_err(|err| eyre!(render_parse_error(&text, &err)))?;

    let mut bindings = match &args.bindings_file {
        Some(path) => load_bindings_file(path)?,
        None => HashMap::new(),
    };
    for binding in &args.bindings {
        let (name, value) = parse_binding(binding)?;
        bindings.insert(name, value);
    }
    debug!("Evaluating `{tree}` with {} bindings", bindings.len());

    let evaluator = PredicateEvaluator::new(&bindings);
    if args.value {
        println!("{}", evaluator.evaluate_value(&tree)?);
    } else {
        println!("{}", evaluator.evaluate(&tree)?);
    }
    Ok(())
}

/// Read a JSON object mapping names to scalar values.
fn load_bindings_file(path: &Path) -> Result<HashMap<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bindings file: {}", path.display()))?;
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse bindings file as a JSON object: {}", path.display()))?;

    object
        .iter()
        .map(|(name, json)| -> Result<(String, Value)> {
            let value = Value::from_json(json)
                .wrap_err_with(|| format!("Invalid binding `{name}` in {}", path.display()))?;
            Ok((name.clone(), value))
        })
        .collect()
}

/// Parse `name=value`. Values that form a constant expression (numbers,
/// booleans, quoted strings, negated numbers) are evaluated; anything else is
/// taken as a raw string.
fn parse_binding(binding: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = binding.split_once('=') else {
        bail!("Invalid binding `{binding}`. Expected NAME=VALUE");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid binding `{binding}`: empty name");
    }

    let constants = HashMap::<String, Value>::new();
    let value = parse(raw)
        .ok()
        .filter(|tree| tree.free_identifiers().is_empty())
        .and_then(|tree| PredicateEvaluator::new(&constants).evaluate_value(&tree).ok())
        .unwrap_or_else(|| Value::Str(raw.to_string()));

    Ok((name.to_string(), value))
}
