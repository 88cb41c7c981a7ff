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

//! Command implementations.

mod check;
mod eval;
mod run;

pub use check::check_manifest;
pub use eval::eval_expression;
pub use run::run_manifest;

use sempred_engine::ParseError;

/// Render a parse error with a caret under the offending character.
///
/// The padding copies whitespace from the text, so tabs before the offset line
/// up with the echoed line.
fn render_parse_error(text: &str, err: &ParseError) -> String {
    let padding: String = text
        .chars()
        .take(err.offset)
        .map(|c| if c.is_whitespace() { c } else { ' ' })
        .collect();
    format!("{err}\n    {text}\n    {padding}^")
}
