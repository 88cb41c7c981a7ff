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

/// Normalize predicate text as extracted from a grammar.
///
/// Strips an enclosing `{ ... }?` (or bare `{ ... }`) predicate wrapper and replaces
/// any contiguous whitespace outside string literals with a single space. String
/// literal contents, escapes included, are kept byte for byte.
pub fn normalize_predicate(text: &str) -> String {
    let inner = strip_predicate_wrapper(text.trim());

    let mut out = String::with_capacity(inner.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pending_space = false;

    for c in inner.chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
    }

    out
}

fn strip_predicate_wrapper(text: &str) -> &str {
    let Some(rest) = text.strip_prefix('{') else {
        return text;
    };
    rest.strip_suffix("}?").or_else(|| rest.strip_suffix('}')).unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_predicate_single_space() {
        assert_eq!(normalize_predicate("a < b"), "a < b");
    }

    #[test]
    fn test_normalize_predicate_multiple_spaces() {
        assert_eq!(normalize_predicate("a  <    b"), "a < b");
    }

    #[test]
    fn test_normalize_predicate_mixed_whitespace() {
        assert_eq!(normalize_predicate("a  \t\n  && b \r\n || c"), "a && b || c");
    }

    #[test]
    fn test_normalize_predicate_leading_trailing_whitespace() {
        assert_eq!(normalize_predicate("  x > 1  "), "x > 1");
        assert_eq!(normalize_predicate("\t\nx > 1\n\t"), "x > 1");
    }

    #[test]
    fn test_normalize_predicate_empty() {
        assert_eq!(normalize_predicate(""), "");
        assert_eq!(normalize_predicate("   "), "");
        assert_eq!(normalize_predicate("{}?"), "");
    }

    #[test]
    fn test_normalize_predicate_strips_wrapper() {
        assert_eq!(normalize_predicate("{version < 1000}?"), "version < 1000");
        assert_eq!(normalize_predicate("{ doesItBlend() }?"), "doesItBlend()");
        assert_eq!(normalize_predicate("  {\n  a &&\n  b\n}  "), "a && b");
    }

    #[test]
    fn test_normalize_predicate_keeps_unbalanced_brace() {
        assert_eq!(normalize_predicate("{a"), "{a");
    }

    #[test]
    fn test_normalize_predicate_preserves_string_literals() {
        assert_eq!(normalize_predicate("name  ==  \"a   b\""), "name == \"a   b\"");
        assert_eq!(normalize_predicate("s == 'x\t y'"), "s == 'x\t y'");
        assert_eq!(normalize_predicate(r#"s == "q\"  q"  &&  t"#), r#"s == "q\"  q" && t"#);
    }

    #[test]
    fn test_normalize_predicate_unicode_whitespace() {
        assert_eq!(normalize_predicate("a\u{00A0}<\u{2003}b"), "a < b");
    }
}
