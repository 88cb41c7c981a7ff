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

//! Tokenizer for predicate text.
//!
//! Offsets are character offsets into the original text, so errors point at the
//! same column a user sees in the grammar file.

use std::fmt;

use crate::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    AndAnd,
    OrOr,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier `{name}`"),
            Self::Int(_) | Self::Float(_) => f.write_str("number"),
            Self::Str(_) => f.write_str("string"),
            Self::True => f.write_str("`true`"),
            Self::False => f.write_str("`false`"),
            Self::AndAnd => f.write_str("`&&`"),
            Self::OrOr => f.write_str("`||`"),
            Self::Bang => f.write_str("`!`"),
            Self::EqEq => f.write_str("`==`"),
            Self::NotEq => f.write_str("`!=`"),
            Self::Lt => f.write_str("`<`"),
            Self::Le => f.write_str("`<=`"),
            Self::Gt => f.write_str("`>`"),
            Self::Ge => f.write_str("`>=`"),
            Self::Plus => f.write_str("`+`"),
            Self::Minus => f.write_str("`-`"),
            Self::Star => f.write_str("`*`"),
            Self::Slash => f.write_str("`/`"),
            Self::Percent => f.write_str("`%`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::Comma => f.write_str("`,`"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) offset: usize,
}

/// Split `text` into tokens, always terminated by [`Token::Eof`].
pub(crate) fn tokenize(text: &str) -> Result<Vec<Spanned>, ParseError> {
    Lexer { chars: text.chars().collect(), pos: 0 }.run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn text(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn run(mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.eat_while(char::is_whitespace);
            let offset = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Spanned { token: Token::Eof, offset });
                return Ok(tokens);
            };
            let token = match c {
                '0'..='9' => self.lex_number()?,
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.lex_number()?,
                '"' | '\'' => self.lex_string(c)?,
                c if c == '_' || c.is_ascii_alphabetic() => self.lex_word(),
                _ => self.lex_operator(c)?,
            };
            tokens.push(Spanned { token, offset });
        }
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        self.eat_while(|c| c == '_' || c.is_ascii_alphanumeric());
        match self.text(start).as_str() {
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Ident(self.text(start)),
        }
    }

    fn lex_operator(&mut self, c: char) -> Result<Token, ParseError> {
        let offset = self.pos;
        self.pos += 1;
        let next = self.peek();
        let token = match (c, next) {
            ('&', Some('&')) => Token::AndAnd,
            ('|', Some('|')) => Token::OrOr,
            ('!', Some('=')) => Token::NotEq,
            ('=', Some('=')) => Token::EqEq,
            ('<', Some('=')) => Token::Le,
            ('>', Some('=')) => Token::Ge,
            ('&', _) | ('|', _) => {
                return Err(ParseError::new(offset, format!("bitwise `{c}` is not supported")));
            }
            ('=', _) => {
                return Err(ParseError::new(offset, "assignment is not supported, use `==`"));
            }
            ('!', _) => return Ok(Token::Bang),
            ('<', _) => return Ok(Token::Lt),
            ('>', _) => return Ok(Token::Gt),
            ('+', _) => return Ok(Token::Plus),
            ('-', _) => return Ok(Token::Minus),
            ('*', _) => return Ok(Token::Star),
            ('/', _) => return Ok(Token::Slash),
            ('%', _) => return Ok(Token::Percent),
            ('(', _) => return Ok(Token::LParen),
            (')', _) => return Ok(Token::RParen),
            (',', _) => return Ok(Token::Comma),
            _ => return Err(ParseError::new(offset, format!("unexpected character `{c}`"))),
        };
        // Two-character operator.
        self.pos += 1;
        Ok(token)
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            self.eat_while(|c| c.is_ascii_hexdigit());
            if self.pos == digits_start {
                return Err(ParseError::new(self.pos, "expected hexadecimal digits"));
            }
            let digits = self.text(digits_start);
            self.reject_suffix()?;
            return i64::from_str_radix(&digits, 16)
                .map(Token::Int)
                .map_err(|_| ParseError::new(start, "integer literal does not fit in 64 bits"));
        }

        let mut is_float = false;
        self.eat_while(|c| c.is_ascii_digit());
        // `012` is octal in C and Java and a syntax error in strict JavaScript.
        if self.pos - start > 1 && self.chars[start] == '0' {
            return Err(ParseError::new(
                start,
                "leading zeros are not supported, octal literals are ambiguous across languages",
            ));
        }
        if self.peek() == Some('.') {
            if !self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                return Err(ParseError::new(self.pos + 1, "expected digits after decimal point"));
            }
            is_float = true;
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ParseError::new(self.pos, "expected exponent digits"));
            }
            self.eat_while(|c| c.is_ascii_digit());
        }
        self.reject_suffix()?;

        let text = self.text(start);
        if is_float {
            let text = if text.starts_with('.') { format!("0{text}") } else { text };
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Token::Float(value)),
                _ => Err(ParseError::new(start, "floating literal out of range")),
            }
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| ParseError::new(start, "integer literal does not fit in 64 bits"))
        }
    }

    /// Type suffixes such as `10L` or `1.5f` belong to the target language.
    fn reject_suffix(&self) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == '_' || c.is_alphanumeric() => {
                Err(ParseError::new(self.pos, format!("invalid suffix `{c}` on numeric literal")))
            }
            _ => Ok(()),
        }
    }

    fn lex_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(ParseError::new(start, "unterminated string literal"));
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(Token::Str(value));
                }
                Some('\\') => {
                    let escape_at = self.pos;
                    self.pos += 1;
                    let decoded = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('x') => self.read_hex_escape(escape_at, 2)?,
                        Some('u') => self.read_hex_escape(escape_at, 4)?,
                        None => return Err(ParseError::new(start, "unterminated string literal")),
                        Some(other) => {
                            return Err(ParseError::new(
                                escape_at,
                                format!("unknown escape sequence `\\{other}`"),
                            ));
                        }
                    };
                    value.push(decoded);
                }
                Some(c) => {
                    self.pos += 1;
                    value.push(c);
                }
            }
        }
    }

    fn read_hex_escape(&mut self, escape_at: usize, len: usize) -> Result<char, ParseError> {
        let start = self.pos;
        for _ in 0..len {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Err(ParseError::new(escape_at, "malformed hexadecimal escape"));
            }
            self.pos += 1;
        }
        u32::from_str_radix(&self.text(start), 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| ParseError::new(escape_at, "escape is not a valid character"))
    }
}
