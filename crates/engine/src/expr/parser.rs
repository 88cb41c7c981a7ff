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

//! Precedence-climbing parser for predicate expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := eq ( "&&" eq )*
//! eq      := rel ( ( "==" | "!=" ) rel )*
//! rel     := add ( ( "<" | "<=" | ">" | ">=" ) add )*
//! add     := mul ( ( "+" | "-" ) mul )*
//! mul     := unary ( ( "*" | "/" | "%" ) unary )*
//! unary   := ( "!" | "-" ) unary | primary
//! primary := literal | ident | ident "(" [ expr ( "," expr )* ] ")" | "(" expr ")"
//! ```

use tracing::trace;

use super::{
    ast::{BinaryOp, ExpressionNode, Literal, UnaryOp},
    lexer::{tokenize, Spanned, Token},
};
use crate::ParseError;

/// Upper bound on the syntactic nesting of the input: parentheses, unary
/// operators and call arguments.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Upper bound on the depth of the produced tree.
///
/// Flat operator chains such as `k == 0 || k == 1 || ...` grow the tree by one
/// level per operator without nesting the input, so they get a much larger
/// bound than [`MAX_NESTING_DEPTH`].
pub const MAX_TREE_DEPTH: usize = 2048;

/// Parse predicate text into an expression tree.
///
/// The whole input must form a single expression. Errors carry the character
/// offset of the offending token; running out of input reports the text length.
pub fn parse(text: &str) -> Result<ExpressionNode, ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens: &tokens, pos: 0, nesting: 0 };
    let (node, depth) = parser.parse_expression()?;
    parser.expect_end()?;
    trace!(depth, "parsed predicate expression");
    Ok(node)
}

/// Parsed subtree together with its depth.
type Parsed = (ExpressionNode, usize);

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    nesting: usize,
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::OrOr => BinaryOp::Or,
        Token::AndAnd => BinaryOp::And,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Le => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::Ge => BinaryOp::Ge,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        _ => return None,
    })
}

impl Parser<'_> {
    fn cur(&self) -> &Spanned {
        // The token stream always ends with Eof and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) -> Token {
        let token = self.cur().token.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.cur().offset, message)
    }

    fn expect(&mut self, expected: &Token, context: &str) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {expected} {context}, found {}", self.peek())))
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Eof => Ok(()),
            Token::LParen => Err(self.error("only plain function names can be called")),
            other => Err(self.error(format!("expected operator or end of input, found {other}"))),
        }
    }

    fn check_nesting(&self) -> Result<(), ParseError> {
        if self.nesting > MAX_NESTING_DEPTH {
            return Err(self.error(format!(
                "expression nested deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize, offset: usize) -> Result<(), ParseError> {
        if depth > MAX_TREE_DEPTH {
            return Err(ParseError::new(
                offset,
                format!("expression tree deeper than {MAX_TREE_DEPTH} levels"),
            ));
        }
        Ok(())
    }

    /// Run `f` one syntactic nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.nesting += 1;
        let result = self.check_nesting().and_then(|()| f(self));
        self.nesting -= 1;
        result
    }

    fn parse_expression(&mut self) -> Result<Parsed, ParseError> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Parsed, ParseError> {
        let (mut lhs, mut depth) = self.parse_unary()?;

        while let Some(op) = binary_op(self.peek()) {
            if op.precedence() < min_precedence {
                break;
            }
            let offset = self.cur().offset;
            self.advance();

            let (rhs, rhs_depth) = self.parse_binary(op.precedence() + 1)?;
            depth = 1 + depth.max(rhs_depth);
            self.check_depth(depth, offset)?;
            lhs = ExpressionNode::binary(op, lhs, rhs);
        }

        Ok((lhs, depth))
    }

    fn parse_unary(&mut self) -> Result<Parsed, ParseError> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        let offset = self.cur().offset;
        self.advance();

        let (operand, depth) = self.nested(Self::parse_unary)?;
        self.check_depth(depth + 1, offset)?;
        Ok((ExpressionNode::unary(op, operand), depth + 1))
    }

    fn parse_primary(&mut self) -> Result<Parsed, ParseError> {
        let node = match self.peek() {
            Token::True => ExpressionNode::from(Literal::Bool(true)),
            Token::False => ExpressionNode::from(Literal::Bool(false)),
            Token::Int(value) => ExpressionNode::from(Literal::Int(*value)),
            Token::Float(value) => ExpressionNode::from(Literal::Float(*value)),
            Token::Str(value) => ExpressionNode::from(Literal::Str(value.clone())),
            Token::Ident(name) => {
                let name = name.clone();
                let offset = self.cur().offset;
                self.advance();
                if self.peek() == &Token::LParen {
                    return self.parse_call(name, offset);
                }
                return Ok((ExpressionNode::Identifier(name), 1));
            }
            Token::LParen => {
                self.advance();
                let inner = self.nested(Self::parse_expression)?;
                self.expect(&Token::RParen, "to close `(`")?;
                return Ok(inner);
            }
            other => return Err(self.error(format!("expected expression, found {other}"))),
        };
        self.advance();
        Ok((node, 1))
    }

    fn parse_call(&mut self, name: String, offset: usize) -> Result<Parsed, ParseError> {
        self.expect(&Token::LParen, "after function name")?;
        let mut args = Vec::new();
        let mut depth = 0;

        if self.peek() == &Token::RParen {
            self.advance();
        } else {
            loop {
                let (arg, arg_depth) = self.nested(Self::parse_expression)?;
                depth = depth.max(arg_depth);
                args.push(arg);
                match self.peek() {
                    Token::Comma => {
                        self.advance();
                    }
                    Token::RParen => {
                        self.advance();
                        break;
                    }
                    other => {
                        return Err(self.error(format!(
                            "expected `,` or `)` in arguments of `{name}`, found {other}"
                        )));
                    }
                }
            }
        }

        self.check_depth(depth + 1, offset)?;
        Ok((ExpressionNode::call(name, args), depth + 1))
    }
}
