//! Recursive-descent parser for filter expressions.
//!
//! ```text
//! or         := and ( "||" and )*
//! and        := unary ( "&&" unary )*
//! unary      := "!" unary | comparison
//! comparison := operand ( compare-op operand )?
//! operand    := literal | "-" number | path | "(" or ")"
//! path       := ident ( "." ident | "[" ( string | integer ) "]" )*
//! ```
//!
//! `contains`, `startsWith` and `endsWith` are comparison operators written
//! as bare words between their operands.

use crate::error::SyntaxError;
use crate::expr::ast::{CompareOp, Expr, Literal, Path, Segment};
use crate::expr::lexer::{tokenize, Token, TokenKind};

/// Deepest tree the parser builds, counting open `(` and `!` as well.
/// Checking and evaluation recurse over the tree.
const MAX_NESTING: usize = 128;

/// Parses a complete filter expression.
pub(crate) fn parse_expression(text: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        open: 0,
    };
    let (expr, _) = parser.parse_or()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(SyntaxError::at(
            format!("unexpected {} after expression", trailing.kind.describe()),
            trailing.offset,
        ));
    }
    Ok(expr)
}

/// An expression and the depth of its tree.
type Parsed = (Expr, usize);

fn bounded(depth: usize, offset: usize) -> Result<usize, SyntaxError> {
    if depth > MAX_NESTING {
        return Err(SyntaxError::at("expression nests too deeply", offset));
    }
    Ok(depth)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    /// `(` and `!` entered but not yet closed.
    open: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof and the cursor never moves past it.
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(SyntaxError::at(
                format!("expected {}, found {}", kind.describe(), token.kind.describe()),
                token.offset,
            ))
        }
    }

    fn enter(&mut self, offset: usize) -> Result<(), SyntaxError> {
        self.open += 1;
        bounded(self.open, offset).map(|_| ())
    }

    fn leave(&mut self) {
        self.open -= 1;
    }

    fn parse_or(&mut self) -> Result<Parsed, SyntaxError> {
        let (mut lhs, mut depth) = self.parse_and()?;
        while self.peek().kind == TokenKind::OrOr {
            let offset = self.advance().offset;
            let (rhs, rhs_depth) = self.parse_and()?;
            depth = bounded(depth.max(rhs_depth) + 1, offset)?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, depth))
    }

    fn parse_and(&mut self) -> Result<Parsed, SyntaxError> {
        let (mut lhs, mut depth) = self.parse_unary()?;
        while self.peek().kind == TokenKind::AndAnd {
            let offset = self.advance().offset;
            let (rhs, rhs_depth) = self.parse_unary()?;
            depth = bounded(depth.max(rhs_depth) + 1, offset)?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, depth))
    }

    fn parse_unary(&mut self) -> Result<Parsed, SyntaxError> {
        if self.peek().kind != TokenKind::Bang {
            return self.parse_comparison();
        }
        let offset = self.advance().offset;
        self.enter(offset)?;
        let (inner, depth) = self.parse_unary()?;
        self.leave();
        Ok((Expr::Not(Box::new(inner)), bounded(depth + 1, offset)?))
    }

    fn parse_comparison(&mut self) -> Result<Parsed, SyntaxError> {
        let (lhs, lhs_depth) = self.parse_operand()?;
        let Some(op) = self.compare_op() else {
            return Ok((lhs, lhs_depth));
        };
        let offset = self.advance().offset;
        let (rhs, rhs_depth) = self.parse_operand()?;

        if self.compare_op().is_some() {
            return Err(SyntaxError::at(
                "comparison operators cannot be chained; use `&&`",
                self.peek().offset,
            ));
        }

        let depth = bounded(lhs_depth.max(rhs_depth) + 1, offset)?;
        Ok((
            Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            depth,
        ))
    }

    fn compare_op(&self) -> Option<CompareOp> {
        match &self.peek().kind {
            TokenKind::EqEq => Some(CompareOp::Eq),
            TokenKind::NotEq => Some(CompareOp::Ne),
            TokenKind::Lt => Some(CompareOp::Lt),
            TokenKind::Le => Some(CompareOp::Le),
            TokenKind::Gt => Some(CompareOp::Gt),
            TokenKind::Ge => Some(CompareOp::Ge),
            TokenKind::Ident(word) => match word.as_str() {
                "contains" => Some(CompareOp::Contains),
                "startsWith" => Some(CompareOp::StartsWith),
                "endsWith" => Some(CompareOp::EndsWith),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_operand(&mut self) -> Result<Parsed, SyntaxError> {
        let token = self.advance();
        let leaf = match token.kind {
            TokenKind::Str(value) => Expr::Literal(Literal::Str(value)),
            TokenKind::Number(value) => Expr::Literal(Literal::Number(value)),
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::Minus => {
                let number = self.advance();
                match number.kind {
                    TokenKind::Number(value) => negate(&value)
                        .map(|n| Expr::Literal(Literal::Number(n)))
                        .ok_or_else(|| {
                            SyntaxError::at(format!("number `-{value}` is out of range"), token.offset)
                        })?,
                    other => {
                        return Err(SyntaxError::at(
                            format!("expected number after `-`, found {}", other.describe()),
                            number.offset,
                        ))
                    }
                }
            }
            TokenKind::LParen => {
                self.enter(token.offset)?;
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                self.leave();
                return Ok(inner);
            }
            TokenKind::Ident(name) => {
                if matches!(name.as_str(), "contains" | "startsWith" | "endsWith") {
                    return Err(SyntaxError::at(
                        format!("`{name}` needs an operand on its left"),
                        token.offset,
                    ));
                }
                Expr::Field(self.parse_path(name)?)
            }
            other => {
                return Err(SyntaxError::at(
                    format!("expected a value or field, found {}", other.describe()),
                    token.offset,
                ))
            }
        };
        Ok((leaf, 1))
    }

    fn parse_path(&mut self, root: String) -> Result<Path, SyntaxError> {
        let mut segments = Vec::new();
        loop {
            if self.eat(&TokenKind::Dot) {
                let token = self.advance();
                match token.kind {
                    TokenKind::Ident(member) => segments.push(Segment::Member(member)),
                    other => {
                        return Err(SyntaxError::at(
                            format!("expected member name after `.`, found {}", other.describe()),
                            token.offset,
                        ))
                    }
                }
            } else if self.eat(&TokenKind::LBracket) {
                let token = self.advance();
                let segment = match token.kind {
                    TokenKind::Str(key) => Segment::Member(key),
                    TokenKind::Number(ref n) => match n.as_u64().and_then(|i| usize::try_from(i).ok()) {
                        Some(index) => Segment::Index(index),
                        None => {
                            return Err(SyntaxError::at(
                                "index must be a non-negative integer",
                                token.offset,
                            ))
                        }
                    },
                    other => {
                        return Err(SyntaxError::at(
                            format!("expected index or key, found {}", other.describe()),
                            token.offset,
                        ))
                    }
                };
                self.expect(TokenKind::RBracket)?;
                segments.push(segment);
            } else {
                return Ok(Path { root, segments });
            }
        }
    }
}

fn negate(value: &serde_json::Number) -> Option<serde_json::Number> {
    if let Some(unsigned) = value.as_u64() {
        if let Ok(signed) = i64::try_from(unsigned) {
            return Some(serde_json::Number::from(-signed));
        }
    }
    value.as_f64().and_then(|f| serde_json::Number::from_f64(-f))
}
