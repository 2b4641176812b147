use serde_json::Number;

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Number(Number),
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
    Minus,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Eof,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{name}`"),
            Self::Str(_) => "string literal".to_string(),
            Self::Number(n) => format!("number {n}"),
            Self::True => "`true`".to_string(),
            Self::False => "`false`".to_string(),
            Self::AndAnd => "`&&`".to_string(),
            Self::OrOr => "`||`".to_string(),
            Self::Bang => "`!`".to_string(),
            Self::EqEq => "`==`".to_string(),
            Self::NotEq => "`!=`".to_string(),
            Self::Lt => "`<`".to_string(),
            Self::Le => "`<=`".to_string(),
            Self::Gt => "`>`".to_string(),
            Self::Ge => "`>=`".to_string(),
            Self::Minus => "`-`".to_string(),
            Self::Dot => "`.`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::LBracket => "`[`".to_string(),
            Self::RBracket => "`]`".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub offset: usize,
}

/// Splits filter text into tokens, always ending with [`TokenKind::Eof`].
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, SyntaxError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let next = bytes.get(pos + 1).copied();
        let kind = match c {
            b'&' if next == Some(b'&') => {
                pos += 2;
                TokenKind::AndAnd
            }
            b'|' if next == Some(b'|') => {
                pos += 2;
                TokenKind::OrOr
            }
            b'=' if next == Some(b'=') => {
                pos += 2;
                TokenKind::EqEq
            }
            b'!' if next == Some(b'=') => {
                pos += 2;
                TokenKind::NotEq
            }
            b'<' if next == Some(b'=') => {
                pos += 2;
                TokenKind::Le
            }
            b'>' if next == Some(b'=') => {
                pos += 2;
                TokenKind::Ge
            }
            b'!' => single(&mut pos, TokenKind::Bang),
            b'<' => single(&mut pos, TokenKind::Lt),
            b'>' => single(&mut pos, TokenKind::Gt),
            b'-' => single(&mut pos, TokenKind::Minus),
            b'.' => single(&mut pos, TokenKind::Dot),
            b'(' => single(&mut pos, TokenKind::LParen),
            b')' => single(&mut pos, TokenKind::RParen),
            b'[' => single(&mut pos, TokenKind::LBracket),
            b']' => single(&mut pos, TokenKind::RBracket),
            b'"' | b'\'' => {
                let (value, end) = lex_string(text, start)?;
                pos = end;
                TokenKind::Str(value)
            }
            b'0'..=b'9' => {
                let (value, end) = lex_number(text, start)?;
                pos = end;
                TokenKind::Number(value)
            }
            c if c == b'_' || c.is_ascii_alphabetic() => {
                while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric())
                {
                    pos += 1;
                }
                match &text[start..pos] {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    ident => TokenKind::Ident(ident.to_string()),
                }
            }
            b'=' => return Err(SyntaxError::at("expected `==`, found `=`", start)),
            b'&' => return Err(SyntaxError::at("expected `&&`, found `&`", start)),
            b'|' => return Err(SyntaxError::at("expected `||`, found `|`", start)),
            _ => {
                let ch = text[start..].chars().next().unwrap_or('?');
                return Err(SyntaxError::at(format!("unexpected character `{ch}`"), start));
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: text.len(),
    });
    Ok(tokens)
}

fn single(pos: &mut usize, kind: TokenKind) -> TokenKind {
    *pos += 1;
    kind
}

/// Lexes a quoted string starting at `start`; returns the value and the
/// offset just past the closing quote.
fn lex_string(text: &str, start: usize) -> Result<(String, usize), SyntaxError> {
    let mut chars = text[start..].char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(SyntaxError::at("unterminated string literal", start)),
    };
    let mut value = String::new();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((value, start + i + c.len_utf8())),
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, '\\')) => '\\',
                    Some((_, '"')) => '"',
                    Some((_, '\'')) => '\'',
                    Some((_, 'n')) => '\n',
                    Some((_, 't')) => '\t',
                    Some((_, 'r')) => '\r',
                    Some((j, other)) => {
                        return Err(SyntaxError::at(
                            format!("unknown escape sequence `\\{other}`"),
                            start + j - 1,
                        ))
                    }
                    None => break,
                };
                value.push(escaped);
            }
            c => value.push(c),
        }
    }

    Err(SyntaxError::at("unterminated string literal", start))
}

/// Lexes `digits [. digits] [(e|E) [+|-] digits]`.
fn lex_number(text: &str, start: usize) -> Result<(Number, usize), SyntaxError> {
    let bytes = text.as_bytes();
    let mut pos = start;
    let digits = |pos: &mut usize| {
        let from = *pos;
        while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
            *pos += 1;
        }
        *pos > from
    };

    digits(&mut pos);
    let mut integral = true;

    if bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
        pos += 1;
        digits(&mut pos);
        integral = false;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mark = pos;
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        if !digits(&mut pos) {
            return Err(SyntaxError::at("malformed exponent", mark));
        }
        integral = false;
    }

    let literal = &text[start..pos];
    let number = if integral {
        literal
            .parse::<u64>()
            .ok()
            .map(Number::from)
            .or_else(|| literal.parse::<f64>().ok().and_then(Number::from_f64))
    } else {
        literal.parse::<f64>().ok().and_then(Number::from_f64)
    };

    match number {
        Some(number) => Ok((number, pos)),
        None => Err(SyntaxError::at(
            format!("number `{literal}` is out of range"),
            start,
        )),
    }
}
