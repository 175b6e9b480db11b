//! Tokenizer for formula text.

use super::error::ParseError;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::Str(s) => format!("string {s:?}"),
            Token::Ident(name) => format!("identifier {name:?}"),
            Token::Eof => "end of formula".to_owned(),
            other => format!("{:?}", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Number(_) | Token::Str(_) | Token::Ident(_) | Token::Eof => "",
        }
    }
}

/// Splits `text` into tokens paired with their byte offsets.
///
/// The final token is always [`Token::Eof`].
pub(crate) fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                pos += 1;
            }
            let literal = &text[start..pos];
            let number = literal.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                text: literal.to_owned(),
                offset: start,
            })?;
            tokens.push((Token::Number(number), start));
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
            pos += 1;
            while pos < bytes.len()
                && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'_' | b'$' | b'.'))
            {
                pos += 1;
            }
            tokens.push((Token::Ident(text[start..pos].to_owned()), start));
            continue;
        }

        if c == b'\'' || c == b'"' {
            let (literal, end) = string_literal(text, start)?;
            tokens.push((Token::Str(literal), start));
            pos = end;
            continue;
        }

        let next = bytes.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'=', Some(b'=')) => (Token::EqEq, if bytes.get(pos + 2) == Some(&b'=') { 3 } else { 2 }),
            (b'!', Some(b'=')) => (Token::NotEq, if bytes.get(pos + 2) == Some(&b'=') { 3 } else { 2 }),
            (b'&', Some(b'&')) => (Token::AndAnd, 2),
            (b'|', Some(b'|')) => (Token::OrOr, 2),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b',', _) => (Token::Comma, 1),
            (b'?', _) => (Token::Question, 1),
            (b':', _) => (Token::Colon, 1),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'!', _) => (Token::Bang, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'>', _) => (Token::Gt, 1),
            _ => {
                let ch = text[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::UnexpectedChar { ch, offset: start });
            }
        };
        tokens.push((token, start));
        pos += width;
    }

    tokens.push((Token::Eof, text.len()));
    Ok(tokens)
}

/// Reads a quoted literal starting at `start`, returning it and the offset
/// just past the closing quote.
///
/// `\\`, `\'`, `\"` and `\n` are escapes; any other backslash sequence is
/// kept verbatim so regex patterns such as `'^languages\.'` survive.
fn string_literal(text: &str, start: usize) -> Result<(String, usize), ParseError> {
    let mut chars = text[start..].char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(ParseError::UnterminatedString { offset: start }),
    };
    let mut literal = String::new();

    while let Some((index, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((literal, start + index + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => literal.push('\n'),
                Some((_, escaped @ ('\\' | '\'' | '"'))) => literal.push(escaped),
                Some((_, other)) => {
                    literal.push('\\');
                    literal.push(other);
                }
                None => break,
            },
            c => literal.push(c),
        }
    }

    Err(ParseError::UnterminatedString { offset: start })
}
