//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Precedence, lowest first: `?:`, `||`, `&&`, `== !=`, `< <= > >=`,
//! `+ -`, `* / %`, unary `- !`.

use std::str::FromStr;

use regex::Regex;

use super::error::ParseError;
use super::lexer::{Token, tokenize};
use super::{BinaryOp, Builtin, Expr, LogicalOp, UnaryOp};
use crate::attribute::{AttrName, Value};
use crate::config::EngineConfig;

pub(crate) fn parse(text: &str) -> Result<Expr, ParseError> {
    if text.len() > EngineConfig::MAX_FORMULA_LEN {
        return Err(ParseError::TooLong {
            len: text.len(),
            max: EngineConfig::MAX_FORMULA_LEN,
        });
    }
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
        depth: 0,
    };
    let expr = parser.ternary()?;
    parser.expect(&Token::Eof, "end of formula")?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize() always terminates the stream with Eof
        self.tokens.get(self.pos).map_or(&Token::Eof, |(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(0, |(_, o)| *o)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            found: self.peek().describe(),
            offset: self.offset(),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > EngineConfig::MAX_FORMULA_DEPTH {
            return Err(ParseError::TooDeep {
                max: EngineConfig::MAX_FORMULA_DEPTH,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn ternary(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let condition = self.logical_or()?;
        let expr = if self.eat(&Token::Question) {
            let then = self.ternary()?;
            self.expect(&Token::Colon, "':' in conditional")?;
            let otherwise = self.ternary()?;
            Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            condition
        };
        self.leave();
        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.logical_and()?;
        let mut chained = 0;
        while self.eat(&Token::OrOr) {
            self.enter()?;
            chained += 1;
            let rhs = self.logical_and()?;
            lhs = Expr::Logical(LogicalOp::Or, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.equality()?;
        let mut chained = 0;
        while self.eat(&Token::AndAnd) {
            self.enter()?;
            chained += 1;
            let rhs = self.equality()?;
            lhs = Expr::Logical(LogicalOp::And, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(Self::comparison, |t| match t {
            Token::EqEq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::Ne),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(Self::additive, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::Le => Some(BinaryOp::Le),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Ge => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(Self::term, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(Self::unary, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    /// Left-associative chain of `next` operands joined by operators `op_for` accepts.
    ///
    /// Every extra operand nests the tree one level deeper, so it counts
    /// against the depth limit like a parenthesis does.
    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
        op_for: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, ParseError> {
        let mut lhs = next(self)?;
        let mut chained = 0;
        while let Some(op) = op_for(self.peek()) {
            self.advance();
            self.enter()?;
            chained += 1;
            let rhs = next(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Negate,
            Token::Bang => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary()?;
        self.leave();
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::Number(_) | Token::Str(_) | Token::LParen | Token::Ident(_) => {}
            _ => return Err(self.unexpected("a value")),
        }
        match self.advance() {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    return self.call(&name);
                }
                Ok(match name.as_str() {
                    "true" => Expr::Literal(Value::Bool(true)),
                    "false" => Expr::Literal(Value::Bool(false)),
                    "null" | "undefined" => Expr::Null,
                    "source" => Expr::Source,
                    _ => Expr::Attr(AttrName::from(name)),
                })
            }
            _ => {
                let expr = self.ternary()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
        }
    }

    fn call(&mut self, name: &str) -> Result<Expr, ParseError> {
        let bare = name.strip_prefix("Math.").unwrap_or(name);
        let builtin = Builtin::from_str(bare).map_err(|_| ParseError::UnknownFunction {
            name: name.to_owned(),
        })?;

        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.ternary()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma, "',' or ')'")?;
            }
        }

        check_arity(builtin, args.len())?;

        match builtin {
            Builtin::Attr => Ok(Expr::Attr(literal_name(builtin, args, 0)?)),
            Builtin::Defined => Ok(Expr::Defined(literal_name(builtin, args, 0)?)),
            Builtin::Matches => {
                let mut args = args.into_iter();
                let subject = args.next().unwrap_or(Expr::Null);
                let pattern = match args.next() {
                    Some(Expr::Literal(Value::Text(pattern))) => pattern,
                    _ => {
                        return Err(ParseError::ExpectedLiteral {
                            function: builtin.name(),
                            position: 2,
                        });
                    }
                };
                let regex = Regex::new(&pattern).map_err(|e| ParseError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Expr::Matches(Box::new(subject), regex))
            }
            Builtin::Table => {
                let mut args = args.into_iter();
                let table = match args.next() {
                    Some(Expr::Literal(Value::Text(table))) => table,
                    _ => {
                        return Err(ParseError::ExpectedLiteral {
                            function: builtin.name(),
                            position: 1,
                        });
                    }
                };
                let key = args.next().unwrap_or(Expr::Null);
                Ok(Expr::Table(table, Box::new(key)))
            }
            _ => Ok(Expr::Call(builtin, args)),
        }
    }
}

fn check_arity(builtin: Builtin, found: usize) -> Result<(), ParseError> {
    let (min, max) = builtin.arity();
    let ok = found >= min && max.is_none_or(|max| found <= max);
    if ok {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    Err(ParseError::Arity {
        function: builtin.name(),
        expected,
        found,
    })
}

fn literal_name(builtin: Builtin, args: Vec<Expr>, index: usize) -> Result<AttrName, ParseError> {
    match args.into_iter().nth(index) {
        Some(Expr::Literal(Value::Text(name))) => Ok(AttrName::from(name)),
        _ => Err(ParseError::ExpectedLiteral {
            function: builtin.name(),
            position: index + 1,
        }),
    }
}
