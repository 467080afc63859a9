// src/manifest/condition.rs

//! Dependency condition expressions
//!
//! Format 3 manifests may attach a `condition` attribute to any dependency
//! tag, for example `condition="$ROS_VERSION == 2 and $ROS_DISTRO != foxy"`.
//! Grammar:
//!
//! ```text
//! expr := and ("or" and)*
//! and  := cmp ("and" cmp)*
//! cmp  := "(" expr ")" | atom (op atom)?
//! op   := "==" | "!=" | "<" | "<=" | ">" | ">="
//! atom := "$" IDENT | WORD | "quoted string"
//! ```
//!
//! Undefined variables expand to the empty string. Comparisons are string
//! comparisons.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// ROS 1 distributions, used to derive `ROS_VERSION`
const ROS1_DISTROS: &[&str] = &["indigo", "jade", "kinetic", "lunar", "melodic", "noetic"];

/// ROS 1 distributions still on Python 2
const PYTHON2_DISTROS: &[&str] = &["indigo", "jade", "kinetic", "lunar", "melodic"];

/// Variables visible to condition expressions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionContext {
    vars: HashMap<String, String>,
}

impl ConditionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context used when generating Nix expressions for `distro`
    pub fn for_distro(distro: &str) -> Self {
        let ros1 = ROS1_DISTROS.contains(&distro);
        let python2 = PYTHON2_DISTROS.contains(&distro);
        Self::new()
            .with("ROS_OS", "nixos")
            .with("ROS_DISTRO", distro)
            .with("ROS_VERSION", if ros1 { "1" } else { "2" })
            .with("ROS_PYTHON_VERSION", if python2 { "2" } else { "3" })
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Value of a variable, empty if undefined
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn apply(self, lhs: &str, rhs: &str) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Var(String),
    Literal(String),
}

impl Atom {
    fn value<'a>(&'a self, ctx: &'a ConditionContext) -> &'a str {
        match self {
            Self::Var(name) => ctx.get(name),
            Self::Literal(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Cmp(Atom, CmpOp, Atom),
    Truthy(Atom),
}

impl Expr {
    fn eval(&self, ctx: &ConditionContext) -> bool {
        match self {
            Self::Or(a, b) => a.eval(ctx) || b.eval(ctx),
            Self::And(a, b) => a.eval(ctx) && b.eval(ctx),
            Self::Cmp(lhs, op, rhs) => op.apply(lhs.value(ctx), rhs.value(ctx)),
            Self::Truthy(atom) => !atom.value(ctx).is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Op(CmpOp),
    Atom(Atom),
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.next_if(|&(_, n)| n == '=').is_some();
                let op = match (c, followed_by_eq) {
                    ('=', true) => CmpOp::Eq,
                    ('!', true) => CmpOp::Ne,
                    ('<', false) => CmpOp::Lt,
                    ('<', true) => CmpOp::Le,
                    ('>', false) => CmpOp::Gt,
                    ('>', true) => CmpOp::Ge,
                    _ => {
                        return Err(Error::Condition(format!(
                            "unexpected '{}' at offset {} in \"{}\"",
                            c, pos, input
                        )));
                    }
                };
                tokens.push(Token::Op(op));
            }
            '"' | '\'' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some((_, q)) if q == c => break,
                        Some((_, ch)) => literal.push(ch),
                        None => {
                            return Err(Error::Condition(format!(
                                "unterminated string in \"{}\"",
                                input
                            )));
                        }
                    }
                }
                tokens.push(Token::Atom(Atom::Literal(literal)));
            }
            '$' => {
                chars.next();
                let mut name = String::new();
                while let Some((_, ch)) = chars.next_if(|&(_, n)| is_word_char(n)) {
                    name.push(ch);
                }
                if name.is_empty() {
                    return Err(Error::Condition(format!(
                        "missing variable name at offset {} in \"{}\"",
                        pos, input
                    )));
                }
                tokens.push(Token::Atom(Atom::Var(name)));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some((_, ch)) = chars.next_if(|&(_, n)| is_word_char(n)) {
                    word.push(ch);
                }
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    _ => Token::Atom(Atom::Literal(word)),
                });
            }
            other => {
                return Err(Error::Condition(format!(
                    "unexpected '{}' at offset {} in \"{}\"",
                    other, pos, input
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn error(&self, what: &str) -> Error {
        Error::Condition(format!("{} in \"{}\"", what, self.source))
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_cmp()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_cmp()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        match self.bump() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("missing ')'")),
                }
            }
            Some(Token::Atom(lhs)) => {
                if let Some(Token::Op(op)) = self.peek() {
                    self.pos += 1;
                    match self.bump() {
                        Some(Token::Atom(rhs)) => Ok(Expr::Cmp(lhs.clone(), *op, rhs.clone())),
                        _ => Err(self.error("expected operand after comparison operator")),
                    }
                } else {
                    Ok(Expr::Truthy(lhs.clone()))
                }
            }
            Some(_) => Err(self.error("unexpected token")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// A parsed dependency condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    /// Parse a condition expression
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            source,
        };
        let expr = parser.parse_or()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("trailing tokens"));
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate against `ctx`
    pub fn evaluate(&self, ctx: &ConditionContext) -> bool {
        self.expr.eval(ctx)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Whether an optional condition is active; no condition means always active
pub fn is_active(condition: Option<&Condition>, ctx: &ConditionContext) -> bool {
    condition.is_none_or(|c| c.evaluate(ctx))
}
