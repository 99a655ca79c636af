//! A small regex dialect for lexer rule patterns.
//!
//! Supports literals, `.`, character classes (`[a-z]`, `[^0-9]`), grouping,
//! alternation `|`, concatenation, and the quantifiers `*`, `+`, `?`. This
//! covers every rule shape the grammar file format needs (keyword literals,
//! character-class-based identifiers/numbers, optional/repeated pieces); it
//! is not meant to be a general-purpose regex engine.

use std::fmt;

#[derive(Debug, Clone)]
pub enum Ast {
    Char(char),
    Any,
    Class { ranges: Vec<(char, char)>, negated: bool },
    Concat(Vec<Ast>),
    Alt(Vec<Ast>),
    Star(Box<Ast>),
    Plus(Box<Ast>),
    Opt(Box<Ast>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegexError {
    pub message: String,
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid regex: {}", self.message)
    }
}

impl std::error::Error for RegexError {}

pub fn parse(pattern: &str) -> Result<Ast, RegexError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut p = Parser { chars: &chars, pos: 0 };
    let ast = p.parse_alt()?;
    if p.pos != p.chars.len() {
        return Err(RegexError { message: format!("unexpected trailing input at {}", p.pos) });
    }
    Ok(ast)
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn parse_alt(&mut self) -> Result<Ast, RegexError> {
        let mut branches = vec![self.parse_concat()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Ast::Alt(branches))
        }
    }

    fn parse_concat(&mut self) -> Result<Ast, RegexError> {
        let mut parts = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            parts.push(self.parse_quantified()?);
        }
        if parts.len() == 1 {
            Ok(parts.pop().unwrap())
        } else {
            Ok(Ast::Concat(parts))
        }
    }

    fn parse_quantified(&mut self) -> Result<Ast, RegexError> {
        let atom = self.parse_atom()?;
        match self.peek() {
            Some('*') => {
                self.bump();
                Ok(Ast::Star(Box::new(atom)))
            }
            Some('+') => {
                self.bump();
                Ok(Ast::Plus(Box::new(atom)))
            }
            Some('?') => {
                self.bump();
                Ok(Ast::Opt(Box::new(atom)))
            }
            _ => Ok(atom),
        }
    }

    fn parse_atom(&mut self) -> Result<Ast, RegexError> {
        match self.bump() {
            Some('(') => {
                let inner = self.parse_alt()?;
                if self.bump() != Some(')') {
                    return Err(RegexError { message: "unclosed group".into() });
                }
                Ok(inner)
            }
            Some('[') => self.parse_class(),
            Some('.') => Ok(Ast::Any),
            Some('\\') => match self.bump() {
                Some(c) => Ok(Ast::Char(unescape(c))),
                None => Err(RegexError { message: "dangling escape".into() }),
            },
            Some(c) => Ok(Ast::Char(c)),
            None => Err(RegexError { message: "unexpected end of pattern".into() }),
        }
    }

    fn parse_class(&mut self) -> Result<Ast, RegexError> {
        let negated = if self.peek() == Some('^') {
            self.bump();
            true
        } else {
            false
        };
        let mut ranges = Vec::new();
        loop {
            match self.peek() {
                None => return Err(RegexError { message: "unclosed character class".into() }),
                Some(']') => {
                    self.bump();
                    break;
                }
                _ => {
                    let lo = self.class_char()?;
                    if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
                        self.bump();
                        let hi = self.class_char()?;
                        ranges.push((lo, hi));
                    } else {
                        ranges.push((lo, lo));
                    }
                }
            }
        }
        Ok(Ast::Class { ranges, negated })
    }

    fn class_char(&mut self) -> Result<char, RegexError> {
        match self.bump() {
            Some('\\') => match self.bump() {
                Some(c) => Ok(unescape(c)),
                None => Err(RegexError { message: "dangling escape in class".into() }),
            },
            Some(c) => Ok(c),
            None => Err(RegexError { message: "unexpected end inside character class".into() }),
        }
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}
