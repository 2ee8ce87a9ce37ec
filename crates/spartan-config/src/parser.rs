use std::path::Path;

use spartan_core::interface_map::InterfaceMap;
use spartan_core::value::Value;
use thiserror::Error;

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// A single `input { }` module invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDef {
    pub module: String,
    pub options: InterfaceMap,
}

/// A single `filter { }` / `output { }` module invocation plus its wiring.
///
/// `connections` is 0 (chain end), 1 (normal next-element index), or 3
/// (`if`/`else` wiring: `[true_branch, else_branch_or_next, after_block]`,
/// reserved — rejected at wiring time, not here).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDef {
    pub module: String,
    pub options: InterfaceMap,
    pub connections: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub inputs: Vec<InputDef>,
    pub filters: Vec<PipelineDef>,
    pub outputs: Vec<PipelineDef>,
}

impl ParsedFile {
    fn extend(&mut self, other: ParsedFile) {
        self.inputs.extend(other.inputs);
        self.filters.extend(other.filters);
        self.outputs.extend(other.outputs);
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: expected one of {expected:?}, found {found:?}")]
    UnexpectedToken {
        line: usize,
        expected: Vec<TokenKind>,
        found: TokenKind,
    },
    #[error("{0}")]
    Io(String),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        let mut tokens: Vec<Token> = Lexer::new(source).collect();
        tokens.push(Token {
            kind: TokenKind::Eof,
            literal: String::new(),
            line: tokens.last().map(|t| t.line).unwrap_or(1),
            column: 0,
        });
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                line: self.peek().line,
                expected: vec![kind],
                found: self.peek().kind.clone(),
            })
        }
    }

    fn parse_file(&mut self) -> Result<ParsedFile, ParseError> {
        let mut out = ParsedFile::default();
        loop {
            match self.peek().kind {
                TokenKind::Input => {
                    self.advance();
                    self.expect(TokenKind::LBrace)?;
                    while self.peek().kind != TokenKind::RBrace {
                        let (module, options) = self.parse_module()?;
                        out.inputs.push(InputDef { module, options });
                    }
                    self.expect(TokenKind::RBrace)?;
                }
                TokenKind::Filter => {
                    self.advance();
                    self.expect(TokenKind::LBrace)?;
                    let start = out.filters.len();
                    self.parse_pipeline_block(&mut out.filters)?;
                    self.expect(TokenKind::RBrace)?;
                    wire_sequential(&mut out.filters, start);
                }
                TokenKind::Output => {
                    self.advance();
                    self.expect(TokenKind::LBrace)?;
                    let start = out.outputs.len();
                    self.parse_pipeline_block(&mut out.outputs)?;
                    self.expect(TokenKind::RBrace)?;
                    wire_sequential(&mut out.outputs, start);
                }
                TokenKind::Eof => break,
                other => {
                    return Err(ParseError::UnexpectedToken {
                        line: self.peek().line,
                        expected: vec![TokenKind::Input, TokenKind::Filter, TokenKind::Output, TokenKind::Eof],
                        found: other,
                    })
                }
            }
        }
        Ok(out)
    }

    /// Parses the modules (and reserved `if`/`else` blocks) inside one
    /// `filter { }` / `output { }` section, appending to `defs` without
    /// assigning connections yet (the caller wires sequentially afterward).
    fn parse_pipeline_block(&mut self, defs: &mut Vec<PipelineDef>) -> Result<(), ParseError> {
        while !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            if self.peek().kind == TokenKind::If {
                self.parse_if_block(defs)?;
            } else {
                let (module, options) = self.parse_module()?;
                defs.push(PipelineDef { module, options, connections: vec![] });
            }
        }
        Ok(())
    }

    /// `if/else` wiring is reserved: parsed here so a config that uses it
    /// still lexes and parses cleanly, but it is rejected at wiring time
    /// (spec §9), not here.
    fn parse_if_block(&mut self, defs: &mut Vec<PipelineDef>) -> Result<(), ParseError> {
        self.expect(TokenKind::If)?;
        // The condition grammar is reserved/unspecified; skip tokens up to
        // the opening brace of the true branch.
        while self.peek().kind != TokenKind::LBrace && self.peek().kind != TokenKind::Eof {
            self.advance();
        }
        let if_index = defs.len();
        defs.push(PipelineDef {
            module: "__if__".to_string(),
            options: InterfaceMap::new(),
            connections: vec![],
        });

        self.expect(TokenKind::LBrace)?;
        let true_start = defs.len();
        self.parse_pipeline_block(defs)?;
        self.expect(TokenKind::RBrace)?;
        wire_sequential_open(defs, true_start);

        let else_start = if self.peek().kind == TokenKind::Else {
            self.advance();
            self.expect(TokenKind::LBrace)?;
            let start = defs.len();
            self.parse_pipeline_block(defs)?;
            self.expect(TokenKind::RBrace)?;
            wire_sequential_open(defs, start);
            Some(start)
        } else {
            None
        };

        let after = defs.len();
        for d in defs.iter_mut().skip(true_start) {
            if d.connections.is_empty() {
                d.connections = vec![after];
            }
        }
        defs[if_index].connections = vec![true_start, else_start.unwrap_or(after), after];
        Ok(())
    }

    fn parse_module(&mut self) -> Result<(String, InterfaceMap), ParseError> {
        let ident = self.expect(TokenKind::Ident)?;
        let options = self.parse_option_map()?;
        Ok((ident.literal, options))
    }

    fn parse_option_map(&mut self) -> Result<InterfaceMap, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut map = InterfaceMap::new();
        while self.peek().kind != TokenKind::RBrace {
            let key = self.parse_key()?;
            self.expect(TokenKind::Arrow)?;
            let value = self.parse_value()?;
            map.set(&key, value);
            if self.peek().kind == TokenKind::Comma {
                self.advance();
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(map)
    }

    fn parse_key(&mut self) -> Result<String, ParseError> {
        match self.peek().kind {
            TokenKind::Ident | TokenKind::String => Ok(self.advance().literal),
            other => Err(ParseError::UnexpectedToken {
                line: self.peek().line,
                expected: vec![TokenKind::Ident, TokenKind::String],
                found: other,
            }),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match self.peek().kind {
            TokenKind::String => Ok(Value::String(self.advance().literal)),
            TokenKind::Int => {
                let tok = self.advance();
                Ok(Value::Int(tok.literal.parse().unwrap_or(0)))
            }
            TokenKind::Float => {
                let tok = self.advance();
                Ok(Value::Float(tok.literal.parse().unwrap_or(0.0)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Value::Bool(false))
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => Ok(Value::Map(self.parse_option_map()?)),
            other => Err(ParseError::UnexpectedToken {
                line: self.peek().line,
                expected: vec![
                    TokenKind::String,
                    TokenKind::Int,
                    TokenKind::Float,
                    TokenKind::True,
                    TokenKind::False,
                    TokenKind::LBracket,
                    TokenKind::LBrace,
                ],
                found: other,
            }),
        }
    }

    /// Arrays dispatch their element type on the first item; an empty
    /// array parses as an empty `Value::Array` with no element-type
    /// commitment.
    fn parse_array(&mut self) -> Result<Value, ParseError> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        while self.peek().kind != TokenKind::RBracket {
            let item = match self.peek().kind {
                TokenKind::String => Value::String(self.advance().literal),
                TokenKind::Int => {
                    let tok = self.advance();
                    Value::Int(tok.literal.parse().unwrap_or(0))
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        line: self.peek().line,
                        expected: vec![TokenKind::String, TokenKind::Int],
                        found: other,
                    })
                }
            };
            items.push(item);
            if self.peek().kind == TokenKind::Comma {
                self.advance();
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Value::Array(items))
    }
}

/// Assigns `Connections = [i+1]` to every element but the last in
/// `defs[start..]`, and `[]` to the last — the normal (non-`if`) wiring
/// rule for a freshly parsed `filter`/`output` section. Elements that
/// already carry connections (an `if`/`else` node and its branch bodies,
/// wired by `parse_if_block` before this runs) are left untouched.
fn wire_sequential(defs: &mut [PipelineDef], start: usize) {
    let end = defs.len();
    for i in start..end {
        if !defs[i].connections.is_empty() {
            continue;
        }
        defs[i].connections = if i + 1 < end { vec![i + 1] } else { vec![] };
    }
}

/// Same as `wire_sequential` but used for an `if`/`else` branch body, where
/// the caller still needs to know which element was last (so it can
/// redirect it past the block instead of terminating the chain) — so this
/// leaves `connections` empty on the last element for the caller to fill.
/// Already-wired elements (a nested `if`/`else` and its own branch bodies)
/// are left untouched for the same reason as in `wire_sequential`.
fn wire_sequential_open(defs: &mut [PipelineDef], start: usize) {
    let end = defs.len();
    for i in start..end {
        if !defs[i].connections.is_empty() {
            continue;
        }
        if i + 1 < end {
            defs[i].connections = vec![i + 1];
        }
    }
}

pub fn parse(source: &str) -> Result<ParsedFile, ParseError> {
    Parser::new(source).parse_file()
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<ParsedFile, ParseError> {
    let source = std::fs::read_to_string(path.as_ref()).map_err(|e| ParseError::Io(e.to_string()))?;
    parse(&source)
}

/// Expands a shell-style glob, sorts matches lexicographically, and
/// concatenates the parsed state across files: the `ParsedFile` accumulates
/// `Inputs`/`Filters`/`Outputs` across all files in order.
pub fn parse_glob(pattern: &str) -> Result<ParsedFile, ParseError> {
    let mut paths: Vec<_> = glob::glob(pattern)
        .map_err(|e| ParseError::Io(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ParseError::Io(e.to_string()))?;
    paths.sort();
    let mut out = ParsedFile::default();
    for path in paths {
        out.extend(parse_file(&path)?);
    }
    Ok(out)
}
