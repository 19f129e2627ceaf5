//! Data path descriptor parser.
//!
//! Two grammars share this parser:
//!
//! - the observer grammar (`a.b[2]`, `a.**`, `**`, comma separated lists), which is
//!   strict and rejects trailing characters;
//! - the set-data key grammar (`list[2].name`, `a\.b`), which is lenient and always
//!   consumes the whole input.

use thiserror::Error;

use crate::types::{DataPath, MultiPaths, ObserverPath, PathSegment};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("illegal index")]
    IllegalIndex,
    #[error("field name cannot start with digits")]
    FieldStartsWithDigit,
    #[error("first field name illegal")]
    FirstFieldIllegal,
    #[error("field name illegal")]
    FieldIllegal,
    #[error("unexpected trailing characters")]
    TrailingCharacters,
}

/// A malformed data path descriptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("data path descriptor \"{input}\" is illegal at char {position} ({kind})")]
pub struct PathSyntaxError {
    pub input: String,
    /// Character (not byte) offset of the failure.
    pub position: usize,
    pub kind: SyntaxErrorKind,
}

/// Data path parser.
pub struct DataPathParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> DataPathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Parse a comma separated list of observer paths.
    pub fn parse_multi(input: &'a str) -> Result<MultiPaths, PathSyntaxError> {
        let mut parser = Self::new(input);
        let mut paths = vec![parser.parse_observer_path()?];
        parser.skip_whitespace();
        while parser.peek() == Some(',') {
            parser.advance();
            paths.push(parser.parse_observer_path()?);
            parser.skip_whitespace();
        }
        parser.expect_end()?;
        Ok(paths)
    }

    /// Parse exactly one observer path.
    pub fn parse_observer(input: &'a str) -> Result<ObserverPath, PathSyntaxError> {
        let mut parser = Self::new(input);
        let path = parser.parse_observer_path()?;
        parser.skip_whitespace();
        parser.expect_end()?;
        Ok(path)
    }

    /// Parse a set-data string key.
    ///
    /// Lenient: stray dots and names are accepted as written. The one error
    /// still reported is an illegal bracket index, which covers a missing
    /// number and digits that overflow `usize`.
    pub fn parse_single(input: &'a str) -> Result<DataPath, PathSyntaxError> {
        let mut parser = Self::new(input);
        parser.parse_lenient_path()
    }

    // ── Observer grammar ─────────────────────────────────────────────────────

    fn parse_observer_path(&mut self) -> Result<ObserverPath, PathSyntaxError> {
        self.skip_whitespace();
        if self.at_double_star() {
            self.pos += 2;
            return Ok(ObserverPath::any());
        }
        let first = self.parse_field_name()?;
        if first.is_empty() {
            return Err(self.error(SyntaxErrorKind::FirstFieldIllegal));
        }
        let mut segments: DataPath = vec![PathSegment::Field(first)];
        while !self.is_at_end() {
            if !self.skip_whitespace() {
                break;
            }
            match self.peek() {
                Some('.') => {
                    self.advance();
                    self.skip_whitespace();
                    if self.at_double_star() {
                        self.pos += 2;
                        return Ok(ObserverPath::with_wildcard(segments));
                    }
                    let field = self.parse_field_name()?;
                    if field.is_empty() {
                        return Err(self.error(SyntaxErrorKind::FieldIllegal));
                    }
                    segments.push(PathSegment::Field(field));
                }
                Some('[') => {
                    self.advance();
                    self.skip_whitespace();
                    let index = self.parse_index()?;
                    self.skip_whitespace();
                    if self.peek() != Some(']') {
                        return Err(self.error(SyntaxErrorKind::IllegalIndex));
                    }
                    self.advance();
                    segments.push(PathSegment::Index(index));
                }
                _ => break,
            }
        }
        Ok(ObserverPath::new(segments))
    }

    fn parse_field_name(&mut self) -> Result<String, PathSyntaxError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                // the escaped char is taken as-is; a trailing backslash is dropped
                if let Some(next) = self.peek_at(1) {
                    name.push(next);
                    self.advance();
                }
            } else if c == '_' || c.is_ascii_alphabetic() {
                name.push(c);
            } else if c.is_ascii_digit() {
                if name.is_empty() {
                    return Err(self.error(SyntaxErrorKind::FieldStartsWithDigit));
                }
                name.push(c);
            } else {
                break;
            }
            self.advance();
        }
        Ok(name)
    }

    // ── Set-data grammar ─────────────────────────────────────────────────────

    fn parse_lenient_path(&mut self) -> Result<DataPath, PathSyntaxError> {
        let mut segments = DataPath::new();
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.advance();
                    let field = self.parse_field_name_with_special_chars();
                    if !field.is_empty() {
                        segments.push(PathSegment::Field(field));
                    }
                }
                '[' => {
                    self.advance();
                    let index = self.parse_index()?;
                    if self.peek().is_some_and(|c| c != ']') {
                        return Err(self.error(SyntaxErrorKind::IllegalIndex));
                    }
                    self.advance();
                    segments.push(PathSegment::Index(index));
                }
                _ => {
                    let field = self.parse_field_name_with_special_chars();
                    segments.push(PathSegment::Field(field));
                }
            }
        }
        if segments.is_empty() {
            segments.push(PathSegment::Field(String::new()));
        }
        Ok(segments)
    }

    fn parse_field_name_with_special_chars(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            match c {
                '\\' => match self.peek_at(1) {
                    Some(next @ ('.' | '[' | ']' | '\\')) => {
                        name.push(next);
                        self.pos += 2;
                    }
                    _ => {
                        name.push('\\');
                        self.advance();
                    }
                },
                '.' | '[' => break,
                _ => {
                    name.push(c);
                    self.advance();
                }
            }
        }
        name
    }

    // ── Shared helpers ───────────────────────────────────────────────────────

    /// Digits of a bracket index; empty or overflowing input is `IllegalIndex` in both grammars.
    fn parse_index(&mut self) -> Result<usize, PathSyntaxError> {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        if start == self.pos {
            return Err(self.error(SyntaxErrorKind::IllegalIndex));
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse()
            .map_err(|_| self.error_at(start, SyntaxErrorKind::IllegalIndex))
    }

    /// Skip whitespace; returns whether input remains.
    fn skip_whitespace(&mut self) -> bool {
        while matches!(
            self.peek(),
            Some(' ' | '\n' | '\r' | '\t' | '\u{000C}')
        ) {
            self.advance();
        }
        !self.is_at_end()
    }

    fn at_double_star(&self) -> bool {
        self.peek() == Some('*') && self.peek_at(1) == Some('*')
    }

    fn expect_end(&self) -> Result<(), PathSyntaxError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error(SyntaxErrorKind::TrailingCharacters))
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, kind: SyntaxErrorKind) -> PathSyntaxError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, position: usize, kind: SyntaxErrorKind) -> PathSyntaxError {
        PathSyntaxError {
            input: self.input.to_string(),
            position,
            kind,
        }
    }
}
