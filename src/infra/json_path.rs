//! # JSON Path / JSON 路径查询
//!
//! A small JSON query language used by content checks and variable capture.
//!
//! Supported syntax: root `$`, child `.name`, `['name']` and `["name"]`,
//! index `[n]` (negative counts from the end), wildcard `.*` and `[*]`,
//! recursive descent `..name` and `..*`, and filters such as
//! `[?(@.a.b == 'x')]`, `[?@.n >= 2]` or `[?@.flag]`.
//!
//! Matches are returned in document order. Callers in this crate only ever
//! use the first one.
//!
//! 一个用于内容检查和变量捕获的小型 JSON 查询语言。调用方只使用第一个匹配。

use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonPathError {
    #[error("JSON path is empty")]
    Empty,
    #[error("Invalid JSON path '{path}' at position {position}: {reason}")]
    Syntax {
        path: String,
        position: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Child(Selector),
    Descendant(Selector),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// `@.a.b <op> literal`, or an existence test when `condition` is `None`.
#[derive(Debug, Clone, PartialEq)]
struct Filter {
    path: Vec<String>,
    condition: Option<(CompareOp, Value)>,
}

/// A parsed query.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parses `path`. A path without a leading `$` is read relative to the
    /// root, so `data.id` means `$.data.id`.
    pub fn parse(path: &str) -> Result<Self, JsonPathError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(JsonPathError::Empty);
        }

        let body = match trimmed.strip_prefix('$') {
            Some(rest) => rest.to_string(),
            None if trimmed.starts_with('[') || trimmed.starts_with('.') => trimmed.to_string(),
            None => format!(".{trimmed}"),
        };

        let mut parser = Parser {
            source: trimmed,
            chars: body.chars().collect(),
            pos: 0,
        };
        let segments = parser.segments()?;
        Ok(Self { segments })
    }

    /// Every match in document order.
    pub fn find_all<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut nodes = vec![root];
        for segment in &self.segments {
            let mut next = Vec::new();
            match segment {
                Segment::Child(selector) => {
                    for node in nodes {
                        select(selector, node, &mut next);
                    }
                }
                Segment::Descendant(selector) => {
                    for node in nodes {
                        let mut all = Vec::new();
                        collect_descendants(node, &mut all);
                        for candidate in all {
                            select(selector, candidate, &mut next);
                        }
                    }
                }
            }
            nodes = next;
        }
        nodes
    }

    pub fn find_first<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.find_all(root).into_iter().next()
    }
}

/// Parses `path` and returns its first match in `root`.
pub fn select_first<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>, JsonPathError> {
    Ok(JsonPath::parse(path)?.find_first(root))
}

/// String form of a match: strings without quotes, every other value as
/// compact JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `node` followed by all of its descendants, pre-order.
fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Array(items) => items.iter().for_each(|v| collect_descendants(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_descendants(v, out)),
        _ => {}
    }
}

fn select<'a>(selector: &Selector, node: &'a Value, out: &mut Vec<&'a Value>) {
    match selector {
        Selector::Name(name) => {
            if let Some(v) = node.as_object().and_then(|m| m.get(name)) {
                out.push(v);
            }
        }
        Selector::Index(index) => {
            if let Some(items) = node.as_array() {
                let len = items.len() as i64;
                let resolved = if *index < 0 { len + index } else { *index };
                if (0..len).contains(&resolved) {
                    out.push(&items[resolved as usize]);
                }
            }
        }
        Selector::Wildcard => match node {
            Value::Array(items) => out.extend(items.iter()),
            Value::Object(map) => out.extend(map.values()),
            _ => {}
        },
        Selector::Filter(filter) => match node {
            Value::Array(items) => out.extend(items.iter().filter(|v| filter.matches(v))),
            Value::Object(map) => out.extend(map.values().filter(|v| filter.matches(v))),
            _ => {}
        },
    }
}

impl Filter {
    fn matches(&self, candidate: &Value) -> bool {
        let mut current = Some(candidate);
        for name in &self.path {
            current = current.and_then(|v| v.as_object()).and_then(|m| m.get(name));
        }

        let Some(actual) = current else {
            return false;
        };
        let Some((op, expected)) = &self.condition else {
            return true;
        };

        match op {
            CompareOp::Eq => json_equals(actual, expected),
            CompareOp::Ne => !json_equals(actual, expected),
            CompareOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            CompareOp::Le => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            CompareOp::Ge => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

fn json_equals(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> JsonPathError {
        JsonPathError::Syntax {
            path: self.source.to_string(),
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), JsonPathError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn segments(&mut self) -> Result<Vec<Segment>, JsonPathError> {
        let mut segments = Vec::new();
        while let Some(c) = self.peek() {
            let segment = match c {
                '.' if self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    match self.peek() {
                        Some('*') => {
                            self.pos += 1;
                            Segment::Descendant(Selector::Wildcard)
                        }
                        Some('[') => Segment::Descendant(self.bracket()?),
                        _ => Segment::Descendant(Selector::Name(self.name()?)),
                    }
                }
                '.' => {
                    self.pos += 1;
                    if self.eat('*') {
                        Segment::Child(Selector::Wildcard)
                    } else {
                        Segment::Child(Selector::Name(self.name()?))
                    }
                }
                '[' => Segment::Child(self.bracket()?),
                other => return Err(self.error(format!("unexpected character '{other}'"))),
            };
            segments.push(segment);
        }
        Ok(segments)
    }

    /// A dotted member name: everything up to the next `.`, `[` or operator.
    fn name(&mut self) -> Result<String, JsonPathError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | '[' | ']' | ')' | '=' | '!' | '<' | '>') || c.is_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a member name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn quoted(&mut self) -> Result<String, JsonPathError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => text.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                Some(c) if c == quote => break,
                Some(c) => text.push(c),
            }
            self.pos += 1;
        }
        self.pos += 1;
        Ok(text)
    }

    fn bracket(&mut self) -> Result<Selector, JsonPathError> {
        self.expect('[')?;
        self.skip_whitespace();
        let selector = match self.peek() {
            Some('\'' | '"') => Selector::Name(self.quoted()?),
            Some('*') => {
                self.pos += 1;
                Selector::Wildcard
            }
            Some('?') => {
                self.pos += 1;
                Selector::Filter(self.filter()?)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => Selector::Index(self.integer()?),
            _ => return Err(self.error("expected a name, index, '*' or filter")),
        };
        self.skip_whitespace();
        self.expect(']')?;
        Ok(selector)
    }

    fn integer(&mut self) -> Result<i64, JsonPathError> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse().map_err(|_| self.error("expected an integer index"))
    }

    fn filter(&mut self) -> Result<Filter, JsonPathError> {
        self.skip_whitespace();
        let parenthesised = self.eat('(');
        self.skip_whitespace();
        self.expect('@')?;

        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    path.push(self.name()?);
                }
                Some('[') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    path.push(self.quoted()?);
                    self.skip_whitespace();
                    self.expect(']')?;
                }
                _ => break,
            }
        }

        self.skip_whitespace();
        let condition = match self.operator() {
            Some(op) => {
                self.skip_whitespace();
                Some((op, self.literal()?))
            }
            None => None,
        };

        self.skip_whitespace();
        if parenthesised {
            self.expect(')')?;
        }
        Ok(Filter { path, condition })
    }

    fn operator(&mut self) -> Option<CompareOp> {
        let (op, width) = match (self.peek(), self.peek_at(1)) {
            (Some('='), Some('=')) => (CompareOp::Eq, 2),
            (Some('!'), Some('=')) => (CompareOp::Ne, 2),
            (Some('<'), Some('=')) => (CompareOp::Le, 2),
            (Some('>'), Some('=')) => (CompareOp::Ge, 2),
            (Some('<'), _) => (CompareOp::Lt, 1),
            (Some('>'), _) => (CompareOp::Gt, 1),
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn literal(&mut self) -> Result<Value, JsonPathError> {
        if matches!(self.peek(), Some('\'' | '"')) {
            return Ok(Value::String(self.quoted()?));
        }

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ')' | ']') {
                break;
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            _ => serde_json::from_str::<serde_json::Number>(&text)
                .map(Value::Number)
                .map_err(|_| self.error(format!("invalid literal '{text}'"))),
        }
    }
}
