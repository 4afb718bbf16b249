//! Recursive-descent parser for the NATS configuration format

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::scalar::{classify, Scalar};
use crate::{ConfError, Result, HOST_IDENTITY_VAR, MAX_INCLUDE_DEPTH};

/// Parser entry point holding the explicit variable environment.
///
/// Cheap to clone; one parser can decode any number of files.
#[derive(Debug, Clone, Default)]
pub struct ConfParser {
    vars: BTreeMap<String, String>,
}

impl ConfParser {
    /// Create a parser with an empty variable environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable visible to `$NAME` references.
    ///
    /// The value is decoded as a configuration value, so `"8222"` resolves
    /// to an integer and `"nats-0"` to a string.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Bind the simulated host identity (`$HOSTNAME`)
    pub fn with_host_identity(self, host: impl Into<String>) -> Self {
        self.with_var(HOST_IDENTITY_VAR, host)
    }

    /// Parse configuration text.
    ///
    /// Relative `include` paths resolve against the current directory.
    pub fn parse_str(&self, input: &str) -> Result<Map<String, Value>> {
        Parser::new(self, input, None, 0, Vec::new()).parse_document()
    }

    /// Parse a configuration file.
    ///
    /// Relative `include` paths resolve against the file's directory.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Map<String, Value>> {
        self.parse_file_at_depth(path.as_ref(), 0, Vec::new())
    }

    fn parse_file_at_depth(
        &self,
        path: &Path,
        depth: usize,
        outer: Vec<Map<String, Value>>,
    ) -> Result<Map<String, Value>> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(ConfError::IncludeDepth {
                path: path.to_path_buf(),
            });
        }
        let input = std::fs::read_to_string(path).map_err(|source| ConfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), depth, "parsing configuration file");
        let base_dir = path.parent().map(Path::to_path_buf);
        Parser::new(self, &input, base_dir, depth, outer).parse_document()
    }

    /// Decode a variable's environment value; falls back to the raw text.
    fn env_value(&self, raw: &str) -> Value {
        let mut parser = Parser::new(self, raw, None, 0, Vec::new());
        parser.allow_variables = false;
        parser.skip_inline_space();
        match parser.parse_value() {
            Ok(value) => {
                parser.skip_inline_space();
                if parser.at_eof() {
                    value
                } else {
                    Value::String(raw.to_string())
                }
            }
            Err(_) => Value::String(raw.to_string()),
        }
    }
}

/// Single-pass parser over one input text
struct Parser<'a> {
    config: &'a ConfParser,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    base_dir: Option<PathBuf>,
    depth: usize,
    /// Maps under construction, outermost first
    scopes: Vec<Map<String, Value>>,
    allow_variables: bool,
}

impl<'a> Parser<'a> {
    fn new(
        config: &'a ConfParser,
        input: &str,
        base_dir: Option<PathBuf>,
        depth: usize,
        outer: Vec<Map<String, Value>>,
    ) -> Self {
        Self {
            config,
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            base_dir,
            depth,
            scopes: outer,
            allow_variables: true,
        }
    }

    fn parse_document(mut self) -> Result<Map<String, Value>> {
        self.skip_trivia();
        let wrapped = self.peek() == Some('{');
        if wrapped {
            self.bump();
        }

        let outer_len = self.scopes.len();
        self.scopes.push(Map::new());
        self.parse_pairs(wrapped.then_some('}'))?;

        self.skip_trivia();
        if !self.at_eof() {
            return Err(self.error("unexpected content after configuration"));
        }

        let map = self.scopes.pop().unwrap_or_default();
        debug_assert_eq!(self.scopes.len(), outer_len);
        Ok(map)
    }

    /// Parse `key value` pairs into the innermost scope until `close` (or EOF).
    fn parse_pairs(&mut self, close: Option<char>) -> Result<()> {
        loop {
            self.skip_trivia_and_terminators();
            match self.peek() {
                None => {
                    return match close {
                        Some(c) => {
                            Err(self.error(format!("unexpected end of input, expected '{c}'")))
                        }
                        None => Ok(()),
                    };
                }
                Some(c) if Some(c) == close => {
                    self.bump();
                    return Ok(());
                }
                Some(c @ ('}' | ']')) => {
                    return Err(self.error(format!("unexpected '{c}'")));
                }
                Some(_) => {}
            }

            let key_line = self.line;
            let key = self.parse_key()?;

            if key == "include" && self.peek().is_some_and(|c| c == ' ' || c == '\t') {
                self.skip_inline_space();
                if !matches!(self.peek(), Some(':' | '=')) {
                    self.parse_include()?;
                    continue;
                }
            }

            self.skip_inline_space();
            if matches!(self.peek(), Some(':' | '=')) {
                self.bump();
                self.skip_inline_space();
            }
            if matches!(self.peek(), None | Some('\n' | '\r')) {
                return Err(self.error(format!("expected a value for key '{key}'")));
            }

            let value = self.parse_value()?;
            trace!(key = %key, line = key_line, "parsed key");
            self.current_scope().insert(key, value);
        }
    }

    fn parse_key(&mut self) -> Result<String> {
        match self.peek() {
            Some('"') => self.parse_double_quoted(),
            Some('\'') => self.parse_single_quoted(),
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    let delimiter = matches!(c, ':' | '=' | ',' | ';' | '{' | '}' | '[' | ']');
                    if c.is_whitespace() || delimiter {
                        break;
                    }
                    self.bump();
                }
                if self.pos == start {
                    return Err(self.error("expected a key"));
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('{') => {
                self.bump();
                self.scopes.push(Map::new());
                self.parse_pairs(Some('}'))?;
                Ok(Value::Object(self.scopes.pop().unwrap_or_default()))
            }
            Some('[') => {
                self.bump();
                self.parse_array()
            }
            Some('"') => self.parse_double_quoted().map(Value::String),
            Some('\'') => self.parse_single_quoted().map(Value::String),
            Some('$') if self.allow_variables => self.parse_variable(),
            Some(_) => {
                let (line, column) = (self.line, self.column);
                let token = self.parse_bare_token();
                if token.is_empty() {
                    return Err(self.error("expected a value"));
                }
                match classify(&token) {
                    Scalar::Value(value) => Ok(value),
                    Scalar::Overflow => Err(ConfError::syntax(
                        line,
                        column,
                        format!("integer '{token}' out of range"),
                    )),
                }
            }
            None => Err(self.error("expected a value")),
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia_and_terminators();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                None => return Err(self.error("unexpected end of input, expected ']'")),
                Some(_) => items.push(self.parse_value()?),
            }
        }
    }

    fn parse_variable(&mut self) -> Result<Value> {
        let line = self.line;
        self.bump();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected a variable name after '$'"));
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if let Some(value) = self.scopes.iter().rev().find_map(|scope| scope.get(&name)) {
            return Ok(value.clone());
        }
        match self.config.vars.get(&name) {
            Some(raw) => {
                debug!(variable = %name, "resolved variable from environment");
                Ok(self.config.env_value(raw))
            }
            None => Err(ConfError::UndefinedVariable { name, line }),
        }
    }

    fn parse_include(&mut self) -> Result<()> {
        let target = match self.peek() {
            Some('"') => self.parse_double_quoted()?,
            Some('\'') => self.parse_single_quoted()?,
            _ => self.parse_bare_token(),
        };
        if target.is_empty() {
            return Err(self.error("expected a path after 'include'"));
        }

        let path = match &self.base_dir {
            Some(dir) => dir.join(&target),
            None => PathBuf::from(&target),
        };
        let included =
            self.config
                .parse_file_at_depth(&path, self.depth + 1, self.scopes.clone())?;
        let scope = self.current_scope();
        for (key, value) in included {
            scope.insert(key, value);
        }
        Ok(())
    }

    fn parse_double_quoted(&mut self) -> Result<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('u') => self.parse_unicode_escape()?,
                        Some(c) => return Err(self.error(format!("invalid escape '\\{c}'"))),
                        None => return Err(self.error("unterminated string")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode code point"))
    }

    fn parse_single_quoted(&mut self) -> Result<String> {
        self.bump();
        let start = self.pos;
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some('\'') => {
                    let raw = self.chars[start..self.pos].iter().collect();
                    self.bump();
                    return Ok(raw);
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn parse_bare_token(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | ';' | '}' | ']' | '#') {
                break;
            }
            self.bump();
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn current_scope(&mut self) -> &mut Map<String, Value> {
        if self.scopes.is_empty() {
            self.scopes.push(Map::new());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    // Character handling

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_inline_space(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
    }

    fn skip_comment(&mut self) -> bool {
        let starts = match self.peek() {
            Some('#') => true,
            Some('/') => self.peek_next() == Some('/'),
            _ => false,
        };
        if starts {
            while !matches!(self.peek(), None | Some('\n')) {
                self.bump();
            }
        }
        starts
    }

    /// Skip whitespace, newlines, and comments.
    fn skip_trivia(&mut self) {
        loop {
            if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
                continue;
            }
            if !self.skip_comment() {
                return;
            }
        }
    }

    /// Skip trivia plus the `,` and `;` pair terminators.
    fn skip_trivia_and_terminators(&mut self) {
        loop {
            self.skip_trivia();
            if matches!(self.peek(), Some(',' | ';')) {
                self.bump();
            } else {
                return;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ConfError {
        ConfError::syntax(self.line, self.column, message)
    }
}
