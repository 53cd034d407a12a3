use serde_json::{Map, Value};
use thiserror::Error;

use super::clock::Clock;

#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error("expression parse error: {0}")]
    Parse(String),
}

/// Per-run state visible to templates and conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    pub input: Map<String, Value>,
    pub steps: Vec<Value>,
}

impl ExecutionContext {
    pub fn new(input: Map<String, Value>) -> Self {
        Self {
            input,
            steps: Vec::new(),
        }
    }

    pub fn push_outcome(&mut self, outcome: Map<String, Value>) {
        self.steps.push(Value::Object(outcome));
    }

    pub fn push_skipped(&mut self) {
        let mut marker = Map::new();
        marker.insert("skipped".to_owned(), Value::Bool(true));
        self.steps.push(Value::Object(marker));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluationOptions {
    pub max_length: usize,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self { max_length: 8_192 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Identifier(String),
    Integer(String),
    LBracket,
    RBracket,
    Dot,
    /// Everything after a `.`, verbatim.
    Field(String),
    Other(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reference {
    Timestamp,
    Date,
    Time,
    Input(String),
    Step(usize),
    StepField { index: usize, field: String },
    Unknown,
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut chars = input.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some((idx, ch)) = chars.peek().copied() {
        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = idx;
            chars.next();
            while let Some((_, c)) = chars.peek().copied() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    chars.next();
                } else {
                    break;
                }
            }
            let end = chars.peek().map(|(i, _)| *i).unwrap_or(input.len());
            tokens.push(Token::Identifier(input[start..end].to_owned()));
            continue;
        }

        if ch.is_ascii_digit() {
            let start = idx;
            chars.next();
            while let Some((_, c)) = chars.peek().copied() {
                if c.is_ascii_digit() {
                    chars.next();
                } else {
                    break;
                }
            }
            let end = chars.peek().map(|(i, _)| *i).unwrap_or(input.len());
            tokens.push(Token::Integer(input[start..end].to_owned()));
            continue;
        }

        chars.next();
        match ch {
            '[' => tokens.push(Token::LBracket),
            ']' => tokens.push(Token::RBracket),
            '.' => {
                tokens.push(Token::Dot);
                tokens.push(Token::Field(input[idx + 1..].to_owned()));
                break;
            }
            other => tokens.push(Token::Other(other)),
        }
    }

    tokens
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn parse_reference(&mut self) -> Reference {
        let reference = match self.next() {
            Some(Token::Identifier(name)) => match name.as_str() {
                "timestamp" => Reference::Timestamp,
                "date" => Reference::Date,
                "time" => Reference::Time,
                "input" => self.parse_input(),
                "steps" => self.parse_steps(),
                _ => Reference::Unknown,
            },
            _ => Reference::Unknown,
        };

        if self.peek().is_some() {
            return Reference::Unknown;
        }
        reference
    }

    fn parse_input(&mut self) -> Reference {
        if !self.match_token(&Token::Dot) {
            return Reference::Unknown;
        }
        match self.next() {
            Some(Token::Field(field)) => Reference::Input(field),
            _ => Reference::Unknown,
        }
    }

    fn parse_steps(&mut self) -> Reference {
        if !self.match_token(&Token::LBracket) {
            return Reference::Unknown;
        }
        let Some(Token::Integer(digits)) = self.next() else {
            return Reference::Unknown;
        };
        if !self.match_token(&Token::RBracket) {
            return Reference::Unknown;
        }

        // Too large for usize is simply out of range.
        let index = digits.parse::<usize>().unwrap_or(usize::MAX);
        if self.peek().is_none() {
            return Reference::Step(index);
        }
        if !self.match_token(&Token::Dot) {
            return Reference::Unknown;
        }
        match self.next() {
            Some(Token::Field(field)) if !field.is_empty() => {
                Reference::StepField { index, field }
            }
            _ => Reference::Unknown,
        }
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            return true;
        }
        false
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }
}

/// Resolves references and `{{ ... }}` templates against one execution context.
pub struct Evaluator<'a> {
    context: &'a ExecutionContext,
    clock: &'a dyn Clock,
    options: EvaluationOptions,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a ExecutionContext, clock: &'a dyn Clock) -> Self {
        Self {
            context,
            clock,
            options: EvaluationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    /// Evaluates a bare expression such as `input.city` or `steps[0].message`.
    pub fn evaluate(&self, expression: &str) -> Result<Value, ExpressionError> {
        let expression = expression.trim();
        if expression.len() > self.options.max_length {
            return Err(ExpressionError::Parse(format!(
                "expression exceeds max length {}",
                self.options.max_length
            )));
        }

        let reference = Parser::new(tokenize(expression)).parse_reference();
        Ok(self.resolve(reference))
    }

    fn resolve(&self, reference: Reference) -> Value {
        let now = || self.clock.now();
        match reference {
            Reference::Timestamp => {
                Value::String(now().format("%Y-%m-%d %H:%M:%S").to_string())
            }
            Reference::Date => Value::String(now().format("%Y-%m-%d").to_string()),
            Reference::Time => Value::String(now().format("%H:%M:%S").to_string()),
            Reference::Input(field) => self
                .context
                .input
                .get(&field)
                .cloned()
                .unwrap_or_else(empty_string),
            Reference::Step(index) => self
                .context
                .steps
                .get(index)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            Reference::StepField { index, field } => self
                .context
                .steps
                .get(index)
                .and_then(|record| record.get(&field))
                .cloned()
                .unwrap_or_else(empty_string),
            Reference::Unknown => empty_string(),
        }
    }

    /// Rewrites every `{{ ... }}` token in `text`. A token whose expression
    /// fails to evaluate stays in the output exactly as written.
    pub fn render(&self, text: &str) -> String {
        let mut rendered = String::with_capacity(text.len());
        let mut cursor = 0;

        while let Some((start, end, inner)) = find_token(text, cursor) {
            rendered.push_str(&text[cursor..start]);
            match self.evaluate(inner) {
                Ok(value) => rendered.push_str(&value_to_string(&value)),
                Err(_) => rendered.push_str(&text[start..end]),
            }
            cursor = end;
        }

        rendered.push_str(&text[cursor..]);
        rendered
    }

    pub fn substitute(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.render(text)),
            Value::Object(map) => Value::Object(self.substitute_map(map)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.substitute(item)).collect())
            }
            _ => value.clone(),
        }
    }

    pub fn substitute_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(key, item)| (key.clone(), self.substitute(item)))
            .collect()
    }
}

/// Finds the next template token at or after `from`, returning its byte
/// span and the raw text between the braces.
///
/// Matches like the lazy pattern `\{\{\s*(.+?)\s*\}\}`: the shortest body
/// that holds at least one character, with no line break inside the
/// trimmed expression.
fn find_token(text: &str, from: usize) -> Option<(usize, usize, &str)> {
    let mut search = from;
    while let Some(offset) = text[search..].find("{{") {
        let start = search + offset;
        let body_start = start + 2;

        // The body holds at least one character.
        let Some(first) = text[body_start..].chars().next() else {
            return None;
        };
        let mut close_search = body_start + first.len_utf8();
        while let Some(close_offset) = text[close_search..].find("}}") {
            let close = close_search + close_offset;
            let body = &text[body_start..close];
            if is_token_body(body) {
                return Some((start, close + 2, body));
            }
            close_search = close + 1;
        }

        search = start + 1;
    }
    None
}

fn is_token_body(body: &str) -> bool {
    let core = body.trim();
    if core.contains('\n') {
        return false;
    }
    !core.is_empty() || body.chars().any(|c| c.is_whitespace() && c != '\n')
}

fn empty_string() -> Value {
    Value::String(String::new())
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(v) => *v,
        Value::Number(v) => v.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(v) => !v.is_empty(),
        Value::Array(v) => !v.is_empty(),
        Value::Object(v) => !v.is_empty(),
        Value::Null => false,
    }
}

pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(v) => v.as_f64(),
        Value::String(v) => v.trim().parse::<f64>().ok(),
        Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(v) => v.clone(),
        Value::Null => "null".to_owned(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
