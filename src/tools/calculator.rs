//! Safe arithmetic calculator tool.
//!
//! Evaluates arithmetic expressions with a small recursive-descent parser
//! instead of handing untrusted text to any dynamic evaluator. Input passes
//! three validation gates before parsing: a character allow-list,
//! consecutive-operator rejection, and parenthesis balancing. Every failure
//! mode returns a descriptive string so the agent loop never aborts.

use crate::tools::Tool;
use std::time::Duration;
use tracing::debug;

/// Simulated tool latency applied per invocation.
const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

const OPERATORS: &[char] = &['+', '-', '*', '/', '^'];

/// Calculator tool supporting `+ - * / ^ ( )` and numeric literals.
#[derive(Debug, Clone)]
pub struct Calculator {
    latency: Duration,
}

impl Calculator {
    /// Create a calculator with the default simulated latency.
    pub fn new() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
        }
    }

    /// Override the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "Calculator"
    }

    async fn invoke(&self, input: &str) -> String {
        tokio::time::sleep(self.latency).await;
        let result = evaluate(input);
        debug!(input, result = %result, "calculator invoked");
        result
    }
}

/// Evaluate an arithmetic expression, returning either the numeric result
/// or a descriptive rejection string.
pub fn evaluate(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return "Invalid expression: empty input".to_string();
    }

    if let Some(bad) = trimmed
        .chars()
        .find(|c| !c.is_ascii_digit() && !c.is_whitespace() && !"+-*/^().".contains(*c))
    {
        return format!("Invalid expression: unsupported character '{}'", bad);
    }

    let compact: Vec<char> = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact
        .windows(2)
        .any(|pair| OPERATORS.contains(&pair[0]) && OPERATORS.contains(&pair[1]))
    {
        return "Invalid expression: consecutive operators are not allowed".to_string();
    }

    let mut depth: i32 = 0;
    for c in &compact {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return "Invalid expression: unbalanced parentheses".to_string();
        }
    }
    if depth != 0 {
        return "Invalid expression: unbalanced parentheses".to_string();
    }

    match Parser::new(&compact).parse() {
        Ok(value) => format_number(value),
        Err(reason) => format!("Invalid expression: {}", reason),
    }
}

fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "Invalid expression: result is not a finite number".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Recursive-descent parser over a whitespace-free character sequence.
///
/// Grammar:
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := '-'? power
/// power  := atom ('^' factor)?          (right-associative)
/// atom   := number | '(' expr ')'
/// ```
struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(chars: &'a [char]) -> Self {
        Self { chars, pos: 0 }
    }

    fn parse(mut self) -> Result<f64, String> {
        let value = self.expr()?;
        match self.peek() {
            None => Ok(value),
            Some(c) => Err(format!("unexpected '{}'", c)),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.bump();
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.bump();
            let rhs = self.factor()?;
            if op == '/' {
                if rhs == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= rhs;
            } else {
                value *= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, String> {
        if self.peek() == Some('-') {
            self.bump();
            return Ok(-self.factor()?);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.atom()?;
        if self.peek() == Some('^') {
            self.bump();
            let exponent = self.factor()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let value = self.expr()?;
                match self.bump() {
                    Some(')') => Ok(value),
                    _ => Err("expected ')'".to_string()),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(format!("unexpected '{}'", c)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            match c {
                _ if c.is_ascii_digit() => {
                    self.bump();
                }
                '.' if !seen_dot => {
                    seen_dot = true;
                    self.bump();
                }
                _ => break,
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("malformed number '{}'", literal))
    }
}
