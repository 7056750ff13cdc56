use super::error::ToolError;
use super::traits::{single_string_schema, string_arg, Tool};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

const MAX_NESTING: usize = 64;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &'static str {
        "calculate"
    }

    fn description(&self) -> &'static str {
        "Safely evaluate a mathematical expression. Example: '2 + 2', '10 * 5', '100 / 4'"
    }

    fn parameters(&self) -> Value {
        single_string_schema("expression", "The mathematical expression to evaluate")
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let expression = string_arg(arguments, "expression");
        calculate(expression).map(Value::String)
    }
}

/// Evaluate `expression` and render it as `"<expression> = <value>"`
pub fn calculate(expression: &str) -> Result<String, ToolError> {
    if let Some(bad) = expression
        .chars()
        .find(|c| !(c.is_ascii_digit() || "+-*/.()".contains(*c) || c.is_whitespace()))
    {
        return Err(ToolError::InvalidInput(format!(
            "Only basic math operations (+, -, *, /, parentheses) are allowed, found '{}'",
            bad
        )));
    }

    let value = evaluate(expression)?;
    Ok(format!("{} = {}", expression, value))
}

/// Result of an arithmetic evaluation.
///
/// Integer literals combined with `+ - *` stay exact; a decimal literal or
/// any `/` makes the result a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn negate(self) -> Result<Self, ToolError> {
        match self {
            Self::Int(i) => i.checked_neg().map(Self::Int).ok_or_else(overflow),
            Self::Float(f) => Ok(Self::Float(-f)),
        }
    }

    fn apply(self, op: BinOp, rhs: Self) -> Result<Self, ToolError> {
        let result = match (op, self, rhs) {
            (BinOp::Div, lhs, rhs) => {
                let divisor = rhs.as_f64();
                if divisor == 0.0 {
                    return Err(failed("division by zero"));
                }
                Self::Float(lhs.as_f64() / divisor)
            }
            (op, Self::Int(a), Self::Int(b)) => {
                let exact = match op {
                    BinOp::Add => a.checked_add(b),
                    BinOp::Sub => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                Self::Int(exact.ok_or_else(overflow)?)
            }
            (op, lhs, rhs) => {
                let (a, b) = (lhs.as_f64(), rhs.as_f64());
                Self::Float(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    _ => a * b,
                })
            }
        };

        match result {
            Self::Float(f) if !f.is_finite() => Err(failed("result is not a finite number")),
            other => Ok(other),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            // Debug keeps the trailing ".0" on integral floats
            Self::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// Parse and evaluate an arithmetic expression over `+ - * / ( )`
pub fn evaluate(expression: &str) -> Result<Number, ToolError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };

    let value = parser.expr(0)?;
    if let Some(token) = parser.peek() {
        return Err(failed(format!("unexpected token {:?}", token)));
    }
    Ok(value)
}

fn failed(msg: impl Into<String>) -> ToolError {
    ToolError::EvaluationFailed(msg.into())
}

fn overflow() -> ToolError {
    failed("integer overflow")
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(Number),
    Op(BinOp),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(parse_literal(&input[start..end])?));
                continue;
            }
            '+' => Token::Op(BinOp::Add),
            '-' => Token::Op(BinOp::Sub),
            '*' => Token::Op(BinOp::Mul),
            '/' => Token::Op(BinOp::Div),
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(failed(format!("unexpected character '{}'", other))),
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

fn parse_literal(literal: &str) -> Result<Number, ToolError> {
    if literal.contains('.') {
        literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| failed(format!("invalid number '{}'", literal)))
    } else {
        literal
            .parse::<i128>()
            .map(Number::Int)
            .map_err(|_| failed(format!("integer literal '{}' is too large", literal)))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self, depth: usize) -> Result<Number, ToolError> {
        let mut value = self.term(depth)?;
        while let Some(Token::Op(op @ (BinOp::Add | BinOp::Sub))) = self.peek() {
            self.pos += 1;
            let rhs = self.term(depth)?;
            value = value.apply(op, rhs)?;
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self, depth: usize) -> Result<Number, ToolError> {
        let mut value = self.factor(depth)?;
        while let Some(Token::Op(op @ (BinOp::Mul | BinOp::Div))) = self.peek() {
            self.pos += 1;
            let rhs = self.factor(depth)?;
            value = value.apply(op, rhs)?;
        }
        Ok(value)
    }

    // factor := ('+' | '-') factor | number | '(' expr ')'
    fn factor(&mut self, depth: usize) -> Result<Number, ToolError> {
        if depth > MAX_NESTING {
            return Err(failed("expression nested too deeply"));
        }

        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Op(BinOp::Add)) => self.factor(depth + 1),
            Some(Token::Op(BinOp::Sub)) => self.factor(depth + 1)?.negate(),
            Some(Token::LParen) => {
                let value = self.expr(depth + 1)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(failed("missing closing parenthesis")),
                }
            }
            Some(token) => Err(failed(format!("unexpected token {:?}", token))),
            None => Err(failed("unexpected end of expression")),
        }
    }
}
