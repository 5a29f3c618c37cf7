//! Row-predicate expressions for filtering tables.
//!
//! The language is a small subset of the dataframe `query` dialect:
//!
//! ```text
//! (price > 10 and region == 'EU') or `unit cost` <= 2.5
//! grade in ['A', 'B'] & ~(score % 2 == 0)
//! ```
//!
//! Precedence, loosest first: `or`/`|`, `and`/`&`, `not`/`~`, comparisons
//! (chainable, plus `in` / `not in`), `+ -`, `* / %`, unary minus.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at offset {at}")]
    UnexpectedChar { ch: char, at: usize },

    #[error("unterminated {0}")]
    Unterminated(&'static str),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("expected {expected}, found {found}")]
    Syntax { expected: &'static str, found: String },

    #[error("name '{0}' is not defined")]
    UnknownColumn(String),

    #[error("unsupported operand types for {op}: {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("bad operand type for {op}: {operand}")]
    BadOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),

    #[error("expression must evaluate to a boolean, got {0}")]
    NotBoolean(&'static str),

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

type Result<T> = std::result::Result<T, ExprError>;

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    /// Bare identifier; may turn out to be a keyword.
    Ident(String),
    /// Backtick-quoted column name; never a keyword.
    Quoted(String),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(i) => write!(f, "{i}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Quoted(s) => write!(f, "`{s}`"),
            Token::Op(op) => write!(f, "'{op}'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Comma => write!(f, "','"),
            Token::End => write!(f, "end of expression"),
        }
    }
}

const TWO_CHAR_OPS: [&str; 4] = ["==", "!=", "<=", ">="];
const ONE_CHAR_OPS: [&str; 10] = ["<", ">", "+", "-", "*", "/", "%", "&", "|", "~"];

fn tokenize(src: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && next.is_some_and(|d| d.is_ascii_digit())) {
            let (token, end) = lex_number(&chars, i)?;
            tokens.push(token);
            i = end;
        } else if c == '\'' || c == '"' {
            let mut text = String::new();
            let mut j = i + 1;
            loop {
                match chars.get(j) {
                    None => return Err(ExprError::Unterminated("string literal")),
                    Some('\\') if j + 1 < chars.len() => {
                        text.push(chars[j + 1]);
                        j += 2;
                    }
                    Some(&q) if q == c => break,
                    Some(&other) => {
                        text.push(other);
                        j += 1;
                    }
                }
            }
            tokens.push(Token::Str(text));
            i = j + 1;
        } else if c == '`' {
            let end = chars[i + 1..]
                .iter()
                .position(|&ch| ch == '`')
                .ok_or(ExprError::Unterminated("backtick-quoted name"))?;
            tokens.push(Token::Quoted(chars[i + 1..i + 1 + end].iter().collect()));
            i += end + 2;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            let pair: String = [Some(c), next].iter().flatten().collect();
            if let Some(op) = TWO_CHAR_OPS.iter().find(|op| **op == pair) {
                tokens.push(Token::Op(*op));
                i += 2;
                continue;
            }
            let single = c.to_string();
            tokens.push(match c {
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ',' => Token::Comma,
                _ => match ONE_CHAR_OPS.iter().find(|op| **op == single) {
                    Some(op) => Token::Op(*op),
                    None => return Err(ExprError::UnexpectedChar { ch: c, at: i }),
                },
            });
            i += 1;
        }
    }

    tokens.push(Token::End);
    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize)> {
    let mut i = start;
    let mut is_float = false;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        is_float = true;
        i += 1;
        if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
            i += 1;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }

    let text: String = chars[start..i].iter().collect();
    let token = if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ExprError::InvalidNumber(text))?
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ExprError::InvalidNumber(text))?
    };
    Ok((token, i))
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }

    fn comparison(op: &str) -> Option<BinOp> {
        Some(match op {
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Column(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Membership {
        needle: Box<Expr>,
        haystack: Vec<Expr>,
        negated: bool,
    },
}

impl Expr {
    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn collect_columns(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Column(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Not(e) | Expr::Neg(e) => e.collect_columns(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_columns(out);
                rhs.collect_columns(out);
            }
            Expr::Membership {
                needle, haystack, ..
            } => {
                needle.collect_columns(out);
                for item in haystack {
                    item.collect_columns(out);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent, one function per precedence level
// ---------------------------------------------------------------------------

/// Limit on parser nesting and on operator chain length.
const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Expr>) -> Result<Expr> {
        self.descend()?;
        let expr = parse(self)?;
        self.depth -= 1;
        Ok(expr)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, want: Token, expected: &'static str) -> Result<()> {
        if *self.peek() == want {
            self.bump();
            Ok(())
        } else {
            Err(ExprError::Syntax {
                expected,
                found: self.peek().to_string(),
            })
        }
    }

    fn at_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Ident(w) if w == word)
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.peek(), Token::Op(o) if *o == op)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut lhs = self.parse_and()?;
        while self.at_keyword("or") || self.at_op("|") {
            self.bump();
            self.descend()?;
            let rhs = self.parse_and()?;
            lhs = Expr::binary(BinOp::Or, lhs, rhs);
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut lhs = self.parse_not()?;
        while self.at_keyword("and") || self.at_op("&") {
            self.bump();
            self.descend()?;
            let rhs = self.parse_not()?;
            lhs = Expr::binary(BinOp::And, lhs, rhs);
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.at_keyword("not") || self.at_op("~") {
            self.bump();
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    /// `a < b <= c` means `a < b and b <= c`.
    fn parse_comparison(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let first = self.parse_additive()?;
        let mut links: Vec<Expr> = Vec::new();
        let mut lhs = first.clone();

        loop {
            if !links.is_empty() {
                self.descend()?;
            }
            let link = if let Token::Op(op) = self.peek() {
                match BinOp::comparison(op) {
                    Some(cmp) => {
                        self.bump();
                        let rhs = self.parse_additive()?;
                        let link = Expr::binary(cmp, lhs, rhs.clone());
                        lhs = rhs;
                        link
                    }
                    None => break,
                }
            } else if self.at_keyword("in") {
                self.bump();
                let haystack = self.parse_list()?;
                Expr::Membership {
                    needle: Box::new(lhs.clone()),
                    haystack,
                    negated: false,
                }
            } else if self.at_keyword("not") && matches!(self.peek_at(1), Token::Ident(w) if w == "in") {
                self.bump();
                self.bump();
                let haystack = self.parse_list()?;
                Expr::Membership {
                    needle: Box::new(lhs.clone()),
                    haystack,
                    negated: true,
                }
            } else {
                break;
            };
            links.push(link);
        }
        self.depth = mark;

        let mut links = links.into_iter();
        match links.next() {
            None => Ok(first),
            Some(head) => Ok(links.fold(head, |acc, next| Expr::binary(BinOp::And, acc, next))),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Expr>> {
        let close = match self.bump() {
            Token::LBracket => Token::RBracket,
            Token::LParen => Token::RParen,
            other => {
                return Err(ExprError::Syntax {
                    expected: "a list after 'in'",
                    found: other.to_string(),
                })
            }
        };
        let mut items = Vec::new();
        while *self.peek() != close {
            items.push(self.parse_additive()?);
            if *self.peek() == Token::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(close, "closing bracket")?;
        Ok(items)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Token::Op("+") => BinOp::Add,
                Token::Op("-") => BinOp::Sub,
                _ => break,
            };
            self.bump();
            self.descend()?;
            let rhs = self.parse_term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Op("*") => BinOp::Mul,
                Token::Op("/") => BinOp::Div,
                Token::Op("%") => BinOp::Rem,
                _ => break,
            };
            self.bump();
            self.descend()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.at_op("-") {
            self.bump();
            let inner = self.nested(Self::parse_unary)?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        if self.at_op("+") {
            self.bump();
            return self.nested(Self::parse_unary);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.bump() {
            Token::Int(i) => Ok(Expr::Literal(Value::Integer(i))),
            Token::Float(v) => Ok(Expr::Literal(Value::Float(v))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Quoted(name) => Ok(Expr::Column(name)),
            Token::Ident(word) => match word.as_str() {
                "True" | "true" => Ok(Expr::Literal(Value::Bool(true))),
                "False" | "false" => Ok(Expr::Literal(Value::Bool(false))),
                "None" | "null" => Ok(Expr::Literal(Value::Null)),
                "and" | "or" | "not" | "in" => Err(ExprError::Syntax {
                    expected: "an operand",
                    found: word,
                }),
                _ => Ok(Expr::Column(word)),
            },
            Token::LParen => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(ExprError::Syntax {
                expected: "an operand",
                found: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

struct RowContext<'a> {
    table: &'a Table,
    positions: &'a HashMap<&'a str, usize>,
    row: usize,
}

impl Expr {
    fn eval(&self, ctx: &RowContext<'_>) -> Result<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Column(name) => {
                let pos = ctx
                    .positions
                    .get(name.as_str())
                    .ok_or_else(|| ExprError::UnknownColumn(name.clone()))?;
                Ok(ctx.table.value(ctx.row, *pos).clone())
            }
            Expr::Not(inner) => Ok(Value::Bool(!truthy(&inner.eval(ctx)?, "not")?)),
            Expr::Neg(inner) => match inner.eval(ctx)? {
                Value::Integer(i) => i
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or(ExprError::Overflow("-")),
                Value::Float(v) => Ok(Value::Float(-v)),
                Value::Null => Ok(Value::Null),
                other => Err(ExprError::BadOperand {
                    op: "unary -",
                    operand: other.type_name(),
                }),
            },
            Expr::Binary { op, lhs, rhs } => match op {
                BinOp::And => {
                    let result = truthy(&lhs.eval(ctx)?, "and")? && truthy(&rhs.eval(ctx)?, "and")?;
                    Ok(Value::Bool(result))
                }
                BinOp::Or => {
                    let result = truthy(&lhs.eval(ctx)?, "or")? || truthy(&rhs.eval(ctx)?, "or")?;
                    Ok(Value::Bool(result))
                }
                BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    compare(*op, &lhs.eval(ctx)?, &rhs.eval(ctx)?)
                }
                _ => arithmetic(*op, lhs.eval(ctx)?, rhs.eval(ctx)?),
            },
            Expr::Membership {
                needle,
                haystack,
                negated,
            } => {
                let needle = needle.eval(ctx)?;
                if needle.is_missing() {
                    return Ok(Value::Bool(*negated));
                }
                let mut found = false;
                for item in haystack {
                    if loosely_equal(&needle, &item.eval(ctx)?) {
                        found = true;
                        break;
                    }
                }
                Ok(Value::Bool(found != *negated))
            }
        }
    }
}

/// Boolean operands; a missing value counts as false.
fn truthy(v: &Value, op: &'static str) -> Result<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        v if v.is_missing() => Ok(false),
        other => Err(ExprError::BadOperand {
            op,
            operand: other.type_name(),
        }),
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    matches!(ordering(a, b), Some(Ordering::Equal))
}

/// Order of two non-missing values of compatible kinds.
fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (x, y) if x.is_numeric() && y.is_numeric() => {
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (x, y) => Some(x.as_str()?.cmp(y.as_str()?)),
    }
}

fn compare(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    if lhs.is_missing() || rhs.is_missing() {
        return Ok(Value::Bool(op == BinOp::Ne));
    }
    let result = match (op, ordering(lhs, rhs)) {
        (BinOp::Eq, ord) => ord == Some(Ordering::Equal),
        (BinOp::Ne, ord) => ord != Some(Ordering::Equal),
        (_, None) => {
            return Err(ExprError::TypeMismatch {
                op: op.symbol(),
                left: lhs.type_name(),
                right: rhs.type_name(),
            })
        }
        (BinOp::Lt, Some(ord)) => ord.is_lt(),
        (BinOp::Le, Some(ord)) => ord.is_le(),
        (BinOp::Gt, Some(ord)) => ord.is_gt(),
        (_, Some(ord)) => ord.is_ge(),
    };
    Ok(Value::Bool(result))
}

fn arithmetic(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    let mismatch = |l: &Value, r: &Value| ExprError::TypeMismatch {
        op: op.symbol(),
        left: l.type_name(),
        right: r.type_name(),
    };

    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => {
            let (a, b) = (*a, *b);
            let checked = match op {
                BinOp::Add => a.checked_add(b),
                BinOp::Sub => a.checked_sub(b),
                BinOp::Mul => a.checked_mul(b),
                BinOp::Div => return Ok(Value::Float(a as f64 / b as f64)),
                _ if b == 0 => return Ok(Value::Float(f64::NAN)),
                _ => a.checked_rem(b).map(|r| if r != 0 && (r < 0) != (b < 0) { r + b } else { r }),
            };
            checked.map(Value::Integer).ok_or(ExprError::Overflow(op.symbol()))
        }
        (l, r) if (l.is_numeric() || l.is_missing()) && (r.is_numeric() || r.is_missing()) => {
            let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
                return Ok(Value::Null);
            };
            Ok(Value::Float(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                _ => {
                    let r = a % b;
                    if r != 0.0 && (r < 0.0) != (b < 0.0) {
                        r + b
                    } else {
                        r
                    }
                }
            }))
        }
        (Value::String(a), Value::String(b)) if op == BinOp::Add => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (l, r) => Err(mismatch(l, r)),
    }
}

// ---------------------------------------------------------------------------
// Predicate – a parsed expression ready to run against tables
// ---------------------------------------------------------------------------

/// A parsed row predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    expr: Expr,
    columns: Vec<String>,
}

impl Predicate {
    pub fn parse(source: &str) -> Result<Predicate> {
        if source.trim().is_empty() {
            return Err(ExprError::Empty);
        }
        let mut parser = Parser {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;
        if *parser.peek() != Token::End {
            return Err(ExprError::Syntax {
                expected: "end of expression",
                found: parser.peek().to_string(),
            });
        }
        let mut columns = Vec::new();
        expr.collect_columns(&mut columns);
        Ok(Predicate {
            source: source.to_string(),
            expr,
            columns,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Column names the expression refers to, in order of first use.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Indices of the rows for which the predicate holds.
    pub fn matches(&self, table: &Table) -> Result<Vec<usize>> {
        let mut positions = HashMap::new();
        for name in &self.columns {
            let pos = table
                .position(name)
                .ok_or_else(|| ExprError::UnknownColumn(name.clone()))?;
            positions.insert(name.as_str(), pos);
        }

        let mut kept = Vec::new();
        for row in 0..table.height() {
            let ctx = RowContext {
                table,
                positions: &positions,
                row,
            };
            match self.expr.eval(&ctx)? {
                Value::Bool(true) => kept.push(row),
                Value::Bool(false) | Value::Null => {}
                other => return Err(ExprError::NotBoolean(other.type_name())),
            }
        }
        Ok(kept)
    }
}

impl FromStr for Predicate {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self> {
        Predicate::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table() -> Table {
        Table::new(vec![
            Column::new("a", [1, 2, 3, 4]),
            Column::new("b", [0.5, 1.5, f64::NAN, 3.5]),
            Column::new("s", ["x", "y", "x", "z"]),
            Column::new("unit cost", [10, 20, 30, 40]),
        ])
        .unwrap()
    }

    fn rows(src: &str) -> Vec<usize> {
        Predicate::parse(src).unwrap().matches(&table()).unwrap()
    }

    #[test]
    fn comparisons_and_boolean_operators() {
        assert_eq!(rows("a > 2"), vec![2, 3]);
        assert_eq!(rows("a >= 2 and s == 'x'"), vec![2]);
        assert_eq!(rows("a == 1 | s == \"z\""), vec![0, 3]);
        assert_eq!(rows("not a > 1"), vec![0]);
        assert_eq!(rows("~(a > 1) or a == 4"), vec![0, 3]);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(rows("a == 1 or a == 2 and s == 'x'"), vec![0]);
        assert_eq!(rows("(a == 1 or a == 2) and s == 'y'"), vec![1]);
    }

    #[test]
    fn missing_values_never_compare_true() {
        assert_eq!(rows("b > 0"), vec![0, 1, 3]);
        assert_eq!(rows("b != 100"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn arithmetic_and_mixed_numeric_comparison() {
        assert_eq!(rows("a * 2 > b + 2"), vec![1, 3]);
        assert_eq!(rows("a % 2 == 0"), vec![1, 3]);
        assert_eq!(rows("a / 2 == 1.5"), vec![2]);
        assert_eq!(rows("-a < -3"), vec![3]);
    }

    #[test]
    fn chained_comparison() {
        assert_eq!(rows("1 < a <= 3"), vec![1, 2]);
    }

    #[test]
    fn membership() {
        assert_eq!(rows("s in ['x', 'z']"), vec![0, 2, 3]);
        assert_eq!(rows("a not in (1, 4)"), vec![1, 2]);
    }

    #[test]
    fn backtick_names() {
        assert_eq!(rows("`unit cost` >= 30"), vec![2, 3]);
    }

    #[test]
    fn reports_unknown_columns() {
        let pred = Predicate::parse("missing > 1").unwrap();
        assert_eq!(
            pred.matches(&table()),
            Err(ExprError::UnknownColumn("missing".into()))
        );
    }

    #[test]
    fn reports_type_errors() {
        let pred = Predicate::parse("s > 1").unwrap();
        assert!(matches!(
            pred.matches(&table()),
            Err(ExprError::TypeMismatch { .. })
        ));

        let pred = Predicate::parse("a + 1").unwrap();
        assert_eq!(
            pred.matches(&table()),
            Err(ExprError::NotBoolean("integer"))
        );
    }

    #[test]
    fn rejects_malformed_syntax() {
        for src in ["a >", "a = 1", "(a > 1", "'open", "a > 1 b", "and", "a in 3", ""] {
            assert!(Predicate::parse(src).is_err(), "{src} should not parse");
        }
    }

    #[test]
    fn remembers_source_and_columns() {
        let pred = Predicate::parse("`unit cost` > a or a in [b, 2]").unwrap();
        assert_eq!(pred.source(), "`unit cost` > a or a in [b, 2]");
        assert_eq!(pred.columns(), ["unit cost", "a", "b"]);
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let prefixes = [
            "~".repeat(200_000),
            "not ".repeat(50_000),
            "(".repeat(200_000),
            "-".repeat(200_000),
        ];
        for prefix in prefixes {
            let src = format!("{prefix}a > 1");
            assert_eq!(
                Predicate::parse(&src),
                Err(ExprError::TooDeep(MAX_DEPTH)),
                "{}",
                &src[..8]
            );
        }

        let long_chain = vec!["a"; 100_000].join(" + ") + " > 1";
        assert_eq!(
            Predicate::parse(&long_chain),
            Err(ExprError::TooDeep(MAX_DEPTH))
        );
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let src = format!("{}a > 1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(rows(&src), vec![1, 2, 3]);
        assert_eq!(rows(&format!("{}a > 1", "~~".repeat(50))), vec![1, 2, 3]);
    }
}
