//! Recursive-descent parser. Precedence, lowest first:
//! conditional, `or`, `and`, `not`, comparison chains, `+ -`, `* / // %`,
//! unary `+ -`, `**`, primaries.

use crate::error::ExprError;
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Left-associative operator chain, folded from the left at evaluation.
    Chain(Box<Expr>, Vec<(BinaryOp, Expr)>),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    Call(String, Vec<Expr>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

pub(crate) fn parse(tokens: Vec<Token>) -> Result<Expr, ExprError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(ExprError::syntax(trailing.offset, "unexpected trailing input"));
    }
    Ok(expr)
}

/// A single operand stays as it is; more become one flat node so long
/// chains never nest.
fn flatten(mut operands: Vec<Expr>, node: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        node(operands)
    }
}

fn chain(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    match <[(BinaryOp, Expr); 1]>::try_from(rest) {
        Ok([(op, right)]) => Expr::Binary(op, Box::new(first), Box::new(right)),
        Err(rest) if rest.is_empty() => first,
        Err(rest) => Expr::Chain(Box::new(first), rest),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize() always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_kind_at(&self, ahead: usize) -> &TokenKind {
        let index = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ExprError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(ExprError::syntax(self.peek().offset, format!("expected {what}")))
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep { max: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let result = self.conditional();
        self.leave();
        result
    }

    fn conditional(&mut self) -> Result<Expr, ExprError> {
        let then = self.or()?;
        if !self.eat(&TokenKind::If) {
            return Ok(then);
        }
        let condition = self.or()?;
        self.expect(&TokenKind::Else, "'else'")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut operands = vec![self.and()?];
        while self.eat(&TokenKind::Or) {
            operands.push(self.and()?);
        }
        Ok(flatten(operands, Expr::Or))
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut operands = vec![self.not()?];
        while self.eat(&TokenKind::And) {
            operands.push(self.not()?);
        }
        Ok(flatten(operands, Expr::And))
    }

    fn not(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&TokenKind::Not) {
            self.enter()?;
            let operand = self.not();
            self.leave();
            return Ok(Expr::Not(Box::new(operand?)));
        }
        self.comparison()
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match (self.peek_kind(), self.peek_kind_at(1)) {
            (TokenKind::Eq, _) => CompareOp::Eq,
            (TokenKind::Ne, _) => CompareOp::Ne,
            (TokenKind::Lt, _) => CompareOp::Lt,
            (TokenKind::Le, _) => CompareOp::Le,
            (TokenKind::Gt, _) => CompareOp::Gt,
            (TokenKind::Ge, _) => CompareOp::Ge,
            (TokenKind::In, _) => CompareOp::In,
            (TokenKind::Not, TokenKind::In) => {
                self.advance();
                CompareOp::NotIn
            }
            (TokenKind::Is, TokenKind::Not) => {
                self.advance();
                CompareOp::IsNot
            }
            (TokenKind::Is, _) => CompareOp::Is,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let first = self.arith()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            rest.push((op, self.arith()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn arith(&mut self) -> Result<Expr, ExprError> {
        let first = self.term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(chain(first, rest)),
            };
            self.advance();
            rest.push((op, self.term()?));
        }
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let first = self.unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(chain(first, rest)),
            };
            self.advance();
            rest.push((op, self.unary()?));
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary();
        self.leave();
        Ok(Expr::Unary(op, Box::new(operand?)))
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.primary()?;
        if self.eat(&TokenKind::DoubleStar) {
            // right-associative, binds tighter than a unary minus on its left
            self.enter()?;
            let exponent = self.unary();
            self.leave();
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent?)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::None => Ok(Expr::Literal(Value::None)),
            TokenKind::Name(name) => {
                if self.eat(&TokenKind::LParen) {
                    let args = self.sequence(&TokenKind::RParen, "')'")?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            TokenKind::LBracket => Ok(Expr::List(self.sequence(&TokenKind::RBracket, "']'")?)),
            TokenKind::LParen => self.parenthesized(token.offset),
            TokenKind::Eof => Err(ExprError::syntax(token.offset, "unexpected end of expression")),
            other => Err(ExprError::syntax(
                token.offset,
                format!("unexpected token {other:?}"),
            )),
        }
    }

    /// `(expr)` groups; `()`, `(a,)` and `(a, b)` build tuples.
    fn parenthesized(&mut self, offset: usize) -> Result<Expr, ExprError> {
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.expression()?;
        if self.eat(&TokenKind::RParen) {
            return Ok(first);
        }
        if !self.eat(&TokenKind::Comma) {
            return Err(ExprError::syntax(offset, "unclosed '('"));
        }
        let mut items = vec![first];
        items.extend(self.sequence(&TokenKind::RParen, "')'")?);
        Ok(Expr::List(items))
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    fn sequence(&mut self, close: &TokenKind, what: &str) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.expression()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close, what)?;
                return Ok(items);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_str(source: &str) -> Result<Expr, ExprError> {
        parse(tokenize(source)?)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_str("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Literal(Value::Int(1))),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Literal(Value::Int(2))),
                    Box::new(Expr::Literal(Value::Int(3))),
                )),
            )
        );
    }

    #[test]
    fn operator_chains_stay_flat() {
        let Expr::Chain(first, rest) = parse_str("1 - 2 + 3").unwrap() else {
            panic!("expected a chain");
        };
        assert_eq!(*first, Expr::Literal(Value::Int(1)));
        assert_eq!(
            rest.iter().map(|(op, _)| *op).collect::<Vec<_>>(),
            vec![BinaryOp::Sub, BinaryOp::Add]
        );
        assert!(matches!(parse_str("a and b and c").unwrap(), Expr::And(operands) if operands.len() == 3));
        assert!(matches!(parse_str("a or b").unwrap(), Expr::Or(operands) if operands.len() == 2));
        assert_eq!(parse_str("a").unwrap(), Expr::Name("a".to_string()));
    }

    #[test]
    fn comparison_chains_are_collected() {
        let Expr::Compare(_, rest) = parse_str("0 < a <= 10").unwrap() else {
            panic!("expected a comparison");
        };
        assert_eq!(
            rest.iter().map(|(op, _)| *op).collect::<Vec<_>>(),
            vec![CompareOp::Lt, CompareOp::Le]
        );
    }

    #[test]
    fn not_in_and_is_not() {
        let Expr::Compare(_, rest) = parse_str("a not in b is not None").unwrap() else {
            panic!("expected a comparison");
        };
        assert_eq!(rest[0].0, CompareOp::NotIn);
        assert_eq!(rest[1].0, CompareOp::IsNot);
    }

    #[test]
    fn tuples_and_groups() {
        assert_eq!(parse_str("(1)").unwrap(), Expr::Literal(Value::Int(1)));
        assert!(matches!(parse_str("(1,)").unwrap(), Expr::List(items) if items.len() == 1));
        assert!(matches!(parse_str("[1, 2,]").unwrap(), Expr::List(items) if items.len() == 2));
    }

    #[test]
    fn errors() {
        assert!(matches!(parse_str("1 +"), Err(ExprError::Syntax { .. })));
        assert!(matches!(parse_str("a b"), Err(ExprError::Syntax { .. })));
        assert!(matches!(parse_str("1 if a"), Err(ExprError::Syntax { .. })));
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse_str(&deep), Err(ExprError::TooDeep { max: MAX_DEPTH }));
    }
}
