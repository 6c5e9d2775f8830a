//! medq-expr
//!
//! Sandboxed evaluator for the small expression language used by
//! questionnaire check codes and readonly/invisible conditions.
//!
//! The language is a Python-flavoured subset: literals, lists, boolean
//! logic, chained comparisons, arithmetic, conditionals and a fixed set of
//! pure builtins. There is no attribute access, no assignment and no way to
//! reach the host; the only inputs are the variables in an [`Environment`].

mod error;
mod eval;
mod lexer;
mod parser;
mod value;

use std::collections::BTreeSet;

pub use error::ExprError;
pub use eval::{Environment, MAX_SEQUENCE_LEN};
pub use parser::MAX_DEPTH;
pub use value::Value;

/// Longest accepted source text, in bytes.
pub const MAX_SOURCE_LEN: usize = 4096;

/// A parsed expression, ready to evaluate against any number of environments.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: parser::Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        if source.len() > MAX_SOURCE_LEN {
            return Err(ExprError::TooLong {
                max: MAX_SOURCE_LEN,
            });
        }
        let tokens = lexer::tokenize(source)?;
        let root = parser::parse(tokens)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, env: &Environment) -> Result<Value, ExprError> {
        eval::eval(&self.root, env)
    }

    /// Variable names the expression reads. Function names are excluded.
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_names(&self.root, &mut names);
        names
    }
}

fn collect_names(expr: &parser::Expr, names: &mut BTreeSet<String>) {
    use parser::Expr;
    match expr {
        Expr::Literal(_) => {}
        Expr::Name(name) => {
            names.insert(name.clone());
        }
        Expr::List(items) | Expr::Call(_, items) | Expr::And(items) | Expr::Or(items) => {
            for item in items {
                collect_names(item, names);
            }
        }
        Expr::Unary(_, operand) | Expr::Not(operand) => collect_names(operand, names),
        Expr::Binary(_, left, right) => {
            collect_names(left, names);
            collect_names(right, names);
        }
        Expr::Chain(first, rest) => {
            collect_names(first, names);
            for (_, operand) in rest {
                collect_names(operand, names);
            }
        }
        Expr::Compare(first, rest) => {
            collect_names(first, names);
            for (_, operand) in rest {
                collect_names(operand, names);
            }
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            collect_names(condition, names);
            collect_names(then, names);
            collect_names(otherwise, names);
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(source: &str, env: &Environment) -> Result<Value, ExprError> {
    Expression::parse(source)?.evaluate(env)
}
