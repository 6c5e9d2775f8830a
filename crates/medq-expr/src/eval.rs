use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::ExprError;
use crate::parser::{BinaryOp, CompareOp, Expr, UnaryOp};
use crate::value::Value;

/// Upper bound on strings and lists built by `*` and `+`.
pub const MAX_SEQUENCE_LEN: usize = 65_536;

/// Named variables visible to an expression.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        for (name, value) in iter {
            env.insert(name, value);
        }
        env
    }
}

pub(crate) fn eval(expr: &Expr, env: &Environment) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| ExprError::UnknownName(name.clone())),
        Expr::List(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| eval(item, env))
                .collect::<Result<_, _>>()?,
        )),
        Expr::Unary(op, operand) => unary(*op, eval(operand, env)?),
        Expr::Binary(op, left, right) => binary(*op, eval(left, env)?, eval(right, env)?),
        Expr::Chain(first, rest) => rest.iter().try_fold(eval(first, env)?, |acc, (op, right)| {
            binary(*op, acc, eval(right, env)?)
        }),
        Expr::Not(operand) => Ok(Value::Bool(!eval(operand, env)?.is_truthy())),
        Expr::And(operands) => short_circuit(operands, env, false),
        Expr::Or(operands) => short_circuit(operands, env, true),
        Expr::Compare(first, rest) => {
            let mut left = eval(first, env)?;
            for (op, right) in rest {
                let right = eval(right, env)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|arg| eval(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, args)
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, env)?.is_truthy() {
                eval(then, env)
            } else {
                eval(otherwise, env)
            }
        }
    }
}

/// Python `and`/`or`: the first operand whose truthiness equals `stop_on`,
/// or the last one.
fn short_circuit(operands: &[Expr], env: &Environment, stop_on: bool) -> Result<Value, ExprError> {
    let mut last = Value::None;
    for operand in operands {
        last = eval(operand, env)?;
        if last.is_truthy() == stop_on {
            break;
        }
    }
    Ok(last)
}

fn type_error(op: &str, left: &Value, right: &Value) -> ExprError {
    ExprError::Type(format!(
        "unsupported operand types for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, ExprError> {
    match (op, value) {
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(f)),
        (op, v) => match (op, v.as_int()) {
            (UnaryOp::Neg, Some(i)) => i.checked_neg().map(Value::Int).ok_or(ExprError::Overflow),
            (UnaryOp::Pos, Some(i)) => Ok(Value::Int(i)),
            (_, None) => Err(ExprError::Type(format!(
                "bad operand type for unary operator: '{}'",
                v.type_name()
            ))),
        },
    }
}

fn repeat<T: Clone>(items: &[T], times: i64) -> Result<Vec<T>, ExprError> {
    let times = usize::try_from(times.max(0)).map_err(|_| ExprError::Overflow)?;
    let total = items.len().saturating_mul(times);
    if total > MAX_SEQUENCE_LEN {
        return Err(ExprError::TooLarge {
            max: MAX_SEQUENCE_LEN,
        });
    }
    Ok(std::iter::repeat_n(items, times).flatten().cloned().collect())
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, ExprError> {
    // Integer arithmetic first: bools count as 0/1.
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return int_binary(op, a, b);
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return float_binary(op, a, b);
    }

    match (op, &left, &right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            if a.len() + b.len() > MAX_SEQUENCE_LEN {
                return Err(ExprError::TooLarge {
                    max: MAX_SEQUENCE_LEN,
                });
            }
            Ok(Value::Str(format!("{a}{b}")))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            if a.len() + b.len() > MAX_SEQUENCE_LEN {
                return Err(ExprError::TooLarge {
                    max: MAX_SEQUENCE_LEN,
                });
            }
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(s), n) | (BinaryOp::Mul, n, Value::Str(s))
            if n.as_int().is_some() =>
        {
            let chars: Vec<char> = s.chars().collect();
            let repeated = repeat(&chars, n.as_int().unwrap_or_default())?;
            Ok(Value::Str(repeated.into_iter().collect()))
        }
        (BinaryOp::Mul, Value::List(items), n) | (BinaryOp::Mul, n, Value::List(items))
            if n.as_int().is_some() =>
        {
            Ok(Value::List(repeat(items, n.as_int().unwrap_or_default())?))
        }
        (op, l, r) => Err(type_error(op_symbol(op), l, r)),
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value, ExprError> {
    let checked = |v: Option<i64>| v.map(Value::Int).ok_or(ExprError::Overflow);
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mul => checked(a.checked_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(ExprError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or(ExprError::Overflow)?;
            // round toward negative infinity
            if a % b != 0 && ((a < 0) != (b < 0)) {
                Ok(Value::Int(q - 1))
            } else {
                Ok(Value::Int(q))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(ExprError::DivisionByZero);
            }
            let r = a.checked_rem(b).ok_or(ExprError::Overflow)?;
            // result takes the sign of the divisor
            if r != 0 && ((r < 0) != (b < 0)) {
                Ok(Value::Int(r + b))
            } else {
                Ok(Value::Int(r))
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(ExprError::DivisionByZero);
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| ExprError::Overflow)?;
            checked(a.checked_pow(exp))
        }
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, ExprError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            a - b * (a / b).floor()
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(value))
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, ExprError> {
    let ordered = |accept: fn(Ordering) -> bool| -> Result<bool, ExprError> {
        Ok(left.try_cmp(right)?.is_some_and(accept))
    };
    match op {
        CompareOp::Eq => Ok(left.loose_eq(right)),
        CompareOp::Ne => Ok(!left.loose_eq(right)),
        CompareOp::Lt => ordered(Ordering::is_lt),
        CompareOp::Le => ordered(Ordering::is_le),
        CompareOp::Gt => ordered(Ordering::is_gt),
        CompareOp::Ge => ordered(Ordering::is_ge),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Is => Ok(same(left, right)),
        CompareOp::IsNot => Ok(!same(left, right)),
    }
}

/// `is` compares kind and value; there is no object identity here.
fn same(left: &Value, right: &Value) -> bool {
    std::mem::discriminant(left) == std::mem::discriminant(right) && left == right
}

fn contains(container: &Value, needle: &Value) -> Result<bool, ExprError> {
    match (container, needle) {
        (Value::List(items), needle) => Ok(items.iter().any(|item| item.loose_eq(needle))),
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::Str(_), other) => Err(ExprError::Type(format!(
            "'in <str>' requires str as left operand, not '{}'",
            other.type_name()
        ))),
        (other, _) => Err(ExprError::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn arity(function: &str, expected: &'static str, actual: usize) -> ExprError {
    ExprError::Arity {
        function: function.to_string(),
        expected,
        actual,
    }
}

/// Arguments of `min`/`max`/`sum`/`any`/`all`: a single list, or the
/// positional arguments themselves.
fn iterable_args(name: &str, args: Vec<Value>) -> Result<Vec<Value>, ExprError> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::List(items)]) => Ok(items),
        Ok([other]) => Err(ExprError::Type(format!(
            "{name}() argument '{}' is not iterable",
            other.type_name()
        ))),
        Err(args) => Ok(args),
    }
}

fn extreme(name: &str, args: Vec<Value>, keep: Ordering) -> Result<Value, ExprError> {
    let items = iterable_args(name, args)?;
    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(ExprError::Value(format!("{name}() arg is an empty sequence")));
    };
    for item in iter {
        if item.try_cmp(&best)? == Some(keep) {
            best = item;
        }
    }
    Ok(best)
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, ExprError> {
    match name {
        "len" => match args.as_slice() {
            [Value::Str(s)] => Ok(Value::Int(s.chars().count() as i64)),
            [Value::List(items)] => Ok(Value::Int(items.len() as i64)),
            [other] => Err(ExprError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
            _ => Err(arity(name, "1", args.len())),
        },
        "abs" => match args.as_slice() {
            [Value::Float(f)] => Ok(Value::Float(f.abs())),
            [v] if v.as_int().is_some() => v
                .as_int()
                .and_then(i64::checked_abs)
                .map(Value::Int)
                .ok_or(ExprError::Overflow),
            [other] => Err(ExprError::Type(format!(
                "bad operand type for abs(): '{}'",
                other.type_name()
            ))),
            _ => Err(arity(name, "1", args.len())),
        },
        "min" => extreme(name, args, Ordering::Less),
        "max" => extreme(name, args, Ordering::Greater),
        "sum" => {
            let items = iterable_args(name, args)?;
            items
                .into_iter()
                .try_fold(Value::Int(0), |acc, item| binary(BinaryOp::Add, acc, item))
        }
        "any" => Ok(Value::Bool(
            iterable_args(name, args)?.iter().any(Value::is_truthy),
        )),
        "all" => Ok(Value::Bool(
            iterable_args(name, args)?.iter().all(Value::is_truthy),
        )),
        "bool" => match args.as_slice() {
            [] => Ok(Value::Bool(false)),
            [v] => Ok(Value::Bool(v.is_truthy())),
            _ => Err(arity(name, "0 or 1", args.len())),
        },
        "int" => match args.as_slice() {
            [Value::Float(f)] => {
                let truncated = f.trunc();
                if !truncated.is_finite() || truncated.abs() >= i64::MAX as f64 {
                    return Err(ExprError::Overflow);
                }
                Ok(Value::Int(truncated as i64))
            }
            [Value::Str(s)] => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ExprError::Value(format!("invalid literal for int(): '{s}'"))),
            [v] if v.as_int().is_some() => Ok(Value::Int(v.as_int().unwrap_or_default())),
            [other] => Err(ExprError::Type(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
            _ => Err(arity(name, "1", args.len())),
        },
        "float" => match args.as_slice() {
            [Value::Str(s)] => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ExprError::Value(format!("could not convert string to float: '{s}'"))),
            [v] if v.as_float().is_some() => Ok(Value::Float(v.as_float().unwrap_or_default())),
            [other] => Err(ExprError::Type(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
            _ => Err(arity(name, "1", args.len())),
        },
        "str" => match args.as_slice() {
            [v] => Ok(Value::Str(v.to_string())),
            _ => Err(arity(name, "1", args.len())),
        },
        "round" => round(args),
        other => Err(ExprError::UnknownFunction(other.to_string())),
    }
}

/// Round an integer to a multiple of `10^places`, ties to even.
fn round_int(i: i64, places: u64) -> Result<Value, ExprError> {
    // |i64| < 10^19
    if places > 18 {
        return Ok(Value::Int(0));
    }
    let unit = 10i64.pow(places as u32);
    let (quotient, remainder) = (i.div_euclid(unit), i.rem_euclid(unit));
    let up = match (remainder * 2).cmp(&unit) {
        Ordering::Greater => true,
        Ordering::Equal => quotient % 2 != 0,
        Ordering::Less => false,
    };
    let quotient = if up { quotient + 1 } else { quotient };
    quotient
        .checked_mul(unit)
        .map(Value::Int)
        .ok_or(ExprError::Overflow)
}

fn round(args: Vec<Value>) -> Result<Value, ExprError> {
    let (value, digits) = match args.as_slice() {
        [v] => (v, None),
        [v, d] => (v, Some(d.as_int().ok_or_else(|| {
            ExprError::Type(format!("round() digits must be an integer, not '{}'", d.type_name()))
        })?)),
        _ => return Err(arity("round", "1 or 2", args.len())),
    };

    if let Some(i) = value.as_int() {
        return match digits {
            Some(d) if d < 0 => round_int(i, d.unsigned_abs()),
            _ => Ok(Value::Int(i)),
        };
    }
    let Some(x) = value.as_float() else {
        return Err(ExprError::Type(format!(
            "type '{}' doesn't define round()",
            value.type_name()
        )));
    };

    match digits {
        None => {
            let rounded = x.round_ties_even();
            if !rounded.is_finite() || rounded.abs() >= i64::MAX as f64 {
                return Err(ExprError::Overflow);
            }
            Ok(Value::Int(rounded as i64))
        }
        Some(d) => {
            let d = i32::try_from(d.clamp(-308, 308)).unwrap_or_default();
            let factor = 10f64.powi(d);
            Ok(Value::Float((x * factor).round_ties_even() / factor))
        }
    }
}
