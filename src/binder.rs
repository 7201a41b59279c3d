//! Selector binding.
//!
//! A stored selector is only interpreted here, once per raw row, when a query
//! is materialized. The binder walks the selector body against the row the
//! way the backend's response is shaped: member access reads object fields,
//! nested lambdas run per element, and arithmetic follows the same
//! integer-preserving rules as literals.

use std::cmp::Ordering;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Lambda},
    value::Value,
};

/// Errors that can occur while applying a selector to a row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// Type mismatch or invalid operation for the given type
    #[error("type error: {0}")]
    Type(String),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// A name that is neither the selector parameter nor an enclosing lambda's
    #[error("`{0}` is not bound in this projection")]
    UnboundIdentifier(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("selector must take exactly one parameter, got {0}")]
    ParameterCount(usize),
}

/// Lambda parameters visible at a point in the selector.
struct Scope<'a> {
    name: &'a str,
    value: Value,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        if self.name == name {
            Some(&self.value)
        } else {
            self.parent?.lookup(name)
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Binder;

impl Binder {
    pub fn new() -> Self {
        Self
    }

    /// Applies `selector` to one raw row.
    ///
    /// # Examples
    ///
    /// ```
    /// use navql::{Binder, Value};
    /// use navql::parser::parse_lambda;
    ///
    /// let selector = parse_lambda("p => p.Votes * 2").unwrap();
    /// let row = Value::from(serde_json::json!({ "Votes": 21 }));
    /// assert_eq!(Binder::new().bind(&selector, row).unwrap(), Value::Integer(42));
    /// ```
    pub fn bind(&self, selector: &Lambda, row: Value) -> Result<Value, BindError> {
        let param = selector
            .single_param()
            .ok_or(BindError::ParameterCount(selector.params.len()))?;
        let scope = Scope {
            name: param,
            value: row,
            parent: None,
        };
        self.eval_expr(&selector.body, &scope)
    }

    /// [`bind`](Self::bind) over JSON rows.
    pub fn bind_json(
        &self,
        selector: &Lambda,
        row: serde_json::Value,
    ) -> Result<serde_json::Value, BindError> {
        self.bind(selector, Value::from(row)).map(serde_json::Value::from)
    }

    fn eval_expr(&self, expr: &Expr, scope: &Scope<'_>) -> Result<Value, BindError> {
        match expr {
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Identifier(name) => scope
                .lookup(name)
                .cloned()
                .ok_or_else(|| BindError::UnboundIdentifier(name.clone())),
            Expr::Member { object, name } => {
                let obj_value = self.eval_expr(object, scope)?;
                self.apply_member(&obj_value, name)
            }
            Expr::Index { object, index } => {
                let obj_value = self.eval_expr(object, scope)?;
                let index_value = self.eval_expr(index, scope)?;
                self.apply_index(&obj_value, &index_value)
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let obj_value = self.eval_expr(object, scope)?;
                self.eval_method_call(obj_value, method, args, scope)
            }
            Expr::Lambda(lambda) => Err(BindError::Type(format!(
                "`{lambda}` can only be used as a method argument"
            ))),
            Expr::Not(operand) => Ok(Value::Boolean(!self.eval_expr(operand, scope)?.as_bool())),
            Expr::BinaryOp { op, left, right } => match op {
                BinOp::NullCoalesce => {
                    let left_val = self.eval_expr(left, scope)?;
                    if left_val == Value::Null {
                        self.eval_expr(right, scope)
                    } else {
                        Ok(left_val)
                    }
                }
                BinOp::And => {
                    let left_val = self.eval_expr(left, scope)?;
                    if !left_val.as_bool() {
                        return Ok(Value::Boolean(false));
                    }
                    Ok(Value::Boolean(self.eval_expr(right, scope)?.as_bool()))
                }
                BinOp::Or => {
                    let left_val = self.eval_expr(left, scope)?;
                    if left_val.as_bool() {
                        return Ok(Value::Boolean(true));
                    }
                    Ok(Value::Boolean(self.eval_expr(right, scope)?.as_bool()))
                }
                _ => {
                    let left_val = self.eval_expr(left, scope)?;
                    let right_val = self.eval_expr(right, scope)?;
                    self.apply_binop(*op, &left_val, &right_val)
                }
            },
            Expr::Object(pairs) => {
                let mut map = std::collections::BTreeMap::new();
                for (key, expr) in pairs {
                    map.insert(key.clone(), self.eval_expr(expr, scope)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Array(exprs) => exprs
                .iter()
                .map(|expr| self.eval_expr(expr, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    /// Runs a single-parameter lambda argument against `item`.
    fn apply_lambda(
        &self,
        method: &str,
        arg: &Expr,
        item: Value,
        scope: &Scope<'_>,
    ) -> Result<Value, BindError> {
        let Expr::Lambda(lambda) = arg else {
            return Err(BindError::Type(format!(
                ".{method}() expects a lambda argument, got `{arg}`"
            )));
        };
        let param = lambda
            .single_param()
            .ok_or(BindError::ParameterCount(lambda.params.len()))?;
        let inner = Scope {
            name: param,
            value: item,
            parent: Some(scope),
        };
        self.eval_expr(&lambda.body, &inner)
    }

    fn apply_member(&self, object: &Value, name: &str) -> Result<Value, BindError> {
        match object {
            Value::Null => Ok(Value::Null),
            Value::Object(_) => Ok(object.get(name).cloned().unwrap_or(Value::Null)),
            Value::Array(arr) if name == "Count" || name == "Length" => {
                Ok(Value::Integer(arr.len() as i64))
            }
            Value::String(s) if name == "Length" => Ok(Value::Integer(s.chars().count() as i64)),
            other => Err(BindError::Type(format!(
                "cannot read member `{name}` of {}",
                other.type_name()
            ))),
        }
    }

    fn apply_index(&self, object: &Value, index: &Value) -> Result<Value, BindError> {
        match (object, index) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Array(arr), Value::Integer(n)) => {
                let index = if *n < 0 {
                    // Negative index counts from the end
                    let abs_idx = n.unsigned_abs() as usize;
                    if abs_idx > arr.len() {
                        return Ok(Value::Null);
                    }
                    arr.len() - abs_idx
                } else {
                    *n as usize
                };
                Ok(arr.get(index).cloned().unwrap_or(Value::Null))
            }
            (Value::Object(_), Value::String(key)) => {
                Ok(object.get(key).cloned().unwrap_or(Value::Null))
            }
            (v, k) => Err(BindError::Type(format!(
                "cannot index {} with {}",
                v.type_name(),
                k.type_name()
            ))),
        }
    }

    fn apply_binop(&self, op: BinOp, left: &Value, right: &Value) -> Result<Value, BindError> {
        match op {
            BinOp::Add => match (left, right) {
                (Value::String(a), b) => Ok(Value::String(format!("{a}{}", b.as_string()))),
                (a, Value::String(b)) => Ok(Value::String(format!("{}{b}", a.as_string()))),
                (a, b) => arithmetic(op, a, b),
            },
            BinOp::Subtract | BinOp::Multiply => arithmetic(op, left, right),
            BinOp::Divide | BinOp::Modulo => {
                if right.as_float() == Some(0.0) {
                    return Err(BindError::DivisionByZero);
                }
                arithmetic(op, left, right)
            }
            BinOp::Equal => Ok(Value::Boolean(loosely_equal(left, right))),
            BinOp::NotEqual => Ok(Value::Boolean(!loosely_equal(left, right))),
            BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
                let ordering = order(left, right).ok_or_else(|| {
                    BindError::Type(format!(
                        "cannot compare {} {op} {}",
                        left.type_name(),
                        right.type_name()
                    ))
                })?;
                Ok(Value::Boolean(match op {
                    BinOp::LessThan => ordering == Ordering::Less,
                    BinOp::GreaterThan => ordering == Ordering::Greater,
                    BinOp::LessEqual => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }
            BinOp::And => Ok(Value::Boolean(left.as_bool() && right.as_bool())),
            BinOp::Or => Ok(Value::Boolean(left.as_bool() || right.as_bool())),
            BinOp::NullCoalesce => Ok(if *left == Value::Null {
                right.clone()
            } else {
                left.clone()
            }),
        }
    }

    /// Dispatch method calls to their implementations
    fn eval_method_call(
        &self,
        object: Value,
        method: &str,
        args: &[Expr],
        scope: &Scope<'_>,
    ) -> Result<Value, BindError> {
        match method {
            // Collection methods
            "Select" => {
                let arg = single_arg(method, args)?;
                let items = expect_array(method, object)?;
                items
                    .into_iter()
                    .map(|item| self.apply_lambda(method, arg, item, scope))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            "Where" => {
                let arg = single_arg(method, args)?;
                let mut kept = vec![];
                for item in expect_array(method, object)? {
                    if self.apply_lambda(method, arg, item.clone(), scope)?.as_bool() {
                        kept.push(item);
                    }
                }
                Ok(Value::Array(kept))
            }
            "Any" => {
                let items = expect_array(method, object)?;
                match args {
                    [] => Ok(Value::Boolean(!items.is_empty())),
                    [arg] => {
                        for item in items {
                            if self.apply_lambda(method, arg, item, scope)?.as_bool() {
                                return Ok(Value::Boolean(true));
                            }
                        }
                        Ok(Value::Boolean(false))
                    }
                    _ => Err(arity_error(method, "at most one", args.len())),
                }
            }
            "All" => {
                let arg = single_arg(method, args)?;
                for item in expect_array(method, object)? {
                    if !self.apply_lambda(method, arg, item, scope)?.as_bool() {
                        return Ok(Value::Boolean(false));
                    }
                }
                Ok(Value::Boolean(true))
            }
            "OrderBy" | "OrderByDescending" => {
                let arg = single_arg(method, args)?;
                let mut keyed = vec![];
                for item in expect_array(method, object)? {
                    let key = self.apply_lambda(method, arg, item.clone(), scope)?;
                    keyed.push((key, item));
                }
                keyed.sort_by(|(a, _), (b, _)| order(a, b).unwrap_or(Ordering::Equal));
                if method == "OrderByDescending" {
                    keyed.reverse();
                }
                Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
            }
            "Take" | "Skip" => {
                let count = self.eval_count(method, args, scope)?;
                let items = expect_array(method, object)?;
                Ok(Value::Array(if method == "Take" {
                    items.into_iter().take(count).collect()
                } else {
                    items.into_iter().skip(count).collect()
                }))
            }
            "First" | "Last" => {
                let mut items = expect_array(method, object)?;
                if let [arg] = args {
                    let mut kept = vec![];
                    for item in items {
                        if self.apply_lambda(method, arg, item.clone(), scope)?.as_bool() {
                            kept.push(item);
                        }
                    }
                    items = kept;
                } else if !args.is_empty() {
                    return Err(arity_error(method, "at most one", args.len()));
                }
                let picked = if method == "First" {
                    items.into_iter().next()
                } else {
                    items.pop()
                };
                Ok(picked.unwrap_or(Value::Null))
            }
            "Count" => {
                let items = expect_array(method, object)?;
                match args {
                    [] => Ok(Value::Integer(items.len() as i64)),
                    [arg] => {
                        let mut count = 0;
                        for item in items {
                            if self.apply_lambda(method, arg, item, scope)?.as_bool() {
                                count += 1;
                            }
                        }
                        Ok(Value::Integer(count))
                    }
                    _ => Err(arity_error(method, "at most one", args.len())),
                }
            }
            "Sum" => {
                let mut total = Value::Integer(0);
                for item in expect_array(method, object)? {
                    let value = match args {
                        [] => item,
                        [arg] => self.apply_lambda(method, arg, item, scope)?,
                        _ => return Err(arity_error(method, "at most one", args.len())),
                    };
                    if value == Value::Null {
                        continue;
                    }
                    total = arithmetic(BinOp::Add, &total, &value)?;
                }
                Ok(total)
            }
            "Min" | "Max" => {
                let wanted = if method == "Min" {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let mut best: Option<Value> = None;
                for item in expect_array(method, object)? {
                    let value = match args {
                        [] => item,
                        [arg] => self.apply_lambda(method, arg, item, scope)?,
                        _ => return Err(arity_error(method, "at most one", args.len())),
                    };
                    best = match best {
                        Some(current) if order(&value, &current) != Some(wanted) => Some(current),
                        _ => Some(value),
                    };
                }
                Ok(best.unwrap_or(Value::Null))
            }
            // String methods
            "ToUpper" => Ok(Value::String(expect_string(method, &object)?.to_uppercase())),
            "ToLower" => Ok(Value::String(expect_string(method, &object)?.to_lowercase())),
            "Trim" => Ok(Value::String(expect_string(method, &object)?.trim().to_string())),
            "Contains" => {
                let needle = self.eval_expr(single_arg(method, args)?, scope)?;
                match (&object, &needle) {
                    (Value::String(s), Value::String(n)) => Ok(Value::Boolean(s.contains(n.as_str()))),
                    (Value::Array(items), needle) => Ok(Value::Boolean(
                        items.iter().any(|item| loosely_equal(item, needle)),
                    )),
                    (Value::Null, _) => Ok(Value::Boolean(false)),
                    (o, n) => Err(BindError::Type(format!(
                        ".Contains() cannot search {} for {}",
                        o.type_name(),
                        n.type_name()
                    ))),
                }
            }
            "StartsWith" | "EndsWith" => {
                let affix = self.eval_expr(single_arg(method, args)?, scope)?;
                let Value::String(affix) = affix else {
                    return Err(BindError::Type(format!(
                        ".{method}() argument must be string, got {}",
                        affix.type_name()
                    )));
                };
                let s = expect_string(method, &object)?;
                Ok(Value::Boolean(if method == "StartsWith" {
                    s.starts_with(affix.as_str())
                } else {
                    s.ends_with(affix.as_str())
                }))
            }
            "Matches" => {
                let pattern = self.eval_expr(single_arg(method, args)?, scope)?;
                let Value::String(pattern) = pattern else {
                    return Err(BindError::Type(format!(
                        ".Matches() argument must be string, got {}",
                        pattern.type_name()
                    )));
                };
                let re = regex::Regex::new(&pattern)
                    .map_err(|e| BindError::Type(format!("invalid regex: {e}")))?;
                match object {
                    Value::String(s) => Ok(Value::Boolean(re.is_match(&s))),
                    _ => Ok(Value::Boolean(false)),
                }
            }
            _ => Err(BindError::UnknownMethod(method.to_string())),
        }
    }

    fn eval_count(&self, method: &str, args: &[Expr], scope: &Scope<'_>) -> Result<usize, BindError> {
        let count = self.eval_expr(single_arg(method, args)?, scope)?;
        match count {
            Value::Integer(n) if n >= 0 => Ok(n as usize),
            other => Err(BindError::Type(format!(
                ".{method}() requires a non-negative integer, got {}",
                other.type_name()
            ))),
        }
    }
}

fn arity_error(method: &str, expected: &str, found: usize) -> BindError {
    BindError::Type(format!(
        ".{method}() takes {expected} argument(s), got {found}"
    ))
}

fn single_arg<'e>(method: &str, args: &'e [Expr]) -> Result<&'e Expr, BindError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(arity_error(method, "exactly one", args.len())),
    }
}

fn expect_array(method: &str, value: Value) -> Result<Vec<Value>, BindError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(vec![]),
        other => Err(BindError::Type(format!(
            ".{method}() requires array, got {}",
            other.type_name()
        ))),
    }
}

fn expect_string<'v>(method: &str, value: &'v Value) -> Result<&'v str, BindError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(BindError::Type(format!(
            ".{method}() requires string, got {}",
            other.type_name()
        ))),
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}

/// Numeric arithmetic that keeps integer results integral.
///
/// Integer pairs use checked integer math (division falls back to float when
/// inexact); mixed pairs go through `Decimal` so `100 * 1.1` is `110`, not
/// `110.00000000000001`.
fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, BindError> {
    let type_error = || {
        BindError::Type(format!(
            "cannot apply {op} to {} and {}",
            left.type_name(),
            right.type_name()
        ))
    };

    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let result = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Subtract => a.checked_sub(*b),
                BinOp::Multiply => a.checked_mul(*b),
                BinOp::Modulo => a.checked_rem(*b),
                BinOp::Divide if a.checked_rem(*b) == Some(0) => a.checked_div(*b),
                BinOp::Divide => return Ok(Value::Float(*a as f64 / *b as f64)),
                _ => return Err(type_error()),
            };
            result
                .map(Value::Integer)
                .ok_or_else(|| BindError::Type(format!("integer overflow in {a} {op} {b}")))
        }
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
            BinOp::Add => a + b,
            BinOp::Subtract => a - b,
            BinOp::Multiply => a * b,
            BinOp::Divide => a / b,
            BinOp::Modulo => a % b,
            _ => return Err(type_error()),
        })),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            if let (Some(ad), Some(bd)) = (to_decimal(left), to_decimal(right)) {
                let rd = match op {
                    BinOp::Add => ad.checked_add(bd),
                    BinOp::Subtract => ad.checked_sub(bd),
                    BinOp::Multiply => ad.checked_mul(bd),
                    BinOp::Divide => ad.checked_div(bd),
                    BinOp::Modulo => ad.checked_rem(bd),
                    _ => return Err(type_error()),
                };
                if let Some(rd) = rd {
                    if rd.is_integer()
                        && let Some(r) = rd.to_i64()
                    {
                        return Ok(Value::Integer(r));
                    } else if let Some(r) = rd.to_f64() {
                        return Ok(Value::Float(r));
                    }
                }
            }
            let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
                return Err(type_error());
            };
            arithmetic(op, &Value::Float(a), &Value::Float(b))
        }
        _ => Err(type_error()),
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (a, b) => a.as_float()?.partial_cmp(&b.as_float()?),
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            order(left, right) == Some(Ordering::Equal)
        }
        _ => left == right,
    }
}
