//! Item methods and arithmetic.

use jpq_bytecode::{BinaryOp, Method, NodeRef, NodeView, UnaryOp};
use jpq_core::{Datetime, Document, Numeric};

use super::Outcome;
use super::exec::{Exec, Found, single};
use crate::Result;
use crate::error::EvalError;
use crate::item::{Item, Shape};
use crate::trace::Tracer;

impl<'q, 'd, D: Document, T: Tracer> Exec<'q, 'd, '_, D, T> {
    pub(super) fn method(
        &mut self,
        view: &NodeView<'q>,
        method: Method,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
        unwrap: bool,
    ) -> Result<Outcome> {
        let name = method.as_str();
        match method {
            Method::Type => {
                let type_name = Item::String(input.type_name().to_string());
                self.next(view.next, type_name, found)
            }
            Method::Size => {
                let size = match input.array_len() {
                    Some(size) => size,
                    None if self.auto_wrap() => 1,
                    None if !self.ignore_structural => {
                        return Err(EvalError::TypeMismatch(
                            "jsonpath item method .size() can only be applied to an array"
                                .to_string(),
                        ));
                    }
                    None => return Ok(Outcome::NotFound),
                };
                self.next(view.next, Item::Number(Numeric::Int(size as i64)), found)
            }
            _ if unwrap && input.is_array() => self.unwrap_target(view.at, input, found),
            Method::Abs | Method::Floor | Method::Ceiling => {
                let n = input.as_number().ok_or_else(|| {
                    EvalError::TypeMismatch(format!(
                        "jsonpath item method .{name}() can only be applied to a numeric value"
                    ))
                })?;
                let n = match method {
                    Method::Abs => n.abs(),
                    Method::Floor => n.floor(),
                    _ => n.ceil(),
                };
                self.next(view.next, Item::Number(n), found)
            }
            Method::Double => {
                let value = match input.shape() {
                    Shape::Number(n) => n.as_f64(),
                    Shape::String(s) => s.trim().parse::<f64>().map_err(|_| {
                        EvalError::Arithmetic(format!(
                            "argument \"{s}\" of jsonpath item method .double() is invalid for type double precision"
                        ))
                    })?,
                    _ => {
                        return Err(EvalError::TypeMismatch(
                            "jsonpath item method .double() can only be applied to a string or numeric value"
                                .to_string(),
                        ));
                    }
                };
                if !value.is_finite() {
                    return Err(EvalError::Arithmetic(
                        "NaN or Infinity is not allowed for jsonpath item method .double()"
                            .to_string(),
                    ));
                }
                self.next(view.next, Item::Number(Numeric::Float(value)), found)
            }
            Method::KeyValue => {
                if !input.is_object() {
                    return Err(EvalError::TypeMismatch(
                        "jsonpath item method .keyvalue() can only be applied to an object"
                            .to_string(),
                    ));
                }
                let pairs = input
                    .entries()
                    .into_iter()
                    .map(|(key, value)| {
                        Item::Object(vec![
                            ("key".to_string(), Item::String(key)),
                            ("value".to_string(), value),
                        ])
                    })
                    .collect();
                self.each(view.next, pairs, found)
            }
            Method::Datetime => {
                let text = input.as_str().ok_or_else(|| {
                    EvalError::TypeMismatch(
                        "jsonpath item method .datetime() can only be applied to a string"
                            .to_string(),
                    )
                })?;
                let datetime = Datetime::parse(text).ok_or_else(|| {
                    EvalError::TypeMismatch(format!("datetime format is not recognized: \"{text}\""))
                })?;
                self.next(view.next, Item::DateTime(datetime), found)
            }
        }
    }

    pub(super) fn arithmetic(
        &mut self,
        view: &NodeView<'q>,
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let l = self.numeric_operand(left, input, "left", op)?;
        let r = self.numeric_operand(right, input, "right", op)?;
        let result = match op {
            BinaryOp::Add => l.add(r),
            BinaryOp::Sub => l.sub(r),
            BinaryOp::Mul => l.mul(r),
            BinaryOp::Div => l.div(r),
            _ => l.rem(r),
        }
        .map_err(|e| EvalError::Arithmetic(e.to_string()))?;
        self.next(view.next, Item::Number(result), found)
    }

    fn numeric_operand(
        &mut self,
        at: NodeRef,
        input: &Item<'d, D>,
        side: &str,
        op: BinaryOp,
    ) -> Result<Numeric> {
        let values = self.collect(at, input, true)?;
        let item = single(values).ok_or_else(|| {
            EvalError::SingletonRequired(format!(
                "{side} operand of jsonpath operator {} is not a single numeric value",
                op.as_str()
            ))
        })?;
        item.as_number().ok_or_else(|| {
            EvalError::TypeMismatch(format!(
                "{side} operand of jsonpath operator {} is not a single numeric value",
                op.as_str()
            ))
        })
    }

    /// Unary `+` and `-` apply to every item of their operand.
    pub(super) fn unary_arithmetic(
        &mut self,
        view: &NodeView<'q>,
        op: UnaryOp,
        arg: NodeRef,
        input: &Item<'d, D>,
        mut found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let symbol = if op == UnaryOp::Minus { "-" } else { "+" };
        let values = self.collect(arg, input, true)?;
        let mut outcome = Outcome::NotFound;
        for item in values {
            let n = item.as_number().ok_or_else(|| {
                EvalError::TypeMismatch(format!(
                    "operand of unary jsonpath operator {symbol} is not a numeric value"
                ))
            })?;
            let n = if op == UnaryOp::Minus { n.neg() } else { n };
            if self.next(view.next, Item::Number(n), found.as_deref_mut())? == Outcome::Found {
                outcome = Outcome::Found;
                if found.is_none() {
                    break;
                }
            }
        }
        Ok(outcome)
    }
}
