//! Column-at-a-time expression evaluation over a `RowBatch`.
//!
//! Null handling follows SQL: comparisons with a null operand are null, `AND`
//! is three-valued, and `TRY_CAST` turns any unconvertible value into null
//! instead of failing the block.

use std::cmp::Ordering;

use tripclean_core::expr::{CmpOp, Expr};
use tripclean_core::schema::DataType;
use tripclean_core::temporal::{minute_diff, parse_timestamp_micros};
use tripclean_core::types::{RowBatch, Scalar};

use crate::traits::OpError;

/// Evaluate `expr` for every row of `batch`.
pub fn evaluate(expr: &Expr, batch: &RowBatch) -> Result<Vec<Scalar>, OpError> {
    let n = batch.num_rows();
    Ok(match expr {
        Expr::Column(name) => batch
            .column(name)
            .ok_or_else(|| OpError::Schema(format!("column '{name}' not found")))?
            .values
            .clone(),
        Expr::Literal(v) => vec![v.clone(); n],
        Expr::TryCast { expr, to } => evaluate(expr, batch)?
            .into_iter()
            .map(|v| try_cast(v, *to))
            .collect(),
        Expr::Lower(expr) => evaluate(expr, batch)?
            .into_iter()
            .map(|v| text(v, |s| s.to_lowercase()))
            .collect(),
        Expr::Trim(expr) => evaluate(expr, batch)?
            .into_iter()
            .map(|v| text(v, |s| s.trim().to_string()))
            .collect(),
        Expr::MinuteDiff { start, end } => {
            let a = evaluate(start, batch)?;
            let b = evaluate(end, batch)?;
            a.into_iter()
                .zip(b)
                .map(|pair| match pair {
                    (Scalar::Timestamp(s), Scalar::Timestamp(e)) => Scalar::I64(minute_diff(s, e)),
                    _ => Scalar::Null,
                })
                .collect()
        }
        Expr::IsNotNull(expr) => evaluate(expr, batch)?
            .into_iter()
            .map(|v| Scalar::Bool(!v.is_null()))
            .collect(),
        Expr::Compare { op, left, right } => {
            let l = evaluate(left, batch)?;
            let r = evaluate(right, batch)?;
            l.iter()
                .zip(&r)
                .map(|(a, b)| compare(*op, a, b))
                .collect::<Result<_, _>>()?
        }
        Expr::And(terms) => {
            let mut acc = vec![Scalar::Bool(true); n];
            for term in terms {
                let vals = evaluate(term, batch)?;
                for (slot, v) in acc.iter_mut().zip(vals) {
                    *slot = and(slot, &v)?;
                }
            }
            acc
        }
    })
}

/// Rows for which `predicate` evaluated to true (null and false both drop).
pub fn selection_mask(predicate: &Expr, batch: &RowBatch) -> Result<Vec<bool>, OpError> {
    Ok(evaluate(predicate, batch)?
        .into_iter()
        .map(|v| matches!(v, Scalar::Bool(true)))
        .collect())
}

fn text(v: Scalar, f: impl Fn(&str) -> String) -> Scalar {
    match v {
        Scalar::Str(s) => Scalar::Str(f(&s)),
        other => match other.render() {
            Some(s) => Scalar::Str(f(&s)),
            None => Scalar::Null,
        },
    }
}

fn and(a: &Scalar, b: &Scalar) -> Result<Scalar, OpError> {
    use Scalar::*;
    Ok(match (a, b) {
        (Bool(false), _) | (_, Bool(false)) => Bool(false),
        (Bool(true), Bool(true)) => Bool(true),
        (Null, Bool(true)) | (Bool(true), Null) | (Null, Null) => Null,
        (x, y) => {
            return Err(OpError::Exec(format!(
                "AND expects booleans, got {x:?} and {y:?}"
            )))
        }
    })
}

fn compare(op: CmpOp, a: &Scalar, b: &Scalar) -> Result<Scalar, OpError> {
    use Scalar::*;
    let ord = match (a, b) {
        (Null, _) | (_, Null) => return Ok(Null),
        (Bool(x), Bool(y)) => x.cmp(y),
        (I64(x), I64(y)) => x.cmp(y),
        (F64(x), F64(y)) => float_cmp(*x, *y),
        (I64(x), F64(y)) => float_cmp(*x as f64, *y),
        (F64(x), I64(y)) => float_cmp(*x, *y as f64),
        (Str(x), Str(y)) => x.cmp(y),
        (Timestamp(x), Timestamp(y)) => x.cmp(y),
        (x, y) => {
            return Err(OpError::Exec(format!(
                "cannot compare {x:?} {} {y:?}",
                op.symbol()
            )))
        }
    };
    let hit = match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::NotEq => ord != Ordering::Equal,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::LtEq => ord != Ordering::Greater,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::GtEq => ord != Ordering::Less,
    };
    Ok(Bool(hit))
}

/// NaN sorts above every other value, as in SQL engines.
fn float_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Best-effort conversion; anything that does not convert becomes `Null`.
pub fn try_cast(v: Scalar, to: DataType) -> Scalar {
    use Scalar::*;
    match (v, to) {
        (Null, _) => Null,

        (Timestamp(t), DataType::Timestamp) => Timestamp(t),
        (Str(s), DataType::Timestamp) => parse_timestamp_micros(&s).map(Timestamp).unwrap_or(Null),
        (_, DataType::Timestamp) => Null,

        (F64(f), DataType::Float64) => F64(f),
        (I64(i), DataType::Float64) => F64(i as f64),
        (Bool(b), DataType::Float64) => F64(if b { 1.0 } else { 0.0 }),
        (Str(s), DataType::Float64) => s.trim().parse::<f64>().map(F64).unwrap_or(Null),
        (_, DataType::Float64) => Null,

        (I64(i), DataType::Int64) => I64(i),
        (Bool(b), DataType::Int64) => I64(b as i64),
        (F64(f), DataType::Int64) => round_to_i64(f).map(I64).unwrap_or(Null),
        (Str(s), DataType::Int64) => {
            let t = s.trim();
            match t.parse::<i64>() {
                Ok(i) => I64(i),
                Err(_) => t.parse::<f64>().ok().and_then(round_to_i64).map(I64).unwrap_or(Null),
            }
        }
        (_, DataType::Int64) => Null,

        (Bool(b), DataType::Boolean) => Bool(b),
        (I64(i), DataType::Boolean) => Bool(i != 0),
        (Str(s), DataType::Boolean) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Bool(true),
            "false" | "f" | "0" | "no" | "n" => Bool(false),
            _ => Null,
        },
        (_, DataType::Boolean) => Null,

        (other, DataType::Utf8) => other.render().map(Str).unwrap_or(Null),
    }
}

fn round_to_i64(f: f64) -> Option<i64> {
    let r = f.round();
    if r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64 {
        Some(r as i64)
    } else {
        None
    }
}
