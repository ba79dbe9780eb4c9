//! Expression AST shared by the planner (type derivation) and the operators
//! (evaluation).
//!
//! Expressions are plain serde data so they can travel inside operator
//! bindings and be hashed into run manifests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Schema};
use crate::types::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::NotEq => "<>",
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Literal(Scalar),
    /// Best-effort conversion; failures evaluate to `Null`, never an error.
    TryCast { expr: Box<Expr>, to: DataType },
    Lower(Box<Expr>),
    Trim(Box<Expr>),
    /// Minute boundaries crossed from `start` to `end` (BIGINT).
    MinuteDiff { start: Box<Expr>, end: Box<Expr> },
    IsNotNull(Box<Expr>),
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
}

pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

pub fn lit(value: Scalar) -> Expr {
    Expr::Literal(value)
}

pub fn minute_diff(start: Expr, end: Expr) -> Expr {
    Expr::MinuteDiff {
        start: Box::new(start),
        end: Box::new(end),
    }
}

impl Expr {
    pub fn try_cast(self, to: DataType) -> Expr {
        Expr::TryCast {
            expr: Box::new(self),
            to,
        }
    }

    pub fn lower(self) -> Expr {
        Expr::Lower(Box::new(self))
    }

    pub fn trim(self) -> Expr {
        Expr::Trim(Box::new(self))
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNotNull(Box::new(self))
    }

    pub fn compare(self, op: CmpOp, right: Expr) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn gt_eq(self, right: Expr) -> Expr {
        self.compare(CmpOp::GtEq, right)
    }

    pub fn lt_eq(self, right: Expr) -> Expr {
        self.compare(CmpOp::LtEq, right)
    }

    /// Conjunction of `terms`, flattening nested `And`s.
    pub fn and_all(terms: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Expr::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Expr::And(flat)
    }

    /// Column names referenced anywhere in this expression, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Literal(_) => {}
            Expr::TryCast { expr, .. }
            | Expr::Lower(expr)
            | Expr::Trim(expr)
            | Expr::IsNotNull(expr) => expr.collect_columns(out),
            Expr::MinuteDiff { start, end } => {
                start.collect_columns(out);
                end.collect_columns(out);
            }
            Expr::Compare { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::And(terms) => terms.iter().for_each(|t| t.collect_columns(out)),
        }
    }

    /// Output type of this expression against `schema`.
    ///
    /// Unknown columns and ill-typed operands surface as `Error::Schema`, so a
    /// plan that type-checks here cannot fail on schema grounds at run time.
    pub fn data_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Expr::Column(name) => Ok(schema.require(name)?.data_type),
            Expr::Literal(v) => Ok(v.data_type().unwrap_or(DataType::Utf8)),
            Expr::TryCast { expr, to } => {
                expr.data_type(schema)?;
                Ok(*to)
            }
            Expr::Lower(expr) | Expr::Trim(expr) => {
                expr.data_type(schema)?;
                Ok(DataType::Utf8)
            }
            Expr::MinuteDiff { start, end } => {
                for side in [start, end] {
                    let dt = side.data_type(schema)?;
                    if dt != DataType::Timestamp {
                        return Err(Error::Schema(format!(
                            "DATE_DIFF expects TIMESTAMP operands, got {dt} for {side}"
                        )));
                    }
                }
                Ok(DataType::Int64)
            }
            Expr::IsNotNull(expr) => {
                expr.data_type(schema)?;
                Ok(DataType::Boolean)
            }
            Expr::Compare { op, left, right } => {
                let l = left.data_type(schema)?;
                let r = right.data_type(schema)?;
                if !comparable(l, r) {
                    return Err(Error::Schema(format!(
                        "cannot compare {l} {} {r} in {self}",
                        op.symbol()
                    )));
                }
                Ok(DataType::Boolean)
            }
            Expr::And(terms) => {
                for t in terms {
                    let dt = t.data_type(schema)?;
                    if dt != DataType::Boolean {
                        return Err(Error::Schema(format!(
                            "AND operand {t} is {dt}, expected BOOLEAN"
                        )));
                    }
                }
                Ok(DataType::Boolean)
            }
        }
    }
}

fn comparable(l: DataType, r: DataType) -> bool {
    let numeric = |t: DataType| matches!(t, DataType::Int64 | DataType::Float64);
    l == r || (numeric(l) && numeric(r))
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{name}"),
            Expr::Literal(v) => match v {
                Scalar::Null => write!(f, "NULL"),
                Scalar::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
                Scalar::Timestamp(_) => {
                    write!(f, "TIMESTAMP '{}'", v.render().unwrap_or_default())
                }
                other => write!(f, "{}", other.render().unwrap_or_default()),
            },
            Expr::TryCast { expr, to } => write!(f, "TRY_CAST({expr} AS {to})"),
            Expr::Lower(expr) => write!(f, "LOWER({expr})"),
            Expr::Trim(expr) => write!(f, "TRIM({expr})"),
            Expr::MinuteDiff { start, end } => write!(f, "DATE_DIFF('minute', {start}, {end})"),
            Expr::IsNotNull(expr) => write!(f, "{expr} IS NOT NULL"),
            Expr::Compare { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            Expr::And(terms) => {
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " AND ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
        }
    }
}
