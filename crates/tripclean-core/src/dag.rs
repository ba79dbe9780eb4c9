//! Logical and physical pipeline representations for planning/execution.
//!
//! The planner produces a `LogicalPlan` (what to do), then a `PhysicalPlan`
//! that binds concrete operator keys to `OpId`s. Pipelines are linear:
//! one scan, any number of unary stages, one sink.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::id::OpId;
use crate::schema::{Field, Schema};

/// Everything the executor needs to stream a multi-file CSV scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSpec {
    /// Absolute file paths, already sorted by the resolver.
    pub files: Vec<String>,
    /// Header columns with their resolved types, followed by the provenance column.
    pub schema: Schema,
    /// Name of the synthetic column carrying each row's source path.
    pub filename_column: String,
}

impl ScanSpec {
    /// Schema of the CSV columns alone (without the provenance column).
    pub fn csv_fields(&self) -> &[crate::schema::Field] {
        let n = self.schema.len().saturating_sub(1);
        &self.schema.fields[..n]
    }
}

/// `expr AS alias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedExpr {
    pub expr: Expr,
    pub alias: String,
}

impl NamedExpr {
    pub fn new(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: alias.into(),
        }
    }
}

/// Output schema of a projection over `input`.
///
/// Aliases must be unique. A bare column reference keeps its input
/// nullability; any other expression is nullable.
pub fn project_schema(input: &Schema, exprs: &[NamedExpr]) -> Result<Schema> {
    let mut fields: Vec<Field> = Vec::with_capacity(exprs.len());
    for named in exprs {
        if fields.iter().any(|f| f.name == named.alias) {
            return Err(Error::Schema(format!(
                "duplicate output column '{}'",
                named.alias
            )));
        }
        let data_type = named.expr.data_type(input)?;
        let nullable = match &named.expr {
            Expr::Column(name) => input.require(name)?.nullable,
            _ => true,
        };
        fields.push(Field::new(named.alias.clone(), data_type, nullable));
    }
    Ok(Schema::new(fields))
}

/// High-level logical nodes (source → transforms → sink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalPlan {
    Scan {
        spec: ScanSpec,
    },
    /// Projection with expressions: output columns are exactly `exprs`, in order.
    Map {
        input: Box<LogicalPlan>,
        exprs: Vec<NamedExpr>,
    },
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    Sink {
        input: Box<LogicalPlan>,
        destination: String,
        format: String, // only "parquet" today
    },
}

/// Physical nodes bind to operator IDs (resolved by the exec runtime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhysicalPlan {
    Source {
        op: OpId,
        schema: Schema,
    },
    Unary {
        op: OpId,
        input: Box<PhysicalPlan>,
        schema: Schema,
    },
    Sink {
        op: OpId,
        input: Box<PhysicalPlan>,
    },
}

impl LogicalPlan {
    /// Returns the number of inputs for this node.
    pub fn inputs(&self) -> usize {
        match self {
            LogicalPlan::Scan { .. } => 0,
            LogicalPlan::Map { .. } | LogicalPlan::Filter { .. } | LogicalPlan::Sink { .. } => 1,
        }
    }

    /// The single upstream node, if any.
    pub fn input(&self) -> Option<&LogicalPlan> {
        match self {
            LogicalPlan::Scan { .. } => None,
            LogicalPlan::Map { input, .. }
            | LogicalPlan::Filter { input, .. }
            | LogicalPlan::Sink { input, .. } => Some(input),
        }
    }

    /// Node label used by EXPLAIN output.
    pub fn label(&self) -> String {
        match self {
            LogicalPlan::Scan { spec } => format!(
                "Scan: {} file(s), {} column(s)",
                spec.files.len(),
                spec.schema.len()
            ),
            LogicalPlan::Map { exprs, .. } => {
                let items: Vec<String> = exprs
                    .iter()
                    .map(|n| match &n.expr {
                        Expr::Column(c) if *c == n.alias => c.clone(),
                        e => format!("{e} AS {}", n.alias),
                    })
                    .collect();
                format!("Map: {}", items.join(", "))
            }
            LogicalPlan::Filter { predicate, .. } => format!("Filter: {predicate}"),
            LogicalPlan::Sink {
                destination,
                format,
                ..
            } => format!("Sink: {format} -> {destination}"),
        }
    }

    /// Indented one-node-per-line rendering, sink first.
    pub fn explain(&self) -> String {
        let mut lines = Vec::new();
        let mut cur = Some(self);
        let mut depth = 0usize;
        while let Some(node) = cur {
            lines.push(format!("{}{}", "  ".repeat(depth), node.label()));
            cur = node.input();
            depth += 1;
        }
        lines.join("\n")
    }
}

impl PhysicalPlan {
    /// Returns the number of inputs for this node.
    pub fn inputs(&self) -> usize {
        match self {
            PhysicalPlan::Source { .. } => 0,
            PhysicalPlan::Unary { .. } | PhysicalPlan::Sink { .. } => 1,
        }
    }

    pub fn op(&self) -> OpId {
        match self {
            PhysicalPlan::Source { op, .. }
            | PhysicalPlan::Unary { op, .. }
            | PhysicalPlan::Sink { op, .. } => *op,
        }
    }

    /// Operator ids from source to sink.
    pub fn pipeline_order(&self) -> Vec<OpId> {
        let mut out = Vec::new();
        let mut cur = Some(self);
        while let Some(node) = cur {
            out.push(node.op());
            cur = match node {
                PhysicalPlan::Source { .. } => None,
                PhysicalPlan::Unary { input, .. } | PhysicalPlan::Sink { input, .. } => {
                    Some(input)
                }
            };
        }
        out.reverse();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::col;
    use crate::schema::DataType;

    fn scan() -> LogicalPlan {
        LogicalPlan::Scan {
            spec: ScanSpec {
                files: vec!["/data/a.csv".into()],
                schema: Schema::new(vec![
                    Field::new("ride_id", DataType::Utf8, true),
                    Field::new("filename", DataType::Utf8, false),
                ]),
                filename_column: "filename".into(),
            },
        }
    }

    #[test]
    fn explain_walks_to_the_scan() {
        let plan = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Map {
                input: Box::new(scan()),
                exprs: vec![NamedExpr::new(col("ride_id"), "ride_id")],
            }),
            predicate: col("ride_id").is_not_null(),
        };
        let text = plan.explain();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Filter: ride_id IS NOT NULL");
        assert_eq!(lines[1], "  Map: ride_id");
        assert!(lines[2].starts_with("    Scan: 1 file(s)"));
    }

    #[test]
    fn physical_order_is_source_first() {
        let schema = Schema::default();
        let plan = PhysicalPlan::Sink {
            op: OpId::new(2),
            input: Box::new(PhysicalPlan::Unary {
                op: OpId::new(1),
                input: Box::new(PhysicalPlan::Source {
                    op: OpId::new(0),
                    schema: schema.clone(),
                }),
                schema,
            }),
        };
        assert_eq!(plan.inputs(), 1);
        assert_eq!(
            plan.pipeline_order(),
            vec![OpId::new(0), OpId::new(1), OpId::new(2)]
        );
    }

    #[test]
    fn csv_fields_exclude_provenance() {
        let LogicalPlan::Scan { spec } = scan() else {
            unreachable!()
        };
        assert_eq!(spec.csv_fields().len(), 1);
        assert_eq!(spec.csv_fields()[0].name, "ride_id");
    }

    #[test]
    fn projection_keeps_column_nullability_and_rejects_duplicates() {
        let input = Schema::new(vec![
            Field::new("ride_id", DataType::Utf8, true),
            Field::new("filename", DataType::Utf8, false),
        ]);
        let out = project_schema(
            &input,
            &[
                NamedExpr::new(col("filename"), "source"),
                NamedExpr::new(col("ride_id").is_not_null(), "has_id"),
            ],
        )
        .unwrap();
        assert_eq!(out.names(), vec!["source", "has_id"]);
        assert!(!out.fields[0].nullable);
        assert_eq!(out.fields[1].data_type, DataType::Boolean);
        assert!(out.fields[1].nullable);

        let err = project_schema(
            &input,
            &[
                NamedExpr::new(col("ride_id"), "x"),
                NamedExpr::new(col("filename"), "x"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let err = project_schema(&input, &[NamedExpr::new(col("nope"), "nope")]).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
