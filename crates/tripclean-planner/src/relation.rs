//! Immutable relation builder.
//!
//! Every step returns a new `Relation` that owns a fresh `LogicalPlan` node
//! wrapping the previous one, plus the schema that node produces. Schema
//! problems (unknown columns, ill-typed expressions) surface here, while the
//! plan is being built, never during execution.

use tripclean_core::dag::{project_schema, LogicalPlan, NamedExpr, ScanSpec};
use tripclean_core::error::{Error, Result};
use tripclean_core::expr::Expr;
use tripclean_core::schema::{DataType, Schema};

use crate::policy::{enrichment_exprs, typing_exprs, TripCleaningPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    plan: LogicalPlan,
    schema: Schema,
    provenance: String,
}

impl Relation {
    /// Lazy scan over the probed files. Nothing is read here.
    pub fn scan(spec: ScanSpec) -> Self {
        let schema = spec.schema.clone();
        let provenance = spec.filename_column.clone();
        Self {
            plan: LogicalPlan::Scan { spec },
            schema,
            provenance,
        }
    }

    pub fn plan(&self) -> &LogicalPlan {
        &self.plan
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn into_plan(self) -> LogicalPlan {
        self.plan
    }

    /// Projection with expressions; output columns are exactly `exprs`.
    pub fn map(&self, exprs: Vec<NamedExpr>) -> Result<Relation> {
        let schema = project_schema(&self.schema, &exprs)?;
        Ok(Relation {
            plan: LogicalPlan::Map {
                input: Box::new(self.plan.clone()),
                exprs,
            },
            schema,
            provenance: self.provenance.clone(),
        })
    }

    /// Row filter; the schema is unchanged.
    pub fn filter(&self, predicate: Expr) -> Result<Relation> {
        let dt = predicate.data_type(&self.schema)?;
        if dt != DataType::Boolean {
            return Err(Error::Schema(format!(
                "filter predicate {predicate} is {dt}, expected BOOLEAN"
            )));
        }
        Ok(Relation {
            plan: LogicalPlan::Filter {
                input: Box::new(self.plan.clone()),
                predicate,
            },
            schema: self.schema.clone(),
            provenance: self.provenance.clone(),
        })
    }

    /// Coerce timestamps and coordinates, normalize `member_casual`, and keep
    /// the remaining trip columns plus provenance. Extra header columns drop out.
    pub fn typed(&self) -> Result<Relation> {
        self.map(typing_exprs(&self.provenance))
    }

    /// Append `duration_min` to every incoming column.
    pub fn enriched(&self) -> Result<Relation> {
        self.map(enrichment_exprs(self.schema.names()))
    }

    /// Keep only rows that satisfy the policy's validity predicate.
    pub fn clean(&self, policy: &TripCleaningPolicy) -> Result<Relation> {
        self.filter(policy.validity_predicate())
    }

    /// Terminal node. Only `parquet` is supported.
    pub fn sink(&self, destination: impl Into<String>, format: &str) -> Result<LogicalPlan> {
        if format != "parquet" {
            return Err(Error::Plan(format!("unsupported sink format '{format}'")));
        }
        Ok(LogicalPlan::Sink {
            input: Box::new(self.plan.clone()),
            destination: destination.into(),
            format: format.to_string(),
        })
    }

    pub fn explain(&self) -> String {
        self.plan.explain()
    }
}
