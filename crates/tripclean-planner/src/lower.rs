//! Lowering: `LogicalPlan` → `PhysicalProgram`.
//!
//! Ids are assigned source-first, so a linear pipeline reads 0, 1, 2, ...

use std::collections::BTreeMap;

use serde_json::json;
use tripclean_core::dag::{project_schema, LogicalPlan, PhysicalPlan};
use tripclean_core::error::{Error, Result};
use tripclean_core::id::OpId;
use tripclean_core::schema::Schema;

use crate::physical::{OperatorBinding, PhysicalProgram};

pub fn lower_to_physical(plan: &LogicalPlan) -> Result<PhysicalProgram> {
    if !matches!(plan, LogicalPlan::Sink { .. }) {
        return Err(Error::Plan(format!(
            "pipeline must end in a sink, found '{}'",
            plan.label()
        )));
    }
    let mut bindings = BTreeMap::new();
    let mut next = 0u64;
    let (physical, _) = lower_node(plan, &mut next, &mut bindings)?;
    Ok(PhysicalProgram::new(physical, bindings))
}

fn lower_node(
    node: &LogicalPlan,
    next: &mut u64,
    bindings: &mut BTreeMap<OpId, OperatorBinding>,
) -> Result<(PhysicalPlan, Schema)> {
    let lowered = match node.input() {
        Some(input) => Some(lower_node(input, next, bindings)?),
        None => None,
    };
    let op = OpId::new(*next);
    *next += 1;

    let (key, config, plan, schema) = match (node, lowered) {
        (LogicalPlan::Scan { spec }, None) => {
            let schema = spec.schema.clone();
            (
                "source",
                serde_json::to_value(spec)?,
                PhysicalPlan::Source {
                    op,
                    schema: schema.clone(),
                },
                schema,
            )
        }
        (LogicalPlan::Map { exprs, .. }, Some((input, in_schema))) => {
            let schema = project_schema(&in_schema, exprs)?;
            (
                "map",
                json!({ "exprs": exprs }),
                PhysicalPlan::Unary {
                    op,
                    input: Box::new(input),
                    schema: schema.clone(),
                },
                schema,
            )
        }
        (LogicalPlan::Filter { predicate, .. }, Some((input, in_schema))) => (
            "filter",
            json!({ "predicate": predicate }),
            PhysicalPlan::Unary {
                op,
                input: Box::new(input),
                schema: in_schema.clone(),
            },
            in_schema,
        ),
        (
            LogicalPlan::Sink {
                destination,
                format,
                ..
            },
            Some((input, in_schema)),
        ) => {
            if format != "parquet" {
                return Err(Error::Plan(format!("unsupported sink format '{format}'")));
            }
            (
                "sink",
                json!({ "destination": destination, "format": format }),
                PhysicalPlan::Sink {
                    op,
                    input: Box::new(input),
                },
                in_schema,
            )
        }
        (other, _) => {
            return Err(Error::Plan(format!(
                "malformed plan node '{}'",
                other.label()
            )))
        }
    };

    bindings.insert(
        op,
        OperatorBinding {
            key: key.to_string(),
            config,
        },
    );
    Ok((plan, schema))
}
