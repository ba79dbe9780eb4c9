//! Map operator: computes a new column list from expressions over the input.
//!
//! The output carries exactly the listed expressions, in order. Passing a
//! column through unchanged is `NamedExpr::new(col("x"), "x")`.

use serde::{Deserialize, Serialize};
use tripclean_core::dag::{project_schema, NamedExpr};
use tripclean_core::prelude::Schema;
use tripclean_core::types::{Column, RowBatch};

use crate::eval::evaluate;
use crate::plan::OpPlan;
use crate::traits::{single_input, OpError, Operator};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Map {
    pub exprs: Vec<NamedExpr>,
}

impl Map {
    pub fn new(exprs: Vec<NamedExpr>) -> Self {
        Self { exprs }
    }
}

impl Operator for Map {
    fn name(&self) -> &'static str {
        "map"
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan, OpError> {
        let input = single_input(input_schemas, self.name())?;
        Ok(OpPlan::new(project_schema(input, &self.exprs)?))
    }

    fn eval_block(&self, inputs: &[RowBatch]) -> Result<RowBatch, OpError> {
        let input = single_input(inputs, self.name())?;
        let mut columns = Vec::with_capacity(self.exprs.len());
        for named in &self.exprs {
            columns.push(Column::new(named.alias.clone(), evaluate(&named.expr, input)?));
        }
        Ok(RowBatch::new(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripclean_core::expr::{col, minute_diff};
    use tripclean_core::prelude::{DataType, Field, Scalar};

    fn input_schema() -> Schema {
        Schema::new(vec![
            Field::new("started_at", DataType::Utf8, true),
            Field::new("ended_at", DataType::Utf8, true),
            Field::new("rideable_type", DataType::Utf8, false),
        ])
    }

    fn typing() -> Map {
        Map::new(vec![
            NamedExpr::new(col("started_at").try_cast(DataType::Timestamp), "started_at"),
            NamedExpr::new(col("ended_at").try_cast(DataType::Timestamp), "ended_at"),
            NamedExpr::new(col("rideable_type"), "rideable_type"),
        ])
    }

    #[test]
    fn plan_derives_types_and_nullability() {
        let plan = typing().plan(&[input_schema()]).unwrap();
        let s = plan.output_schema;
        assert_eq!(s.names(), vec!["started_at", "ended_at", "rideable_type"]);
        assert_eq!(s.fields[0].data_type, DataType::Timestamp);
        assert!(s.fields[0].nullable);
        assert!(!s.fields[2].nullable);
        assert!(plan.preserves_rows);
    }

    #[test]
    fn plan_rejects_unknown_column() {
        let m = Map::new(vec![NamedExpr::new(col("nope"), "nope")]);
        assert!(matches!(m.plan(&[input_schema()]), Err(OpError::Schema(_))));
    }

    #[test]
    fn plan_rejects_duplicate_alias() {
        let m = Map::new(vec![
            NamedExpr::new(col("started_at"), "x"),
            NamedExpr::new(col("ended_at"), "x"),
        ]);
        assert!(matches!(m.plan(&[input_schema()]), Err(OpError::Schema(_))));
    }

    #[test]
    fn eval_casts_then_derives_duration() {
        let batch = RowBatch::new(vec![
            Column::new(
                "started_at",
                vec![
                    Scalar::Str("2024-01-01 08:00:00".into()),
                    Scalar::Str("garbage".into()),
                ],
            ),
            Column::new(
                "ended_at",
                vec![
                    Scalar::Str("2024-01-01 08:15:00".into()),
                    Scalar::Str("2024-01-01 08:15:00".into()),
                ],
            ),
            Column::new(
                "rideable_type",
                vec![Scalar::Str("classic_bike".into()); 2],
            ),
        ]);
        let typed = typing().eval_block(&[batch]).unwrap();
        assert_eq!(typed.columns[0].values[1], Scalar::Null);

        let enrich = Map::new(vec![NamedExpr::new(
            minute_diff(col("started_at"), col("ended_at")),
            "duration_min",
        )]);
        let out = enrich.eval_block(&[typed]).unwrap();
        assert_eq!(out.columns[0].values, vec![Scalar::I64(15), Scalar::Null]);
    }
}
