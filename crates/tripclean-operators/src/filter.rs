//! Filter operator: keeps rows whose predicate evaluates to true.
//!
//! A null predicate result drops the row, the same as false.

use serde::{Deserialize, Serialize};
use tripclean_core::expr::Expr;
use tripclean_core::prelude::{DataType, Schema};
use tripclean_core::types::RowBatch;

use crate::eval::selection_mask;
use crate::plan::OpPlan;
use crate::traits::{single_input, OpError, Operator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    pub predicate: Expr,
}

impl Filter {
    pub fn new(predicate: Expr) -> Self {
        Self { predicate }
    }
}

impl Operator for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan, OpError> {
        let schema = single_input(input_schemas, self.name())?;
        let dt = self.predicate.data_type(schema)?;
        if dt != DataType::Boolean {
            return Err(OpError::Schema(format!(
                "filter predicate {} is {dt}, expected BOOLEAN",
                self.predicate
            )));
        }
        Ok(OpPlan::new(schema.clone()).filtering())
    }

    fn eval_block(&self, inputs: &[RowBatch]) -> Result<RowBatch, OpError> {
        let input = single_input(inputs, self.name())?;
        let keep = selection_mask(&self.predicate, input)?;
        input.retain(&keep).map_err(OpError::Exec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripclean_core::expr::{col, lit};
    use tripclean_core::prelude::{Field, Scalar};
    use tripclean_core::types::Column;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("duration_min", DataType::Int64, true),
            Field::new("member_casual", DataType::Utf8, true),
        ])
    }

    fn batch() -> RowBatch {
        RowBatch::new(vec![
            Column::new(
                "duration_min",
                vec![Scalar::I64(0), Scalar::I64(1), Scalar::I64(1440), Scalar::I64(1441), Scalar::Null],
            ),
            Column::new(
                "member_casual",
                vec![Scalar::Str("member".into()); 5],
            ),
        ])
    }

    fn bounds() -> Expr {
        Expr::and_all(vec![
            col("duration_min").is_not_null(),
            col("duration_min").gt_eq(lit(Scalar::I64(1))),
            col("duration_min").lt_eq(lit(Scalar::I64(1440))),
        ])
    }

    #[test]
    fn keeps_inclusive_bounds_and_drops_nulls() {
        let out = Filter::new(bounds()).eval_block(&[batch()]).unwrap();
        assert_eq!(
            out.columns[0].values,
            vec![Scalar::I64(1), Scalar::I64(1440)]
        );
        assert_eq!(out.columns[1].values.len(), 2);
    }

    #[test]
    fn plan_keeps_schema_and_marks_filtering() {
        let plan = Filter::new(bounds()).plan(&[schema()]).unwrap();
        assert_eq!(plan.output_schema, schema());
        assert!(!plan.preserves_rows);
    }

    #[test]
    fn plan_rejects_non_boolean_predicate() {
        let f = Filter::new(col("member_casual"));
        assert!(matches!(f.plan(&[schema()]), Err(OpError::Schema(_))));
    }

    #[test]
    fn requires_single_input() {
        let f = Filter::new(bounds());
        assert!(f.eval_block(&[]).is_err());
    }
}
