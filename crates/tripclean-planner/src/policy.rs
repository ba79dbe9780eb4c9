//! The fixed cleaning rules for trip-history records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tripclean_core::config::DurationBounds;
use tripclean_core::dag::NamedExpr;
use tripclean_core::expr::{col, lit, minute_diff, Expr};
use tripclean_core::schema::DataType;
use tripclean_core::types::Scalar;

/// Header columns carried into the cleaned output, in output order.
pub const TRIP_COLUMNS: [&str; 13] = [
    "ride_id",
    "rideable_type",
    "started_at",
    "ended_at",
    "start_station_name",
    "start_station_id",
    "end_station_name",
    "end_station_id",
    "start_lat",
    "start_lng",
    "end_lat",
    "end_lng",
    "member_casual",
];

pub const TIMESTAMP_COLUMNS: [&str; 2] = ["started_at", "ended_at"];

pub const COORDINATE_COLUMNS: [&str; 4] = ["start_lat", "start_lng", "end_lat", "end_lng"];

pub const CATEGORY_COLUMN: &str = "member_casual";

pub const DURATION_COLUMN: &str = "duration_min";

/// Validity rules applied by the final filtering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripCleaningPolicy {
    pub duration: DurationBounds,
}

impl Default for TripCleaningPolicy {
    fn default() -> Self {
        Self {
            duration: DurationBounds::TRIP,
        }
    }
}

impl TripCleaningPolicy {
    pub fn new(duration: DurationBounds) -> Self {
        Self { duration }
    }

    /// Columns that must be read as raw text so `TRY_CAST` is the only thing
    /// interpreting them.
    pub fn text_columns() -> impl Iterator<Item = &'static str> {
        TIMESTAMP_COLUMNS
            .into_iter()
            .chain(COORDINATE_COLUMNS)
            .chain(std::iter::once(CATEGORY_COLUMN))
    }

    /// Type overrides for the CSV probe.
    pub fn type_overrides() -> BTreeMap<String, DataType> {
        Self::text_columns()
            .map(|c| (c.to_string(), DataType::Utf8))
            .collect()
    }

    /// `ride_id`, both timestamps and the duration must be present, and the
    /// duration must fall inside the configured inclusive window.
    pub fn validity_predicate(&self) -> Expr {
        let mut terms: Vec<Expr> = ["ride_id", "started_at", "ended_at", DURATION_COLUMN]
            .into_iter()
            .map(|c| col(c).is_not_null())
            .collect();
        terms.push(col(DURATION_COLUMN).gt_eq(lit(Scalar::I64(self.duration.min_minutes))));
        terms.push(col(DURATION_COLUMN).lt_eq(lit(Scalar::I64(self.duration.max_minutes))));
        Expr::and_all(terms)
    }
}

/// One expression per output column of the typing stage, then provenance.
pub fn typing_exprs(provenance: &str) -> Vec<NamedExpr> {
    let mut out: Vec<NamedExpr> = TRIP_COLUMNS
        .into_iter()
        .map(|name| {
            let expr = if TIMESTAMP_COLUMNS.contains(&name) {
                col(name).try_cast(DataType::Timestamp)
            } else if COORDINATE_COLUMNS.contains(&name) {
                col(name).try_cast(DataType::Float64)
            } else if name == CATEGORY_COLUMN {
                col(name).trim().lower()
            } else {
                col(name)
            };
            NamedExpr::new(expr, name)
        })
        .collect();
    out.push(NamedExpr::new(col(provenance), provenance));
    out
}

/// Every incoming column unchanged, followed by `duration_min`.
pub fn enrichment_exprs<'a>(columns: impl IntoIterator<Item = &'a str>) -> Vec<NamedExpr> {
    let mut out: Vec<NamedExpr> = columns
        .into_iter()
        .map(|c| NamedExpr::new(col(c), c))
        .collect();
    out.push(NamedExpr::new(
        minute_diff(col("started_at"), col("ended_at")),
        DURATION_COLUMN,
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_reads_like_sql() {
        let text = TripCleaningPolicy::default().validity_predicate().to_string();
        assert_eq!(
            text,
            "ride_id IS NOT NULL AND started_at IS NOT NULL AND ended_at IS NOT NULL \
             AND duration_min IS NOT NULL AND duration_min >= 1 AND duration_min <= 1440"
        );
    }

    #[test]
    fn overrides_cover_every_coerced_column() {
        let o = TripCleaningPolicy::type_overrides();
        assert_eq!(o.len(), 7);
        assert!(o.values().all(|t| *t == DataType::Utf8));
        assert!(o.contains_key("member_casual"));
    }

    #[test]
    fn typing_keeps_output_order() {
        let exprs = typing_exprs("filename");
        let names: Vec<&str> = exprs.iter().map(|n| n.alias.as_str()).collect();
        assert_eq!(names.len(), 14);
        assert_eq!(names[..13], TRIP_COLUMNS);
        assert_eq!(names[13], "filename");
        assert_eq!(exprs[12].expr.to_string(), "LOWER(TRIM(member_casual))");
        assert_eq!(exprs[8].expr.to_string(), "TRY_CAST(start_lat AS DOUBLE)");
    }
}
