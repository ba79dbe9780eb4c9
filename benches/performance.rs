use criterion::{criterion_group, criterion_main, Criterion};
use tripclean::core::dag::ScanSpec;
use tripclean::core::schema::{DataType, Field, Schema};
use tripclean::core::types::{Column, RowBatch, Scalar};
use tripclean::operators::{Filter, Map, Operator};
use tripclean::planner::policy::{enrichment_exprs, typing_exprs, TRIP_COLUMNS};
use tripclean::{Relation, TripCleaningPolicy};

fn make_batch(rows: usize) -> RowBatch {
    let mut columns: Vec<Column> = TRIP_COLUMNS
        .iter()
        .map(|name| {
            let values = (0..rows)
                .map(|i| {
                    let v = match *name {
                        "started_at" => format!("2024-01-01 08:{:02}:00", i % 60),
                        "ended_at" => format!("2024-01-01 09:{:02}:00", (i * 7) % 60),
                        "start_lat" | "end_lat" => format!("41.{}", 8000 + i % 999),
                        "start_lng" | "end_lng" => format!("-87.{}", 6000 + i % 999),
                        "member_casual" => if i % 3 == 0 { " Casual" } else { "member " }.to_string(),
                        _ => format!("{name}-{i}"),
                    };
                    Scalar::Str(v)
                })
                .collect();
            Column::new(*name, values)
        })
        .collect();
    columns.push(Column::new(
        "filename",
        vec![Scalar::Str("/data/raw/2024-01.csv".into()); rows],
    ));
    RowBatch::new(columns)
}

fn bench_cleaning_chain(c: &mut Criterion) {
    let mut fields: Vec<Field> = TRIP_COLUMNS
        .iter()
        .map(|n| Field::new(*n, DataType::Utf8, true))
        .collect();
    fields.push(Field::new("filename", DataType::Utf8, false));
    let typed = Relation::scan(ScanSpec {
        files: vec!["/data/raw/2024-01.csv".into()],
        schema: Schema::new(fields),
        filename_column: "filename".into(),
    })
    .typed()
    .unwrap();

    let typing = Map::new(typing_exprs("filename"));
    let enrich = Map::new(enrichment_exprs(typed.schema().names()));
    let filter = Filter::new(TripCleaningPolicy::default().validity_predicate());
    let batch = make_batch(8_192);

    c.bench_function("typing_enrich_filter_8k", |b| {
        b.iter(|| {
            let t = typing.eval_block(&[batch.clone()]).unwrap();
            let e = enrich.eval_block(&[t]).unwrap();
            let _ = filter.eval_block(&[e]).unwrap();
        })
    });
}

criterion_group!(benches, bench_cleaning_chain);
criterion_main!(benches);
