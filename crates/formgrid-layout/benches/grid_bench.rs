//! Benchmarks for grid edits, geometry and drop-target resolution.
//!
//! Run with: cargo bench -p formgrid-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use formgrid_layout::{
    Bounds, DragReflowSession, DragSubject, DropTuning, FieldId, FieldRecord, Grid,
    GridOperation, Payload, Point, RowMetrics, width,
};
use std::hint::black_box;

/// Grid of `rows` rows cycling through 1..=5 fields per row.
fn make_grid(rows: usize) -> Grid {
    let mut records = Vec::new();
    for row in 0..rows {
        let count = row % 5 + 1;
        for column in 0..count {
            records.push(FieldRecord::placed(
                format!("f{row}_{column}"),
                row,
                column,
                width::auto_width(count),
                Payload::new(),
            ));
        }
    }
    Grid::from_records(records).expect("bench layout is valid")
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/from_records");
    for rows in [10, 100, 1000] {
        let records = make_grid(rows).to_records();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &records, |b, records| {
            b.iter_batched(
                || records.clone(),
                |records| black_box(Grid::from_records(records)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/apply_operation");
    for rows in [10, 100] {
        let grid = make_grid(rows);
        let operations = [
            (
                "move_field",
                GridOperation::MoveField {
                    id: FieldId::new("f1_0"),
                    to_row: rows / 2,
                    to_column: 0,
                },
            ),
            (
                "duplicate_row",
                GridOperation::DuplicateRow { row_index: 3 },
            ),
            (
                "resize_field",
                GridOperation::ResizeField {
                    id: FieldId::new("f2_1"),
                    width: 41.0,
                },
            ),
        ];
        for (name, operation) in operations {
            group.bench_function(BenchmarkId::new(name, rows), |b| {
                b.iter_batched(
                    || grid.clone(),
                    |mut grid| black_box(grid.apply_operation(&operation)),
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_drag_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag/update");
    let metrics = RowMetrics::default();
    for rows in [10, 100, 1000] {
        let grid = make_grid(rows);
        let geometry = grid.solve_geometry(Bounds::from_size(800.0, 80_000.0), metrics);
        let mut session = DragReflowSession::begin(
            &grid,
            DragSubject::Field {
                id: FieldId::new("f0_0"),
            },
            DropTuning::default(),
        )
        .expect("field exists");
        let y = (rows as f64 / 2.0) * metrics.pitch() + 20.0;
        group.bench_with_input(BenchmarkId::from_parameter(rows), &geometry, |b, geometry| {
            b.iter(|| black_box(session.update(geometry, Point::new(317.0, y))))
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let rows = [
        vec![33.3, 33.3, 33.3],
        vec![20.0, 20.0, 20.0, 20.0, 24.0],
        vec![60.0, 47.0],
        vec![25.0, 25.0],
    ];
    c.bench_function("width/settle_row", |b| {
        b.iter(|| {
            for row in &rows {
                black_box(width::settle_row(black_box(row)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_load,
    bench_operations,
    bench_drag_update,
    bench_normalize
);
criterion_main!(benches);
