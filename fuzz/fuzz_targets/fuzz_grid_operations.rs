#![no_main]

use arbitrary::Arbitrary;
use formgrid_layout::{
    FieldId, FieldWidth, Grid, GridOperation, GridPosition, GridTimeline, MAX_FIELDS_PER_ROW,
    MAX_WIDTH, MIN_WIDTH, Payload,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Step {
    Add { row: u8, column: u8, targeted: bool, proportional: bool },
    AddInNewRow { row: u8 },
    Move { field: u8, row: u8, column: u8 },
    MoveToNewRow { field: u8, row: u8 },
    Resize { field: u8, width: f32 },
    SetWidths { fields: Vec<(u8, f32)> },
    Normalize { row: u8 },
    Delete { field: u8 },
    Duplicate { field: u8 },
    MoveRow { from: u8, to: u8 },
    DuplicateRow { row: u8 },
    DeleteRow { row: u8 },
    Undo,
    Redo,
}

fn pick(ids: &[FieldId], index: u8) -> Option<FieldId> {
    (!ids.is_empty()).then(|| ids[usize::from(index) % ids.len()].clone())
}

fn operation(grid: &Grid, step: &Step) -> Option<GridOperation> {
    let ids: Vec<FieldId> = grid.fields().map(|field| field.id().clone()).collect();
    let rows = grid.row_count();
    let row_in = |raw: u8| (rows > 0).then(|| usize::from(raw) % rows);
    let row_or_end = |raw: u8| usize::from(raw) % (rows + 1);
    Some(match *step {
        Step::Add {
            row,
            column,
            targeted,
            proportional,
        } => GridOperation::AddField {
            payload: Payload::new(),
            target: targeted.then(|| {
                GridPosition::new(row_or_end(row), usize::from(column) % (MAX_FIELDS_PER_ROW + 1))
            }),
            preserve_proportions: proportional,
        },
        Step::AddInNewRow { row } => GridOperation::AddFieldInNewRow {
            payload: Payload::new(),
            row_index: row_or_end(row),
        },
        Step::Move { field, row, column } => GridOperation::MoveField {
            id: pick(&ids, field)?,
            to_row: row_or_end(row),
            to_column: usize::from(column),
        },
        Step::MoveToNewRow { field, row } => GridOperation::MoveFieldToNewRow {
            id: pick(&ids, field)?,
            row_index: row_or_end(row),
        },
        Step::Resize { field, width } => GridOperation::ResizeField {
            id: pick(&ids, field)?,
            width: f64::from(width),
        },
        Step::SetWidths { ref fields } => GridOperation::SetWidths {
            widths: fields
                .iter()
                .take(8)
                .map(|&(field, width)| {
                    pick(&ids, field).map(|id| FieldWidth::new(id, f64::from(width)))
                })
                .collect::<Option<Vec<_>>>()?,
        },
        Step::Normalize { row } => GridOperation::NormalizeRow {
            row_index: row_in(row)?,
        },
        Step::Delete { field } => GridOperation::DeleteField {
            id: pick(&ids, field)?,
        },
        Step::Duplicate { field } => GridOperation::DuplicateField {
            id: pick(&ids, field)?,
        },
        Step::MoveRow { from, to } => GridOperation::MoveRow {
            row_index: row_in(from)?,
            to_row_index: row_in(to)?,
        },
        Step::DuplicateRow { row } => GridOperation::DuplicateRow {
            row_index: row_in(row)?,
        },
        Step::DeleteRow { row } => GridOperation::DeleteRow {
            row_index: row_in(row)?,
        },
        Step::Undo | Step::Redo => return None,
    })
}

fuzz_target!(|steps: Vec<Step>| {
    if steps.len() > 256 {
        return;
    }
    let mut grid = Grid::new();
    let mut timeline = GridTimeline::with_baseline(&grid);

    for step in &steps {
        match step {
            Step::Undo => {
                let _ = timeline.undo(&mut grid).expect("undo replays");
            }
            Step::Redo => {
                let _ = timeline.redo(&mut grid).expect("redo replays");
            }
            _ => {
                if let Some(operation) = operation(&grid, step) {
                    let before = grid.clone();
                    match timeline.apply_and_record(&mut grid, operation) {
                        Ok(outcome) => {
                            assert_eq!(outcome.after_hash, grid.layout_hash());
                            if !outcome.is_applied() {
                                assert_eq!(grid, before, "rejected edit changed the grid");
                            }
                        }
                        Err(_) => assert_eq!(grid, before, "failed edit changed the grid"),
                    }
                }
            }
        }

        // Post-conditions that must always hold:
        let report = grid.invariant_report();
        assert!(report.is_clean(), "invariants: {:?}", report.issues);
        for row in grid.rows() {
            assert!(!row.is_empty() && row.len() <= MAX_FIELDS_PER_ROW);
            for field in row.fields() {
                assert!((MIN_WIDTH..=MAX_WIDTH).contains(&field.width()));
            }
        }
    }

    // Saved layouts reload to the same layout.
    let reloaded = Grid::from_records(grid.to_records()).expect("saved layout reloads");
    assert_eq!(reloaded.layout_hash(), grid.layout_hash());
});
