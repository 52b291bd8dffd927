//! End-to-end editing scenarios driven through `LayoutEditor`.

use formgrid_layout::{
    Bounds, DragSubject, DropTarget, EditOutcome, FieldId, FieldRecord, GridOperation,
    GridPosition, LayoutEditor, OperationStatus, Payload, Point, Rejection, ResizeEdge,
    RowMetrics,
};
use serde_json::json;

fn payload(kind: &str) -> Payload {
    let mut payload = Payload::new();
    let _ = payload.insert("type".to_string(), json!(kind));
    payload
}

fn editor(records: Vec<FieldRecord>) -> LayoutEditor {
    LayoutEditor::from_records(records)
        .expect("valid layout")
        .with_row_metrics(RowMetrics::new(40.0, 10.0).expect("metrics"))
}

fn widths(editor: &LayoutEditor, row: usize) -> Vec<f64> {
    editor.grid().row(row).expect("row exists").widths()
}

fn ids(editor: &LayoutEditor, row: usize) -> Vec<String> {
    editor
        .grid()
        .row(row)
        .expect("row exists")
        .fields()
        .iter()
        .map(|field| field.id().as_str().to_string())
        .collect()
}

fn area() -> Bounds {
    Bounds::from_size(500.0, 400.0)
}

#[test]
fn boundary_resize_moves_width_between_neighbors() {
    let mut editor = editor(vec![
        FieldRecord::placed("first", 0, 0, 40.0, payload("text")),
        FieldRecord::placed("last", 0, 1, 60.0, payload("text")),
    ]);

    let _ = editor
        .begin_resize(&FieldId::new("first"), ResizeEdge::Right)
        .expect("begin");
    let preview = editor.update_resize(10.0).expect("update");
    assert_eq!(preview.width, 50.0);
    assert_eq!(preview.neighbor_width, Some(50.0));
    let _ = editor.end_resize().expect("end");
    assert_eq!(widths(&editor, 0), vec![50.0, 50.0]);

    assert!(editor.undo().expect("undo"));
    assert_eq!(widths(&editor, 0), vec![40.0, 60.0]);

    let _ = editor
        .begin_resize(&FieldId::new("first"), ResizeEdge::Right)
        .expect("begin");
    let preview = editor.update_resize(-50.0).expect("update");
    assert!(preview.held.is_some());
    let _ = editor.end_resize().expect("end");
    assert_eq!(widths(&editor, 0), vec![40.0, 60.0]);
}

#[test]
fn adding_to_a_full_row_is_rejected() {
    let records = (0..5)
        .map(|column| FieldRecord::placed(format!("f{column}"), 0, column, 20.0, payload("text")))
        .collect();
    let mut editor = editor(records);
    let before = editor.grid().clone();

    let outcome = editor
        .apply(GridOperation::AddField {
            payload: payload("email"),
            target: Some(GridPosition::new(0, 2)),
            preserve_proportions: false,
        })
        .expect("row reference is valid");

    assert_eq!(
        outcome.status,
        OperationStatus::Rejected {
            rejection: Rejection::CapacityExceeded {
                row_index: 0,
                capacity: 5
            }
        }
    );
    assert_eq!(editor.grid(), &before);
    assert_eq!(editor.grid().row(0).expect("row").len(), 5);
    assert!(!editor.timeline().can_undo());
}

#[test]
fn deleting_from_an_even_row_renormalizes_the_rest() {
    let mut editor = editor(vec![
        FieldRecord::placed("a", 0, 0, 33.3, payload("text")),
        FieldRecord::placed("b", 0, 1, 33.3, payload("text")),
        FieldRecord::placed("c", 0, 2, 33.4, payload("text")),
    ]);
    let _ = editor
        .apply(GridOperation::DeleteField {
            id: FieldId::new("b"),
        })
        .expect("delete");
    assert_eq!(ids(&editor, 0), vec!["a", "c"]);
    assert_eq!(widths(&editor, 0), vec![50.0, 50.0]);
}

#[test]
fn duplicating_a_sole_field_opens_a_row_below() {
    let mut editor = editor(vec![
        FieldRecord::placed("title", 0, 0, 100.0, payload("heading")),
        FieldRecord::placed("body", 1, 0, 100.0, payload("textarea")),
    ]);
    let outcome = editor
        .apply(GridOperation::DuplicateField {
            id: FieldId::new("title"),
        })
        .expect("duplicate");
    let copy = outcome.created.first().cloned().expect("copy created");

    assert_eq!(ids(&editor, 0), vec!["title"]);
    assert_eq!(widths(&editor, 0), vec![100.0]);
    let placed = editor.grid().field(&copy).expect("copy placed");
    assert_eq!(placed.row_index(), 1);
    assert_eq!(placed.width(), 100.0);
    assert_eq!(placed.payload().get("type"), Some(&json!("heading")));
    assert_eq!(ids(&editor, 2), vec!["body"]);
}

fn five_rows() -> Vec<FieldRecord> {
    vec![
        FieldRecord::placed("r0", 0, 0, 100.0, payload("text")),
        FieldRecord::placed("r1", 1, 0, 100.0, payload("text")),
        FieldRecord::placed("x", 2, 0, 50.0, payload("text")),
        FieldRecord::placed("y", 2, 1, 50.0, payload("text")),
        FieldRecord::placed("r3", 3, 0, 100.0, payload("text")),
        FieldRecord::placed("r4", 4, 0, 100.0, payload("text")),
    ]
}

#[test]
fn dragging_below_the_last_row_creates_a_row() {
    let mut editor = editor(five_rows());
    let geometry = editor.geometry(area());
    editor
        .begin_drag(DragSubject::Field { id: FieldId::new("x") })
        .expect("begin");
    let target = editor
        .update_drag(&geometry, Point::new(120.0, 300.0))
        .expect("update");
    assert_eq!(target, Some(DropTarget::NewRowBelow { row_index: 4 }));

    let outcome = editor.end_drag().expect("end");
    assert!(outcome.is_applied());
    assert_eq!(editor.grid().row_count(), 6);
    assert_eq!(ids(&editor, 5), vec!["x"]);
    assert_eq!(widths(&editor, 5), vec![100.0]);
    assert_eq!(ids(&editor, 2), vec!["y"]);
    assert_eq!(widths(&editor, 2), vec![100.0]);
}

#[test]
fn dragging_out_a_sole_field_compacts_the_rows() {
    let mut editor = editor(five_rows());
    let _ = editor
        .apply(GridOperation::DeleteField {
            id: FieldId::new("y"),
        })
        .expect("delete");
    let geometry = editor.geometry(area());
    editor
        .begin_drag(DragSubject::Field { id: FieldId::new("x") })
        .expect("begin");
    let _ = editor
        .update_drag(&geometry, Point::new(10.0, 390.0))
        .expect("update");
    let outcome = editor.end_drag().expect("end");
    assert!(outcome.is_applied());

    assert_eq!(editor.grid().row_count(), 5);
    assert_eq!(ids(&editor, 2), vec!["r3"]);
    assert_eq!(ids(&editor, 4), vec!["x"]);
    assert!(editor.grid().invariant_report().is_clean());
}

#[test]
fn dropping_a_new_field_into_a_full_row_has_no_target() {
    let records = (0..5)
        .map(|column| FieldRecord::placed(format!("f{column}"), 0, column, 20.0, payload("text")))
        .collect();
    let mut editor = editor(records);
    let geometry = editor.geometry(area());
    editor
        .begin_drag(DragSubject::NewField {
            payload: payload("date"),
        })
        .expect("begin");
    let target = editor
        .update_drag(&geometry, Point::new(150.0, 20.0))
        .expect("update");
    assert_eq!(target, None);
    assert_eq!(
        editor.end_drag().expect("end"),
        EditOutcome::Rejected(Rejection::NoDropTarget)
    );
    assert_eq!(editor.grid().len(), 5);
}
