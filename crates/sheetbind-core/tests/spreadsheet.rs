//! Workspace scenarios: aliases, structural edits, renames, bindings and persistence.

use sheetbind_core::{BindingStatus, CoreError, ErrorKind, Settings, Value, Workspace};

const DOC: &str = "doc";
const SHEET: &str = "Spreadsheet";

fn workspace() -> Workspace {
    let mut ws = Workspace::new();
    ws.new_document(DOC).unwrap();
    ws.add_sheet(DOC, SHEET).unwrap();
    ws
}

fn set(ws: &mut Workspace, address: &str, input: &str) {
    ws.set_cell(DOC, SHEET, address, input).unwrap();
}

fn value(ws: &mut Workspace, address: &str) -> Value {
    ws.cell_value(DOC, SHEET, address).unwrap()
}

fn contents(ws: &Workspace, address: &str) -> String {
    ws.cell_contents(DOC, SHEET, address).unwrap()
}

fn engine_kind<T: std::fmt::Debug>(result: Result<T, CoreError>) -> ErrorKind {
    result.unwrap_err().engine_kind().unwrap()
}

#[test]
fn test_reserved_alias_leaves_table_unchanged() {
    let mut ws = workspace();
    ws.set_alias(DOC, SHEET, "A1", "width").unwrap();
    assert_eq!(
        engine_kind(ws.set_alias(DOC, SHEET, "A1", "B2")),
        ErrorKind::ReservedName
    );
    assert_eq!(ws.alias_of(DOC, SHEET, "A1").unwrap().as_deref(), Some("width"));
    assert!(ws.resolve_alias(DOC, SHEET, "B2").is_err());
}

#[test]
fn test_ambiguous_alias_is_rejected() {
    let mut ws = workspace();
    ws.set_alias(DOC, SHEET, "A1", "X").unwrap();
    assert_eq!(
        engine_kind(ws.set_alias(DOC, SHEET, "B1", "X")),
        ErrorKind::AmbiguousAlias
    );
    assert_eq!(ws.alias_of(DOC, SHEET, "B1").unwrap(), None);
    assert_eq!(ws.resolve_alias(DOC, SHEET, "X").unwrap().to_string(), "A1");
}

#[test]
fn test_cleared_alias_is_unset() {
    let mut ws = workspace();
    set(&mut ws, "A1", "5");
    ws.set_alias(DOC, SHEET, "A1", "alias1").unwrap();
    let previous = ws.set_alias(DOC, SHEET, "A1", "").unwrap();
    assert_eq!(previous.as_deref(), Some("alias1"));
    assert_eq!(ws.alias_of(DOC, SHEET, "A1").unwrap(), None);
    assert_eq!(
        engine_kind(ws.resolve_alias(DOC, SHEET, "alias1")),
        ErrorKind::UnknownAlias
    );
    assert_eq!(value(&mut ws, "A1"), Value::Number(5.0));
}

#[test]
fn test_read_by_alias_equals_read_by_address() {
    let mut ws = workspace();
    set(&mut ws, "C3", "=6 * 7");
    ws.set_alias(DOC, SHEET, "C3", "answer").unwrap();
    assert_eq!(value(&mut ws, "answer"), value(&mut ws, "C3"));
    assert_eq!(value(&mut ws, "answer"), Value::Number(42.0));
}

#[test]
fn test_remove_rows_rewrites_references() {
    let mut ws = workspace();
    set(&mut ws, "A3", "123");
    set(&mut ws, "A1", "=A3");
    assert_eq!(value(&mut ws, "A1"), Value::Number(123.0));

    ws.remove_rows(DOC, SHEET, 1, 1).unwrap();
    assert_eq!(contents(&ws, "A1"), "=A2");
    assert_eq!(contents(&ws, "A2"), "123");
    assert_eq!(contents(&ws, "A3"), "");
    assert_eq!(value(&mut ws, "A1"), Value::Number(123.0));
}

#[test]
fn test_insert_rows_rewrites_references() {
    let mut ws = workspace();
    set(&mut ws, "B1", "=B2");
    set(&mut ws, "B2", "124");

    ws.insert_rows(DOC, SHEET, 1, 1).unwrap();
    assert_eq!(contents(&ws, "B1"), "=B3");
    assert_eq!(contents(&ws, "B2"), "");
    assert_eq!(contents(&ws, "B3"), "124");
    assert_eq!(value(&mut ws, "B1"), Value::Number(124.0));
}

#[test]
fn test_removed_target_becomes_ref_error() {
    let mut ws = workspace();
    set(&mut ws, "A2", "7");
    set(&mut ws, "A1", "=A2 + 1");
    set(&mut ws, "B1", "=SUM(A2:A4)");

    ws.remove_rows(DOC, SHEET, 1, 1).unwrap();
    assert_eq!(contents(&ws, "A1"), "=#REF! + 1");
    assert_eq!(contents(&ws, "B1"), "=SUM(A2:A3)");
    assert_eq!(
        engine_kind(ws.cell_value(DOC, SHEET, "A1")),
        ErrorKind::UnresolvedReference
    );
    assert_eq!(value(&mut ws, "B1"), Value::Number(0.0));
}

#[test]
fn test_columns_shift_aliases_with_their_cells() {
    let mut ws = workspace();
    set(&mut ws, "B1", "2");
    ws.set_alias(DOC, SHEET, "B1", "two").unwrap();
    set(&mut ws, "A1", "=two + B1");

    ws.insert_columns(DOC, SHEET, 0, 2).unwrap();
    assert_eq!(ws.resolve_alias(DOC, SHEET, "two").unwrap().to_string(), "D1");
    assert_eq!(contents(&ws, "C1"), "=two + D1");
    assert_eq!(value(&mut ws, "C1"), Value::Number(4.0));

    ws.remove_columns(DOC, SHEET, 3, 1).unwrap();
    assert_eq!(ws.alias_of(DOC, SHEET, "D1").unwrap(), None);
    assert_eq!(contents(&ws, "C1"), "=two + #REF!");
}

#[test]
fn test_structural_edit_rewrites_references_from_everywhere() {
    let mut ws = workspace();
    set(&mut ws, "A3", "4");
    ws.add_sheet(DOC, "Other").unwrap();
    ws.set_cell(DOC, "Other", "A3", "5").unwrap();
    ws.set_cell(DOC, "Other", "A1", "=Spreadsheet.A3 + A3").unwrap();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    ws.set_property(DOC, "Box", "Height", Value::Empty).unwrap();
    ws.bind_expression(DOC, "Box", "Height", "Spreadsheet.A3 * 10").unwrap();
    ws.new_document("main").unwrap();
    ws.add_sheet("main", SHEET).unwrap();
    ws.set_cell("main", SHEET, "A3", "1").unwrap();
    ws.set_cell("main", SHEET, "B1", "=doc#Spreadsheet.A3 + A3").unwrap();

    ws.remove_rows(DOC, SHEET, 1, 1).unwrap();
    assert_eq!(ws.cell_contents(DOC, "Other", "A1").unwrap(), "=Spreadsheet.A2 + A3");
    assert_eq!(ws.cell_value(DOC, "Other", "A1").unwrap(), Value::Number(9.0));
    assert_eq!(
        ws.expression_text(DOC, "Box", "Height").unwrap().as_deref(),
        Some("Spreadsheet.A2 * 10")
    );
    assert_eq!(ws.current_value(DOC, "Box", "Height").unwrap(), Value::Number(40.0));
    assert_eq!(
        ws.cell_contents("main", SHEET, "B1").unwrap(),
        "=doc#Spreadsheet.A2 + A3"
    );
    assert_eq!(ws.cell_value("main", SHEET, "B1").unwrap(), Value::Number(5.0));
}

#[test]
fn test_structural_edit_under_a_bound_property_of_another_document() {
    let mut ws = Workspace::new();
    ws.new_document("cube").unwrap();
    ws.add_sheet("cube", SHEET).unwrap();
    ws.set_cell("cube", SHEET, "A3", "6").unwrap();
    ws.add_feature("cube", "Cube", "Part::Box").unwrap();
    ws.set_property("cube", "Cube", "Height", Value::Empty).unwrap();
    ws.bind_expression("cube", "Cube", "Height", "Spreadsheet.A3").unwrap();

    ws.new_document("main").unwrap();
    ws.add_sheet("main", SHEET).unwrap();
    ws.set_cell("main", SHEET, "A1", "=cube#Cube.Height * 2").unwrap();
    ws.set_cell("main", SHEET, "A2", "=cube#Spreadsheet.A3").unwrap();
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(12.0));

    ws.insert_rows("cube", SHEET, 0, 1).unwrap();
    assert_eq!(
        ws.expression_text("cube", "Cube", "Height").unwrap().as_deref(),
        Some("Spreadsheet.A4")
    );
    assert_eq!(ws.cell_contents("main", SHEET, "A1").unwrap(), "=cube#Cube.Height * 2");
    assert_eq!(ws.cell_contents("main", SHEET, "A2").unwrap(), "=cube#Spreadsheet.A4");
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(12.0));
    assert_eq!(ws.cell_value("main", SHEET, "A2").unwrap(), Value::Number(6.0));

    ws.set_cell("cube", SHEET, "A4", "8").unwrap();
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(16.0));
}

#[test]
fn test_out_of_bounds_edit_changes_nothing() {
    let mut ws = workspace();
    set(&mut ws, "A1", "=A16384");
    let result = ws.insert_rows(DOC, SHEET, 0, 1);
    assert_eq!(engine_kind(result), ErrorKind::OutOfBounds);
    assert_eq!(contents(&ws, "A1"), "=A16384");
}

#[test]
fn test_alias_rename_keeps_dependents_working() {
    let mut ws = workspace();
    set(&mut ws, "B1", "124");
    ws.set_alias(DOC, SHEET, "B1", "alias1").unwrap();
    set(&mut ws, "B2", "=alias1");
    assert_eq!(value(&mut ws, "B1"), Value::Number(124.0));
    assert_eq!(value(&mut ws, "B2"), Value::Number(124.0));

    let previous = ws.set_alias(DOC, SHEET, "B1", "alias2").unwrap();
    assert_eq!(previous.as_deref(), Some("alias1"));
    assert_eq!(contents(&ws, "B2"), "=alias2");
    assert_eq!(value(&mut ws, "B2"), Value::Number(124.0));
}

#[test]
fn test_alias_rename_reaches_other_objects_and_documents() {
    let mut ws = workspace();
    set(&mut ws, "B1", "124");
    ws.set_alias(DOC, SHEET, "B1", "alias1").unwrap();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    ws.set_property(DOC, "Box", "Length", Value::Empty).unwrap();
    ws.bind_expression(DOC, "Box", "Length", "Spreadsheet.alias1").unwrap();

    ws.new_document("main").unwrap();
    ws.add_sheet("main", SHEET).unwrap();
    ws.set_cell("main", SHEET, "B1", "1").unwrap();
    ws.set_alias("main", SHEET, "B1", "alias1").unwrap();
    ws.set_cell("main", SHEET, "A1", "=doc#Spreadsheet.alias1 * 2").unwrap();
    ws.set_cell("main", SHEET, "A2", "=alias1").unwrap();
    assert_eq!(ws.current_value(DOC, "Box", "Length").unwrap(), Value::Number(124.0));
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(248.0));

    ws.set_alias(DOC, SHEET, "B1", "alias2").unwrap();
    assert_eq!(
        ws.expression_text(DOC, "Box", "Length").unwrap().as_deref(),
        Some("Spreadsheet.alias2")
    );
    assert_eq!(ws.current_value(DOC, "Box", "Length").unwrap(), Value::Number(124.0));
    assert_eq!(
        ws.cell_contents("main", SHEET, "A1").unwrap(),
        "=doc#Spreadsheet.alias2 * 2"
    );
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(248.0));
    // The other document's own alias of the same name is a different cell.
    assert_eq!(ws.cell_contents("main", SHEET, "A2").unwrap(), "=alias1");
    assert_eq!(ws.cell_value("main", SHEET, "A2").unwrap(), Value::Number(1.0));
}

#[test]
fn test_sheet_label_rename_updates_binding_text() {
    let mut ws = workspace();
    set(&mut ws, "A1", "5");
    ws.set_alias(DOC, SHEET, "A1", "alias1").unwrap();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    ws.set_property(DOC, "Box", "Length", Value::Empty).unwrap();
    ws.bind_expression(DOC, "Box", "Length", "Spreadsheet.alias1 * 2")
        .unwrap();
    assert_eq!(ws.current_value(DOC, "Box", "Length").unwrap(), Value::Number(10.0));

    ws.set_label(DOC, SHEET, "Params").unwrap();
    assert_eq!(
        ws.expression_text(DOC, "Box", "Length").unwrap().as_deref(),
        Some("Params.alias1 * 2")
    );
    assert_eq!(ws.current_value(DOC, "Box", "Length").unwrap(), Value::Number(10.0));

    // Qualifiers written with a label that is not the old one are left alone.
    ws.bind_expression(DOC, "Box", "Length", "Spreadsheet.alias1").unwrap();
    ws.set_label(DOC, SHEET, "Inputs").unwrap();
    assert_eq!(
        ws.expression_text(DOC, "Box", "Length").unwrap().as_deref(),
        Some("Spreadsheet.alias1")
    );
}

#[test]
fn test_label_and_name_mix_up() {
    let mut ws = workspace();
    set(&mut ws, "A1", "3");
    ws.set_alias(DOC, SHEET, "A1", "Length").unwrap();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    ws.set_property(DOC, "Box", "Length", Value::Number(1.0)).unwrap();
    ws.bind_expression(DOC, "Box", "Length", "Spreadsheet.Length")
        .unwrap();

    ws.set_label(DOC, SHEET, "Calc").unwrap();
    assert_eq!(
        ws.expression_text(DOC, "Box", "Length").unwrap().as_deref(),
        Some("Calc.Length")
    );
    assert_eq!(ws.current_value(DOC, "Box", "Length").unwrap(), Value::Number(3.0));
    assert_eq!(ws.status(DOC, "Box", "Length").unwrap(), BindingStatus::UpToDate);
}

#[test]
fn test_duplicate_and_empty_labels() {
    let mut ws = workspace();
    ws.add_sheet(DOC, "Other").unwrap();
    assert!(matches!(
        ws.set_label(DOC, "Other", SHEET),
        Err(CoreError::DuplicateLabel(_))
    ));
    assert!(matches!(
        ws.set_label(DOC, "Other", ""),
        Err(CoreError::InvalidLabel(_))
    ));
    ws.set_label(DOC, "Other", "Params").unwrap();
    assert!(matches!(
        ws.set_label(DOC, SHEET, "Params"),
        Err(CoreError::DuplicateLabel(_))
    ));
}

#[test]
fn test_labels_must_be_quotable() {
    let mut ws = workspace();
    set(&mut ws, "A1", "=1");
    ws.add_sheet(DOC, "Other").unwrap();
    ws.set_cell(DOC, "Other", "A1", "=Spreadsheet.A1").unwrap();
    for label in ["a>>b", "ends>", " padded", "padded ", "two\nlines"] {
        assert!(
            matches!(ws.set_label(DOC, SHEET, label), Err(CoreError::InvalidLabel(_))),
            "{label:?}"
        );
        assert!(
            matches!(ws.set_document_label(DOC, label), Err(CoreError::InvalidLabel(_))),
            "{label:?}"
        );
    }
    assert_eq!(ws.cell_contents(DOC, "Other", "A1").unwrap(), "=Spreadsheet.A1");

    ws.set_label(DOC, SHEET, "My Params").unwrap();
    assert_eq!(ws.cell_contents(DOC, "Other", "A1").unwrap(), "=<<My Params>>.A1");
    assert_eq!(ws.cell_value(DOC, "Other", "A1").unwrap(), Value::Number(1.0));
}

#[test]
fn test_property_names_are_identifiers() {
    let mut ws = workspace();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    for name in ["my length", "a:b", "two\nlines", ""] {
        assert!(
            matches!(
                ws.set_property(DOC, "Box", name, Value::Number(1.0)),
                Err(CoreError::InvalidProperty(_))
            ),
            "{name:?}"
        );
    }
    assert!(ws.document(DOC).unwrap().feature("Box").unwrap().properties().next().is_none());
}

#[test]
fn test_large_range_tracks_cells_as_they_appear() {
    let settings = Settings {
        max_range_cells: 4,
        ..Settings::default()
    };
    let mut ws = Workspace::with_settings(settings);
    ws.new_document(DOC).unwrap();
    ws.add_sheet(DOC, SHEET).unwrap();
    set(&mut ws, "A1", "=SUM(B1:B100)");
    assert_eq!(value(&mut ws, "A1"), Value::Number(0.0));

    set(&mut ws, "B50", "5");
    assert_eq!(ws.cell_status(DOC, SHEET, "A1").unwrap(), BindingStatus::Dirty);
    assert_eq!(value(&mut ws, "A1"), Value::Number(5.0));
    set(&mut ws, "B50", "7");
    assert_eq!(value(&mut ws, "A1"), Value::Number(7.0));

    // Cells outside the range leave the sum alone.
    set(&mut ws, "C50", "1");
    assert_eq!(ws.cell_status(DOC, SHEET, "A1").unwrap(), BindingStatus::UpToDate);

    set(&mut ws, "B50", "");
    assert_eq!(value(&mut ws, "A1"), Value::Number(0.0));
}

#[test]
fn test_content_edits_keep_edges_current() {
    let mut ws = workspace();
    set(&mut ws, "A1", "1");
    set(&mut ws, "A2", "2");
    set(&mut ws, "B1", "=A1 * 10");
    assert_eq!(value(&mut ws, "B1"), Value::Number(10.0));

    // Retargeting drops the old edge and adds the new one.
    set(&mut ws, "B1", "=A2 * 10");
    assert_eq!(value(&mut ws, "B1"), Value::Number(20.0));
    set(&mut ws, "A1", "5");
    assert_eq!(ws.cell_status(DOC, SHEET, "B1").unwrap(), BindingStatus::UpToDate);
    set(&mut ws, "A2", "3");
    assert_eq!(ws.cell_status(DOC, SHEET, "B1").unwrap(), BindingStatus::Dirty);
    assert_eq!(value(&mut ws, "B1"), Value::Number(30.0));

    // A literal has no edges left.
    set(&mut ws, "B1", "0");
    set(&mut ws, "C1", "=B1 + 1");
    set(&mut ws, "A2", "4");
    assert_eq!(value(&mut ws, "C1"), Value::Number(1.0));
    assert_eq!(ws.cell_status(DOC, SHEET, "C1").unwrap(), BindingStatus::UpToDate);
}

#[test]
fn test_feature_binding_reaches_up_to_date() {
    let mut ws = workspace();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    ws.set_property(DOC, "Box", "Length", Value::Number(10.0)).unwrap();
    ws.set_property(DOC, "Box", "Height", Value::Empty).unwrap();
    ws.bind_expression(DOC, "Box", "Height", "Length * 2").unwrap();
    assert_eq!(ws.status(DOC, "Box", "Height").unwrap(), BindingStatus::Dirty);
    assert_eq!(ws.object_status(DOC, "Box").unwrap().label(), "Touched");

    ws.recompute();
    assert_eq!(ws.status(DOC, "Box", "Height").unwrap(), BindingStatus::UpToDate);
    assert_eq!(ws.object_status(DOC, "Box").unwrap().label(), "Up-to-date");
    assert_eq!(ws.current_value(DOC, "Box", "Height").unwrap(), Value::Number(20.0));

    ws.set_property(DOC, "Box", "Length", Value::Number(4.0)).unwrap();
    assert_eq!(ws.status(DOC, "Box", "Height").unwrap(), BindingStatus::Dirty);
    assert_eq!(ws.current_value(DOC, "Box", "Height").unwrap(), Value::Number(8.0));

    ws.clear_expression(DOC, "Box", "Height").unwrap();
    assert_eq!(ws.expression_text(DOC, "Box", "Height").unwrap(), None);
    assert_eq!(ws.current_value(DOC, "Box", "Height").unwrap(), Value::Number(8.0));
}

#[test]
fn test_binding_unknown_property_fails() {
    let mut ws = workspace();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    assert!(matches!(
        ws.bind_expression(DOC, "Box", "Width", "1"),
        Err(CoreError::NoSuchProperty { .. })
    ));
    assert!(matches!(
        ws.bind_expression(DOC, SHEET, "Width", "1"),
        Err(CoreError::NotAFeature(_))
    ));
}

#[test]
fn test_new_property_resolves_waiting_binding() {
    let mut ws = workspace();
    ws.add_feature(DOC, "Box", "Part::Box").unwrap();
    ws.set_property(DOC, "Box", "Height", Value::Empty).unwrap();
    ws.bind_expression(DOC, "Box", "Height", "Width * 2").unwrap();
    assert!(ws.current_value(DOC, "Box", "Height").is_err());

    ws.set_property(DOC, "Box", "Width", Value::Number(3.0)).unwrap();
    assert_eq!(ws.current_value(DOC, "Box", "Height").unwrap(), Value::Number(6.0));
    ws.set_property(DOC, "Box", "Width", Value::Number(4.0)).unwrap();
    assert_eq!(ws.current_value(DOC, "Box", "Height").unwrap(), Value::Number(8.0));
}

#[test]
fn test_booleans_coerce_in_numeric_bindings() {
    let mut ws = workspace();
    set(&mut ws, "A1", "TRUE");
    set(&mut ws, "A2", "=A1 + 1");
    set(&mut ws, "A3", "=IF(A1, 10, 20)");
    assert_eq!(value(&mut ws, "A1"), Value::Bool(true));
    assert_eq!(value(&mut ws, "A2"), Value::Number(2.0));
    assert_eq!(value(&mut ws, "A3"), Value::Number(10.0));
}

#[test]
fn test_cycle_marks_both_nodes_and_spares_others() {
    let mut ws = workspace();
    set(&mut ws, "C1", "5");
    set(&mut ws, "C2", "=C1 * 2");
    assert_eq!(value(&mut ws, "C2"), Value::Number(10.0));

    assert!(!ws.set_cell(DOC, SHEET, "A1", "=A2").unwrap().is_cyclic());
    let outcome = ws.set_cell(DOC, SHEET, "A2", "=A1").unwrap();
    assert!(outcome.is_cyclic());

    let report = ws.recompute();
    assert_eq!(report.errors.len(), 2);
    for address in ["A1", "A2"] {
        assert_eq!(ws.cell_status(DOC, SHEET, address).unwrap(), BindingStatus::Error);
        assert_eq!(
            engine_kind(ws.cell_value(DOC, SHEET, address)),
            ErrorKind::CyclicDependency
        );
    }
    assert_eq!(value(&mut ws, "C2"), Value::Number(10.0));
    assert_eq!(ws.cell_status(DOC, SHEET, "C2").unwrap(), BindingStatus::UpToDate);

    // Breaking the cycle recovers both nodes.
    set(&mut ws, "A2", "1");
    assert_eq!(value(&mut ws, "A1"), Value::Number(1.0));
}

#[test]
fn test_errors_flow_to_dependents() {
    let mut ws = workspace();
    set(&mut ws, "A1", "=1 / 0");
    set(&mut ws, "A2", "=A1 + 1");
    set(&mut ws, "A3", "=IF(TRUE, 3, A1)");
    assert_eq!(engine_kind(ws.cell_value(DOC, SHEET, "A2")), ErrorKind::Evaluation);
    assert_eq!(value(&mut ws, "A3"), Value::Number(3.0));
}

#[test]
fn test_recompute_is_idempotent() {
    let mut ws = workspace();
    set(&mut ws, "A1", "2");
    set(&mut ws, "A2", "=A1 * 21");
    let first = ws.recompute();
    assert_eq!(first.evaluated, 1);
    assert_eq!(value(&mut ws, "A2"), Value::Number(42.0));

    let second = ws.recompute();
    assert_eq!(second.evaluated, 0);
    assert_eq!(value(&mut ws, "A2"), Value::Number(42.0));
    assert_eq!(ws.cell_status(DOC, SHEET, "A2").unwrap(), BindingStatus::UpToDate);
}

#[test]
fn test_parse_error_keeps_previous_content() {
    let mut ws = workspace();
    set(&mut ws, "A1", "=2 + 2");
    assert_eq!(value(&mut ws, "A1"), Value::Number(4.0));
    assert_eq!(
        engine_kind(ws.set_cell(DOC, SHEET, "A1", "=2 +")),
        ErrorKind::Parse
    );
    assert_eq!(contents(&ws, "A1"), "=2 + 2");
    assert_eq!(value(&mut ws, "A1"), Value::Number(4.0));
}

#[test]
fn test_cross_document_reference_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let main_path = dir.path().join("main.sbd");
    let other_path = dir.path().join("other.sbd");

    let mut ws = Workspace::new();
    ws.new_document("other").unwrap();
    ws.add_sheet("other", SHEET).unwrap();
    ws.set_cell("other", SHEET, "A1", "12").unwrap();
    ws.set_alias("other", SHEET, "A1", "width").unwrap();
    ws.new_document("main").unwrap();
    ws.add_feature("main", "Box", "Part::Box").unwrap();
    ws.set_property("main", "Box", "Length", Value::Empty).unwrap();
    ws.bind_expression("main", "Box", "Length", "other#Spreadsheet.width + 1")
        .unwrap();
    assert_eq!(ws.current_value("main", "Box", "Length").unwrap(), Value::Number(13.0));

    ws.save_document_as("other", &other_path).unwrap();
    ws.save_document_as("main", &main_path).unwrap();
    ws.close_document("other").unwrap();
    assert_eq!(
        engine_kind(ws.current_value("main", "Box", "Length")),
        ErrorKind::UnresolvedReference
    );
    ws.close_document("main").unwrap();
    assert!(ws.document_names().is_empty());

    let mut ws = Workspace::new();
    assert_eq!(ws.open_document(&main_path).unwrap(), "main");
    assert_eq!(
        ws.expression_text("main", "Box", "Length").unwrap().as_deref(),
        Some("other#Spreadsheet.width + 1")
    );
    assert_eq!(
        engine_kind(ws.current_value("main", "Box", "Length")),
        ErrorKind::UnresolvedReference
    );

    ws.open_document(&other_path).unwrap();
    assert_eq!(ws.current_value("main", "Box", "Length").unwrap(), Value::Number(13.0));
    assert_eq!(
        ws.expression_text("main", "Box", "Length").unwrap().as_deref(),
        Some("other#Spreadsheet.width + 1")
    );

    // Edits in one document reach readers in the other.
    ws.set_cell("other", SHEET, "width", "20").unwrap();
    assert_eq!(ws.status("main", "Box", "Length").unwrap(), BindingStatus::Dirty);
    assert_eq!(ws.current_value("main", "Box", "Length").unwrap(), Value::Number(21.0));
}

#[test]
fn test_label_rename_reaches_closed_document_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let main_path = dir.path().join("main.sbd");
    let other_path = dir.path().join("other.sbd");

    let mut ws = Workspace::new();
    ws.new_document("other").unwrap();
    ws.add_sheet("other", SHEET).unwrap();
    ws.set_label("other", SHEET, "Params").unwrap();
    ws.set_cell("other", SHEET, "A1", "7").unwrap();
    ws.save_document_as("other", &other_path).unwrap();

    ws.new_document("main").unwrap();
    ws.add_sheet("main", SHEET).unwrap();
    ws.set_cell("main", SHEET, "A1", "=other#Params.A1 * 2").unwrap();
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(14.0));
    ws.save_document_as("main", &main_path).unwrap();
    ws.close_document("main").unwrap();

    ws.set_label("other", SHEET, "Inputs").unwrap();
    ws.save_document("other").unwrap();

    ws.open_document(&main_path).unwrap();
    assert_eq!(
        ws.cell_contents("main", SHEET, "A1").unwrap(),
        "=other#Inputs.A1 * 2"
    );
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(14.0));
}

#[test]
fn test_document_management_errors() {
    let mut ws = workspace();
    assert!(matches!(
        ws.new_document(DOC),
        Err(CoreError::DuplicateDocument(_))
    ));
    assert!(matches!(ws.save_document(DOC), Err(CoreError::NoFilePath)));
    assert!(matches!(
        ws.close_document("missing"),
        Err(CoreError::NoSuchDocument(_))
    ));
    assert!(matches!(
        ws.add_sheet(DOC, SHEET),
        Err(CoreError::DuplicateObject { .. })
    ));
    assert!(matches!(
        ws.set_cell(DOC, "Missing", "A1", "1"),
        Err(CoreError::NoSuchObject { .. })
    ));
}

#[test]
fn test_document_label_rename() {
    let mut ws = Workspace::new();
    ws.new_document("other").unwrap();
    ws.add_sheet("other", SHEET).unwrap();
    ws.set_cell("other", SHEET, "A1", "3").unwrap();
    ws.set_document_label("other", "Parts").unwrap();

    ws.new_document("main").unwrap();
    ws.add_sheet("main", SHEET).unwrap();
    ws.set_cell("main", SHEET, "A1", "=Parts#Spreadsheet.A1").unwrap();
    ws.set_cell("main", SHEET, "A2", "=other#Spreadsheet.A1").unwrap();

    ws.set_document_label("other", "Library").unwrap();
    assert_eq!(
        ws.cell_contents("main", SHEET, "A1").unwrap(),
        "=Library#Spreadsheet.A1"
    );
    assert_eq!(
        ws.cell_contents("main", SHEET, "A2").unwrap(),
        "=other#Spreadsheet.A1"
    );
    assert_eq!(ws.cell_value("main", SHEET, "A1").unwrap(), Value::Number(3.0));
    assert!(matches!(
        ws.set_document_label("main", "Library"),
        Err(CoreError::DuplicateLabel(_))
    ));
}

#[test]
fn test_evaluate_expression_in_sheet_scope() {
    let mut ws = workspace();
    set(&mut ws, "A1", "4");
    set(&mut ws, "A2", "=A1 * 10");
    assert_eq!(
        ws.evaluate_expression(DOC, SHEET, "=SUM(A1:A2) / 2").unwrap(),
        Value::Number(22.0)
    );
}
