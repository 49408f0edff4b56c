use super::*;
use crate::error::Error;
use crate::tabular::{Cell, Table, TabularConfig, Tabularizer};
use calamine::{open_workbook, Data, Reader, Xlsx};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use test_case::test_case;

fn table(records: &[Value]) -> Table {
    Tabularizer::new(TabularConfig::default())
        .tabularize(records)
        .unwrap()
}

fn cell(range: &calamine::Range<Data>, row: usize, col: usize) -> Data {
    range
        .get_value((row as u32, col as u32))
        .cloned()
        .unwrap_or(Data::Empty)
}

// ============================================================================
// Sheet naming
// ============================================================================

#[test_case("Forms", "Forms" ; "plain")]
#[test_case("a/b:c*d?e[f]g\\h", "a_b_c_d_e_f_g_h" ; "illegal characters")]
#[test_case("'quoted'", "_quoted_" ; "edge apostrophes")]
#[test_case("  padded  ", "padded" ; "trimmed")]
#[test_case("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghij", "ABCDEFGHIJKLMNOPQRSTUVWXYZabcde" ; "truncated")]
fn test_sanitize_sheet_name(input: &str, expected: &str) {
    assert_eq!(sanitize_sheet_name(input), expected);
}

#[test]
fn test_sanitize_truncates_on_char_boundaries() {
    let name = "é".repeat(40);
    let sanitized = sanitize_sheet_name(&name);
    assert_eq!(sanitized.chars().count(), MAX_SHEET_NAME_LEN);
}

#[test]
fn test_namer_collisions_get_position_suffix() {
    let mut namer = SheetNamer::new();
    let long = "RelationshipAndSubsidiaryDetailsOne";

    assert_eq!(namer.assign("Forms"), "Forms");
    assert_eq!(namer.assign("forms"), "forms~2");
    assert_eq!(namer.assign(long), "RelationshipAndSubsidiaryDetail");
    let third = namer.assign("RelationshipAndSubsidiaryDetailsTwo");
    assert_eq!(third, "RelationshipAndSubsidiaryDeta~4");
    assert!(third.chars().count() <= MAX_SHEET_NAME_LEN);
    assert_eq!(namer.len(), 4);
}

#[test]
fn test_namer_empty_name() {
    let mut namer = SheetNamer::new();
    assert!(namer.is_empty());
    assert_eq!(namer.assign("a"), "a");
    assert_eq!(namer.assign(""), "Sheet2");
    assert_eq!(namer.assign("   "), "Sheet3");
}

#[test]
fn test_namer_is_deterministic() {
    let names = ["Forms", "FORMS", "", "x/y", "Forms"];
    let run = || {
        let mut namer = SheetNamer::new();
        names.iter().map(|n| namer.assign(n)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

// ============================================================================
// Cell text
// ============================================================================

#[test]
fn test_cell_text() {
    assert_eq!(cell_text(&Cell::Missing), None);
    assert_eq!(cell_text(&Cell::Value(json!(null))), None);
    assert_eq!(cell_text(&Cell::Value(json!("x"))), Some("x".to_string()));
    assert_eq!(cell_text(&Cell::Value(json!(1.5))), Some("1.5".to_string()));
    assert_eq!(
        cell_text(&Cell::Value(json!([1, {"a": 2}]))),
        Some(r#"[1,{"a":2}]"#.to_string())
    );
}

// ============================================================================
// Workbook sink
// ============================================================================

#[test]
fn test_workbook_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("extract.xlsx");

    let forms = table(&[
        json!({"id": "a", "score": 3, "ok": true, "note": null}),
        json!({"id": "b", "score": 4.5, "extra": "x"}),
    ]);
    let responses = table(&[json!({"docId": "d1"})]);

    let mut sink: Box<dyn TableSink> = Box::new(WorkbookSink::new(&path));
    assert_eq!(sink.write_table(&NamedTable::new("Forms", forms)).unwrap(), "Forms");
    assert_eq!(
        sink.write_table(&NamedTable::new("Response/Extract", responses))
            .unwrap(),
        "Response_Extract"
    );
    let summary = sink.finish().unwrap();

    assert_eq!(summary.sheets, vec!["Forms", "Response_Extract"]);
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.path.as_deref(), Some(path.as_path()));

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Forms", "Response_Extract"]);

    let range = workbook.worksheet_range("Forms").unwrap();
    let header: Vec<Data> = (0..5).map(|c| cell(&range, 0, c)).collect();
    assert_eq!(
        header,
        ["id", "score", "ok", "note", "extra"]
            .iter()
            .map(|s| Data::String(s.to_string()))
            .collect::<Vec<_>>()
    );
    assert_eq!(cell(&range, 1, 0), Data::String("a".to_string()));
    assert_eq!(cell(&range, 1, 1), Data::Float(3.0));
    assert_eq!(cell(&range, 1, 2), Data::Bool(true));
    assert_eq!(cell(&range, 1, 3), Data::Empty);
    assert_eq!(cell(&range, 1, 4), Data::Empty);
    assert_eq!(cell(&range, 2, 1), Data::Float(4.5));
    assert_eq!(cell(&range, 2, 2), Data::Empty);
    assert_eq!(cell(&range, 2, 4), Data::String("x".to_string()));
}

#[test]
fn test_workbook_unexpanded_arrays_as_json_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("arrays.xlsx");

    let table = Tabularizer::new(TabularConfig::default().fixed_point(1))
        .tabularize(&[json!({"a": [[1, 2]]})])
        .unwrap();

    let mut sink: Box<dyn TableSink> = Box::new(WorkbookSink::new(&path));
    sink.write_table(&NamedTable::new("Nested", table)).unwrap();
    sink.finish().unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("Nested").unwrap();
    assert_eq!(cell(&range, 0, 0), Data::String("a".to_string()));
    assert_eq!(cell(&range, 1, 0), Data::String("[1,2]".to_string()));
}

#[test]
fn test_workbook_without_tables_is_not_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.xlsx");

    let sink: Box<dyn TableSink> = Box::new(WorkbookSink::new(&path));
    let summary = sink.finish().unwrap();

    assert!(summary.sheets.is_empty());
    assert_eq!(summary.path, None);
    assert!(!path.exists());
}

#[test]
fn test_workbook_colliding_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dupes.xlsx");

    let mut sink: Box<dyn TableSink> = Box::new(WorkbookSink::new(&path));
    sink.write_table(&NamedTable::new("Forms", table(&[json!({"a": 1})])))
        .unwrap();
    sink.write_table(&NamedTable::new("FORMS", table(&[json!({"b": 2})])))
        .unwrap();
    let summary = sink.finish().unwrap();

    assert_eq!(summary.sheets, vec!["Forms", "FORMS~2"]);
    let workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Forms", "FORMS~2"]);
}

#[test]
fn test_workbook_rejects_too_many_columns_before_adding_sheet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wide.xlsx");
    let wide: serde_json::Map<String, Value> = (0..=MAX_WORKSHEET_COLS)
        .map(|i| (format!("c{i}"), json!(i)))
        .collect();

    let mut sink: Box<dyn TableSink> = Box::new(WorkbookSink::new(&path));
    let err = sink
        .write_table(&NamedTable::new("Wide", table(&[Value::Object(wide)])))
        .unwrap_err();
    assert!(matches!(err, Error::Output { .. }));

    sink.write_table(&NamedTable::new("Narrow", table(&[json!({"a": 1})])))
        .unwrap();
    let summary = sink.finish().unwrap();

    assert_eq!(summary.sheets, vec!["Narrow"]);
    let workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Narrow"]);
}

// ============================================================================
// JSON-lines sink
// ============================================================================

#[test]
fn test_json_lines_sink() {
    let mut buffer = Vec::new();
    {
        let mut sink = JsonLinesSink::new(&mut buffer);
        let t = table(&[json!({"a": 1, "b": null}), json!({"a": 2, "c": "x"})]);
        sink.write_table(&NamedTable::new("T", t)).unwrap();
        let summary = Box::new(sink).finish().unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.path, None);
    }

    let lines: Vec<Value> = String::from_utf8(buffer)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            json!({"sheet": "T", "row": {"a": 1, "b": null}}),
            json!({"sheet": "T", "row": {"a": 2, "c": "x"}}),
        ]
    );
}
