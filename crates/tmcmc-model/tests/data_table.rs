use std::fs;

use tempfile::tempdir;
use tmcmc_core::TmcmcError;
use tmcmc_model::ObservedData;

#[test]
fn parses_two_column_tables_with_comments() {
    let data = ObservedData::parse("# x y\n1 2\n\n2.5 5e0 7\n").unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data.iter().collect::<Vec<_>>(), vec![(1.0, 2.0), (2.5, 5.0)]);
}

#[test]
fn non_numeric_cells_are_rejected() {
    let err = ObservedData::parse("1 2\n2 two\n").unwrap_err();
    assert_eq!(err.info().code, "data-parse");
    assert_eq!(err.info().context.get("line").map(String::as_str), Some("2"));
}

#[test]
fn single_column_rows_are_rejected_with_line_number() {
    let err = ObservedData::parse("1 2\n3\n").unwrap_err();
    assert!(matches!(err, TmcmcError::Data(_)));
    assert_eq!(err.info().code, "data-columns");
    assert_eq!(err.info().context.get("line").map(String::as_str), Some("2"));
}

#[test]
fn empty_tables_are_rejected() {
    let err = ObservedData::parse("# nothing here\n").unwrap_err();
    assert_eq!(err.info().code, "data-empty");
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.txt");
    let err = ObservedData::load(&path).unwrap_err();
    assert_eq!(err.info().code, "data-read");
    assert!(err.info().context["path"].ends_with("missing.txt"));
}

#[test]
fn loads_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.txt");
    fs::write(&path, "0 0\n1 2\n2 4\n").unwrap();
    let data = ObservedData::load(&path).unwrap();
    assert_eq!(data.len(), 3);
}
