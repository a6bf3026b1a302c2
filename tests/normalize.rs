mod common;

use kpi_dashboard::{
    dimension::{Dimension, UNKNOWN},
    normalize::normalize,
    snapshot::Snapshot,
    source::{CsvSource, RawCell, RawTable, RowSource, XlsxSource},
};

use common::{PLAN_WORKBOOK, TestWorkspace, fixture_path, plan_snapshot};

fn metric_headers() -> Vec<String> {
    ["TEIKEN", "UITSET", "% BEHAAL", "PROVINSIE"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

#[test]
fn every_dimension_is_filled_after_normalization() {
    let snapshot = plan_snapshot();
    assert_eq!(snapshot.len(), 6);
    for record in snapshot.records() {
        for dimension in Dimension::ALL {
            let value = record.dimension(dimension);
            assert!(!value.trim().is_empty(), "{dimension} empty in {record:?}");
        }
        for value in [record.target, record.output, record.achievement_pct]
            .into_iter()
            .flatten()
        {
            assert!(value.is_finite());
        }
    }
}

#[test]
fn blank_and_whitespace_categories_become_unknown() {
    let snapshot = plan_snapshot();
    let reading_club = &snapshot.records()[4];
    assert_eq!(reading_club.description, "Reading club");
    assert_eq!(reading_club.province, UNKNOWN);
    assert_eq!(reading_club.district, UNKNOWN);
    assert_eq!(reading_club.region, "Wes");
}

#[test]
fn unparseable_numbers_are_missing_and_rows_are_kept() {
    let snapshot = plan_snapshot();
    let pipes = &snapshot.records()[1];
    assert_eq!(pipes.target, Some(50.0));
    assert_eq!(pipes.output, None);
    assert_eq!(pipes.achievement_pct, None);

    let report = snapshot.report();
    assert_eq!(report.rows, 6);
    assert_eq!(report.missing_output, 1);
    assert_eq!(report.missing_achievement, 1);
    assert_eq!(report.missing_target, 0);
    assert_eq!(report.unknown_fills, 2);
}

#[test]
fn numeric_cells_and_short_rows_are_handled() {
    let table = RawTable::new("sheet", metric_headers())
        .with_row([RawCell::Number(10.0), RawCell::Number(5.0), RawCell::Number(50.0), RawCell::Number(7.0)])
        .with_row([RawCell::text("12")]);
    let normalized = normalize(&table).expect("normalize");
    let first = &normalized.records[0];
    assert_eq!(first.achievement_pct, Some(50.0));
    assert_eq!(first.province, "7");

    let short = &normalized.records[1];
    assert_eq!(short.target, Some(12.0));
    assert_eq!(short.output, None);
    assert_eq!(short.province, UNKNOWN);
    assert_eq!(short.quarter, UNKNOWN);
}

#[test]
fn input_table_is_not_mutated() {
    let table = RawTable::new("sheet", metric_headers()).with_row(["1", " ", "x", ""]);
    let before = table.clone();
    normalize(&table).expect("normalize");
    assert_eq!(table, before);
}

#[test]
fn missing_metric_column_is_source_unavailable() {
    let table = RawTable::new("sheet", vec!["TEIKEN".into(), "UITSET".into()]).with_row(["1", "2"]);
    let err = normalize(&table).unwrap_err();
    assert!(err.is_source_unavailable());
    assert!(err.to_string().contains("achievement_pct"));
}

#[test]
fn missing_dimension_column_fills_unknown() {
    let table = RawTable::new("sheet", metric_headers()).with_row(["1", "2", "3", "Gauteng"]);
    let normalized = normalize(&table).expect("normalize");
    assert_eq!(normalized.records[0].province, "Gauteng");
    assert_eq!(normalized.records[0].pillar, UNKNOWN);
}

#[test]
fn unreadable_csv_is_source_unavailable() {
    let workspace = TestWorkspace::new();
    let missing = CsvSource::new(workspace.path().join("absent.csv"));
    let err = missing.load().unwrap_err();
    assert!(err.is_source_unavailable());

    let empty = CsvSource::new(workspace.write("empty.csv", ""));
    assert!(empty.load().unwrap_err().is_source_unavailable());
}

#[test]
fn tab_separated_sources_resolve_their_delimiter() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "plan.tsv",
        "target\toutput\tachievement_pct\tprovince\n10\t8\t80\tGauteng\n",
    );
    let table = CsvSource::new(path).load().expect("load tsv");
    let normalized = normalize(&table).expect("normalize");
    assert_eq!(normalized.records[0].province, "Gauteng");
    assert_eq!(normalized.records[0].achievement_pct, Some(80.0));
}

#[test]
fn undecodable_data_cells_keep_their_row() {
    let workspace = TestWorkspace::new();
    let mut contents = b"description,target,output,achievement_pct,province\n".to_vec();
    contents.extend_from_slice(b"Borehole repairs,100,80,80,Gauteng\n");
    contents.extend_from_slice(b"Skool\xEA desks,200,190,95,Limpopo\n");
    let path = workspace.write_bytes("latin1.csv", &contents);

    let snapshot = Snapshot::load(&CsvSource::new(path)).expect("lossy cells do not abort the load");
    assert_eq!(snapshot.len(), 2);
    let desks = &snapshot.records()[1];
    assert_eq!(desks.description, "Skool\u{FFFD} desks");
    assert_eq!(desks.province, "Limpopo");
    assert_eq!(desks.achievement_pct, Some(95.0));
    assert_eq!(snapshot.report().lossy_cells, 1);
}

#[test]
fn undecodable_header_is_source_unavailable() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("bad_header.csv", b"target,out\xEAput,achievement_pct\n1,2,3\n");
    let err = CsvSource::new(path).load().unwrap_err();
    assert!(err.is_source_unavailable());
    assert!(err.to_string().contains("header row"));
}

#[test]
fn workbook_sheet_matches_the_csv_fixture() {
    let workbook = Snapshot::load(&XlsxSource::new(fixture_path(PLAN_WORKBOOK))).expect("load workbook");
    let csv = plan_snapshot();
    assert_eq!(workbook.len(), 6);
    assert_eq!(workbook.records(), csv.records());
    assert_eq!(workbook.report().missing_achievement, 1);
    assert_eq!(workbook.report().unknown_fills, 2);
}

#[test]
fn missing_sheet_is_source_unavailable() {
    let source = XlsxSource::new(fixture_path(PLAN_WORKBOOK)).with_sheet("2025 BEPLANNING");
    let err = source.load().unwrap_err();
    assert!(err.is_source_unavailable());
    assert!(err.to_string().contains("sheet '2025 BEPLANNING' not found"));
}

#[test]
fn sheet_without_metric_columns_is_rejected() {
    let source = XlsxSource::new(fixture_path(PLAN_WORKBOOK)).with_sheet("Notas");
    let err = Snapshot::load(&source).unwrap_err();
    assert!(err.is_source_unavailable());
    assert!(err.to_string().contains("missing required column 'target'"));
}

#[test]
fn unreadable_workbook_is_source_unavailable() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("broken.xlsx", "not a zip archive");
    let err = XlsxSource::new(path).load().unwrap_err();
    assert!(err.is_source_unavailable());
    assert!(err.to_string().contains("cannot open workbook"));
}
