mod common;

use std::fs;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use common::{ACCEPTED_PASSWORD, StubService, records};
use crm_lookup_tools::LookupError;
use crm_lookup_tools::flatten::{Table, flatten};
use crm_lookup_tools::io::excel_write::RESULTS_SHEET;
use crm_lookup_tools::io::{ExportFormat, export_table};
use crm_lookup_tools::model::{Credentials, RecordSet};
use crm_lookup_tools::query::{QueryKind, SearchTerms};
use crm_lookup_tools::session::LoginMode;
use crm_lookup_tools::workspace::Workspace;
use serde_json::json;
use tempfile::tempdir;

fn sample_table() -> Table {
    flatten(&RecordSet::new(records(vec![
        json!({
            "attributes": {"type": "Sales_Request__c"},
            "Name": "SRQ-100",
            "SRQ_Status__c": "Open",
            "Fiber_Costs__c": 2400.5,
            "Address__c": "12 \"Quoted\" Way, Unit 3"
        }),
        json!({
            "attributes": {"type": "Sales_Request__c"},
            "Name": "SRQ-101",
            "Assigned_To__c": null,
            "Fiber_Costs__c": 0
        }),
    ])))
}

fn read_sheet(path: &std::path::Path) -> calamine::Range<DataType> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opened");
    workbook
        .worksheet_range(RESULTS_SHEET)
        .expect("results sheet present")
        .expect("results sheet read")
}

#[test]
fn csv_export_writes_header_and_rows_in_table_order() {
    let table = sample_table();
    let temp_dir = tempdir().expect("temporary directory");
    let csv_path = temp_dir.path().join("requests.csv");

    export_table(&table, &csv_path, ExportFormat::Csv).expect("CSV written");

    let mut reader = csv::Reader::from_path(&csv_path).expect("CSV opened");
    let headers: Vec<String> = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(
        headers,
        ["Name", "SRQ_Status__c", "Fiber_Costs__c", "Address__c", "Assigned_To__c"]
    );

    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|record| {
            record
                .expect("row parsed")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    assert_eq!(
        rows,
        [
            vec!["SRQ-100", "Open", "2400.5", "12 \"Quoted\" Way, Unit 3", ""],
            vec!["SRQ-101", "", "0", "", ""],
        ]
    );
}

#[test]
fn empty_table_exports_header_only() {
    let table = Table::new(vec!["Name".to_string(), "Address__c".to_string()], Vec::new());
    let temp_dir = tempdir().expect("temporary directory");

    let csv_path = temp_dir.path().join("empty.csv");
    export_table(&table, &csv_path, ExportFormat::Csv).expect("CSV written");
    assert_eq!(fs::read_to_string(&csv_path).expect("CSV read"), "Name,Address__c\n");

    let xlsx_path = temp_dir.path().join("empty.xlsx");
    export_table(&table, &xlsx_path, ExportFormat::Xlsx).expect("Excel written");
    let range = read_sheet(&xlsx_path);
    assert_eq!(range.height(), 1);
    assert_eq!(range.get((0, 1)), Some(&DataType::String("Address__c".to_string())));
}

#[test]
fn table_without_columns_exports_empty_csv() {
    let temp_dir = tempdir().expect("temporary directory");
    let csv_path = temp_dir.path().join("nothing.csv");

    export_table(&Table::default(), &csv_path, ExportFormat::Csv).expect("CSV written");

    assert_eq!(fs::read_to_string(&csv_path).expect("CSV read"), "");
}

#[test]
fn excel_export_keeps_types_and_blanks() {
    let table = sample_table();
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("requests.xlsx");

    export_table(&table, &xlsx_path, ExportFormat::Xlsx).expect("Excel written");

    let range = read_sheet(&xlsx_path);
    assert_eq!(range.height(), 3);
    assert_eq!(range.get((0, 0)), Some(&DataType::String("Name".to_string())));
    assert_eq!(range.get((1, 0)), Some(&DataType::String("SRQ-100".to_string())));
    assert_eq!(range.get((1, 2)), Some(&DataType::Float(2400.5)));
    assert_eq!(range.get((2, 1)), Some(&DataType::Empty));
    assert_eq!(range.get((2, 2)), Some(&DataType::Float(0.0)));
}

#[test]
fn write_failure_is_reported_and_table_is_kept() {
    let service = StubService::with_records(vec![json!({"Name": "CON-1"})]);
    let mut workspace = Workspace::new(service);
    workspace
        .login(LoginMode::Credentials(Credentials {
            username: "dana@acme.test".to_string(),
            password: ACCEPTED_PASSWORD.to_string(),
            security_token: String::new(),
        }))
        .expect("logged in");
    workspace
        .run_query(QueryKind::PartQuoteRequest, &SearchTerms::new("Elm", ""))
        .expect("query ran");

    let temp_dir = tempdir().expect("temporary directory");
    let unreachable = temp_dir.path().join("missing-dir").join("out.csv");
    let error = workspace
        .export(&unreachable, ExportFormat::Csv)
        .expect_err("directory does not exist");

    match error {
        LookupError::ExportWrite { path, .. } => assert_eq!(path, unreachable),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(workspace.table().expect("table kept").len(), 1);
    assert!(workspace.session().is_some());
}

#[test]
fn export_before_any_query_is_rejected() {
    let workspace = Workspace::new(StubService::default());
    let temp_dir = tempdir().expect("temporary directory");

    let error = workspace
        .export(&temp_dir.path().join("out.xlsx"), ExportFormat::Xlsx)
        .expect_err("nothing to export");

    assert!(matches!(error, LookupError::NothingToExport));
}
