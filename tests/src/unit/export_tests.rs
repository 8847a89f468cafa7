use dwgpt_core::export::{encode_records, export_as_delimited_text};
use dwgpt_tests::{record, sample_shipments};
use serde_json::json;

#[test]
fn exported_shipments_decode_to_the_same_values() {
    let records = sample_shipments();
    let encoded = encode_records(&records).expect("records to encode");

    let mut reader = csv::Reader::from_reader(encoded.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(
        headers,
        vec!["shipment_no", "pol", "pod", "carrier", "eta", "remarks"]
    );

    for (row, original) in reader.records().zip(&records) {
        let row = row.unwrap();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let expected = original[header.as_str()].as_str().unwrap_or("");
            assert_eq!(cell, expected, "column {header}");
        }
    }
}

#[test]
fn quoting_example_matches_exactly() {
    let records = vec![record(json!({ "a": "x,y", "b": "He said \"hi\"" }))];
    let export = export_as_delimited_text(&records).unwrap();
    let mut lines = export.contents.lines();
    assert_eq!(lines.next(), Some("a,b"));
    assert_eq!(lines.next(), Some("\"x,y\",\"He said \"\"hi\"\"\""));
    assert!(export.file_name.starts_with("data_export_"));
    assert!(export.file_name.ends_with(".csv"));
}

#[test]
fn export_file_lands_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let export = export_as_delimited_text(&sample_shipments()).unwrap();
    let path = export.write_to(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap().to_str(), Some(export.file_name.as_str()));
    assert_eq!(std::fs::read_to_string(path).unwrap(), export.contents);
}
