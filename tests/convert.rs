//! End-to-end conversion tests over scratch diagnostics files.

use marbl_diag_table::convert::{diagnostics_to_diag_table, load_two_dim_vars};
use marbl_diag_table::table::VertGrid;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_input(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("ecosys_diagnostics");
    fs::write(&path, content).expect("write input");
    path
}

fn convert(
    input: &Path,
    output: &Path,
    two_dim: &[&str],
    vert_grid: VertGrid,
    output_all: bool,
    output_alt_co2: bool,
) -> anyhow::Result<()> {
    let two_dim: BTreeSet<String> = two_dim.iter().map(|s| s.to_string()).collect();
    diagnostics_to_diag_table(input, output, &two_dim, vert_grid, output_all, output_alt_co2)
}

fn read_doc(path: &Path) -> Value {
    let content = fs::read_to_string(path).expect("read output");
    serde_json::from_str(&content).expect("valid JSON")
}

#[test]
fn groups_variables_by_tier_and_grid() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "# MARBL diagnostics\n\
         FG_CO2 : medium_mean\n\
         O2 : low_mean, high_inst\n\
         PO4 : never_mean\n",
    );
    let output = dir.path().join("diag_table.json");

    convert(&input, &output, &["FG_CO2"], VertGrid::Both, false, false).unwrap();
    let doc = read_doc(&output);

    let files = doc["Files"].as_object().unwrap();
    assert_eq!(files["medium"]["fields"][0]["lists"][0], json!(["FG_CO2"]));
    assert_eq!(files["low_z"]["fields"][0]["lists"][0], json!(["O2"]));
    assert_eq!(files["low_native_z"]["fields"][0]["lists"][0], json!(["O2"]));
    assert_eq!(files["high_z"]["fields"][0]["lists"][0], json!(["O2"]));

    // Tiers nothing was assigned to are omitted entirely.
    assert!(!files.contains_key("low"));
    assert!(!files.contains_key("high"));
    assert!(!files.contains_key("medium_z"));
    assert!(!files.contains_key("medium_native_z"));
}

#[test]
fn native_grid_3d_streams_carry_transports() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "O2 : medium_mean\n");
    let output = dir.path().join("diag_table.json");

    convert(&input, &output, &[], VertGrid::Native, false, false).unwrap();
    let doc = read_doc(&output);

    let lists = &doc["Files"]["medium_native_z"]["fields"][0]["lists"];
    assert_eq!(lists[0], json!(["O2"]));
    assert_eq!(
        lists[1],
        json!(["volcello", "vmo", "vhGM", "vhml", "umo", "uhGM", "uhml"])
    );
    assert_eq!(
        doc["Files"]["medium_native_z"]["fields"][0]["module"],
        json!("ocean_model")
    );
}

#[test]
fn interpolated_3d_streams_do_not_carry_transports() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "O2 : medium_mean\n");
    let output = dir.path().join("diag_table.json");

    convert(&input, &output, &[], VertGrid::Interpolated, false, false).unwrap();
    let doc = read_doc(&output);

    let lists = doc["Files"]["medium_z"]["fields"][0]["lists"]
        .as_array()
        .unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(
        doc["Files"]["medium_z"]["fields"][0]["module"],
        json!("ocean_model_z")
    );
}

#[test]
fn output_all_places_everything_in_medium() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "FG_CO2 : low_mean\nSTF_O2 : never_inst\n");
    let output = dir.path().join("diag_table.json");

    convert(
        &input,
        &output,
        &["FG_CO2", "STF_O2"],
        VertGrid::Native,
        true,
        false,
    )
    .unwrap();
    let doc = read_doc(&output);

    let files = doc["Files"].as_object().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(
        files["medium"]["fields"][0]["lists"][0],
        json!(["FG_CO2", "STF_O2"])
    );
}

#[test]
fn alt_co2_variables_are_gated() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "FG_ALT_CO2 : medium_mean\nFG_CO2 : medium_mean\n");
    let output = dir.path().join("diag_table.json");

    convert(&input, &output, &["FG_ALT_CO2", "FG_CO2"], VertGrid::Native, false, false).unwrap();
    let doc = read_doc(&output);
    assert_eq!(
        doc["Files"]["medium"]["fields"][0]["lists"][0],
        json!(["FG_CO2"])
    );

    convert(&input, &output, &["FG_ALT_CO2", "FG_CO2"], VertGrid::Native, false, true).unwrap();
    let doc = read_doc(&output);
    assert_eq!(
        doc["Files"]["medium"]["fields"][0]["lists"][0],
        json!(["FG_ALT_CO2", "FG_CO2"])
    );
}

#[test]
fn duplicate_frequency_declaration_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "BAR : low_mean\nBAR : low_max\n");
    let output = dir.path().join("diag_table.json");

    let err = convert(&input, &output, &[], VertGrid::Native, false, false).unwrap_err();
    assert!(err.to_string().contains("BAR"), "{err}");
    assert!(err.to_string().contains("low"), "{err}");
    assert!(!output.exists());
}

#[test]
fn same_variable_at_different_frequencies_is_fine() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "BAR : low_mean\nBAR : high_inst\n");
    let output = dir.path().join("diag_table.json");

    convert(&input, &output, &["BAR"], VertGrid::Native, false, false).unwrap();
    let doc = read_doc(&output);
    assert_eq!(doc["Files"]["low"]["fields"][0]["lists"][0], json!(["BAR"]));
    assert_eq!(doc["Files"]["high"]["fields"][0]["lists"][0], json!(["BAR"]));
}

#[test]
fn malformed_line_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "FOO low_mean\n");
    let output = dir.path().join("diag_table.json");

    assert!(convert(&input, &output, &[], VertGrid::Native, false, false).is_err());
    assert!(!output.exists());
}

#[test]
fn missing_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("no_such_file");
    let output = dir.path().join("diag_table.json");

    assert!(convert(&input, &output, &[], VertGrid::Native, false, false).is_err());
    assert!(!output.exists());
}

#[test]
fn empty_selection_writes_no_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "# nothing requested\nFOO : never_mean\n");
    let output = dir.path().join("diag_table.json");

    convert(&input, &output, &["FOO"], VertGrid::Both, false, false).unwrap();
    assert!(!output.exists());
}

#[test]
fn tiers_and_keys_serialize_in_declared_order() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "A : medium_mean\nB : high_inst\nC : low_mean\n",
    );
    let output = dir.path().join("diag_table.json");

    convert(&input, &output, &["A", "B", "C"], VertGrid::Native, false, false).unwrap();
    let text = fs::read_to_string(&output).unwrap();

    let medium = text.find("\"medium\"").unwrap();
    let high = text.find("\"high\"").unwrap();
    let low = text.find("\"low\"").unwrap();
    assert!(medium < high && high < low, "{text}");

    // Condition expressions pass through untouched.
    assert!(text.contains("$OCN_DIAG_MODE == \\\"spinup\\\""), "{text}");
    assert!(text.contains("$TEST == True"), "{text}");

    // The consuming reader expects 3-space indentation.
    assert!(text.contains("{\n   \"Files\""), "{text}");
}

#[test]
fn two_dim_list_file_parses_like_the_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("marbl_diag2d_list");
    fs::write(&path, "# 2D fields\nFG_CO2\n  STF_O2  # gas flux\n\n").unwrap();

    let names = load_two_dim_vars(&path).unwrap();
    let expected: BTreeSet<String> =
        ["FG_CO2", "STF_O2"].iter().map(|s| s.to_string()).collect();
    assert_eq!(names, expected);
}
