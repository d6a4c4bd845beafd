mod common;

use common::{sample_path, stages};
use dashboard::config::DashboardConfig;
use dashboard::error::DashboardError;
use dashboard::loader::{forecast_from_csv, from_csv, from_json, load_configured, load_dataset};
use dashboard::milestone::MilestoneStage;
use std::fs;
use tempfile::tempdir;

const HISTORY_CSV: &str = "\
region,grouping,cluster,2023-H1,2023-H2,2024-H1
Victoria and Tasmania,Greater Melbourne,Melbourne,IPG,IPG,IPG+
Victoria and Tasmania,Tasmania,Hobart,PG,,PG
\"Western and Central Australia\",\"Perth, Metro\",Perth,IPG-,IPG,IPG

Victoria and Tasmania,Greater Melbourne,Geelong,PG,IPG-
";

#[test]
fn sample_dataset_loads_and_validates() {
    let data = from_json(sample_path()).unwrap();
    assert_eq!(data.regions.len(), 4);
    assert_eq!(data.cluster_count(), 17);
    assert_eq!(data.history_periods.len(), 8);
    assert_eq!(data.forecast.periods.len(), 4);
    assert!(data.forecast.series_for("Cairns").is_none());
    assert_eq!(data.regional_activity[1].label(), "NEA");
}

#[test]
fn history_csv_keeps_first_seen_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");
    fs::write(&path, HISTORY_CSV).unwrap();

    let data = from_csv(&path).unwrap();
    assert_eq!(data.history_periods, vec!["2023-H1", "2023-H2", "2024-H1"]);

    let ids: Vec<&str> = data.regions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["VICTORIA_AND_TASMANIA", "WESTERN_AND_CENTRAL_AUSTRALIA"]);

    let vic = &data.regions[0];
    assert_eq!(vic.groupings.len(), 2);
    let melbourne: Vec<&str> = vic.groupings[0].clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(melbourne, vec!["Melbourne", "Geelong"]);

    assert_eq!(vic.find_cluster("Hobart").unwrap().milestones, stages(&["PG", "-", "PG"]));
    assert_eq!(vic.find_cluster("Geelong").unwrap().latest(), None);
    assert_eq!(data.regions[1].groupings[0].name, "Perth, Metro");
}

#[test]
fn forecast_csv_replaces_dataset_forecast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast.csv");
    fs::write(&path, "cluster,2024-H1,2025-H1\nSydney,IPG+,IPG+\nDubbo,null,PG\n").unwrap();

    let forecast = forecast_from_csv(&path).unwrap();
    assert_eq!(forecast.periods, vec!["2024-H1", "2025-H1"]);
    assert_eq!(forecast.value_at("Dubbo", 0), None);
    assert_eq!(forecast.value_at("Dubbo", 1), Some(MilestoneStage::Pg));

    let config = DashboardConfig {
        data_path: sample_path(),
        forecast_path: Some(path),
        ..Default::default()
    };
    let data = load_configured(&config).unwrap();
    assert_eq!(data.forecast.series.len(), 2);
    assert_eq!(data.regions.len(), 4);
}

#[test]
fn duplicate_cluster_in_region_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dup.json");
    fs::write(
        &path,
        r#"{
            "regions": [{
                "id": "R", "name": "Region",
                "groupings": [
                    { "name": "A", "clusters": [{ "name": "Same", "milestones": ["PG"] }] },
                    { "name": "B", "clusters": [{ "name": "Same", "milestones": ["IPG"] }] }
                ]
            }]
        }"#,
    )
    .unwrap();

    assert!(matches!(from_json(&path), Err(DashboardError::Validation(_))));
}

#[test]
fn ragged_histories_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ragged.json");
    fs::write(
        &path,
        r#"{
            "history_periods": ["2023", "2024"],
            "regions": [{
                "id": "R", "name": "Region",
                "groupings": [{ "name": "A", "clusters": [{ "name": "Short", "milestones": ["PG"] }] }]
            }]
        }"#,
    )
    .unwrap();

    assert!(matches!(from_json(&path), Err(DashboardError::Validation(_))));
}

#[test]
fn forecast_series_must_span_the_axis() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast.json");
    fs::write(
        &path,
        r#"{ "forecast": { "periods": ["2024", "2025"], "series": { "Perth": ["IPG+"] } } }"#,
    )
    .unwrap();

    assert!(matches!(from_json(&path), Err(DashboardError::Validation(_))));
}

#[test]
fn unknown_extension_is_unsupported() {
    assert!(matches!(
        load_dataset("regions.txt"),
        Err(DashboardError::UnsupportedFormat(ext)) if ext == "txt"
    ));
    assert!(matches!(
        load_dataset("regions"),
        Err(DashboardError::UnsupportedFormat(_))
    ));
}

#[test]
fn empty_and_malformed_files_report_errors() {
    let dir = tempdir().unwrap();

    let empty = dir.path().join("empty.csv");
    fs::write(&empty, "").unwrap();
    assert!(matches!(from_csv(&empty), Err(DashboardError::Csv { .. })));

    let broken = dir.path().join("broken.csv");
    fs::write(&broken, "region,grouping,cluster,2024\nR,G,\"Open,PG\n").unwrap();
    assert!(matches!(
        from_csv(&broken),
        Err(DashboardError::Csv { line: 2, .. })
    ));

    let bad_json = dir.path().join("bad.json");
    fs::write(&bad_json, "{ not json").unwrap();
    assert!(matches!(load_dataset(&bad_json), Err(DashboardError::Json(_))));

    assert!(matches!(
        load_dataset(dir.path().join("missing.json")),
        Err(DashboardError::Io(_))
    ));
}
