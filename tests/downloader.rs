mod common;

use common::sample_dataset;
use dashboard::downloader::{forecast_to_csv, regional_to_csv, summaries_to_csv};
use dashboard::evaluator::PeriodAlignment;

#[test]
fn forecast_csv_has_three_columns_per_period() {
    let data = sample_dataset();
    let nsw = data.region("NSW_ACT").unwrap();
    let csv = forecast_to_csv(&[data.forecast_table(nsw, 3..4, PeriodAlignment::IndexDoubling)]);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines[0],
        "Region,Grouping,Cluster,2024-H1 actual,2024-H1 forecast,2024-H1 verdict"
    );
    assert_eq!(
        lines[1],
        "New South Wales and Australian Capital Territory,Sydney Metropolitan,Sydney,IPG+,IPG,Met"
    );
    assert_eq!(
        lines[5],
        "New South Wales and Australian Capital Territory,Regional NSW and ACT,Dubbo,Opened,PG,Missed"
    );
    assert_eq!(lines.len(), 6);
}

#[test]
fn forecast_csv_leaves_absent_cells_empty() {
    let data = sample_dataset();
    let ne = data.region("NE_AU").unwrap();
    let csv = forecast_to_csv(&[data.forecast_table(ne, 0..1, PeriodAlignment::IndexDoubling)]);

    assert!(csv.lines().any(|l| l == "North Eastern Australia,North Queensland,Cairns,,,"));
}

#[test]
fn regional_csv_ends_with_totals() {
    let data = sample_dataset();
    let csv = regional_to_csv(&data.regional_activity);
    let lines: Vec<&str> = csv.lines().collect();

    assert!(lines[0].starts_with("Region,CC No.,CC Participants"));
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[5], "Total,415,4513,3316,180,1044,745,589,2611,649");
}

#[test]
fn summaries_csv_counts_other_clusters() {
    let data = sample_dataset();
    let csv = summaries_to_csv(&data.summaries());
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "Region,IPG+,IPG,PG,Other,Total");
    assert_eq!(
        lines[1],
        "New South Wales and Australian Capital Territory,1,2,1,1,5"
    );
    assert_eq!(lines[2], "North Eastern Australia,1,1,2,0,4");
}
