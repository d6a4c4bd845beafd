mod common;

use common::sample_dataset;
use dashboard::activity::{
    ActivityCount, MilestoneFunnel, RegionalActivity, TOTAL_ROW_ID, chart_rows, milestone_funnel,
    participant_distribution, regional_table,
};
use dashboard::evaluator::RegionSummary;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} but got {}",
        expected,
        actual
    );
}

#[test]
fn regional_table_appends_totals() {
    let data = sample_dataset();
    let table = data.regional_table();

    assert_eq!(table.len(), 5);
    let total = table.last().unwrap();
    assert_eq!(total.id, TOTAL_ROW_ID);
    assert_eq!(total.childrens_classes, ActivityCount::new(415, 4513, 3316));
    assert_eq!(total.junior_youth_groups, ActivityCount::new(180, 1044, 745));
    assert_eq!(total.study_circles, ActivityCount::new(589, 2611, 649));
}

#[test]
fn regional_table_of_nothing_is_a_zero_total() {
    let table = regional_table(&[]);
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].study_circles, ActivityCount::default());
}

#[test]
fn distribution_shares_sum_to_one() {
    let data = sample_dataset();
    let slices = participant_distribution(&data.regional_activity).unwrap();

    let names: Vec<&str> = slices.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Children's Classes", "Junior Youth Groups", "Study Circles"]
    );
    assert_eq!(slices[0].participants, 4513);
    assert_close(slices[0].share, 4513.0 / 8168.0);
    assert_close(slices.iter().map(|s| s.share).sum(), 1.0);
}

#[test]
fn distribution_handles_empty_and_idle_regions() {
    assert!(participant_distribution(&[]).is_none());

    let idle = RegionalActivity {
        id: "R".to_string(),
        region: "Quiet".to_string(),
        ..Default::default()
    };
    let slices = participant_distribution(&[idle]).unwrap();
    assert!(slices.iter().all(|s| s.share == 0.0));
}

#[test]
fn chart_labels_prefer_abbreviations() {
    let data = sample_dataset();
    let mut rows = data.regional_activity.clone();
    rows[0].abbreviation = None;

    let chart = chart_rows(&rows);
    assert_eq!(chart[0].label, "New South Wales and Australian Capital Territory");
    assert_eq!(chart[3].label, "WCA");
    assert_eq!(chart[3].study_circles, 239);
}

#[test]
fn funnel_is_nested() {
    let data = sample_dataset();
    let funnel = data.funnel();

    assert_eq!(
        funnel,
        MilestoneFunnel {
            total_clusters: 17,
            programme_of_growth: 14,
            intensive_programme: 9,
            embracing_large_numbers: 4,
        }
    );
    assert!(funnel.total_clusters >= funnel.programme_of_growth);
    assert!(funnel.programme_of_growth >= funnel.intensive_programme);
    assert!(funnel.intensive_programme >= funnel.embracing_large_numbers);
    assert_eq!(funnel.cards()[0], ("Total No. of Clusters", 17));
}

#[test]
fn funnel_of_single_summary() {
    let summary = RegionSummary {
        ipg_plus: 1,
        ipg: 2,
        pg: 3,
        total: 10,
    };
    let funnel = milestone_funnel(&[summary]);
    assert_eq!(funnel.programme_of_growth, 6);
    assert_eq!(funnel.intensive_programme, 3);
}

#[test]
fn national_rows_keep_display_order() {
    let data = sample_dataset();
    let rows = data.national.rows();
    assert_eq!(rows[0].0, "Devotional Meetings");
    assert_eq!(rows[0].1, ActivityCount::new(1948, 11445, 3133));
    assert_eq!(rows[3].0, "Study Circles");
}
