use crate::evaluator::RegionSummary;
use serde::{Deserialize, Serialize};

/// Number of activities of one kind with their participants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCount {
    pub count: u64,
    pub participants: u64,
    /// Participants who are friends of the community rather than members.
    pub friends: u64,
}

impl ActivityCount {
    pub fn new(count: u64, participants: u64, friends: u64) -> Self {
        ActivityCount {
            count,
            participants,
            friends,
        }
    }

    fn add(&mut self, other: &ActivityCount) {
        self.count += other.count;
        self.participants += other.participants;
        self.friends += other.friends;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NationalOverview {
    pub devotional_meetings: ActivityCount,
    pub childrens_classes: ActivityCount,
    pub junior_youth_groups: ActivityCount,
    pub study_circles: ActivityCount,
}

impl NationalOverview {
    /// Rows in display order.
    pub fn rows(&self) -> [(&'static str, ActivityCount); 4] {
        [
            ("Devotional Meetings", self.devotional_meetings),
            ("Children's Classes", self.childrens_classes),
            ("Junior Youth Groups", self.junior_youth_groups),
            ("Study Circles", self.study_circles),
        ]
    }
}

/// Core-activity figures for one region.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalActivity {
    pub id: String,
    pub region: String,
    /// Short label used on chart axes.
    #[serde(default)]
    pub abbreviation: Option<String>,
    pub childrens_classes: ActivityCount,
    pub junior_youth_groups: ActivityCount,
    pub study_circles: ActivityCount,
}

impl RegionalActivity {
    pub fn label(&self) -> &str {
        self.abbreviation.as_deref().unwrap_or(&self.region)
    }
}

pub const TOTAL_ROW_ID: &str = "total";

/// Regional rows followed by a totals row summing every field.
pub fn regional_table(rows: &[RegionalActivity]) -> Vec<RegionalActivity> {
    let mut total = RegionalActivity {
        id: TOTAL_ROW_ID.to_string(),
        region: "Total".to_string(),
        ..Default::default()
    };

    for row in rows {
        total.childrens_classes.add(&row.childrens_classes);
        total.junior_youth_groups.add(&row.junior_youth_groups);
        total.study_circles.add(&row.study_circles);
    }

    let mut table = rows.to_vec();
    table.push(total);
    table
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub label: String,
    pub childrens_classes: u64,
    pub junior_youth_groups: u64,
    pub study_circles: u64,
}

/// Activity counts per region, labelled by abbreviation where one is set.
pub fn chart_rows(rows: &[RegionalActivity]) -> Vec<ChartRow> {
    rows.iter()
        .map(|r| ChartRow {
            label: r.label().to_string(),
            childrens_classes: r.childrens_classes.count,
            junior_youth_groups: r.junior_youth_groups.count,
            study_circles: r.study_circles.count,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub participants: u64,
    pub share: f64,
}

/// Participants summed over all regions, split by activity.
///
/// Returns `None` for an empty region list. Shares are zero when nobody
/// participates.
pub fn participant_distribution(rows: &[RegionalActivity]) -> Option<Vec<DistributionSlice>> {
    if rows.is_empty() {
        return None;
    }

    let totals = [
        (
            "Children's Classes",
            rows.iter().map(|r| r.childrens_classes.participants).sum::<u64>(),
        ),
        (
            "Junior Youth Groups",
            rows.iter().map(|r| r.junior_youth_groups.participants).sum::<u64>(),
        ),
        (
            "Study Circles",
            rows.iter().map(|r| r.study_circles.participants).sum::<u64>(),
        ),
    ];
    let all: u64 = totals.iter().map(|(_, n)| n).sum();

    Some(
        totals
            .iter()
            .map(|(name, participants)| DistributionSlice {
                name: name.to_string(),
                participants: *participants,
                share: if all == 0 {
                    0.0
                } else {
                    *participants as f64 / all as f64
                },
            })
            .collect(),
    )
}

/// Nested cluster counts shown as the milestone funnel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneFunnel {
    pub total_clusters: usize,
    /// PG or higher.
    pub programme_of_growth: usize,
    /// IPG-, IPG or IPG+.
    pub intensive_programme: usize,
    /// IPG+.
    pub embracing_large_numbers: usize,
}

impl MilestoneFunnel {
    pub fn cards(&self) -> [(&'static str, usize); 4] {
        [
            ("Total No. of Clusters", self.total_clusters),
            (
                "No. of Clusters with a Programme of Growth",
                self.programme_of_growth,
            ),
            (
                "No. of Clusters with an Intensive Programme of Growth",
                self.intensive_programme,
            ),
            (
                "No. of Clusters where the Pattern of Activity Embraces Large Numbers",
                self.embracing_large_numbers,
            ),
        ]
    }
}

pub fn milestone_funnel(summaries: &[RegionSummary]) -> MilestoneFunnel {
    let mut national = RegionSummary::default();
    for summary in summaries {
        national.merge(summary);
    }

    MilestoneFunnel {
        total_clusters: national.total,
        programme_of_growth: national.classified(),
        intensive_programme: national.ipg + national.ipg_plus,
        embracing_large_numbers: national.ipg_plus,
    }
}
