//! Milestone evaluation: latest-stage summaries per region and
//! actual-versus-forecast verdicts per cluster and period.
//!
//! Every function here is pure and total. Absent data yields absent
//! verdicts, never errors.

use crate::milestone::{Forecast, MilestoneStage, PeriodKey, Region, StageBucket};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Outcome of comparing an actual stage with the forecast for the same period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Met,
    Missed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Met => f.write_str("Met"),
            Verdict::Missed => f.write_str("Missed"),
        }
    }
}

/// Counts of clusters by the bucket of their latest milestone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    #[serde(rename = "IPG+")]
    pub ipg_plus: usize,
    /// IPG and IPG- combined.
    #[serde(rename = "IPG")]
    pub ipg: usize,
    #[serde(rename = "PG")]
    pub pg: usize,
    pub total: usize,
}

impl RegionSummary {
    /// Clusters counted in one of the three buckets.
    pub fn classified(&self) -> usize {
        self.ipg_plus + self.ipg + self.pg
    }

    /// Clusters whose latest milestone is absent, Unopened, Opened or unrecognized.
    pub fn unclassified(&self) -> usize {
        self.total - self.classified()
    }

    /// Adds another summary's counts into this one.
    pub fn merge(&mut self, other: &RegionSummary) {
        self.ipg_plus += other.ipg_plus;
        self.ipg += other.ipg;
        self.pg += other.pg;
        self.total += other.total;
    }
}

/// Summarizes a region by the latest observed milestone of each cluster
///
/// # Arguments
/// * `region` - The region whose clusters are counted, across all groupings
///
/// # Returns
/// * A `RegionSummary` whose `total` equals the region's cluster count. A
///   cluster whose latest milestone is absent, `Unopened`, `Opened` or
///   unrecognized counts toward `total` only.
pub fn summarize_region(region: &Region) -> RegionSummary {
    let mut summary = RegionSummary::default();

    for (_, cluster) in region.clusters() {
        summary.total += 1;
        match cluster.latest().and_then(|stage| stage.bucket()) {
            Some(StageBucket::IpgPlus) => summary.ipg_plus += 1,
            Some(StageBucket::Ipg) => summary.ipg += 1,
            Some(StageBucket::Pg) => summary.pg += 1,
            None => {}
        }
    }

    summary
}

/// Compares an actual stage with a forecast stage.
///
/// An `Unopened` forecast is met by any reported stage. An `Opened` forecast
/// is met by anything except `Unopened`. Otherwise the actual rank must be at
/// least the forecast rank, with `IPG-` and `IPG` tied.
///
/// # Arguments
/// * `actual` - Stage observed at the period, if reported
/// * `forecast` - Stage expected at the period, if forecast
///
/// # Returns
/// * `None` when either side is absent, otherwise the verdict
pub fn evaluate_forecast(
    actual: Option<MilestoneStage>,
    forecast: Option<MilestoneStage>,
) -> Option<Verdict> {
    let (actual, forecast) = (actual?, forecast?);

    let met = match forecast {
        MilestoneStage::Unopened => true,
        MilestoneStage::Opened => actual != MilestoneStage::Unopened,
        _ => actual.rank() >= forecast.rank(),
    };

    Some(if met { Verdict::Met } else { Verdict::Missed })
}

/// How forecast periods are matched to historical periods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodAlignment {
    /// Forecast index `i` reads history index `2 * i`. The history is sampled
    /// twice as often as the forecast; this silently desyncs if that changes.
    #[default]
    IndexDoubling,
    /// Forecast and history period labels are joined on their `PeriodKey`.
    ByKey,
}

impl FromStr for PeriodAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" | "index_doubling" | "index-doubling" => Ok(PeriodAlignment::IndexDoubling),
            "key" | "by_key" | "by-key" => Ok(PeriodAlignment::ByKey),
            other => Err(format!("unknown period alignment: {}", other)),
        }
    }
}

/// Verdict counts over a row or a whole table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastTally {
    pub met: usize,
    pub missed: usize,
    /// Cells without a verdict.
    pub gaps: usize,
}

impl ForecastTally {
    pub fn record(&mut self, verdict: Option<Verdict>) {
        match verdict {
            Some(Verdict::Met) => self.met += 1,
            Some(Verdict::Missed) => self.missed += 1,
            None => self.gaps += 1,
        }
    }

    /// Share of judged cells that were met, or `None` when nothing was judged.
    pub fn hit_rate(&self) -> Option<f64> {
        let judged = self.met + self.missed;
        if judged == 0 {
            None
        } else {
            Some(self.met as f64 / judged as f64)
        }
    }
}

/// One (cluster, forecast period) entry. Absent values serialize as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastCell {
    pub period: String,
    pub actual: Option<MilestoneStage>,
    pub forecast: Option<MilestoneStage>,
    pub verdict: Option<Verdict>,
}

/// Cells of one cluster, one per period in the table's window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub grouping: String,
    pub cluster: String,
    pub cells: Vec<ForecastCell>,
}

impl ForecastRow {
    pub fn tally(&self) -> ForecastTally {
        let mut tally = ForecastTally::default();
        for cell in &self.cells {
            tally.record(cell.verdict);
        }
        tally
    }

    /// Cell for a period label, if the period is in the window.
    pub fn cell(&self, period: &str) -> Option<&ForecastCell> {
        self.cells.iter().find(|c| c.period == period)
    }
}

/// Actual-versus-forecast table of one region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionForecastTable {
    pub region_id: String,
    pub region: String,
    pub periods: Vec<String>,
    pub rows: Vec<ForecastRow>,
}

impl RegionForecastTable {
    pub fn tally(&self) -> ForecastTally {
        let mut tally = ForecastTally::default();
        for row in &self.rows {
            for cell in &row.cells {
                tally.record(cell.verdict);
            }
        }
        tally
    }

    pub fn row(&self, cluster: &str) -> Option<&ForecastRow> {
        self.rows.iter().find(|r| r.cluster == cluster)
    }
}

/// Clamps a requested window to the forecast axis
///
/// # Arguments
/// * `window` - Requested half-open range of forecast period indices
/// * `period_count` - Length of the forecast axis
///
/// # Returns
/// * A range inside `0..period_count`, empty when the request lies past the end
pub fn clamp_window(window: Range<usize>, period_count: usize) -> Range<usize> {
    let end = window.end.min(period_count);
    let start = window.start.min(end);
    start..end
}

fn history_index(
    forecast_index: usize,
    forecast: &Forecast,
    history_periods: &[String],
    alignment: PeriodAlignment,
) -> Option<usize> {
    match alignment {
        PeriodAlignment::IndexDoubling => forecast_index.checked_mul(2),
        PeriodAlignment::ByKey => {
            let label = forecast.periods.get(forecast_index)?;
            history_periods
                .iter()
                .position(|h| PeriodKey::same_period(h, label))
        }
    }
}

/// Builds the actual-versus-forecast table of one region over a window of
/// forecast periods.
///
/// Rows follow cluster declaration order. A cluster without a forecast series
/// gets an absent forecast and verdict in every cell.
///
/// # Arguments
/// * `region` - The region whose clusters become rows
/// * `forecast` - Forecast axis and series keyed by cluster name
/// * `window` - Half-open range of forecast period indices, clamped to the axis
/// * `alignment` - How a forecast period picks its history entry
/// * `history_periods` - History period labels, used by `PeriodAlignment::ByKey`
///
/// # Returns
/// * A `RegionForecastTable` with one column per period in the clamped window
pub fn build_forecast_table(
    region: &Region,
    forecast: &Forecast,
    window: Range<usize>,
    alignment: PeriodAlignment,
    history_periods: &[String],
) -> RegionForecastTable {
    let window = clamp_window(window, forecast.period_count());

    let columns: Vec<(usize, String, Option<usize>)> = window
        .map(|fi| {
            (
                fi,
                forecast.period_label(fi),
                history_index(fi, forecast, history_periods, alignment),
            )
        })
        .collect();

    let rows = region
        .clusters()
        .map(|(grouping, cluster)| {
            let cells = columns
                .iter()
                .map(|(fi, label, hi)| {
                    let actual = hi.and_then(|i| cluster.milestone_at(i));
                    let expected = forecast.value_at(&cluster.name, *fi);
                    ForecastCell {
                        period: label.clone(),
                        actual,
                        forecast: expected,
                        verdict: evaluate_forecast(actual, expected),
                    }
                })
                .collect();

            ForecastRow {
                grouping: grouping.name.clone(),
                cluster: cluster.name.clone(),
                cells,
            }
        })
        .collect();

    RegionForecastTable {
        region_id: region.id.clone(),
        region: region.name.clone(),
        periods: columns.into_iter().map(|(_, label, _)| label).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestone::MilestoneStage::*;

    const RANKED: [MilestoneStage; 4] = [Pg, IpgMinus, Ipg, IpgPlus];

    #[test]
    fn verdict_is_monotonic_in_actual_rank() {
        for f in RANKED {
            for a1 in RANKED {
                for a2 in RANKED {
                    if a1.rank() >= a2.rank()
                        && evaluate_forecast(Some(a2), Some(f)) == Some(Verdict::Met)
                    {
                        assert_eq!(evaluate_forecast(Some(a1), Some(f)), Some(Verdict::Met));
                    }
                }
            }
        }
    }

    #[test]
    fn opened_forecast_is_missed_only_by_unopened() {
        assert_eq!(evaluate_forecast(Some(Unopened), Some(Opened)), Some(Verdict::Missed));
        assert_eq!(evaluate_forecast(Some(Opened), Some(Opened)), Some(Verdict::Met));
        assert_eq!(evaluate_forecast(Some(Unrecognized), Some(Opened)), Some(Verdict::Met));
    }

    #[test]
    fn window_is_clamped_to_axis() {
        assert_eq!(clamp_window(2..10, 4), 2..4);
        assert_eq!(clamp_window(6..10, 4), 4..4);
        assert_eq!(clamp_window(3..1, 4), 1..1);
    }

    #[test]
    fn tally_hit_rate_ignores_gaps() {
        let mut tally = ForecastTally::default();
        tally.record(Some(Verdict::Met));
        tally.record(Some(Verdict::Missed));
        tally.record(None);
        assert_eq!(tally.gaps, 1);
        assert_eq!(tally.hit_rate(), Some(0.5));
        assert_eq!(ForecastTally::default().hit_rate(), None);
    }
}
