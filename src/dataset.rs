use crate::activity::{
    self, MilestoneFunnel, NationalOverview, RegionalActivity,
};
use crate::error::{DashboardError, Result};
use crate::evaluator::{self, PeriodAlignment, RegionForecastTable, RegionSummary};
use crate::milestone::{Forecast, Region};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// Immutable snapshot of everything the dashboard shows.
///
/// Refreshing data means building a new `Dataset` and replacing the old one
/// whole; nothing mutates a snapshot in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub title: String,
    /// Labels of the historical reporting periods, oldest first.
    #[serde(default)]
    pub history_periods: Vec<String>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub forecast: Forecast,
    #[serde(default)]
    pub national: NationalOverview,
    #[serde(default)]
    pub regional_activity: Vec<RegionalActivity>,
}

/// A region's summary tagged with its id and name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionSummaryEntry {
    pub region_id: String,
    pub region: String,
    #[serde(flatten)]
    pub summary: RegionSummary,
}

impl Dataset {
    /// Checks the shape invariants the evaluator relies on
    ///
    /// Cluster names must be unique within a region. When the history or
    /// forecast axis is declared, every milestone or forecast sequence must
    /// span it exactly. Forecast entries for unknown clusters are only logged.
    ///
    /// # Returns
    /// * `Ok(())` or `DashboardError::Validation` naming the first offender
    pub fn validate(&self) -> Result<()> {
        let history_len = self.history_periods.len();

        for region in &self.regions {
            let mut seen = HashSet::new();
            for (_, cluster) in region.clusters() {
                if !seen.insert(cluster.name.as_str()) {
                    return Err(DashboardError::Validation(format!(
                        "cluster {:?} appears more than once in region {:?}",
                        cluster.name, region.name
                    )));
                }
                if history_len > 0 && cluster.milestones.len() != history_len {
                    return Err(DashboardError::Validation(format!(
                        "cluster {:?} has {} milestones but {} history periods are declared",
                        cluster.name,
                        cluster.milestones.len(),
                        history_len
                    )));
                }
            }
        }

        let forecast_len = self.forecast.periods.len();
        for (name, series) in &self.forecast.series {
            if forecast_len > 0 && series.len() != forecast_len {
                return Err(DashboardError::Validation(format!(
                    "forecast for {:?} has {} entries but {} forecast periods are declared",
                    name,
                    series.len(),
                    forecast_len
                )));
            }
            if self.find_region_of(name).is_none() {
                log::warn!("forecast entry for unknown cluster {:?}", name);
            }
        }

        Ok(())
    }

    /// Finds a region by id, or by name ignoring ASCII case.
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.id == id || r.name.eq_ignore_ascii_case(id))
    }

    fn find_region_of(&self, cluster: &str) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.find_cluster(cluster).is_some())
    }

    pub fn cluster_count(&self) -> usize {
        self.regions.iter().map(|r| r.cluster_count()).sum()
    }

    /// One summary per region, in declared order.
    pub fn summaries(&self) -> Vec<RegionSummaryEntry> {
        self.regions
            .iter()
            .map(|r| RegionSummaryEntry {
                region_id: r.id.clone(),
                region: r.name.clone(),
                summary: evaluator::summarize_region(r),
            })
            .collect()
    }

    /// Sum of every region's summary.
    pub fn national_summary(&self) -> RegionSummary {
        let mut national = RegionSummary::default();
        for entry in self.summaries() {
            national.merge(&entry.summary);
        }
        national
    }

    /// Milestone funnel derived from the current region summaries.
    pub fn funnel(&self) -> MilestoneFunnel {
        let summaries: Vec<RegionSummary> =
            self.regions.iter().map(evaluator::summarize_region).collect();
        activity::milestone_funnel(&summaries)
    }

    /// Forecast table of one region against this dataset's forecast
    ///
    /// # Arguments
    /// * `region` - A region of this dataset
    /// * `window` - Half-open range of forecast period indices
    /// * `alignment` - How forecast periods are matched to history periods
    ///
    /// # Returns
    /// * The region's `RegionForecastTable`
    pub fn forecast_table(
        &self,
        region: &Region,
        window: Range<usize>,
        alignment: PeriodAlignment,
    ) -> RegionForecastTable {
        evaluator::build_forecast_table(
            region,
            &self.forecast,
            window,
            alignment,
            &self.history_periods,
        )
    }

    /// Forecast tables for every region, in declared order.
    pub fn forecast_tables(
        &self,
        window: Range<usize>,
        alignment: PeriodAlignment,
    ) -> Vec<RegionForecastTable> {
        self.regions
            .iter()
            .map(|r| self.forecast_table(r, window.clone(), alignment))
            .collect()
    }

    /// Regional activity rows followed by the totals row.
    pub fn regional_table(&self) -> Vec<RegionalActivity> {
        activity::regional_table(&self.regional_activity)
    }
}
