use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    static ref YEAR_FIRST_REGEX: Regex =
        Regex::new(r"^(\d{4})(?:\s*[-/]?\s*H([12]))?$").unwrap();
    static ref HALF_FIRST_REGEX: Regex = Regex::new(r"^H([12])\s*[-/]?\s*(\d{4})$").unwrap();
    static ref IPG_PLUS_REGEX: Regex = Regex::new(r"(?i)\bIPG\+").unwrap();
    static ref IPG_MINUS_REGEX: Regex = Regex::new(r"(?i)\bIPG-").unwrap();
    static ref IPG_REGEX: Regex = Regex::new(r"(?i)\bIPG\b").unwrap();
    static ref PG_REGEX: Regex = Regex::new(r"(?i)\bPG\b").unwrap();
    static ref UNOPENED_REGEX: Regex = Regex::new(r"(?i)\b(?:un|not\s+)opened\b").unwrap();
    static ref OPENED_REGEX: Regex = Regex::new(r"(?i)\bopened\b").unwrap();
}

/// Development stage of a cluster.
///
/// Ordered `Unopened < Opened < PG < IPG- = IPG < IPG+`. Labels that match
/// none of the known categories parse to `Unrecognized`, which ranks like
/// `Unopened` and never lands in a summary bucket.
///
/// The enum keeps only the category, so an unrecognized label serializes as
/// the literal `"Unrecognized"`; the raw text is reported once, in the warning
/// logged by [`MilestoneStage::parse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum MilestoneStage {
    Unopened,
    Opened,
    Pg,
    IpgMinus,
    Ipg,
    IpgPlus,
    Unrecognized,
}

/// Summary bucket a latest milestone is counted under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageBucket {
    IpgPlus,
    Ipg,
    Pg,
}

impl MilestoneStage {
    /// Parses a raw label by category, highest stage first
    ///
    /// Stage tokens are matched case-insensitively as whole words anywhere in
    /// the label, so `"IPG+ (2024)"` is `IpgPlus` and `"Opened in 2023"` is
    /// `Opened`, while `"upgrading"` matches nothing. `IPG+` is checked before
    /// `IPG-` and `IPG`, and `Unopened`/`Not opened` before `Opened`.
    ///
    /// # Arguments
    /// * `label` - The stage label as reported
    ///
    /// # Returns
    /// * The stage category, or `Unrecognized` (logged at warn level)
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();

        if IPG_PLUS_REGEX.is_match(trimmed) {
            MilestoneStage::IpgPlus
        } else if IPG_MINUS_REGEX.is_match(trimmed) {
            MilestoneStage::IpgMinus
        } else if IPG_REGEX.is_match(trimmed) {
            MilestoneStage::Ipg
        } else if PG_REGEX.is_match(trimmed) {
            MilestoneStage::Pg
        } else if UNOPENED_REGEX.is_match(trimmed) {
            MilestoneStage::Unopened
        } else if OPENED_REGEX.is_match(trimmed) {
            MilestoneStage::Opened
        } else {
            if !trimmed.eq_ignore_ascii_case("unrecognized") {
                log::warn!("unrecognized milestone label {:?}", trimmed);
            }
            MilestoneStage::Unrecognized
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MilestoneStage::Unopened => "Unopened",
            MilestoneStage::Opened => "Opened",
            MilestoneStage::Pg => "PG",
            MilestoneStage::IpgMinus => "IPG-",
            MilestoneStage::Ipg => "IPG",
            MilestoneStage::IpgPlus => "IPG+",
            MilestoneStage::Unrecognized => "Unrecognized",
        }
    }

    /// Numeric rank used for forecast comparison. `IPG-` and `IPG` tie.
    pub fn rank(&self) -> u8 {
        match self {
            MilestoneStage::Pg => 1,
            MilestoneStage::Ipg | MilestoneStage::IpgMinus => 2,
            MilestoneStage::IpgPlus => 3,
            MilestoneStage::Unopened | MilestoneStage::Opened | MilestoneStage::Unrecognized => 0,
        }
    }

    pub fn bucket(&self) -> Option<StageBucket> {
        match self {
            MilestoneStage::IpgPlus => Some(StageBucket::IpgPlus),
            MilestoneStage::Ipg | MilestoneStage::IpgMinus => Some(StageBucket::Ipg),
            MilestoneStage::Pg => Some(StageBucket::Pg),
            MilestoneStage::Unopened | MilestoneStage::Opened | MilestoneStage::Unrecognized => None,
        }
    }
}

impl fmt::Display for MilestoneStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for MilestoneStage {
    fn from(label: String) -> Self {
        MilestoneStage::parse(&label)
    }
}

impl From<MilestoneStage> for String {
    fn from(stage: MilestoneStage) -> Self {
        stage.label().to_string()
    }
}

/// Half-year of a reporting period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Half {
    H1,
    H2,
}

/// Explicit reporting-period identifier, e.g. `2024-H1` or `2025`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: u16,
    pub half: Option<Half>,
}

impl PeriodKey {
    /// Accepts `2024`, `2024-H1`, `2024 H2`, `2024/H1` and `H1 2024`.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_uppercase();

        if let Some(caps) = YEAR_FIRST_REGEX.captures(&label) {
            let year = caps.get(1)?.as_str().parse().ok()?;
            let half = caps.get(2).map(|h| half_from(h.as_str()));
            return Some(PeriodKey { year, half });
        }

        let caps = HALF_FIRST_REGEX.captures(&label)?;
        let year = caps.get(2)?.as_str().parse().ok()?;
        Some(PeriodKey {
            year,
            half: Some(half_from(caps.get(1)?.as_str())),
        })
    }

    /// True when two raw period labels name the same period. Labels that do
    /// not parse as keys fall back to a case-insensitive text comparison.
    pub fn same_period(a: &str, b: &str) -> bool {
        match (PeriodKey::parse(a), PeriodKey::parse(b)) {
            (Some(ka), Some(kb)) => ka == kb,
            _ => a.trim().eq_ignore_ascii_case(b.trim()),
        }
    }
}

fn half_from(digit: &str) -> Half {
    if digit == "2" { Half::H2 } else { Half::H1 }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.half {
            Some(Half::H1) => write!(f, "{}-H1", self.year),
            Some(Half::H2) => write!(f, "{}-H2", self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Smallest geographic unit whose stage is tracked.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Cluster {
    pub name: String,
    /// One entry per historical reporting period, oldest first.
    #[serde(default)]
    pub milestones: Vec<Option<MilestoneStage>>,
}

impl Cluster {
    pub fn new(name: impl Into<String>, milestones: Vec<Option<MilestoneStage>>) -> Self {
        Cluster {
            name: name.into(),
            milestones,
        }
    }

    /// Stage at the most recent reporting period, if reported.
    pub fn latest(&self) -> Option<MilestoneStage> {
        self.milestones.last().copied().flatten()
    }

    pub fn milestone_at(&self, index: usize) -> Option<MilestoneStage> {
        self.milestones.get(index).copied().flatten()
    }
}

/// Named set of clusters within a region. Only affects display order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Grouping {
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

/// Top-level area, identified by a stable `id` such as `NSW_ACT`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub groupings: Vec<Grouping>,
}

impl Region {
    /// All clusters of the region in declaration order, paired with their grouping.
    pub fn clusters(&self) -> impl Iterator<Item = (&Grouping, &Cluster)> {
        self.groupings
            .iter()
            .flat_map(|g| g.clusters.iter().map(move |c| (g, c)))
    }

    pub fn cluster_count(&self) -> usize {
        self.groupings.iter().map(|g| g.clusters.len()).sum()
    }

    /// Looks up a cluster by exact name.
    pub fn find_cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters().map(|(_, c)| c).find(|c| c.name == name)
    }
}

/// Expected stages per cluster along the forecast period axis.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Forecast {
    /// Labels of the forecast periods, e.g. `["2024-H1", "2025-H1"]`.
    #[serde(default)]
    pub periods: Vec<String>,
    #[serde(default)]
    pub series: BTreeMap<String, Vec<Option<MilestoneStage>>>,
}

impl Forecast {
    /// Forecast series of a cluster, or `None` when it has no forecast.
    pub fn series_for(&self, cluster: &str) -> Option<&[Option<MilestoneStage>]> {
        self.series.get(cluster).map(|s| s.as_slice())
    }

    /// Forecast stage for a cluster at a forecast-period index.
    pub fn value_at(&self, cluster: &str, index: usize) -> Option<MilestoneStage> {
        self.series_for(cluster)
            .and_then(|s| s.get(index).copied())
            .flatten()
    }

    /// Length of the forecast axis: the declared periods, or the longest
    /// series when no period labels were supplied.
    pub fn period_count(&self) -> usize {
        if !self.periods.is_empty() {
            return self.periods.len();
        }
        self.series.values().map(|s| s.len()).max().unwrap_or(0)
    }

    /// Label of a forecast period, falling back to `P<n>` (1-based) past the
    /// declared labels.
    pub fn period_label(&self, index: usize) -> String {
        self.periods
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("P{}", index + 1))
    }
}
