#![cfg(not(tarpaulin_include))]

use crate::config::DashboardConfig;
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::milestone::{Cluster, Forecast, Grouping, MilestoneStage, Region};
use crate::saving;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of leading columns before the period columns in a history CSV.
const HISTORY_KEY_COLUMNS: usize = 3;

/// Load a dataset from a JSON document
///
/// The document mirrors [`Dataset`]: regions with nested groupings and
/// clusters, the forecast axis and series, and the activity tables. Stage
/// labels are parsed on the way in and the result is validated.
///
/// # Examples
/// ```no_run
/// use dashboard::loader::from_json;
///
/// match from_json("data/dashboard.json") {
///     Ok(data) => println!("Loaded {} regions", data.regions.len()),
///     Err(e) => eprintln!("Error loading dataset: {}", e),
/// }
/// ```
pub fn from_json(filepath: impl AsRef<Path>) -> Result<Dataset> {
    let path = filepath.as_ref();
    let file = File::open(path)?;
    let dataset: Dataset = serde_json::from_reader(BufReader::new(file))?;
    dataset.validate()?;

    log::info!(
        "loaded {} regions, {} clusters from {}",
        dataset.regions.len(),
        dataset.cluster_count(),
        path.display()
    );
    Ok(dataset)
}

/// Import milestone history from a CSV file
///
/// Expected header: `region,grouping,cluster,<period>,<period>,...`. Each
/// following row is one cluster; an empty cell is an unreported period.
/// Regions and groupings keep the order in which they first appear.
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Dataset> {
    let lines = read_lines(filepath.as_ref())?;
    let (header, body) = split_header(&lines)?;

    if header.len() < HISTORY_KEY_COLUMNS {
        return Err(DashboardError::Csv {
            line: 1,
            message: "expected columns region,grouping,cluster".to_string(),
        });
    }
    let history_periods: Vec<String> = header[HISTORY_KEY_COLUMNS..].to_vec();

    let mut regions: Vec<Region> = Vec::new();
    for (line_no, line) in body {
        let fields = parse_csv_row(line, line_no)?;
        if fields.len() < HISTORY_KEY_COLUMNS {
            return Err(DashboardError::Csv {
                line: line_no,
                message: format!("expected at least {} fields", HISTORY_KEY_COLUMNS),
            });
        }

        let milestones = parse_stages(&fields[HISTORY_KEY_COLUMNS..], history_periods.len());
        let cluster = Cluster::new(fields[2].trim(), milestones);
        let region_name = fields[0].trim();
        let grouping_name = fields[1].trim();

        let index = match regions.iter().position(|r| r.name == region_name) {
            Some(i) => i,
            None => {
                regions.push(Region {
                    id: region_id_from_name(region_name),
                    name: region_name.to_string(),
                    groupings: Vec::new(),
                });
                regions.len() - 1
            }
        };
        let region = &mut regions[index];

        match region.groupings.iter_mut().find(|g| g.name == grouping_name) {
            Some(grouping) => grouping.clusters.push(cluster),
            None => region.groupings.push(Grouping {
                name: grouping_name.to_string(),
                clusters: vec![cluster],
            }),
        }
    }

    let dataset = Dataset {
        history_periods,
        regions,
        ..Default::default()
    };
    dataset.validate()?;
    Ok(dataset)
}

/// Import forecast series from a CSV file with header `cluster,<period>,...`.
pub fn forecast_from_csv(filepath: impl AsRef<Path>) -> Result<Forecast> {
    let lines = read_lines(filepath.as_ref())?;
    let (header, body) = split_header(&lines)?;

    if header.is_empty() {
        return Err(DashboardError::Csv {
            line: 1,
            message: "expected a cluster column".to_string(),
        });
    }
    let periods: Vec<String> = header[1..].to_vec();

    let mut series = BTreeMap::new();
    for (line_no, line) in body {
        let fields = parse_csv_row(line, line_no)?;
        let name = fields[0].trim().to_string();
        let stages = parse_stages(&fields[1..], periods.len());
        if series.insert(name.clone(), stages).is_some() {
            log::warn!("duplicate forecast row for {:?} at line {}", name, line_no);
        }
    }

    Ok(Forecast { periods, series })
}

/// Detect file type and load the matching format
///
/// `.json` is a full dataset, `.csv` a milestone history, and `.gz` a saved
/// snapshot.
pub fn load_dataset(filepath: impl AsRef<Path>) -> Result<Dataset> {
    let path = filepath.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("json") => from_json(path),
        Some("csv") => from_csv(path),
        Some("gz") => saving::load_snapshot(path),
        Some(ext) => Err(DashboardError::UnsupportedFormat(ext.to_string())),
        None => Err(DashboardError::UnsupportedFormat(format!(
            "{} has no extension",
            path.display()
        ))),
    }
}

/// Loads the dataset named by the config, replacing its forecast with the
/// configured forecast CSV when one is set.
pub fn load_configured(config: &DashboardConfig) -> Result<Dataset> {
    let mut dataset = load_dataset(&config.data_path)?;

    if let Some(forecast_path) = &config.forecast_path {
        dataset.forecast = forecast_from_csv(forecast_path)?;
        dataset.validate()?;
        log::info!(
            "using {} forecast series from {}",
            dataset.forecast.series.len(),
            forecast_path.display()
        );
    }

    Ok(dataset)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if fs::metadata(path)?.len() == 0 {
        return Err(DashboardError::Csv {
            line: 0,
            message: format!("{} is empty", path.display()),
        });
    }
    let reader = BufReader::new(File::open(path)?);
    let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
    Ok(lines)
}

/// Splits off the header and numbers the remaining non-blank lines from 2.
fn split_header(lines: &[String]) -> Result<(Vec<String>, Vec<(usize, &str)>)> {
    let first = lines.first().ok_or_else(|| DashboardError::Csv {
        line: 1,
        message: "missing header row".to_string(),
    })?;
    let header = parse_csv_row(first.trim_start_matches('\u{feff}'), 1)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let body = lines
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l.as_str()))
        .collect();

    Ok((header, body))
}

/// Parses up to `width` stage cells, padding short rows with absent values.
fn parse_stages(cells: &[String], width: usize) -> Vec<Option<MilestoneStage>> {
    let mut stages: Vec<Option<MilestoneStage>> = cells
        .iter()
        .take(width)
        .map(|c| {
            let c = c.trim();
            if c.is_empty() || c.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(MilestoneStage::parse(c))
            }
        })
        .collect();
    stages.resize(width, None);
    stages
}

fn region_id_from_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

// Quoted fields may contain commas and doubled quotes, but not newlines.
fn parse_csv_row(line: &str, line_no: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(DashboardError::Csv {
            line: line_no,
            message: "unterminated quoted field".to_string(),
        });
    }

    fields.push(current);
    Ok(fields)
}
