#![allow(dead_code)]

use dashboard::dataset::Dataset;
use dashboard::loader;
use dashboard::milestone::{Cluster, Grouping, MilestoneStage, Region};
use std::path::PathBuf;

pub fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/dashboard.json")
}

pub fn sample_dataset() -> Dataset {
    loader::from_json(sample_path()).expect("sample dataset should load")
}

/// Parses a compact stage list where `-` marks an unreported period.
pub fn stages(labels: &[&str]) -> Vec<Option<MilestoneStage>> {
    labels
        .iter()
        .map(|l| {
            if *l == "-" {
                None
            } else {
                Some(MilestoneStage::parse(l))
            }
        })
        .collect()
}

pub fn region(id: &str, groupings: Vec<(&str, Vec<Cluster>)>) -> Region {
    Region {
        id: id.to_string(),
        name: id.to_string(),
        groupings: groupings
            .into_iter()
            .map(|(name, clusters)| Grouping {
                name: name.to_string(),
                clusters,
            })
            .collect(),
    }
}
