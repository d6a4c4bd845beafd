/*!
# Community Activity Dashboard

Data layer of a browser-rendered reporting dashboard for community-activity
statistics and cluster development milestones.

## Overview

The dashboard presents core-activity figures (devotional meetings, children's
classes, junior youth groups, study circles) nationally and per region, and
tracks the development stage of every cluster over time against a forecast.
Rendering is left to the front end; this crate produces the plain records it
draws from.

## Architecture

### Milestone Evaluator
- **Stages**: `Unopened < Opened < PG < IPG- = IPG < IPG+`, parsed once from labels
- **Region summary**: counts of clusters by the stage of their latest report
- **Forecast comparison**: Met/Missed verdict per cluster and forecast period,
  with gaps wherever either side is unreported

### Activity Statistics
- National overview table
- Regional breakdown with a totals row
- Participant distribution across activities
- Cluster milestone funnel

### Data Layer
- JSON datasets, CSV milestone and forecast imports
- Gzip + bincode snapshots
- CSV and XLSX exports

## Modules

- **milestone**: stages, period keys, the region/grouping/cluster hierarchy, forecasts
- **evaluator**: region summaries and forecast verdict tables
- **activity**: activity figures and derived tables
- **dataset**: the immutable snapshot and its validation
- **loader**: reading datasets from disk
- **saving**: snapshot persistence with compression
- **downloader**: export to CSV and XLSX
- **config**: runtime configuration
- **app**: JSON API (feature `web`)

## REST API Endpoints

- `/api/summary` - Latest-stage summary of every region
- `/api/regions/{id}/summary` - Summary of one region
- `/api/forecast` - Actual versus forecast tables (`from`, `to`, `alignment`, `region`)
- `/api/activity` - National and regional activity tables
- `/api/funnel` - Cluster milestone funnel
- `/api/export/forecast.csv`, `/api/export/forecast.xlsx` - Forecast downloads
- `/api/reload` - Replace the loaded dataset
*/

pub mod activity;
pub mod config;
pub mod dataset;
pub mod downloader;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod milestone;
pub mod saving;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the data model and evaluator at the crate root
pub use activity::*;
pub use dataset::*;
pub use error::DashboardError;
pub use evaluator::*;
pub use milestone::*;
