#![cfg(not(tarpaulin_include))]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::activity::{self, ChartRow, DistributionSlice, RegionalActivity};
use crate::config::DashboardConfig;
use crate::dataset::{Dataset, RegionSummaryEntry};
use crate::downloader;
use crate::error::DashboardError;
use crate::evaluator::{ForecastTally, PeriodAlignment, RegionForecastTable, RegionSummary};
use crate::loader;

/// A loaded dataset together with the time it was loaded.
pub struct Snapshot {
    pub dataset: Dataset,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(dataset: Dataset) -> Self {
        Snapshot {
            dataset,
            loaded_at: Utc::now(),
        }
    }
}

/// Shared server state. Handlers clone the current `Arc<Snapshot>` and never
/// see a partially replaced dataset.
pub struct AppState {
    config: DashboardConfig,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl AppState {
    pub fn new(config: DashboardConfig, dataset: Dataset) -> Self {
        AppState {
            config,
            snapshot: RwLock::new(Arc::new(Snapshot::new(dataset))),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Swaps in a new snapshot whole.
    pub fn replace(&self, dataset: Dataset) -> Arc<Snapshot> {
        let next = Arc::new(Snapshot::new(dataset));
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next.clone();
        next
    }
}

struct ApiError(StatusCode, String);

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        let status = match &err {
            DashboardError::Validation(_)
            | DashboardError::Csv { .. }
            | DashboardError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("request failed: {}", self.1);
        (
            self.0,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(self.1),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    loaded_at: DateTime<Utc>,
    regions: Vec<RegionSummaryEntry>,
    national: RegionSummary,
}

#[derive(Deserialize)]
struct ForecastQuery {
    from: Option<usize>,
    to: Option<usize>,
    alignment: Option<String>,
    region: Option<String>,
}

#[derive(Serialize)]
struct ForecastResponse {
    alignment: PeriodAlignment,
    tables: Vec<TableWithTally>,
}

#[derive(Serialize)]
struct TableWithTally {
    #[serde(flatten)]
    table: RegionForecastTable,
    tally: ForecastTally,
}

#[derive(Serialize)]
struct ActivityResponse {
    national: Vec<NationalRow>,
    regional: Vec<RegionalActivity>,
    chart: Vec<ChartRow>,
    distribution: Option<Vec<DistributionSlice>>,
}

#[derive(Serialize)]
struct NationalRow {
    activity: &'static str,
    count: u64,
    participants: u64,
    friends: u64,
}

#[derive(Serialize)]
struct FunnelCard {
    title: &'static str,
    value: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/summary", get(get_summary))
        .route("/api/regions/:id/summary", get(get_region_summary))
        .route("/api/forecast", get(get_forecast))
        .route("/api/activity", get(get_activity))
        .route("/api/funnel", get(get_funnel))
        .route("/api/export/forecast.csv", get(export_forecast_csv))
        .route("/api/export/forecast.xlsx", get(export_forecast_xlsx))
        .route("/api/reload", post(reload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = loader::load_configured(&config)?;
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, dataset));

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn get_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.current();
    Json(SummaryResponse {
        loaded_at: snapshot.loaded_at,
        regions: snapshot.dataset.summaries(),
        national: snapshot.dataset.national_summary(),
    })
}

async fn get_region_summary(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let snapshot = state.current();
    match snapshot.dataset.region(&id) {
        Some(region) => Json(crate::evaluator::summarize_region(region)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn forecast_tables(
    state: &AppState,
    snapshot: &Snapshot,
    query: &ForecastQuery,
) -> Result<(PeriodAlignment, Vec<RegionForecastTable>), ApiError> {
    let alignment = match &query.alignment {
        Some(a) => a
            .parse::<PeriodAlignment>()
            .map_err(|e: String| ApiError(StatusCode::BAD_REQUEST, e))?,
        None => state.config.alignment,
    };
    let window = state.config.forecast_window;
    let from = query.from.unwrap_or(window.from);
    let to = query.to.or(window.to).unwrap_or(usize::MAX);

    let dataset = &snapshot.dataset;
    let tables = match &query.region {
        Some(id) => {
            let region = dataset.region(id).ok_or_else(|| {
                ApiError(StatusCode::NOT_FOUND, format!("unknown region {}", id))
            })?;
            vec![dataset.forecast_table(region, from..to, alignment)]
        }
        None => dataset.forecast_tables(from..to, alignment),
    };
    Ok((alignment, tables))
}

async fn get_forecast(
    Query(query): Query<ForecastQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let snapshot = state.current();
    let (alignment, tables) = forecast_tables(&state, &snapshot, &query)?;

    Ok(Json(ForecastResponse {
        alignment,
        tables: tables
            .into_iter()
            .map(|table| TableWithTally {
                tally: table.tally(),
                table,
            })
            .collect(),
    }))
}

async fn get_activity(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.current();
    let dataset = &snapshot.dataset;

    Json(ActivityResponse {
        national: dataset
            .national
            .rows()
            .into_iter()
            .map(|(activity, c)| NationalRow {
                activity,
                count: c.count,
                participants: c.participants,
                friends: c.friends,
            })
            .collect(),
        regional: dataset.regional_table(),
        chart: activity::chart_rows(&dataset.regional_activity),
        distribution: activity::participant_distribution(&dataset.regional_activity),
    })
}

async fn get_funnel(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let funnel = state.current().dataset.funnel();
    let cards: Vec<FunnelCard> = funnel
        .cards()
        .into_iter()
        .map(|(title, value)| FunnelCard { title, value })
        .collect();
    Json(cards)
}

async fn export_forecast_csv(
    Query(query): Query<ForecastQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let snapshot = state.current();
    let (_, tables) = forecast_tables(&state, &snapshot, &query)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"forecast.csv\"",
            ),
        ],
        downloader::forecast_to_csv(&tables),
    )
        .into_response())
}

async fn export_forecast_xlsx(
    Query(query): Query<ForecastQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let snapshot = state.current();
    let (_, tables) = forecast_tables(&state, &snapshot, &query)?;
    let buffer = downloader::forecast_to_xlsx(&tables)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"forecast.xlsx\"",
            ),
        ],
        buffer,
    )
        .into_response())
}

async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let config = state.config.clone();
    let dataset = tokio::task::spawn_blocking(move || loader::load_configured(&config))
        .await
        .map_err(|e| ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;

    let snapshot = state.replace(dataset);
    log::info!(
        "reloaded {} regions at {}",
        snapshot.dataset.regions.len(),
        snapshot.loaded_at
    );

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        message: None,
    }))
}
