//! HTTP endpoints for collecting, querying and searching forecasts

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::VERSION;
use crate::collector::{CollectionReport, Collector};
use crate::error::WeatherTripError;
use crate::models::{City, ForecastEntry, ForecastIndex, Place};
use crate::reference::ReferenceData;
use crate::search::{CityMatch, DateRange, WeatherCriterion, cities_by_date, qualifying_cities};

const DEFAULT_PLACES_CITY: &str = "ankara";

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub reference: Arc<ReferenceData>,
    pub collector: Arc<Collector>,
    pub timezone: Tz,
    pub collect_timeout: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(
        reference: Arc<ReferenceData>,
        collector: Arc<Collector>,
        timezone: Tz,
        collect_timeout: Duration,
    ) -> Self {
        Self {
            reference,
            collector,
            timezone,
            collect_timeout,
        }
    }

    /// Today's date in the forecast site's time zone
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    async fn within_deadline<F: Future>(&self, work: F) -> Result<F::Output, WeatherTripError> {
        tokio::time::timeout(self.collect_timeout, work)
            .await
            .map_err(|_| WeatherTripError::Timeout {
                seconds: self.collect_timeout.as_secs(),
            })
    }

    async fn collect_all(&self) -> Result<CollectionReport, WeatherTripError> {
        let today = self.today();
        self.within_deadline(self.collector.collect_all(self.reference.cities.all(), today))
            .await
    }
}

/// Error wrapper turning [`WeatherTripError`] into a JSON response
pub struct ApiError(WeatherTripError);

impl From<WeatherTripError> for ApiError {
    fn from(error: WeatherTripError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather-collect", get(weather_collect))
        .route("/weather", get(city_weather))
        .route("/weather-search", get(weather_search))
        .route("/weather-discover", get(weather_discover))
        .route("/places", get(places))
        .route("/cities", get(cities))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectResponse {
    data: ForecastIndex,
    total_cities: usize,
    collected_data: usize,
    unique_dates: usize,
    successful_cities: usize,
    failed_cities: Vec<String>,
    total_days: usize,
    unique_conditions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

impl From<CollectionReport> for CollectResponse {
    fn from(report: CollectionReport) -> Self {
        let errors = report.errors();
        let failed_cities = report.failed_cities().into_iter().map(str::to_string).collect();
        let successful_cities = report.successful_cities().len();
        let unique_conditions = report
            .unique_conditions()
            .into_iter()
            .map(str::to_string)
            .collect();
        let total_cities = report.total_cities;
        let data = report.into_index();

        Self {
            total_cities,
            collected_data: data.entry_count(),
            unique_dates: data.len(),
            successful_cities,
            failed_cities,
            total_days: data.len(),
            unique_conditions,
            errors: (!errors.is_empty()).then_some(errors),
            data,
        }
    }
}

#[instrument(skip_all)]
async fn weather_collect(State(state): State<AppState>) -> ApiResult<CollectResponse> {
    let report = state.collect_all().await?;
    info!(
        "Collection finished: {} entries from {} cities",
        report.entries.len(),
        report.successful_cities().len()
    );
    Ok(Json(CollectResponse::from(report)))
}

#[derive(Debug, Deserialize)]
struct CityQuery {
    city: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeatherDay {
    date: NaiveDate,
    day: String,
    condition: String,
    standard_condition: String,
    day_temp: i32,
    night_temp: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    precipitation: Option<String>,
}

impl From<ForecastEntry> for WeatherDay {
    fn from(entry: ForecastEntry) -> Self {
        Self {
            date: entry.date,
            day: entry.day,
            condition: entry.condition,
            standard_condition: entry.standard_condition.label().to_string(),
            day_temp: entry.day_temp,
            night_temp: entry.night_temp,
            precipitation: entry.precipitation,
        }
    }
}

#[instrument(skip(state))]
async fn city_weather(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> ApiResult<Vec<WeatherDay>> {
    let name = query
        .city
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| WeatherTripError::validation("city parameter is required"))?;
    let city = state
        .reference
        .cities
        .find(&name)
        .ok_or_else(|| WeatherTripError::validation(format!("unknown city '{name}'")))?;

    let today = state.today();
    let entries = state
        .within_deadline(state.collector.fetch_city_forecast(city, today))
        .await??;
    Ok(Json(entries.into_iter().map(WeatherDay::from).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    condition: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    condition: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl SearchQuery {
    fn resolve(&self) -> Result<(WeatherCriterion, DateRange), WeatherTripError> {
        let (Some(condition), Some(start), Some(end)) =
            (&self.condition, &self.start_date, &self.end_date)
        else {
            return Err(WeatherTripError::validation(
                "condition, startDate and endDate are required",
            ));
        };
        Ok((WeatherCriterion::parse(condition)?, DateRange::parse(start, end)?))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    results: BTreeMap<NaiveDate, Vec<String>>,
    params: SearchParams,
    total_days: usize,
    total_unique_cities: usize,
}

#[instrument(skip(state))]
async fn weather_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let (criterion, range) = query.resolve()?;
    let index = state.collect_all().await?.into_index();

    let results = cities_by_date(&index, &criterion, &range);
    let total_unique_cities = results
        .values()
        .flatten()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .len();

    Ok(Json(SearchResponse {
        total_days: results.len(),
        total_unique_cities,
        results,
        params: SearchParams {
            condition: criterion.label().to_string(),
            start_date: range.start(),
            end_date: range.end(),
        },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscoverResponse {
    cities: Vec<CityMatch>,
    total_cities: usize,
}

#[instrument(skip(state))]
async fn weather_discover(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<DiscoverResponse> {
    let (criterion, range) = query.resolve()?;
    let index = state.collect_all().await?.into_index();

    let cities = qualifying_cities(&index, &criterion, &range);
    Ok(Json(DiscoverResponse {
        total_cities: cities.len(),
        cities,
    }))
}

#[derive(Serialize)]
struct PlacesResponse {
    success: bool,
    data: PlacesData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacesData {
    city: String,
    places: Vec<Place>,
    total_found: usize,
    timestamp: String,
}

/// Places answers errors in its own `{success, error}` envelope
struct PlacesError(WeatherTripError);

impl From<WeatherTripError> for PlacesError {
    fn from(error: WeatherTripError) -> Self {
        Self(error)
    }
}

impl IntoResponse for PlacesError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "error": self.0.user_message() });
        (self.0.status_code(), Json(body)).into_response()
    }
}

async fn places(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<PlacesResponse>, PlacesError> {
    let requested = query
        .city
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PLACES_CITY.to_string());

    let (city, places) = state.reference.places.find(&requested).ok_or_else(|| {
        WeatherTripError::not_found(format!("No places known for city '{requested}'"))
    })?;

    Ok(Json(PlacesResponse {
        success: true,
        data: PlacesData {
            city: city.to_string(),
            places: places.to_vec(),
            total_found: places.len(),
            timestamp: Utc::now().to_rfc3339(),
        },
    }))
}

async fn cities(State(state): State<AppState>) -> Json<Vec<City>> {
    Json(state.reference.cities.all().to_vec())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}
