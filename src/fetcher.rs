//! Forecast page fetching and HTML table extraction
//!
//! The forecast site has shipped two markups over time: a `<div class="table">`
//! grid of `.row`/`.cell` elements, and a plain `<table>`. Both are accepted.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{ACCEPT_CHARSET, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

use crate::Result;
use crate::config::ScraperConfig;
use crate::error::WeatherTripError;
use crate::models::{City, RawForecastRow};
use crate::reference::SiteIds;
use crate::text::squash_whitespace;

static TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+)\s*°").expect("static temperature pattern"));
static LEADING_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d+)").expect("static integer pattern"));
static HOURLY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+saatlik$").expect("static hourly pattern"));

/// Anything that can produce raw forecast rows for a city
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_rows(&self, city: &City) -> Result<Vec<RawForecastRow>>;
}

/// Scrapes the forecast site over HTTP
pub struct HttpForecastSource {
    client: Client,
    page_url_template: String,
    site_ids: SiteIds,
}

impl HttpForecastSource {
    pub fn new(config: &ScraperConfig, site_ids: SiteIds) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| WeatherTripError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            page_url_template: config.page_url_template.clone(),
            site_ids,
        })
    }

    /// Forecast page address for a city
    #[must_use]
    pub fn page_url(&self, city: &City) -> String {
        self.page_url_template
            .replace("{slug}", &city.slug())
            .replace("{id}", &self.site_ids.for_city(city))
    }
}

#[async_trait]
impl ForecastSource for HttpForecastSource {
    #[instrument(skip(self, city), fields(city = %city.name))]
    async fn fetch_rows(&self, city: &City) -> Result<Vec<RawForecastRow>> {
        let url = self.page_url(city);
        debug!("Fetching forecast page {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherTripError::upstream(&city.name, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherTripError::upstream(
                &city.name,
                format!("HTTP {status} from {url}"),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| WeatherTripError::upstream(&city.name, format!("body read failed: {e}")))?;

        parse_forecast_page(&html, &city.name)
    }
}

/// Extract forecast rows from a forecast page in either known layout.
pub fn parse_forecast_page(html: &str, city_name: &str) -> Result<Vec<RawForecastRow>> {
    let document = Html::parse_document(html);

    // A grid holding only headings falls through to the plain table
    let grid_rows = parse_selector(".table .row")?;
    let grid = parse_grid(&document, &grid_rows, city_name)?;
    if !grid.is_empty() {
        return Ok(grid);
    }

    let table_rows = parse_selector("table tr")?;
    if document.select(&table_rows).next().is_some() {
        return parse_table(&document, &table_rows, city_name);
    }

    if document.select(&grid_rows).next().is_some() {
        return Ok(grid);
    }

    Err(WeatherTripError::page_structure(
        city_name,
        "no forecast table found",
    ))
}

/// `.table .row` grid: date | "condition NN°" | precipitation | night temperature
fn parse_grid(document: &Html, rows: &Selector, city_name: &str) -> Result<Vec<RawForecastRow>> {
    let cell = parse_selector(".cell")?;

    Ok(document
        .select(rows)
        .filter(|row| !row.value().classes().any(|class| class == "heading"))
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell).map(cell_text).collect();
            if cells.len() < 4 {
                return None;
            }
            let (condition, day_temp) = split_condition_temperature(&cells[1]);
            accept(RawForecastRow {
                city_name: city_name.to_string(),
                date_text: cells[0].clone(),
                condition_text: condition,
                day_temp_text: day_temp,
                night_temp_text: cells[3].clone(),
                precipitation_text: Some(cells[2].clone()).filter(|text| !text.is_empty()),
            })
        })
        .collect())
}

/// Plain `table tr`: date | condition | (unused) | day temperature | night temperature
fn parse_table(document: &Html, rows: &Selector, city_name: &str) -> Result<Vec<RawForecastRow>> {
    let cell = parse_selector("td")?;

    Ok(document
        .select(rows)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell).map(cell_text).collect();
            let column = |index: usize| cells.get(index).cloned().unwrap_or_default();
            accept(RawForecastRow {
                city_name: city_name.to_string(),
                date_text: column(0),
                condition_text: HOURLY_SUFFIX.replace(&column(1), "").into_owned(),
                day_temp_text: column(3),
                night_temp_text: column(4),
                precipitation_text: None,
            })
        })
        .collect())
}

fn accept(row: RawForecastRow) -> Option<RawForecastRow> {
    (!row.date_text.is_empty() && !row.condition_text.is_empty()).then_some(row)
}

fn cell_text(element: ElementRef<'_>) -> String {
    squash_whitespace(&element.text().collect::<String>())
}

/// Split "Güneşli 22°" into ("Güneşli", "22°").
fn split_condition_temperature(text: &str) -> (String, String) {
    match TEMPERATURE.find(text) {
        Some(found) => {
            let condition = format!("{} {}", &text[..found.start()], &text[found.end()..]);
            (squash_whitespace(&condition), found.as_str().to_string())
        }
        None => (text.to_string(), String::new()),
    }
}

/// Leading integer of a temperature cell, `0` when there is none.
#[must_use]
pub fn parse_temperature(text: &str) -> i32 {
    LEADING_INTEGER
        .captures(text)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(0)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| WeatherTripError::parse(format!("invalid CSS selector '{selector}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const GRID_PAGE: &str = r#"<html><body>
        <div class="table">
          <div class="rowgroup">
            <div class="row heading">
              <div class="cell">Tarih</div><div class="cell">Gündüz</div>
              <div class="cell">Yağış</div><div class="cell">Gece</div>
            </div>
            <div class="row">
              <div class="cell">bugün</div>
              <div class="cell"><span>güneşli</span> <b>22°</b></div>
              <div class="cell">%10</div>
              <div class="cell">15°</div>
            </div>
            <div class="row">
              <div class="cell">yarın</div>
              <div class="cell">az bulutlu 18°</div>
              <div class="cell"></div>
              <div class="cell">10°</div>
            </div>
            <div class="row">
              <div class="cell">05 Oca Pzt</div>
              <div class="cell">-3° kar yağışlı</div>
              <div class="cell">%80</div>
              <div class="cell">-9°</div>
            </div>
            <div class="row"><div class="cell">eksik</div></div>
          </div>
        </div>
    </body></html>"#;

    const TABLE_PAGE: &str = r#"<html><body><table>
        <tr><th>Tarih</th><th>Durum</th><th></th><th>Gündüz</th><th>Gece</th></tr>
        <tr><td>Bugün</td><td>Parçalı bulutlu Saatlik</td><td>x</td><td>12°</td><td>4°</td></tr>
        <tr><td>Yarın</td><td>Sağanak yağışlı</td><td>x</td><td>--</td></tr>
        <tr><td></td><td>Güneşli</td><td>x</td><td>9°</td><td>1°</td></tr>
    </table></body></html>"#;

    #[test]
    fn test_parse_grid_layout() {
        let rows = parse_forecast_page(GRID_PAGE, "Bayburt").unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].city_name, "Bayburt");
        assert_eq!(rows[0].date_text, "bugün");
        assert_eq!(rows[0].condition_text, "güneşli");
        assert_eq!(rows[0].day_temp_text, "22°");
        assert_eq!(rows[0].night_temp_text, "15°");
        assert_eq!(rows[0].precipitation_text.as_deref(), Some("%10"));

        assert_eq!(rows[1].condition_text, "az bulutlu");
        assert_eq!(rows[1].precipitation_text, None);

        assert_eq!(rows[2].condition_text, "kar yağışlı");
        assert_eq!(rows[2].day_temp_text, "-3°");
        assert_eq!(rows[2].night_temp_text, "-9°");
    }

    #[test]
    fn test_parse_table_layout() {
        let rows = parse_forecast_page(TABLE_PAGE, "Rize").unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date_text, "Bugün");
        assert_eq!(rows[0].condition_text, "Parçalı bulutlu");
        assert_eq!(rows[0].day_temp_text, "12°");
        assert_eq!(rows[0].night_temp_text, "4°");

        assert_eq!(rows[1].condition_text, "Sağanak yağışlı");
        assert_eq!(rows[1].night_temp_text, "");
    }

    #[test]
    fn test_heading_only_grid_falls_back_to_table() {
        let html = format!(
            r#"<div class="table"><div class="row heading"><div class="cell">Tarih</div></div></div>{TABLE_PAGE}"#
        );
        let rows = parse_forecast_page(&html, "Rize").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].condition_text, "Parçalı bulutlu");
    }

    #[test]
    fn test_heading_only_grid_without_table_is_empty() {
        let html = r#"<div class="table"><div class="row heading"><div class="cell">Tarih</div></div></div>"#;
        assert!(parse_forecast_page(html, "Rize").unwrap().is_empty());
    }

    #[test]
    fn test_missing_table_is_page_structure_error() {
        let result = parse_forecast_page("<html><body><p>Bakımdayız</p></body></html>", "Van");
        assert!(matches!(
            result,
            Err(WeatherTripError::PageStructure { ref city, .. }) if city == "Van"
        ));
    }

    #[rstest]
    #[case("22°", 22)]
    #[case(" -7°", -7)]
    #[case("15", 15)]
    #[case("--", 0)]
    #[case("", 0)]
    #[case("°C", 0)]
    fn test_parse_temperature(#[case] input: &str, #[case] expected: i32) {
        assert_eq!(parse_temperature(input), expected);
    }

    #[test]
    fn test_page_url_from_template() {
        let config = ScraperConfig {
            page_url_template: "https://example.test/{id}/{slug}-45.html".to_string(),
            ..ScraperConfig::default()
        };
        let source = HttpForecastSource::new(&config, SiteIds::default()).unwrap();
        let city = City {
            id: 46,
            name: "Kahramanmaraş".to_string(),
            region: "Akdeniz".to_string(),
            latitude: 37.5858,
            longitude: 36.9371,
        };
        assert_eq!(
            source.page_url(&city),
            "https://example.test/46/kahramanmaras-45.html"
        );
    }
}
