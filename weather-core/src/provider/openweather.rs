use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{collections::BTreeMap, time::Duration};
use tracing::debug;

use crate::{
    Config,
    model::{
        AirQuality, Condition, Coordinates, Location, Precipitation, Readings, Unit,
        WeatherSnapshot, Wind,
    },
};

use super::{ProviderError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const CURRENT_PATH: &str = "/data/2.5/weather";
const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key: config.resolved_api_key(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET `path` and return the body of a successful response.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            debug!(path, %status, body = %truncate_body(&body), "OpenWeather request failed");
        }

        check_status(status, body)
    }
}

/// Pass a 2xx body through; anything else becomes a status error carrying the
/// provider's own message when the body has one.
fn check_status(status: StatusCode, body: String) -> Result<String, ProviderError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(ProviderError::Status {
            status,
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(
        &self,
        city: &str,
        unit: Unit,
    ) -> Result<WeatherSnapshot, ProviderError> {
        let body = self
            .get(CURRENT_PATH, &[("q", city), ("units", unit.as_str())])
            .await?;
        parse_current(&body, unit)
    }

    async fn air_quality(&self, coord: Coordinates) -> Result<AirQuality, ProviderError> {
        let lat = coord.lat.to_string();
        let lon = coord.lon.to_string();
        let body = self
            .get(AIR_POLLUTION_PATH, &[("lat", lat.as_str()), ("lon", lon.as_str())])
            .await?;
        parse_air_quality(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: u8,
    sea_level: Option<f64>,
    grnd_level: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
    gust: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwPrecipitation {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwWeather>,
    main: OwMain,
    visibility: Option<u32>,
    wind: OwWind,
    clouds: OwClouds,
    rain: Option<OwPrecipitation>,
    snow: Option<OwPrecipitation>,
    dt: i64,
    sys: OwSys,
    timezone: i32,
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwAqiMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAqiMain,
    components: BTreeMap<String, f64>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

impl From<OwPrecipitation> for Precipitation {
    fn from(p: OwPrecipitation) -> Self {
        Precipitation {
            last_hour: p.one_hour,
            last_three_hours: p.three_hours,
        }
    }
}

fn parse_current(body: &str, unit: Unit) -> Result<WeatherSnapshot, ProviderError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)?;

    let conditions = parsed
        .weather
        .into_iter()
        .map(|w| Condition {
            id: w.id,
            main: w.main,
            description: w.description,
            icon: w.icon,
        })
        .collect();

    Ok(WeatherSnapshot {
        location: Location {
            id: parsed.id,
            name: parsed.name,
            country: parsed.sys.country,
            coord: Coordinates {
                lat: parsed.coord.lat,
                lon: parsed.coord.lon,
            },
            timezone_offset: parsed.timezone,
        },
        conditions,
        readings: Readings {
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            temp_min: parsed.main.temp_min,
            temp_max: parsed.main.temp_max,
            pressure: parsed.main.pressure,
            humidity_pct: parsed.main.humidity,
            sea_level: parsed.main.sea_level,
            ground_level: parsed.main.grnd_level,
        },
        visibility_m: parsed.visibility,
        cloudiness_pct: parsed.clouds.all,
        wind: Wind {
            speed: parsed.wind.speed,
            deg: parsed.wind.deg,
            gust: parsed.wind.gust,
        },
        rain: parsed.rain.map(Precipitation::from),
        snow: parsed.snow.map(Precipitation::from),
        sunrise: unix_to_utc(parsed.sys.sunrise).unwrap_or_default(),
        sunset: unix_to_utc(parsed.sys.sunset).unwrap_or_default(),
        observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
        unit,
        air_quality: None,
    })
}

/// Only the first (current) entry of the list is used.
fn parse_air_quality(body: &str) -> Result<AirQuality, ProviderError> {
    let parsed: OwAirResponse = serde_json::from_str(body)?;

    let entry = parsed
        .list
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyAirQuality)?;

    Ok(AirQuality {
        index: entry.main.aqi,
        components: entry.components,
        measured_at: unix_to_utc(entry.dt).unwrap_or_else(Utc::now),
    })
}

/// OpenWeather error bodies look like `{"cod":"404","message":"city not found"}`.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: &str = r#"{
        "coord": {"lon": 13.4105, "lat": 52.5244},
        "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
        "base": "stations",
        "main": {"temp": 17.6, "feels_like": 17.2, "temp_min": 16.1, "temp_max": 18.9,
                 "pressure": 1012, "humidity": 72, "sea_level": 1012, "grnd_level": 1007},
        "visibility": 10000,
        "wind": {"speed": 4.12, "deg": 270, "gust": 7.2},
        "rain": {"1h": 0.31},
        "clouds": {"all": 75},
        "dt": 1717243200,
        "sys": {"type": 2, "id": 2011538, "country": "DE",
                "sunrise": 1717210000, "sunset": 1717269900},
        "timezone": 7200,
        "id": 2950159,
        "name": "Berlin",
        "cod": 200
    }"#;

    const AIR: &str = r#"{
        "coord": {"lon": 13.4105, "lat": 52.5244},
        "list": [
            {"main": {"aqi": 3},
             "components": {"co": 230.31, "no": 0.1, "no2": 12.4, "o3": 68.7,
                            "so2": 1.2, "pm2_5": 9.8, "pm10": 14.2, "nh3": 0.9},
             "dt": 1717243200}
        ]
    }"#;

    #[test]
    fn parses_current_weather_payload() {
        let snapshot = parse_current(BERLIN, Unit::Metric).expect("payload should parse");

        assert_eq!(snapshot.location.name, "Berlin");
        assert_eq!(snapshot.location.country, "DE");
        assert_eq!(snapshot.location.timezone_offset, 7200);
        assert_eq!(snapshot.location.coord.lat, 52.5244);
        assert_eq!(snapshot.primary_condition().map(|c| c.main.as_str()), Some("Rain"));
        assert_eq!(snapshot.readings.humidity_pct, 72);
        assert_eq!(snapshot.readings.ground_level, Some(1007.0));
        assert_eq!(snapshot.wind.deg, 270.0);
        assert_eq!(snapshot.wind.gust, Some(7.2));
        assert_eq!(snapshot.visibility_m, Some(10000));
        assert_eq!(snapshot.cloudiness_pct, 75);
        assert_eq!(snapshot.rain.as_ref().and_then(|r| r.last_hour), Some(0.31));
        assert!(snapshot.snow.is_none());
        assert_eq!(snapshot.sunrise.timestamp(), 1717210000);
        assert_eq!(snapshot.unit, Unit::Metric);
        assert!(snapshot.air_quality.is_none());
    }

    #[test]
    fn missing_optional_fields_are_tolerated() {
        let body = r#"{
            "coord": {"lon": 0.0, "lat": 0.0},
            "weather": [],
            "main": {"temp": 1.0, "feels_like": 1.0, "temp_min": 1.0, "temp_max": 1.0,
                     "pressure": 1000, "humidity": 50},
            "wind": {"speed": 0.0},
            "clouds": {"all": 0},
            "dt": 0,
            "sys": {"sunrise": 0, "sunset": 0},
            "timezone": 0,
            "id": 1,
            "name": "Null Island"
        }"#;

        let snapshot = parse_current(body, Unit::Imperial).expect("payload should parse");
        assert!(snapshot.primary_condition().is_none());
        assert!(snapshot.visibility_m.is_none());
        assert!(snapshot.wind.gust.is_none());
        assert!(snapshot.readings.sea_level.is_none());
        assert_eq!(snapshot.unit, Unit::Imperial);
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let err = parse_current(r#"{"name": "Berlin"}"#, Unit::Metric).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn parses_first_air_quality_entry() {
        let aq = parse_air_quality(AIR).expect("payload should parse");
        assert_eq!(aq.index, 3);
        assert_eq!(aq.component("co"), Some(230.31));
        assert_eq!(aq.component("pm2_5"), Some(9.8));
        assert_eq!(aq.components.len(), 8);
    }

    #[test]
    fn empty_air_quality_list_is_an_error() {
        let err = parse_air_quality(r#"{"coord": {"lon": 0, "lat": 0}, "list": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyAirQuality));
    }

    #[test]
    fn extracts_provider_error_message() {
        assert_eq!(
            error_message(r#"{"cod":"404","message":"city not found"}"#).as_deref(),
            Some("city not found")
        );
        assert_eq!(
            error_message(r#"{"cod":401, "message": "Invalid API key."}"#).as_deref(),
            Some("Invalid API key.")
        );
        assert_eq!(error_message("<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(r#"{"cod":"500","message":""}"#), None);
    }

    #[test]
    fn not_found_response_carries_provider_message() {
        let body = r#"{"cod":"404","message":"city not found"}"#.to_string();

        let err = check_status(StatusCode::NOT_FOUND, body).unwrap_err();

        match &err {
            ProviderError::Status { status, message } => {
                assert_eq!(*status, StatusCode::NOT_FOUND);
                assert_eq!(message.as_deref(), Some("city not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.user_message(), "city not found");
    }

    #[test]
    fn error_response_without_message_reports_status_code() {
        let err = check_status(StatusCode::UNAUTHORIZED, "<html>nope</html>".to_string())
            .unwrap_err();
        assert_eq!(err.user_message(), "Request failed with status code 401");
    }

    #[test]
    fn success_response_body_passes_through() {
        let body = check_status(StatusCode::OK, BERLIN.to_string()).expect("2xx is accepted");
        let snapshot = parse_current(&body, Unit::Metric).expect("fixture parses");
        assert_eq!(snapshot.location.name, "Berlin");
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(300);
        assert_eq!(truncate_body(&long).len(), 203);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider =
            OpenWeatherProvider::new("KEY".into()).with_base_url("http://localhost:8080/");
        assert_eq!(provider.base_url, "http://localhost:8080");
    }
}
