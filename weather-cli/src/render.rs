//! Plain-text rendering of the session state.

use chrono::{DateTime, Utc};
use weather_core::{
    Screen, SessionState, WeatherSnapshot,
    format,
    model::Precipitation,
};

const LABEL_WIDTH: usize = 26;

/// Render the header plus exactly one of: error, weather, or the start prompt.
pub fn render(state: &SessionState, now: DateTime<Utc>) -> String {
    let mut lines = header(state);
    lines.push(String::new());

    match state.screen() {
        Screen::Error(message) => lines.push(format!("❌ {message}")),
        Screen::Weather(snapshot) => lines.extend(weather(snapshot, state.last_updated, now)),
        Screen::Prompt => lines.push("☀️  Enter a city name to get started!".to_string()),
    }

    if state.is_loading() {
        lines.push(String::new());
        lines.push("Searching...".to_string());
    }

    lines.join("\n")
}

fn header(state: &SessionState) -> Vec<String> {
    let mut lines = vec![format!(
        "⛅ Weather App  [{} {}]",
        state.unit,
        state.unit.temperature_symbol()
    )];

    if !state.history.is_empty() {
        lines.push(format!("Recent searches: {}", state.history.entries().join(", ")));
    }

    lines
}

fn row(label: &str, value: impl AsRef<str>) -> String {
    format!("  {label:<LABEL_WIDTH$}{}", value.as_ref())
}

fn precipitation(p: &Precipitation) -> String {
    match p.last_hour {
        Some(mm) => format!("{mm} mm"),
        None => "No data".to_string(),
    }
}

fn weather(
    snapshot: &WeatherSnapshot,
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<String> {
    let unit = snapshot.unit;
    let tz = snapshot.location.timezone_offset;
    let readings = &snapshot.readings;
    let wind = &snapshot.wind;

    let mut lines = vec![format!(
        "{}, {}",
        snapshot.location.name, snapshot.location.country
    )];
    lines.push(format!(
        "Updated at {}",
        format::local_time(snapshot.observed_at, tz)
    ));
    lines.push(String::new());

    lines.push(format!(
        "{}  {}",
        format::temperature(readings.temperature, unit),
        snapshot
            .primary_condition()
            .map(|c| format!("{} - {}", c.main, c.description))
            .unwrap_or_default()
    ));
    lines.push(format!(
        "Feels like {}",
        format::temperature(readings.feels_like, unit)
    ));
    lines.push(String::new());

    lines.push(row(
        "🌡️ Temp Range",
        format!(
            "{} - {}",
            format::temperature(readings.temp_min, unit),
            format::temperature(readings.temp_max, unit)
        ),
    ));
    lines.push(row("💧 Humidity", format!("{}%", readings.humidity_pct)));
    lines.push(row("🌪️ Wind Speed", format::speed(wind.speed, unit)));
    lines.push(row(
        "🧭 Wind Direction",
        format!("{:.0}° ({})", wind.deg, format::wind_direction(wind.deg)),
    ));
    if let Some(gust) = wind.gust {
        lines.push(row("💨 Wind Gusts", format::speed(gust, unit)));
    }
    lines.push(row("🔽 Pressure", format!("{:.0} hPa", readings.pressure)));
    if let Some(sea_level) = readings.sea_level {
        lines.push(row("🌊 Sea Level Pressure", format!("{sea_level:.0} hPa")));
    }
    if let Some(ground_level) = readings.ground_level {
        lines.push(row("🏔️ Ground Level Pressure", format!("{ground_level:.0} hPa")));
    }
    lines.push(row(
        "👁️ Visibility",
        snapshot
            .visibility_m
            .map(format::visibility)
            .unwrap_or_else(|| "No data".to_string()),
    ));
    lines.push(row("☁️ Cloudiness", format!("{}%", snapshot.cloudiness_pct)));
    if let Some(rain) = &snapshot.rain {
        lines.push(row("🌧️ Rain (1h)", precipitation(rain)));
    }
    if let Some(snow) = &snapshot.snow {
        lines.push(row("❄️ Snow (1h)", precipitation(snow)));
    }
    lines.push(row("🌅 Sunrise", format::local_time(snapshot.sunrise, tz)));
    lines.push(row("🌇 Sunset", format::local_time(snapshot.sunset, tz)));
    lines.push(row("🕐 Local Time", format::local_time(now, tz)));
    lines.push(row("📍 Coordinates", format::coordinates(snapshot.location.coord)));
    lines.push(row("🌍 Timezone", format::utc_offset(tz)));
    lines.push(row(
        "📊 UV Index",
        format::uv_estimate(
            snapshot.location.coord.lat,
            snapshot.location.coord.lon,
            format::local_hour(now, tz),
        ),
    ));

    if let Some(air) = &snapshot.air_quality {
        lines.push(row(
            "🏭 Air Quality",
            format!(
                "{}/5 ({}) {}",
                air.index,
                format::air_quality_description(air.index),
                format::air_quality_color(air.index)
            ),
        ));
        for (label, key) in [
            ("🫁 PM2.5", "pm2_5"),
            ("💨 PM10", "pm10"),
            ("⚠️ NO₂", "no2"),
            ("🌫️ O₃", "o3"),
        ] {
            if let Some(value) = air.component(key) {
                lines.push(row(label, format::concentration(value)));
            }
        }
        if let Some(co) = air.component("co") {
            lines.push(row("🏭 CO", format::carbon_monoxide_mg(co)));
        }
    }

    if let Some(at) = last_updated {
        lines.push(String::new());
        lines.push(format!("Fetched {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    lines
}
