//! Display helpers turning raw snapshot fields into text.

use chrono::{DateTime, FixedOffset, Timelike, Utc};

use crate::model::{Coordinates, Unit};

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a wind direction in degrees.
pub fn wind_direction(deg: f64) -> &'static str {
    let normalized = deg.rem_euclid(360.0);
    let idx = (normalized / 22.5).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[idx]
}

pub fn air_quality_description(index: u8) -> &'static str {
    match index {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

/// Hex color conventionally used for each AQI level.
pub fn air_quality_color(index: u8) -> &'static str {
    match index {
        1 => "#00e400",
        2 => "#ffff00",
        3 => "#ff7e00",
        4 => "#ff0000",
        5 => "#8f3f97",
        _ => "#666666",
    }
}

pub fn temperature(value: f64, unit: Unit) -> String {
    format!("{}{}", value.round() as i64, unit.temperature_symbol())
}

pub fn speed(value: f64, unit: Unit) -> String {
    format!("{:.1} {}", value, unit.speed_unit())
}

pub fn visibility(metres: u32) -> String {
    format!("{:.1} km", f64::from(metres) / 1000.0)
}

/// Carbon monoxide is reported in μg/m³ but read more naturally in mg/m³.
pub fn carbon_monoxide_mg(micrograms: f64) -> String {
    format!("{:.2} mg/m³", micrograms / 1000.0)
}

pub fn concentration(micrograms: f64) -> String {
    format!("{micrograms:.1} μg/m³")
}

pub fn coordinates(coord: Coordinates) -> String {
    format!("{:.2}°, {:.2}°", coord.lat, coord.lon)
}

/// `UTC+1`, `UTC-3`, `UTC+5:30`.
pub fn utc_offset(seconds: i32) -> String {
    let sign = if seconds >= 0 { '+' } else { '-' };
    let abs = seconds.unsigned_abs();
    let hours = abs / 3600;
    let minutes = (abs % 3600) / 60;

    if minutes == 0 {
        format!("UTC{sign}{hours}")
    } else {
        format!("UTC{sign}{hours}:{minutes:02}")
    }
}

fn to_local(ts: DateTime<Utc>, offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    FixedOffset::east_opt(offset_secs).map(|tz| ts.with_timezone(&tz))
}

/// Wall-clock time at the city, `HH:MM:SS`.
pub fn local_time(ts: DateTime<Utc>, offset_secs: i32) -> String {
    match to_local(ts, offset_secs) {
        Some(local) => local.format("%H:%M:%S").to_string(),
        None => ts.format("%H:%M:%S UTC").to_string(),
    }
}

pub fn local_hour(ts: DateTime<Utc>, offset_secs: i32) -> u32 {
    to_local(ts, offset_secs)
        .map(|local| local.hour())
        .unwrap_or_else(|| ts.hour())
}

/// Rough UV guess from position and local hour; the current-weather endpoint carries no UV.
pub fn uv_estimate(lat: f64, lon: f64, local_hour: u32) -> String {
    if !(6..=18).contains(&local_hour) {
        return "0 (Night)".to_string();
    }

    let lat_factor = lat.abs() / 90.0;
    let lon_factor = lon.to_radians().cos();
    let time_factor = ((f64::from(local_hour) - 6.0) * std::f64::consts::PI / 12.0).sin();
    let estimate = ((1.0 - lat_factor) * lon_factor * time_factor * 10.0).round();

    format!("{} (Estimated)", estimate.max(0.0) as i64)
}
