use crate::{
    Config,
    model::{AirQuality, Coordinates, Unit, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

/// Message shown when nothing better is known about a failure.
pub const GENERIC_FAILURE: &str = "Failed to fetch weather data";

#[derive(Debug, Error)]
pub enum ProviderError {
    /// No response at all (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status; `message` is the provider's own explanation when it sent one.
    #[error("provider returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("air quality response contained no data")]
    EmptyAirQuality,
}

impl ProviderError {
    /// Text suitable for the error view.
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ProviderError::Status { status, .. } => {
                format!("Request failed with status code {}", status.as_u16())
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name, in the requested unit system.
    async fn current_weather(
        &self,
        city: &str,
        unit: Unit,
    ) -> Result<WeatherSnapshot, ProviderError>;

    /// Latest air pollution reading for a point.
    async fn air_quality(&self, coord: Coordinates) -> Result<AirQuality, ProviderError>;
}

/// Construct the OpenWeather provider from config and the resolved credential.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::from_config(config)?;
    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_message_is_used_verbatim() {
        let err = ProviderError::Status {
            status: StatusCode::NOT_FOUND,
            message: Some("city not found".to_string()),
        };
        assert_eq!(err.user_message(), "city not found");
    }

    #[test]
    fn status_without_message_falls_back_to_status_code() {
        let err = ProviderError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: None,
        };
        assert_eq!(err.user_message(), "Request failed with status code 502");

        let blank = ProviderError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.user_message(), "Request failed with status code 401");
    }

    #[test]
    fn decode_failures_use_generic_message() {
        let err: ProviderError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert_eq!(ProviderError::EmptyAirQuality.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn provider_from_config_works_with_defaults() {
        let provider = provider_from_config(&Config::default());
        assert!(provider.is_ok());
    }
}
