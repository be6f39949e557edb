//! Two-stage lookup: current weather by city, then air quality by the
//! returned coordinates. Results reach the session only through the [`Store`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    model::WeatherSnapshot,
    provider::WeatherProvider,
    store::{Action, Store},
};

/// What happened to one `fetch_weather` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Blank input; nothing was requested and the state is untouched.
    Rejected,
    Loaded(Arc<WeatherSnapshot>),
    Failed(String),
    /// A later fetch was started before this one finished; its result was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    provider: Arc<dyn WeatherProvider>,
    store: Store,
}

impl FetchCoordinator {
    pub fn new(provider: Arc<dyn WeatherProvider>, store: Store) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub async fn fetch_weather(&self, city: &str) -> FetchOutcome {
        let city = city.trim();
        if city.is_empty() {
            debug!("Ignoring blank city name");
            return FetchOutcome::Rejected;
        }

        let unit = self.store.with_state(|state| state.unit);
        let request = self.store.start_fetch();
        debug!(%request, city, %unit, "Fetching weather");

        let snapshot = match self.provider.current_weather(city, unit).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%request, city, error = %err, "Weather lookup failed");
                let message = err.user_message();
                let applied = self.store.dispatch(Action::FetchError {
                    request,
                    message: message.clone(),
                });
                return if applied {
                    FetchOutcome::Failed(message)
                } else {
                    FetchOutcome::Superseded
                };
            }
        };

        // Best effort: any failure here just leaves air quality absent.
        let air_quality = match self.provider.air_quality(snapshot.location.coord).await {
            Ok(air_quality) => Some(air_quality),
            Err(err) => {
                debug!(%request, error = %err, "Air quality unavailable");
                None
            }
        };

        let snapshot = Arc::new(snapshot.with_air_quality(air_quality));
        let applied = self.store.dispatch(Action::FetchSuccess {
            request,
            snapshot: Arc::clone(&snapshot),
            at: Utc::now(),
        });

        if !applied {
            debug!(%request, city, "Discarding superseded result");
            return FetchOutcome::Superseded;
        }

        self.store.dispatch(Action::AddToHistory(city.to_string()));
        info!(
            %request,
            city = %snapshot.location.name,
            air_quality = snapshot.air_quality.is_some(),
            "Weather loaded"
        );

        FetchOutcome::Loaded(snapshot)
    }

    pub fn toggle_unit(&self) {
        self.store.dispatch(Action::ToggleUnit);
    }

    pub fn clear_history(&self) {
        self.store.dispatch(Action::ClearHistory);
    }

    pub fn clear_error(&self) {
        self.store.dispatch(Action::ClearError);
    }
}
