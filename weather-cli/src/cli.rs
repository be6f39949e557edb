use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use std::sync::Arc;
use tracing::debug;
use weather_core::{
    Config, FetchCoordinator, FetchOutcome, SessionState, Store, Unit,
    provider::provider_from_config,
};

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and air quality for a city")]
pub struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG is used when absent.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to an interactive session.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default units.
    Configure,

    /// Show weather for a city once.
    Show {
        /// City name, e.g. "Berlin" or "Paris,FR".
        city: String,

        /// Unit system; overrides the configured default.
        #[arg(long, value_parser = parse_unit)]
        units: Option<Unit>,
    },

    /// Search repeatedly, keeping a short list of recent cities.
    Interactive {
        #[arg(long, value_parser = parse_unit)]
        units: Option<Unit>,
    },
}

pub fn parse_unit(value: &str) -> Result<Unit, String> {
    Unit::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Some(Command::Configure) => configure(),
            Some(Command::Show { city, units }) => show(&city, units).await,
            Some(Command::Interactive { units }) => session::run(coordinator(units)?).await,
            None => session::run(coordinator(None)?).await,
        }
    }
}

/// Composition root: config → provider → store → coordinator.
fn coordinator(units: Option<Unit>) -> Result<FetchCoordinator> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let unit = units.unwrap_or_else(|| config.default_unit());
    let store = Store::new(SessionState::with_unit(unit));
    debug!(%unit, base_url = config.base_url(), "Session configured");

    Ok(FetchCoordinator::new(Arc::from(provider), store))
}

async fn show(city: &str, units: Option<Unit>) -> Result<()> {
    let coordinator = coordinator(units)?;

    match coordinator.fetch_weather(city).await {
        FetchOutcome::Loaded(_) => {
            let state = coordinator.store().state();
            println!("{}", render::render(&state, Utc::now()));
            Ok(())
        }
        FetchOutcome::Failed(message) => bail!(message),
        FetchOutcome::Rejected => bail!("City name must not be empty"),
        // Only one fetch runs here.
        FetchOutcome::Superseded => bail!("Weather lookup was superseded"),
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Create one at https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read API key")?;

    let current = Unit::all()
        .iter()
        .position(|u| *u == config.default_unit())
        .unwrap_or(0);
    let unit = Select::new("Default units:", Unit::all().to_vec())
        .with_starting_cursor(current)
        .prompt()
        .context("Failed to read unit preference")?;

    let api_key = api_key.trim();
    if !api_key.is_empty() {
        config.set_api_key(api_key.to_string());
    }
    config.units = Some(unit);

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}
