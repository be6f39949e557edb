//! Interactive loop: prompts for an action, drives the coordinator, re-renders.

use anyhow::Result;
use chrono::Utc;
use inquire::{InquireError, Select, Text};
use std::fmt;
use weather_core::{FetchCoordinator, FetchOutcome, SessionState};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Search,
    Recent,
    ToggleUnit,
    ClearHistory,
    DismissError,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::Search => "Search for a city",
            MenuItem::Recent => "Recent searches",
            MenuItem::ToggleUnit => "Toggle °C / °F",
            MenuItem::ClearHistory => "Clear history",
            MenuItem::DismissError => "Dismiss error",
            MenuItem::Quit => "Quit",
        })
    }
}

/// Entries that make sense for the current state.
pub fn menu(state: &SessionState) -> Vec<MenuItem> {
    let mut items = vec![MenuItem::Search];
    if !state.history.is_empty() {
        items.push(MenuItem::Recent);
    }
    items.push(MenuItem::ToggleUnit);
    if !state.history.is_empty() {
        items.push(MenuItem::ClearHistory);
    }
    if state.error().is_some() {
        items.push(MenuItem::DismissError);
    }
    items.push(MenuItem::Quit);
    items
}

/// `Ok(None)` when the user cancelled the prompt with Esc or Ctrl-C.
fn cancellable<T>(result: Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn show(coordinator: &FetchCoordinator) {
    let state = coordinator.store().state();
    println!("\n{}\n", render::render(&state, Utc::now()));
}

/// Run one fetch, printing a progress line once the store reports loading.
async fn search(coordinator: &FetchCoordinator, city: &str) -> FetchOutcome {
    let mut rx = coordinator.store().subscribe();
    let fetch = coordinator.fetch_weather(city);
    tokio::pin!(fetch);

    let mut announced = false;
    loop {
        tokio::select! {
            outcome = &mut fetch => return outcome,
            Ok(()) = rx.changed() => {
                if !announced && rx.borrow_and_update().is_loading() {
                    println!("Searching for {}...", city.trim());
                    announced = true;
                }
            }
        }
    }
}

pub async fn run(coordinator: FetchCoordinator) -> Result<()> {
    show(&coordinator);

    loop {
        let state = coordinator.store().state();
        let Some(choice) = cancellable(Select::new("What next?", menu(&state)).prompt())? else {
            break;
        };

        match choice {
            MenuItem::Search => {
                let input = Text::new("City:")
                    .with_placeholder("Search for a city...")
                    .prompt();
                let Some(city) = cancellable(input)? else {
                    continue;
                };
                if search(&coordinator, &city).await == FetchOutcome::Rejected {
                    println!("Please enter a city name.");
                    continue;
                }
            }
            MenuItem::Recent => {
                let recent = state.history.entries().to_vec();
                let Some(city) = cancellable(Select::new("Recent searches", recent).prompt())?
                else {
                    continue;
                };
                search(&coordinator, &city).await;
            }
            MenuItem::ToggleUnit => coordinator.toggle_unit(),
            MenuItem::ClearHistory => coordinator.clear_history(),
            MenuItem::DismissError => coordinator.clear_error(),
            MenuItem::Quit => break,
        }

        show(&coordinator);
    }

    Ok(())
}
