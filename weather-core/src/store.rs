//! Session state and the reducer that owns every change to it.
//!
//! The [`Store`] is an explicit handle created by the application root and
//! cloned into whoever needs it. All mutation goes through [`Store::dispatch`],
//! which runs the pure [`reduce`] function and notifies subscribers.

use chrono::{DateTime, Utc};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::watch;
use tracing::debug;

use crate::model::{Unit, WeatherSnapshot};

/// Maximum number of remembered searches.
pub const HISTORY_LIMIT: usize = 5;

/// Tag of one fetch. Only the most recently started fetch may complete into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Recently searched cities, most recent first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    /// Move `city` to the front, evicting the oldest entry past the limit.
    pub fn record(&mut self, city: &str) -> bool {
        if self.entries.first().map(String::as_str) == Some(city) {
            return false;
        }

        self.entries.retain(|entry| entry != city);
        self.entries.insert(0, city.to_string());
        self.entries.truncate(HISTORY_LIMIT);
        true
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.entries.is_empty();
        self.entries.clear();
        changed
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the current fetch cycle stands. Error and data never coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Phase {
    /// Nothing fetched yet, or the last error was dismissed.
    #[default]
    Idle,
    /// A fetch is in flight; `shown` is whatever was on screen when it started.
    Loading { shown: Option<Arc<WeatherSnapshot>> },
    Failed(String),
    Loaded(Arc<WeatherSnapshot>),
}

/// The one screen the view should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen<'a> {
    Prompt,
    Error(&'a str),
    Weather(&'a WeatherSnapshot),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub history: SearchHistory,
    pub unit: Unit,
    pub last_updated: Option<DateTime<Utc>>,
    /// Latest fetch that was started.
    pub latest_request: Option<RequestId>,
}

impl SessionState {
    pub fn with_unit(unit: Unit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&Arc<WeatherSnapshot>> {
        match &self.phase {
            Phase::Loaded(snapshot) => Some(snapshot),
            Phase::Loading { shown } => shown.as_ref(),
            _ => None,
        }
    }

    /// Error wins over data; with neither the prompt is shown.
    pub fn screen(&self) -> Screen<'_> {
        if let Some(message) = self.error() {
            Screen::Error(message)
        } else if let Some(snapshot) = self.data() {
            Screen::Weather(snapshot)
        } else {
            Screen::Prompt
        }
    }

    fn is_latest(&self, request: RequestId) -> bool {
        self.latest_request == Some(request)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FetchStart {
        request: RequestId,
    },
    FetchSuccess {
        request: RequestId,
        snapshot: Arc<WeatherSnapshot>,
        at: DateTime<Utc>,
    },
    FetchError {
        request: RequestId,
        message: String,
    },
    AddToHistory(String),
    ToggleUnit,
    ClearHistory,
    ClearError,
}

impl Action {
    /// Action name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::FetchStart { .. } => "FetchStart",
            Action::FetchSuccess { .. } => "FetchSuccess",
            Action::FetchError { .. } => "FetchError",
            Action::AddToHistory(_) => "AddToHistory",
            Action::ToggleUnit => "ToggleUnit",
            Action::ClearHistory => "ClearHistory",
            Action::ClearError => "ClearError",
        }
    }
}

/// Apply `action` to `state`. Returns `true` if the state changed.
///
/// Completions for a request other than the latest started one are ignored,
/// and so is a start that arrives after a newer one.
pub fn reduce(state: &mut SessionState, action: Action) -> bool {
    match action {
        Action::FetchStart { request } => {
            if state.latest_request.is_some_and(|latest| request <= latest) {
                return false;
            }
            let shown = state.data().cloned();
            state.phase = Phase::Loading { shown };
            state.latest_request = Some(request);
            true
        }

        Action::FetchSuccess {
            request,
            snapshot,
            at,
        } => {
            if !state.is_latest(request) {
                return false;
            }
            state.phase = Phase::Loaded(snapshot);
            state.last_updated = Some(at);
            true
        }

        Action::FetchError { request, message } => {
            if !state.is_latest(request) {
                return false;
            }
            state.phase = Phase::Failed(message);
            true
        }

        Action::AddToHistory(city) => state.history.record(&city),

        Action::ToggleUnit => {
            state.unit = state.unit.toggle();
            true
        }

        Action::ClearHistory => state.history.clear(),

        Action::ClearError => {
            if matches!(state.phase, Phase::Failed(_)) {
                state.phase = Phase::Idle;
                true
            } else {
                false
            }
        }
    }
}

/// Shared handle to the session state.
#[derive(Debug, Clone)]
pub struct Store {
    tx: Arc<watch::Sender<SessionState>>,
    requests: Arc<AtomicU64>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(SessionState::default())
    }
}

impl Store {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the reducer; subscribers are only woken when the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        let name = action.name();
        let changed = self.tx.send_if_modified(|state| reduce(state, action));
        debug!(action = name, state_changed = changed, "Action processed");
        changed
    }

    /// Copy of the current state.
    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that is notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Issue a fresh tag and enter loading under one write lock, so the
    /// newest tag is always the one recorded as latest.
    pub fn start_fetch(&self) -> RequestId {
        let mut request = RequestId(0);
        self.tx.send_modify(|state| {
            request = RequestId(self.requests.fetch_add(1, Ordering::Relaxed) + 1);
            reduce(state, Action::FetchStart { request });
        });
        debug!(action = "FetchStart", %request, "Action processed");
        request
    }
}
