//! Search box synchronization for the layout shell.
//!
//! The search input is a controlled field: its text is local state that user
//! input changes immediately, while the query reported by the last completed
//! load is authoritative and overwrites the text whenever a navigation lands.
//! Navigations are identified by tickets so that a newer navigation
//! supersedes any that are still in flight.

use url::{form_urlencoded, Url};

pub const SEARCH_PARAM: &str = "q";

const LOCATION_BASE: &str = "http://localhost/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NavigationTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    Idle,
    Navigating {
        location: String,
        ticket: NavigationTicket,
    },
}

/// Automatic form submission produced by a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub location: String,
    pub history: HistoryMode,
    pub ticket: NavigationTicket,
}

#[derive(Debug, Clone)]
pub struct SearchSync {
    text: String,
    loaded_query: Option<String>,
    navigation: NavigationState,
    next_ticket: u64,
}

impl SearchSync {
    pub fn new(loaded_query: Option<String>) -> Self {
        Self {
            text: loaded_query.clone().unwrap_or_default(),
            loaded_query,
            navigation: NavigationState::Idle,
            next_ticket: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn loaded_query(&self) -> Option<&str> {
        self.loaded_query.as_deref()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    /// Applies a keystroke and submits the search form.
    ///
    /// Only the first search of a session pushes a history entry: that is when
    /// nothing has been searched yet (`loaded_query` is `None`) and no search
    /// submission is still pending.
    pub fn input(&mut self, text: impl Into<String>) -> Submission {
        self.text = text.into();
        let history = if self.loaded_query.is_none() && !self.is_searching() {
            HistoryMode::Push
        } else {
            HistoryMode::Replace
        };
        let location = search_location(&self.text);
        let ticket = self.begin_navigation(location.clone());
        Submission {
            location,
            history,
            ticket,
        }
    }

    pub fn begin_navigation(&mut self, location: impl Into<String>) -> NavigationTicket {
        self.next_ticket += 1;
        let ticket = NavigationTicket(self.next_ticket);
        self.navigation = NavigationState::Navigating {
            location: location.into(),
            ticket,
        };
        ticket
    }

    /// Reconciles with the query of a finished load. Returns `false` and
    /// changes nothing when `ticket` was superseded.
    pub fn complete_navigation(
        &mut self,
        ticket: NavigationTicket,
        loaded_query: Option<String>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.navigation = NavigationState::Idle;
        self.text = loaded_query.clone().unwrap_or_default();
        self.loaded_query = loaded_query;
        true
    }

    /// Drops the in-flight navigation without touching the loaded query.
    pub fn fail_navigation(&mut self, ticket: NavigationTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.navigation = NavigationState::Idle;
        true
    }

    pub fn is_searching(&self) -> bool {
        match &self.navigation {
            NavigationState::Navigating { location, .. } => location_has_search(location),
            NavigationState::Idle => false,
        }
    }

    pub fn is_detail_loading(&self) -> bool {
        matches!(self.navigation, NavigationState::Navigating { .. }) && !self.is_searching()
    }

    pub fn input_class(&self) -> &'static str {
        if self.is_searching() {
            "loading"
        } else {
            ""
        }
    }

    pub fn detail_class(&self) -> &'static str {
        if self.is_detail_loading() {
            "loading"
        } else {
            ""
        }
    }

    fn is_current(&self, ticket: NavigationTicket) -> bool {
        matches!(&self.navigation, NavigationState::Navigating { ticket: current, .. } if *current == ticket)
    }
}

/// Location the search form submits to for `text`.
pub fn search_location(text: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(SEARCH_PARAM, text)
        .finish();
    format!("/?{query}")
}

pub fn location_has_search(location: &str) -> bool {
    parse_location(location)
        .map(|url| url.query_pairs().any(|(key, _)| key == SEARCH_PARAM))
        .unwrap_or(false)
}

/// The `q` parameter of `location`: `None` when absent, `Some("")` when present but empty.
pub fn query_from_location(location: &str) -> Option<String> {
    let url = parse_location(location)?;
    url.query_pairs()
        .find(|(key, _)| key == SEARCH_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn parse_location(location: &str) -> Option<Url> {
    let base = Url::parse(LOCATION_BASE).ok()?;
    base.join(location).ok()
}
