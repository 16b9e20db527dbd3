use shared::{
    protocol::RootData,
    search::{query_from_location, HistoryMode, NavigationTicket, SearchSync},
};
use tracing::{debug, warn};

use crate::{ContactsClient, History, Result};

/// Drives [`SearchSync`] the way a browser tab would: keystrokes submit the
/// search form, navigations land in [`History`], and every completed load
/// reconciles the search box with the loaded query.
pub struct SearchSession {
    pub(crate) client: ContactsClient,
    sync: SearchSync,
    history: History,
    data: RootData,
}

impl SearchSession {
    /// Opens `location` as the first entry of a fresh history.
    pub async fn open(client: ContactsClient, location: &str) -> Result<Self> {
        let data = client
            .load_root(query_from_location(location).as_deref())
            .await?;
        Ok(Self {
            sync: SearchSync::new(data.query.clone()),
            history: History::new(location),
            client,
            data,
        })
    }

    pub fn search_text(&self) -> &str {
        self.sync.text()
    }

    pub fn sync(&self) -> &SearchSync {
        &self.sync
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn data(&self) -> &RootData {
        &self.data
    }

    /// One keystroke in the search box: the typed text replaces the field
    /// contents and the form submits itself.
    pub async fn type_search(&mut self, text: &str) -> Result<&RootData> {
        let submission = self.sync.input(text);
        match submission.history {
            HistoryMode::Push => self.history.push(submission.location.clone()),
            HistoryMode::Replace => self.history.replace(submission.location.clone()),
        }
        debug!(location = %submission.location, history = ?submission.history, "search submitted");
        self.load(submission.ticket, &submission.location).await
    }

    /// Follows a link, pushing a new history entry.
    pub async fn navigate(&mut self, location: &str) -> Result<&RootData> {
        self.history.push(location);
        let ticket = self.sync.begin_navigation(location);
        self.load(ticket, location).await
    }

    /// Goes back one history entry. Returns `None` at the start of history.
    pub async fn back(&mut self) -> Option<Result<&RootData>> {
        let location = self.history.back()?.to_string();
        let ticket = self.sync.begin_navigation(location.clone());
        Some(self.load(ticket, &location).await)
    }

    async fn load(&mut self, ticket: NavigationTicket, location: &str) -> Result<&RootData> {
        match self
            .client
            .load_root(query_from_location(location).as_deref())
            .await
        {
            Ok(data) => {
                if self.sync.complete_navigation(ticket, data.query.clone()) {
                    self.data = data;
                }
                Ok(&self.data)
            }
            Err(err) => {
                warn!(%location, error = %err, "navigation failed");
                self.sync.fail_navigation(ticket);
                Err(err)
            }
        }
    }
}
