//! HTTP client for the contacts server and a browser-like search session on top of it.

use reqwest::{header, redirect, Client, Response};
use shared::{
    domain::ContactId,
    error::{ApiError, ErrorCode},
    protocol::{destroy_contact_route, home_route, RootData, ROOT_DATA_KEY},
    search::SEARCH_PARAM,
};
use tracing::debug;
use url::Url;

pub mod error;
mod history;
mod session;

pub use error::{ClientError, Result};
pub use history::History;
pub use session::SearchSession;

#[derive(Debug, Clone)]
pub struct ContactsClient {
    http: Client,
    base_url: Url,
}

impl ContactsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // Actions answer with redirects whose target is the interesting part.
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Fetches the root loader output for `query` as JSON.
    pub async fn load_root(&self, query: Option<&str>) -> Result<RootData> {
        let mut url = self.base_url.join(home_route())?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("_data", ROOT_DATA_KEY);
            if let Some(query) = query {
                pairs.append_pair(SEARCH_PARAM, query);
            }
        }
        debug!(%url, "loading root data");
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Submits "New" and returns the editor location of the created contact.
    pub async fn create_contact(&self) -> Result<String> {
        let url = self.base_url.join(home_route())?;
        let response = self.http.post(url).send().await?;
        redirect_location(response).await
    }

    /// Submits the destroy form and returns where the server sent us.
    pub async fn destroy_contact(&self, id: &ContactId) -> Result<String> {
        let url = self.base_url.join(&destroy_contact_route(id))?;
        let response = self.http.post(url).send().await?;
        redirect_location(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error = match response.json::<ApiError>().await {
        Ok(error) => error,
        Err(_) => ApiError::new(
            ErrorCode::Internal,
            status.canonical_reason().unwrap_or("request failed"),
        ),
    };
    Err(ClientError::Server { status, error })
}

async fn redirect_location(response: Response) -> Result<String> {
    let status = response.status();
    if !status.is_redirection() {
        let response = check_status(response).await?;
        return Err(ClientError::MissingRedirect(response.status()));
    }
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or(ClientError::MissingRedirect(status))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
