use reqwest::StatusCode;
use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {error}")]
    Server { status: StatusCode, error: ApiError },
    #[error("expected a redirect, server answered {0}")]
    MissingRedirect(StatusCode),
}

pub type Result<T> = std::result::Result<T, ClientError>;
