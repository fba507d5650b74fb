use reqwest::StatusCode;
use thiserror::Error;

/// Why a reply stream could not be completed.
///
/// The user sees the same apology for every variant; the distinction only
/// matters for the log.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("request to RAG backend failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("RAG backend answered with status {0}")]
    Status(StatusCode),
    #[error("reply stream could not be read: {0}")]
    Body(#[source] reqwest::Error),
}
