use genie_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("{0}")]
    Validation(String),
    #[error("this action needs an email to reply to")]
    NoReplyContext,
    #[error("no reply suggestion at position {0}")]
    NoSuggestion(usize),
    #[error(transparent)]
    Api(#[from] ApiError),
}
