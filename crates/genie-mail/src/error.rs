use genie_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("another change to email `{0}` is still in flight")]
    Busy(String),
}

impl MailError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, MailError::Api(err) if err.is_auth_failure())
    }
}
