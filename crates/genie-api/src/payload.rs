use crate::ApiError;
use genie_core::{Draft, Tone, WireEmail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct TextRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RewriteRequest<'a> {
    pub text: &'a str,
    pub tone: Tone,
}

#[derive(Debug, Serialize)]
pub(crate) struct AutoReplyRequest<'a> {
    pub original_email: &'a str,
    pub context: &'a str,
}

/// Fields shared by every `{success, ...}` response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// `success: false` is a rejection; an absent flag on a 2xx response is accepted.
    pub fn accepted(&self, operation: &str) -> Result<(), ApiError> {
        if self.success == Some(false) {
            let reason = self
                .error
                .clone()
                .or_else(|| self.message.clone())
                .unwrap_or_else(|| format!("{operation} was not successful"));
            return Err(ApiError::Rejected(reason));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InboxResponse {
    pub emails: Vec<WireEmail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DraftsResponse {
    pub drafts: Vec<Draft>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RewriteResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub rewritten_text: Option<String>,
    #[serde(default)]
    pub rewritten: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AutoReplyResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepliesResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub replies: Option<Vec<String>>,
}

pub(crate) fn required<T>(value: Option<T>, operation: &str, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Payload(format!("{operation} response is missing `{field}`")))
}
