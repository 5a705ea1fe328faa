use crate::ApiError;
use async_trait::async_trait;
use genie_core::{Classification, Draft, Email, OutgoingMessage, Tone};

/// Single-record mutations exposed under `/gmail/{action}/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailAction {
    Archive,
    Trash,
    RestoreToInbox,
    Unarchive,
    Restore,
    MarkRead,
    Star,
    Unstar,
}

impl MailAction {
    pub fn path_segment(self) -> &'static str {
        match self {
            MailAction::Archive => "archive",
            MailAction::Trash => "trash",
            MailAction::RestoreToInbox => "inbox",
            MailAction::Unarchive => "unarchive",
            MailAction::Restore => "restore",
            MailAction::MarkRead => "mark-read",
            MailAction::Star => "star",
            MailAction::Unstar => "unstar",
        }
    }
}

#[async_trait]
pub trait MailApi: Send + Sync {
    async fn fetch_inbox(&self) -> Result<Vec<Email>, ApiError>;

    async fn apply(&self, action: MailAction, id: &str) -> Result<(), ApiError>;

    /// Backend-side summary of a stored message.
    async fn summarize_email(&self, id: &str) -> Result<String, ApiError>;

    async fn send(&self, message: &OutgoingMessage) -> Result<(), ApiError>;

    async fn save_draft(&self, message: &OutgoingMessage) -> Result<(), ApiError>;

    async fn list_drafts(&self) -> Result<Vec<Draft>, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AiApi: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ApiError>;

    async fn summarize(&self, text: &str) -> Result<String, ApiError>;

    async fn rewrite(&self, text: &str, tone: Tone) -> Result<String, ApiError>;

    async fn auto_reply(&self, original_email: &str, context: &str) -> Result<String, ApiError>;

    async fn smart_replies(&self, text: &str) -> Result<Vec<String>, ApiError>;

    async fn suggest_replies(&self, text: &str) -> Result<Vec<String>, ApiError>;
}
