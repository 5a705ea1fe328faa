use crate::{Category, Email, EmailDate, MailStatus};
use serde::Deserialize;
use serde_json::Value;

/// Email record as returned by `/gmail/inbox`.
///
/// Backend variants disagree on field spelling (`isRead` / `is_read`, `date` /
/// `created_at`) and on id type, so every field is optional and spellings are
/// kept apart rather than aliased.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireEmail {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub message_id: Option<Value>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "isStarred")]
    pub is_starred_camel: Option<bool>,
    #[serde(default)]
    pub is_starred: Option<bool>,
    #[serde(default, rename = "isRead")]
    pub is_read_camel: Option<bool>,
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, rename = "aiSummary")]
    pub ai_summary_camel: Option<String>,
    #[serde(default)]
    pub ai_summary: Option<String>,
}

impl WireEmail {
    /// Materializes an [`Email`], defaulting missing fields. Records without any
    /// usable identifier are dropped.
    pub fn into_email(self) -> Option<Email> {
        let id = self
            .id
            .as_ref()
            .and_then(identifier)
            .or_else(|| self.message_id.as_ref().and_then(identifier));

        let Some(id) = id else {
            tracing::warn!(
                subject = self.subject.as_deref().unwrap_or_default(),
                "dropping email record without id"
            );
            return None;
        };

        let status = match self.status.as_deref() {
            None => MailStatus::Inbox,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(%id, status = raw, "unknown email status, treating as inbox");
                MailStatus::Inbox
            }),
        };

        Some(Email {
            id,
            sender: self.sender.unwrap_or_default(),
            subject: self.subject.unwrap_or_default(),
            snippet: self.snippet.unwrap_or_default(),
            content: self.content,
            category: self
                .category
                .as_deref()
                .map(Category::from_label)
                .unwrap_or_default(),
            status,
            is_starred: self.is_starred_camel.or(self.is_starred).unwrap_or(false),
            date: self
                .date
                .or(self.created_at)
                .map(EmailDate::parse)
                .unwrap_or_default(),
            is_read: self.is_read_camel.or(self.is_read).unwrap_or(false),
            ai_summary: self
                .ai_summary_camel
                .or(self.ai_summary)
                .filter(|summary| !summary.trim().is_empty()),
        })
    }
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
