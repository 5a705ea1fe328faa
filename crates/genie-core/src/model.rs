use crate::EmailDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Urgent,
    Task,
    Important,
    Promotion,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Urgent,
        Category::Task,
        Category::Important,
        Category::Promotion,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Urgent => "Urgent",
            Category::Task => "Task",
            Category::Important => "Important",
            Category::Promotion => "Promotion",
            Category::General => "General",
        }
    }

    /// Lenient mapping used for backend payloads: unknown labels fall back to `General`.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Category::General)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::General
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant::new("category", value))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MailStatus {
    Inbox,
    Archived,
    Trashed,
}

impl MailStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MailStatus::Inbox => "inbox",
            MailStatus::Archived => "archived",
            MailStatus::Trashed => "trashed",
        }
    }
}

impl Default for MailStatus {
    fn default() -> Self {
        Self::Inbox
    }
}

impl fmt::Display for MailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MailStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(MailStatus::Inbox),
            "archived" | "archive" => Ok(MailStatus::Archived),
            "trashed" | "trash" => Ok(MailStatus::Trashed),
            _ => Err(UnknownVariant::new("status", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
    #[serde(default)]
    pub content: Option<String>,
    pub category: Category,
    pub status: MailStatus,
    pub is_starred: bool,
    pub date: EmailDate,
    pub is_read: bool,
    #[serde(default)]
    pub ai_summary: Option<String>,
}

impl Email {
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Casual,
    Friendly,
    Formal,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Professional, Tone::Casual, Tone::Friendly, Tone::Formal];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Friendly => "friendly",
            Tone::Formal => "formal",
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Self::Professional
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant::new("tone", value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Draft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub label: String,
    #[serde(default)]
    pub score: f32,
}

impl Classification {
    pub fn category(&self) -> Category {
        Category::from_label(&self.label)
    }
}
