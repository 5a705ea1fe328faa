use crate::payload::{
    required, AutoReplyRequest, AutoReplyResponse, DraftsResponse, Envelope, InboxResponse,
    RepliesResponse, RewriteRequest, RewriteResponse, SummaryResponse, TextRequest,
};
use crate::{AiApi, ApiError, MailAction, MailApi};
use async_trait::async_trait;
use genie_core::{Classification, Draft, Email, OutgoingMessage, Tone, WireEmail};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

const DETAIL_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl ApiSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
            user_agent: None,
        }
    }
}

/// HTTP client for the InboxGenie backend.
///
/// Requests share one cookie store so the backend session set during login is
/// sent with every call. No request is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        if settings.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "`{}` cannot be used as an API base url",
                settings.base_url
            )));
        }

        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = settings.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(Self {
            base_url: settings.base_url,
            http: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Redirect target for the Google OAuth flow. No request is made.
    pub fn google_login_url(&self) -> Result<Url, ApiError> {
        self.endpoint(&["auth", "google", "login"])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("`{}` has no path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn record_endpoint(&self, prefix: &[&str], id: &str) -> Result<Url, ApiError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::InvalidRequest(
                "email id must not be empty".to_string(),
            ));
        }

        let mut segments = prefix.to_vec();
        segments.push(id);
        self.endpoint(&segments)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(%url, "POST");
        let response = self.http.post(url).send().await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        decode(response).await
    }

    async fn replies(&self, route: &str, text: &str) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["ai", route])?;
        let response: RepliesResponse = self.post_json(url, &TextRequest { text }).await?;
        response.envelope.accepted(route)?;
        required(response.replies, route, "replies")
    }
}

#[async_trait]
impl MailApi for ApiClient {
    async fn fetch_inbox(&self) -> Result<Vec<Email>, ApiError> {
        // The backend answers 404 when no user has logged in yet.
        let response: InboxResponse =
            self.get(&["gmail", "inbox"]).await.map_err(|err| match err {
                ApiError::Status {
                    status: StatusCode::NOT_FOUND,
                    detail,
                } => ApiError::Unauthorized(detail),
                other => other,
            })?;

        let received = response.emails.len();
        let emails = response
            .emails
            .into_iter()
            .filter_map(WireEmail::into_email)
            .collect::<Vec<_>>();
        tracing::debug!(received, kept = emails.len(), "inbox fetched");
        Ok(emails)
    }

    async fn apply(&self, action: MailAction, id: &str) -> Result<(), ApiError> {
        let url = self.record_endpoint(&["gmail", action.path_segment()], id)?;
        let envelope: Envelope = self.post_empty(url).await?;
        envelope.accepted(action.path_segment())
    }

    async fn summarize_email(&self, id: &str) -> Result<String, ApiError> {
        let url = self.record_endpoint(&["ai", "summarize-email"], id)?;
        let response: SummaryResponse = self.post_empty(url).await?;
        response.envelope.accepted("summarize-email")?;
        required(response.summary, "summarize-email", "summary")
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), ApiError> {
        let url = self.endpoint(&["gmail", "send"])?;
        let envelope: Envelope = self.post_json(url, message).await?;
        envelope.accepted("send")
    }

    async fn save_draft(&self, message: &OutgoingMessage) -> Result<(), ApiError> {
        let url = self.endpoint(&["gmail", "drafts", "save"])?;
        let envelope: Envelope = self.post_json(url, message).await?;
        envelope.accepted("save draft")
    }

    async fn list_drafts(&self) -> Result<Vec<Draft>, ApiError> {
        let response: DraftsResponse = self.get(&["gmail", "drafts"]).await?;
        Ok(response.drafts)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["auth", "logout"])?;
        let envelope: Envelope = self.post_empty(url).await?;
        envelope.accepted("logout")
    }
}

#[async_trait]
impl AiApi for ApiClient {
    async fn classify(&self, text: &str) -> Result<Classification, ApiError> {
        let url = self.endpoint(&["ai", "classify"])?;
        self.post_json(url, &TextRequest { text }).await
    }

    async fn summarize(&self, text: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["ai", "summarize"])?;
        let response: SummaryResponse = self.post_json(url, &TextRequest { text }).await?;
        response.envelope.accepted("summarize")?;
        required(response.summary, "summarize", "summary")
    }

    async fn rewrite(&self, text: &str, tone: Tone) -> Result<String, ApiError> {
        let url = self.endpoint(&["ai", "rewrite"])?;
        let response: RewriteResponse = self.post_json(url, &RewriteRequest { text, tone }).await?;
        response.envelope.accepted("rewrite")?;
        required(
            response.rewritten_text.or(response.rewritten),
            "rewrite",
            "rewritten_text",
        )
    }

    async fn auto_reply(&self, original_email: &str, context: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["ai", "auto-reply"])?;
        let response: AutoReplyResponse = self
            .post_json(
                url,
                &AutoReplyRequest {
                    original_email,
                    context,
                },
            )
            .await?;
        response.envelope.accepted("auto-reply")?;
        required(response.reply, "auto-reply", "reply")
    }

    async fn smart_replies(&self, text: &str) -> Result<Vec<String>, ApiError> {
        self.replies("smart-reply", text).await
    }

    async fn suggest_replies(&self, text: &str) -> Result<Vec<String>, ApiError> {
        self.replies("suggest-replies", text).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(failure(status, &body));
    }

    serde_json::from_str(&body).map_err(|err| ApiError::Payload(err.to_string()))
}

fn failure(status: StatusCode, body: &str) -> ApiError {
    let detail = error_detail(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(detail),
        StatusCode::NOT_FOUND if mentions_missing_user(&detail) => ApiError::Unauthorized(detail),
        _ => ApiError::Status { status, detail },
    }
}

fn mentions_missing_user(detail: &str) -> bool {
    let lower = detail.to_ascii_lowercase();
    lower.contains("no user") || lower.contains("login first") || lower.contains("not logged in")
}

/// FastAPI reports errors as `{"detail": ...}`; other shapes fall back to the raw body.
fn error_detail(status: StatusCode, body: &str) -> String {
    let structured = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["detail", "message", "error"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(|field| field.as_str())
                    .map(str::to_string)
            })
        });
    if let Some(detail) = structured {
        return detail;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status.canonical_reason().unwrap_or("no detail").to_string();
    }
    trimmed.chars().take(DETAIL_LIMIT).collect()
}
