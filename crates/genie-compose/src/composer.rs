use crate::ComposeError;
use genie_api::{AiApi, MailApi};
use genie_core::{Email, OutgoingMessage, Tone};
use lettre::message::{Mailbox, Mailboxes};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComposeMode {
    #[default]
    New,
    /// Replying to an existing message; `context` is the quoted original.
    Reply { context: String },
}

/// Form state for a new message or a reply.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub tone: Tone,
    mode: ComposeMode,
    suggestions: Vec<String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a reply: recipient is the original sender and the subject gets a
    /// single `Re: ` prefix.
    pub fn reply_to(email: &Email) -> Self {
        let body = email
            .content
            .as_deref()
            .filter(|content| !content.trim().is_empty())
            .unwrap_or(&email.snippet);
        let context = format!(
            "From: {}\nSubject: {}\n\n{}",
            email.sender, email.subject, body
        );

        Self {
            to: email.sender.clone(),
            subject: reply_subject(&email.subject),
            mode: ComposeMode::Reply { context },
            ..Self::default()
        }
    }

    pub fn mode(&self) -> &ComposeMode {
        &self.mode
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn message(&self) -> OutgoingMessage {
        OutgoingMessage {
            to: self.to.trim().to_string(),
            subject: self.subject.trim().to_string(),
            body: self.body.clone(),
        }
    }

    /// Rewrites the body in the selected tone, or drafts one from the subject
    /// when the body is still empty.
    pub async fn generate_body(&mut self, ai: &dyn AiApi) -> Result<&str, ComposeError> {
        let prompt = if self.body.trim().is_empty() {
            self.subject.trim()
        } else {
            self.body.trim()
        };
        if prompt.is_empty() {
            return Err(ComposeError::Validation(
                "write a subject or some text first".to_string(),
            ));
        }

        let generated = ai.rewrite(prompt, self.tone).await?;
        self.body = generated;
        Ok(&self.body)
    }

    pub async fn auto_reply(&mut self, ai: &dyn AiApi) -> Result<&str, ComposeError> {
        let context = self.reply_context()?;
        let instructions = format!("Reply in a {} tone.", self.tone);
        let reply = ai.auto_reply(context, &instructions).await?;
        self.body = reply;
        Ok(&self.body)
    }

    /// Fetches reply suggestions. Any failure leaves the list empty.
    pub async fn load_suggestions(&mut self, ai: &dyn AiApi) -> Result<&[String], ComposeError> {
        let context = self.reply_context()?.to_string();
        match ai.suggest_replies(&context).await {
            Ok(suggestions) => {
                self.suggestions = suggestions;
                Ok(&self.suggestions)
            }
            Err(err) => {
                tracing::warn!(error = %err, "reply suggestions unavailable");
                self.suggestions.clear();
                Err(err.into())
            }
        }
    }

    pub fn select_suggestion(&mut self, index: usize) -> Result<(), ComposeError> {
        let suggestion = self
            .suggestions
            .get(index)
            .ok_or(ComposeError::NoSuggestion(index))?;
        self.body = suggestion.clone();
        Ok(())
    }

    pub fn validate_for_send(&self) -> Result<OutgoingMessage, ComposeError> {
        let message = self.message();
        if message.to.is_empty() {
            return Err(ComposeError::Validation("add at least one recipient".to_string()));
        }

        parse_recipients(&message.to)?;

        if message.subject.is_empty() {
            return Err(ComposeError::Validation("subject is required".to_string()));
        }
        if message.body.trim().is_empty() {
            return Err(ComposeError::Validation("message body is required".to_string()));
        }
        Ok(message)
    }

    /// Validates and sends. The form is cleared only once the backend accepted the message.
    pub async fn send(&mut self, mail: &dyn MailApi) -> Result<(), ComposeError> {
        let message = self.validate_for_send()?;
        mail.send(&message).await?;
        tracing::info!(to = %message.to, "message sent");
        self.reset();
        Ok(())
    }

    pub async fn save_draft(&self, mail: &dyn MailApi) -> Result<(), ComposeError> {
        let message = self.message();
        if message.to.is_empty() && message.subject.is_empty() && message.body.trim().is_empty() {
            return Err(ComposeError::Validation("nothing to save".to_string()));
        }
        mail.save_draft(&message).await?;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self {
            tone: self.tone,
            ..Self::default()
        };
    }

    fn reply_context(&self) -> Result<&str, ComposeError> {
        match &self.mode {
            ComposeMode::Reply { context } => Ok(context.as_str()),
            ComposeMode::New => Err(ComposeError::NoReplyContext),
        }
    }
}

/// Accepts bare addresses and `Name <addr>` forms, comma separated.
fn parse_recipients(to: &str) -> Result<Mailboxes, ComposeError> {
    to.parse::<Mailboxes>().map_err(|err| {
        let invalid = to
            .split(',')
            .map(str::trim)
            .find(|recipient| recipient.parse::<Mailbox>().is_err())
            .unwrap_or(to);
        ComposeError::Validation(format!("`{invalid}` is not a valid email address: {err}"))
    })
}

fn reply_subject(subject: &str) -> String {
    let subject = subject.trim();
    let already_prefixed = subject
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if already_prefixed {
        subject.to_string()
    } else {
        format!("Re: {subject}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use genie_api::{ApiError, MailAction};
    use genie_core::{Category, Classification, Draft, EmailDate, MailStatus};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAi {
        suggestions: Option<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeAi {
        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("prompts lock").clone()
        }
    }

    #[async_trait]
    impl AiApi for FakeAi {
        async fn classify(&self, _text: &str) -> Result<Classification, ApiError> {
            Ok(Classification {
                label: "GENERAL".to_string(),
                score: 0.5,
            })
        }

        async fn summarize(&self, text: &str) -> Result<String, ApiError> {
            Ok(text.to_string())
        }

        async fn rewrite(&self, text: &str, tone: Tone) -> Result<String, ApiError> {
            self.prompts.lock().expect("prompts lock").push(text.to_string());
            Ok(format!("[{tone}] {text}"))
        }

        async fn auto_reply(&self, original_email: &str, context: &str) -> Result<String, ApiError> {
            self.prompts
                .lock()
                .expect("prompts lock")
                .push(format!("{original_email}|{context}"));
            Ok("Thanks, will do.".to_string())
        }

        async fn smart_replies(&self, _text: &str) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }

        async fn suggest_replies(&self, _text: &str) -> Result<Vec<String>, ApiError> {
            self.suggestions
                .clone()
                .ok_or_else(|| ApiError::Rejected("suggest-replies was not successful".to_string()))
        }
    }

    #[derive(Default)]
    struct FakeMail {
        sent: Mutex<Vec<OutgoingMessage>>,
        drafts: Mutex<Vec<OutgoingMessage>>,
    }

    #[async_trait]
    impl MailApi for FakeMail {
        async fn fetch_inbox(&self) -> Result<Vec<Email>, ApiError> {
            Ok(Vec::new())
        }

        async fn apply(&self, _action: MailAction, _id: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn summarize_email(&self, _id: &str) -> Result<String, ApiError> {
            Ok(String::new())
        }

        async fn send(&self, message: &OutgoingMessage) -> Result<(), ApiError> {
            self.sent.lock().expect("sent lock").push(message.clone());
            Ok(())
        }

        async fn save_draft(&self, message: &OutgoingMessage) -> Result<(), ApiError> {
            self.drafts.lock().expect("drafts lock").push(message.clone());
            Ok(())
        }

        async fn list_drafts(&self) -> Result<Vec<Draft>, ApiError> {
            Ok(Vec::new())
        }

        async fn logout(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn original() -> Email {
        Email {
            id: "1".to_string(),
            sender: "sarah@acme.io".to_string(),
            subject: "Q4 budget".to_string(),
            snippet: "Can you review the numbers?".to_string(),
            content: None,
            category: Category::Urgent,
            status: MailStatus::Inbox,
            is_starred: false,
            date: EmailDate::missing(),
            is_read: false,
            ai_summary: None,
        }
    }

    fn filled() -> Composer {
        Composer {
            to: "bob@example.com, carol@example.org".to_string(),
            subject: "Lunch".to_string(),
            body: "Noon at the usual place?".to_string(),
            ..Composer::new()
        }
    }

    #[test]
    fn reply_prefills_recipient_and_subject_once() {
        let composer = Composer::reply_to(&original());
        assert_eq!(composer.to, "sarah@acme.io");
        assert_eq!(composer.subject, "Re: Q4 budget");

        let mut answered = original();
        answered.subject = "RE: Q4 budget".to_string();
        assert_eq!(Composer::reply_to(&answered).subject, "RE: Q4 budget");
    }

    #[test]
    fn reply_context_falls_back_to_snippet() {
        let composer = Composer::reply_to(&original());
        match composer.mode() {
            ComposeMode::Reply { context } => {
                assert!(context.starts_with("From: sarah@acme.io\nSubject: Q4 budget"));
                assert!(context.ends_with("Can you review the numbers?"));
            }
            ComposeMode::New => panic!("expected reply mode"),
        }
    }

    #[tokio::test]
    async fn generate_body_uses_subject_when_body_empty() {
        let ai = FakeAi::default();
        let mut composer = Composer {
            subject: "Project update".to_string(),
            tone: Tone::Formal,
            ..Composer::new()
        };

        composer.generate_body(&ai).await.expect("generated");
        assert_eq!(composer.body, "[formal] Project update");

        composer.generate_body(&ai).await.expect("rewritten");
        assert_eq!(ai.prompts(), vec!["Project update", "[formal] Project update"]);
    }

    #[tokio::test]
    async fn generate_body_needs_some_text() {
        let err = Composer::new()
            .generate_body(&FakeAi::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::Validation(_)));
    }

    #[tokio::test]
    async fn auto_reply_requires_reply_mode() {
        let ai = FakeAi::default();
        let err = Composer::new().auto_reply(&ai).await.unwrap_err();
        assert!(matches!(err, ComposeError::NoReplyContext));

        let mut composer = Composer::reply_to(&original());
        composer.tone = Tone::Friendly;
        composer.auto_reply(&ai).await.expect("reply");
        assert_eq!(composer.body, "Thanks, will do.");
        assert!(ai.prompts()[0].ends_with("|Reply in a friendly tone."));
    }

    #[tokio::test]
    async fn unsuccessful_suggestions_leave_list_empty() {
        let mut composer = Composer::reply_to(&original());
        let working = FakeAi {
            suggestions: Some(vec!["Sure!".to_string(), "Not today.".to_string()]),
            ..FakeAi::default()
        };
        composer.load_suggestions(&working).await.expect("suggestions");
        assert_eq!(composer.suggestions().len(), 2);

        let err = composer
            .load_suggestions(&FakeAi::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::Api(ApiError::Rejected(_))));
        assert!(composer.suggestions().is_empty());
    }

    #[tokio::test]
    async fn selecting_a_suggestion_replaces_body() {
        let mut composer = Composer::reply_to(&original());
        composer.body = "draft".to_string();
        let ai = FakeAi {
            suggestions: Some(vec!["Sure!".to_string(), "Not today.".to_string()]),
            ..FakeAi::default()
        };
        composer.load_suggestions(&ai).await.expect("suggestions");

        composer.select_suggestion(1).expect("second suggestion");
        assert_eq!(composer.body, "Not today.");
        assert!(matches!(
            composer.select_suggestion(5),
            Err(ComposeError::NoSuggestion(5))
        ));
    }

    #[test]
    fn validation_checks_every_recipient() {
        assert!(filled().validate_for_send().is_ok());

        let mut bad = filled();
        bad.to = "bob@example.com, not-an-address".to_string();
        let err = bad.validate_for_send().unwrap_err();
        assert!(err.to_string().contains("not-an-address"));

        let mut empty_subject = filled();
        empty_subject.subject = "  ".to_string();
        assert!(matches!(
            empty_subject.validate_for_send(),
            Err(ComposeError::Validation(_))
        ));

        let mut no_recipient = filled();
        no_recipient.to.clear();
        assert!(no_recipient.validate_for_send().is_err());
    }

    #[test]
    fn display_name_recipients_are_accepted() {
        let mut composer = filled();
        composer.to = r#""Lee, Jordan" <jordan@example.com>, carol@example.org"#.to_string();
        assert!(composer.validate_for_send().is_ok());

        composer.to = "Jordan Lee <jordan@example.com>, Jordan Lee <jordan@>".to_string();
        let err = composer.validate_for_send().unwrap_err();
        assert!(err.to_string().contains("Jordan Lee <jordan@>"));
    }

    #[tokio::test]
    async fn reply_to_named_sender_can_be_sent() {
        let mail = FakeMail::default();
        let mut sender = original();
        sender.sender = "GitHub <noreply@github.com>".to_string();

        let mut composer = Composer::reply_to(&sender);
        composer.body = "Thanks for the heads-up.".to_string();
        composer.send(&mail).await.expect("reply sent");

        let sent = mail.sent.lock().expect("sent lock").clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "GitHub <noreply@github.com>");
        assert_eq!(sent[0].subject, "Re: Q4 budget");
    }

    #[tokio::test]
    async fn invalid_message_is_never_sent() {
        let mail = FakeMail::default();
        let mut composer = filled();
        composer.body.clear();

        assert!(composer.send(&mail).await.is_err());
        assert!(mail.sent.lock().expect("sent lock").is_empty());
        assert_eq!(composer.subject, "Lunch");
    }

    #[tokio::test]
    async fn send_resets_form_but_keeps_tone() {
        let mail = FakeMail::default();
        let mut composer = filled();
        composer.tone = Tone::Casual;

        composer.send(&mail).await.expect("sent");
        let sent = mail.sent.lock().expect("sent lock").clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Lunch");

        assert!(composer.to.is_empty());
        assert!(composer.body.is_empty());
        assert_eq!(composer.tone, Tone::Casual);
        assert_eq!(composer.mode(), &ComposeMode::New);
    }

    #[tokio::test]
    async fn drafts_need_any_content_and_keep_the_form() {
        let mail = FakeMail::default();
        assert!(Composer::new().save_draft(&mail).await.is_err());

        let composer = Composer {
            subject: "Ideas".to_string(),
            ..Composer::new()
        };
        composer.save_draft(&mail).await.expect("draft saved");
        assert_eq!(mail.drafts.lock().expect("drafts lock").len(), 1);
        assert_eq!(composer.subject, "Ideas");
    }
}
