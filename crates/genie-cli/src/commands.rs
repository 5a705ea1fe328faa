use crate::state::AppState;
use crate::Command;
use anyhow::{anyhow, Context};
use chrono::Utc;
use genie_api::{AiApi, ApiError, MailApi};
use genie_auth::AuthError;
use genie_compose::{ComposeError, Composer};
use genie_core::{Email, Tone};
use genie_mail::{DateRange, MailError, MailFilter, MutationOutcome, View};
use url::Url;

#[derive(Debug, Clone, Copy)]
enum Change {
    Archive,
    Trash,
    Restore,
    Unarchive,
    InboxRestore,
    Read,
    Star,
}

pub(crate) async fn run(state: &AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::LoginUrl => println!("{}", state.session.login_url(&state.api)?),
        Command::AuthCallback { url } => auth_callback(state, &url).await?,
        Command::Inbox { view, search, days } => inbox(state, view, search, days).await?,
        Command::Counts => counts(state).await?,
        Command::Archive { id } => change(state, &id, Change::Archive).await?,
        Command::Trash { id } => change(state, &id, Change::Trash).await?,
        Command::Restore { id } => change(state, &id, Change::Restore).await?,
        Command::Unarchive { id } => change(state, &id, Change::Unarchive).await?,
        Command::InboxRestore { id } => change(state, &id, Change::InboxRestore).await?,
        Command::Read { id } => change(state, &id, Change::Read).await?,
        Command::Star { id } => change(state, &id, Change::Star).await?,
        Command::Summarize { id } => summarize(state, &id).await?,
        Command::Reply { id, tone, suggest } => reply(state, &id, &tone, suggest).await?,
        Command::Send {
            to,
            subject,
            body,
            tone,
            generate,
        } => {
            let mut composer = Composer::new();
            composer.to = to;
            composer.subject = subject;
            composer.body = body;
            composer.tone = parse_tone(&tone)?;
            if generate {
                composer
                    .generate_body(state.api.as_ref())
                    .await
                    .context("generate message body")?;
            }
            composer
                .send(state.api.as_ref())
                .await
                .context("send message")?;
            println!("Message sent.");
        }
        Command::Draft { to, subject, body } => {
            let mut composer = Composer::new();
            composer.to = to;
            composer.subject = subject;
            composer.body = body;
            composer
                .save_draft(state.api.as_ref())
                .await
                .context("save draft")?;
            println!("Draft saved.");
        }
        Command::Drafts => {
            let drafts = state.api.list_drafts().await.context("list drafts")?;
            if drafts.is_empty() {
                println!("No drafts.");
            }
            for draft in drafts {
                println!(
                    "{:<12} {:<30} {}",
                    draft.id.as_deref().unwrap_or("-"),
                    draft.to,
                    draft.subject
                );
            }
        }
        Command::Rewrite { tone, text } => {
            let rewritten = state
                .api
                .rewrite(&text, parse_tone(&tone)?)
                .await
                .context("rewrite text")?;
            println!("{rewritten}");
        }
        Command::Classify { text } => {
            let classification = state.api.classify(&text).await.context("classify text")?;
            println!(
                "{} ({:.2})",
                classification.category(),
                classification.score
            );
        }
        Command::SmartReplies { text } => {
            let replies = state
                .api
                .smart_replies(&text)
                .await
                .context("fetch smart replies")?;
            print_numbered(&replies);
        }
        Command::Logout => {
            if state.session.logout(state.api.as_ref()).await {
                println!("Signed out.");
            } else {
                println!("Signed out locally; the backend did not confirm.");
            }
        }
        Command::Config => {
            println!("config: {}", state.config_manager.config_path().display());
            println!("backend: {}", state.api.base_url());
        }
    }
    Ok(())
}

/// True when any error in the chain means the backend has no signed-in user.
pub(crate) fn is_auth_failure(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return api.is_auth_failure();
        }
        if let Some(mail) = cause.downcast_ref::<MailError>() {
            return mail.is_auth_failure();
        }
        if let Some(ComposeError::Api(api)) = cause.downcast_ref::<ComposeError>() {
            return api.is_auth_failure();
        }
        matches!(cause.downcast_ref::<AuthError>(), Some(AuthError::Api(api)) if api.is_auth_failure())
    })
}

async fn auth_callback(state: &AppState, raw: &str) -> anyhow::Result<()> {
    let url = Url::parse(raw).with_context(|| format!("parse redirect url `{raw}`"))?;
    let Some(cleaned) = state.session.consume_redirect(&url).await else {
        return Err(anyhow!("`{raw}` does not carry a successful sign-in"));
    };

    let emails = ensure_signed_in(state).await?;
    println!("Signed in. {} emails in the mailbox.", emails.len());
    println!("{cleaned}");
    Ok(())
}

/// Probes the session and seeds the mailbox with the fetched emails.
async fn ensure_signed_in(state: &AppState) -> anyhow::Result<Vec<Email>> {
    let emails = state
        .session
        .probe(state.api.as_ref())
        .await
        .context("check session")?
        .ok_or_else(|| ApiError::Unauthorized("no signed-in user".to_string()))?;
    state.mailbox.replace(emails).await;
    Ok(state.mailbox.snapshot().await)
}

async fn inbox(
    state: &AppState,
    view: Option<String>,
    search: Option<String>,
    days: Option<u32>,
) -> anyhow::Result<()> {
    let view: View = view
        .as_deref()
        .unwrap_or(&state.config.mailbox.default_view)
        .parse()
        .context("parse view")?;
    let filter = MailFilter::new(view)
        .with_search(search.unwrap_or_default())
        .with_date_range(DateRange::from_days(
            days.or(state.config.mailbox.default_days),
        ));

    ensure_signed_in(state).await?;
    let emails = state.mailbox.visible(&filter, Utc::now()).await;
    if emails.is_empty() {
        println!("No emails in {view}.");
        return Ok(());
    }
    for email in &emails {
        print_email(email);
    }
    Ok(())
}

async fn counts(state: &AppState) -> anyhow::Result<()> {
    ensure_signed_in(state).await?;
    let counts = state.mailbox.counts().await;
    println!("unread: {}", counts.unread);
    println!("starred: {}", counts.starred);
    for (category, count) in state.mailbox.category_counts().await {
        println!("{category}: {count}");
    }
    Ok(())
}

async fn change(state: &AppState, id: &str, change: Change) -> anyhow::Result<()> {
    ensure_signed_in(state).await?;
    let mailbox = &state.mailbox;
    let result = match change {
        Change::Archive => mailbox.archive(id).await,
        Change::Trash => mailbox.trash(id).await,
        Change::Restore => mailbox.restore(id).await,
        Change::Unarchive => mailbox.unarchive(id).await,
        Change::InboxRestore => mailbox.restore_to_inbox(id).await,
        Change::Read => mailbox.mark_read(id).await,
        Change::Star => mailbox.star(id).await,
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if let MailError::Api(api) = &err {
                state.session.observe(api).await;
            }
            return Err(err).with_context(|| format!("{change:?} email `{id}`"));
        }
    };

    match outcome {
        MutationOutcome::Applied => {
            if let Some(email) = mailbox.get(id).await {
                print_email(&email);
            }
        }
        MutationOutcome::UnknownId => println!("No email with id `{id}` is loaded."),
        MutationOutcome::Discarded => println!("The mailbox changed before `{id}` was updated."),
    }
    Ok(())
}

async fn summarize(state: &AppState, id: &str) -> anyhow::Result<()> {
    ensure_signed_in(state).await?;
    match state
        .mailbox
        .summarize(id)
        .await
        .with_context(|| format!("summarize email `{id}`"))?
    {
        Some(summary) => println!("{summary}"),
        None => println!("No email with id `{id}` is loaded."),
    }
    Ok(())
}

async fn reply(state: &AppState, id: &str, tone: &str, suggest: bool) -> anyhow::Result<()> {
    ensure_signed_in(state).await?;
    let email = state
        .mailbox
        .get(id)
        .await
        .ok_or_else(|| anyhow!("no email with id `{id}` is loaded"))?;

    let mut composer = Composer::reply_to(&email);
    composer.tone = parse_tone(tone)?;
    if suggest {
        let suggestions = composer
            .load_suggestions(state.api.as_ref())
            .await
            .context("fetch reply suggestions")?;
        print_numbered(suggestions);
        return Ok(());
    }

    composer
        .auto_reply(state.api.as_ref())
        .await
        .context("draft reply")?;
    println!("To: {}", composer.to);
    println!("Subject: {}", composer.subject);
    println!();
    println!("{}", composer.body);
    Ok(())
}

fn parse_tone(raw: &str) -> anyhow::Result<Tone> {
    raw.parse().context("parse tone")
}

fn print_email(email: &Email) {
    let unread = if email.is_read { ' ' } else { '*' };
    let starred = if email.is_starred { 's' } else { ' ' };
    println!(
        "{unread}{starred} {:<12} {:<9} {:<10} {:<24} {}",
        email.id,
        email.status.as_str(),
        email.category.as_str(),
        email.sender,
        email.subject
    );
}

fn print_numbered(lines: &[String]) {
    if lines.is_empty() {
        println!("No suggestions.");
    }
    for (index, line) in lines.iter().enumerate() {
        println!("{}. {line}", index + 1);
    }
}
