use crate::{category_counts, filter_emails, FolderCounts, MailError, MailFilter};
use chrono::{DateTime, Utc};
use genie_api::{MailAction, MailApi};
use genie_core::{Category, Email, MailStatus};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};

type IdGuards = Arc<Mutex<HashMap<String, Arc<Semaphore>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// No email with that id is loaded. No request was made.
    UnknownId,
    /// The backend accepted the change but the view was reloaded or
    /// invalidated before the response arrived.
    Discarded,
}

/// What to do when a second mutation targets an id that already has one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPolicy {
    #[default]
    Queue,
    Reject,
}

/// The loaded mailbox and the only writer to it.
///
/// Local fields change only after the backend acknowledged the matching
/// request. Mutations on one id run one at a time in arrival order.
#[derive(Clone)]
pub struct MailboxState {
    api: Arc<dyn MailApi>,
    emails: Arc<RwLock<Vec<Email>>>,
    id_guards: IdGuards,
    epoch: Arc<AtomicU64>,
    policy: MutationPolicy,
}

impl MailboxState {
    pub fn new(api: Arc<dyn MailApi>) -> Self {
        Self {
            api,
            emails: Arc::new(RwLock::new(Vec::new())),
            id_guards: Arc::new(Mutex::new(HashMap::new())),
            epoch: Arc::new(AtomicU64::new(0)),
            policy: MutationPolicy::Queue,
        }
    }

    pub fn with_policy(mut self, policy: MutationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    /// Fetches the inbox and replaces the collection. Returns the number of emails kept.
    pub async fn load(&self) -> Result<usize, MailError> {
        let emails = self.api.fetch_inbox().await?;
        Ok(self.replace(emails).await)
    }

    pub async fn replace(&self, emails: Vec<Email>) -> usize {
        let emails = dedupe(emails);
        let count = emails.len();

        let mut current = self.emails.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *current = emails;
        tracing::debug!(count, "mailbox replaced");
        count
    }

    pub async fn snapshot(&self) -> Vec<Email> {
        self.emails.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Email> {
        self.emails
            .read()
            .await
            .iter()
            .find(|email| email.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.emails.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.emails.read().await.is_empty()
    }

    pub async fn visible(&self, filter: &MailFilter, now: DateTime<Utc>) -> Vec<Email> {
        let emails = self.emails.read().await;
        filter_emails(&emails, filter, now)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn counts(&self) -> FolderCounts {
        FolderCounts::of(&self.emails.read().await)
    }

    pub async fn category_counts(&self) -> Vec<(Category, usize)> {
        category_counts(&self.emails.read().await)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Marks every in-flight result as stale.
    pub fn invalidate(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(epoch, "mailbox view invalidated");
    }

    /// Flips `is_starred`, calling star or unstar depending on the current value.
    pub async fn star(&self, id: &str) -> Result<MutationOutcome, MailError> {
        self.mutate(
            id,
            |email| {
                if email.is_starred {
                    MailAction::Unstar
                } else {
                    MailAction::Star
                }
            },
            |email, action| email.is_starred = action == MailAction::Star,
        )
        .await
    }

    pub async fn archive(&self, id: &str) -> Result<MutationOutcome, MailError> {
        self.set_status(id, MailAction::Archive, MailStatus::Archived)
            .await
    }

    pub async fn trash(&self, id: &str) -> Result<MutationOutcome, MailError> {
        self.set_status(id, MailAction::Trash, MailStatus::Trashed)
            .await
    }

    pub async fn restore_to_inbox(&self, id: &str) -> Result<MutationOutcome, MailError> {
        self.set_status(id, MailAction::RestoreToInbox, MailStatus::Inbox)
            .await
    }

    pub async fn unarchive(&self, id: &str) -> Result<MutationOutcome, MailError> {
        self.set_status(id, MailAction::Unarchive, MailStatus::Inbox)
            .await
    }

    pub async fn restore(&self, id: &str) -> Result<MutationOutcome, MailError> {
        self.set_status(id, MailAction::Restore, MailStatus::Inbox)
            .await
    }

    pub async fn mark_read(&self, id: &str) -> Result<MutationOutcome, MailError> {
        self.mutate(
            id,
            |_| MailAction::MarkRead,
            |email, _| email.is_read = true,
        )
        .await
    }

    /// Cached summary, or a fresh one from the backend. `None` for an unknown id.
    pub async fn summarize(&self, id: &str) -> Result<Option<String>, MailError> {
        let cached = {
            let emails = self.emails.read().await;
            match emails.iter().find(|email| email.id == id) {
                Some(email) => email.ai_summary.clone(),
                None => return Ok(None),
            }
        };
        if let Some(summary) = cached {
            return Ok(Some(summary));
        }

        let epoch = self.epoch();
        let summary = self.api.summarize_email(id).await?;
        if self.epoch() == epoch {
            self.attach_summary(id, &summary).await;
        } else {
            tracing::warn!(id, "view changed during summarize; summary not cached");
        }
        Ok(Some(summary))
    }

    /// Stores `summary` unless one is already cached. Returns whether it was stored.
    pub async fn attach_summary(&self, id: &str, summary: &str) -> bool {
        let mut emails = self.emails.write().await;
        match emails.iter_mut().find(|email| email.id == id) {
            Some(email) if email.ai_summary.is_none() => {
                email.ai_summary = Some(summary.to_string());
                true
            }
            _ => false,
        }
    }

    async fn set_status(
        &self,
        id: &str,
        action: MailAction,
        status: MailStatus,
    ) -> Result<MutationOutcome, MailError> {
        self.mutate(id, |_| action, |email, _| email.status = status)
            .await
    }

    async fn mutate<P, U>(&self, id: &str, plan: P, update: U) -> Result<MutationOutcome, MailError>
    where
        P: FnOnce(&Email) -> MailAction + Send,
        U: FnOnce(&mut Email, MailAction) + Send,
    {
        let _guard = self.acquire_id_guard(id).await?;

        // The epoch is read under the same lock as the planned record.
        let (action, epoch) = {
            let emails = self.emails.read().await;
            match emails.iter().find(|email| email.id == id) {
                Some(email) => (plan(email), self.epoch()),
                None => {
                    tracing::debug!(id, "ignoring change to unknown email");
                    return Ok(MutationOutcome::UnknownId);
                }
            }
        };

        self.api.apply(action, id).await?;

        let mut emails = self.emails.write().await;
        if self.epoch() != epoch {
            tracing::warn!(id, action = action.path_segment(), "stale result discarded");
            return Ok(MutationOutcome::Discarded);
        }
        match emails.iter_mut().find(|email| email.id == id) {
            Some(email) => {
                update(email, action);
                tracing::debug!(id, action = action.path_segment(), "change applied");
                Ok(MutationOutcome::Applied)
            }
            None => Ok(MutationOutcome::UnknownId),
        }
    }

    async fn acquire_id_guard(&self, id: &str) -> Result<IdGuard, MailError> {
        let semaphore = {
            let mut guards = self
                .id_guards
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guards
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };

        let permit = match self.policy {
            MutationPolicy::Queue => semaphore.clone().acquire_owned().await.ok(),
            MutationPolicy::Reject => semaphore.clone().try_acquire_owned().ok(),
        };
        let guard = IdGuard {
            id: id.to_string(),
            semaphore,
            permit,
            guards: self.id_guards.clone(),
        };
        if guard.permit.is_none() {
            return Err(MailError::Busy(guard.id.clone()));
        }
        Ok(guard)
    }
}

/// Holds the per-id permit and drops the id's semaphore once nobody else uses it.
struct IdGuard {
    id: String,
    semaphore: Arc<Semaphore>,
    permit: Option<OwnedSemaphorePermit>,
    guards: IdGuards,
}

impl Drop for IdGuard {
    fn drop(&mut self) {
        drop(self.permit.take());
        let mut guards = self.guards.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map and one here: no holder and no waiter left.
        let idle = Arc::strong_count(&self.semaphore) == 2
            && guards
                .get(&self.id)
                .is_some_and(|entry| Arc::ptr_eq(entry, &self.semaphore));
        if idle {
            guards.remove(&self.id);
        }
    }
}

fn dedupe(emails: Vec<Email>) -> Vec<Email> {
    let mut seen = HashSet::new();
    emails
        .into_iter()
        .filter(|email| {
            let first = seen.insert(email.id.clone());
            if !first {
                tracing::warn!(id = %email.id, "duplicate email id dropped");
            }
            first
        })
        .collect()
}
