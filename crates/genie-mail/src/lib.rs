mod error;
mod filter;
mod state;

pub use error::MailError;
pub use filter::{category_counts, filter_emails, DateRange, FolderCounts, MailFilter, View};
pub use state::{MailboxState, MutationOutcome, MutationPolicy};
