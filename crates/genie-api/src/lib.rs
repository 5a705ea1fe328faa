mod backend;
mod client;
mod error;
mod payload;

pub use backend::{AiApi, MailAction, MailApi};
pub use client::{ApiClient, ApiSettings};
pub use error::ApiError;
