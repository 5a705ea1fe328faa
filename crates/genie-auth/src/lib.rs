mod error;
mod session;

pub use error::AuthError;
pub use session::{Session, SessionState, AUTH_MARKER};
