mod composer;
mod error;

pub use composer::{ComposeMode, Composer};
pub use error::ComposeError;
