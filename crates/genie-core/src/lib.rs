mod date;
mod model;
mod wire;

pub use date::EmailDate;
pub use model::*;
pub use wire::WireEmail;
