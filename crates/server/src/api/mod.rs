//! API endpoint modules.

mod doc;
mod health;
mod query;

pub use doc::ApiDoc;
pub use health::health;
pub use query::query;
