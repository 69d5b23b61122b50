mod client;
pub mod journal;
pub mod schema;

pub use client::ApiClient;
pub use journal::JOURNAL_TARGET;
pub use schema::ApiResponse;
