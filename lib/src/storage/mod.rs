mod api;
mod client;

pub use api::{latest_matching, ListObjectsResult, ObjectSummary};
pub use client::Client;
