mod client;
mod payload;
mod types;

pub use client::NotificationClient;
pub use payload::generate_payload;
pub use types::{BuildStatus, NotificationOutcome};

#[cfg(test)]
pub(crate) use types::NotifyError;
