use crate::types::Result;
use async_trait::async_trait;

/// Where raw syndication documents come from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the raw feed document at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Where a rendered digest goes.
#[async_trait]
pub trait DigestSender: Send + Sync {
    /// Deliver the digest. Returns `false` on failure; failures are logged by the sender.
    async fn send(&self, subject: &str, html: &str, text: &str) -> bool;
}
