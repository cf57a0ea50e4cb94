pub mod auth;
pub mod twitter;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::{Post, SearchFilter};

/// The social feed the bot reads from and replies to.
///
/// Both calls are fallible; the loop never retries them itself.
#[async_trait]
pub trait FeedClient: Send {
    /// Posts matching `filter` with an id greater than `since_id`.
    async fn fetch_since(&mut self, filter: &SearchFilter, since_id: u64) -> Result<Vec<Post>>;
    async fn publish(&mut self, text: &str) -> Result<()>;
}
