//! Page driver seam.
//!
//! The harness talks to a page only through [`PageDriver`]; a [`Session`]
//! hands out one fresh page per test case. Two implementations exist: the CDP
//! browser (`browser` feature) and the offline [`SnapshotSite`](crate::SnapshotSite).

use crate::locator::{ElementProbe, Selector};
use crate::result::RedlineResult;
use async_trait::async_trait;

/// The page capabilities a fixture case consumes
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL and wait for the load event
    async fn goto(&mut self, url: &str) -> RedlineResult<()>;

    /// Click the first element matching `selector`, following any navigation
    async fn click(&mut self, selector: &Selector) -> RedlineResult<()>;

    /// Current document title
    async fn title(&self) -> RedlineResult<String>;

    /// Current URL
    async fn url(&self) -> RedlineResult<String>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &Selector) -> RedlineResult<usize>;

    /// State of the first element matching `selector`
    async fn probe(&self, selector: &Selector) -> RedlineResult<Option<ElementProbe>>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> RedlineResult<Vec<u8>>;

    /// Close the page, discarding its context
    async fn close(self: Box<Self>) -> RedlineResult<()>;
}

/// Source of isolated pages, one per test case
#[async_trait]
pub trait Session: Send + Sync {
    /// Open a new blank page
    async fn new_page(&self) -> RedlineResult<Box<dyn PageDriver>>;

    /// Short driver name for reports (`cdp`, `snapshot`)
    fn name(&self) -> &'static str;
}
