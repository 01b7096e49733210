//! Rendered-document adapter
//!
//! The crawler and extractor never talk to a browser directly; they go
//! through the narrow [`PageSession`] interface defined here. This keeps the
//! extraction strategies pure and lets tests run against fixture documents
//! without a browser.
//!
//! Two implementations exist: [`ChromeSurface`] drives a headless Chromium
//! over CDP, and [`FixtureSurface`] serves static HTML with a scriptable
//! element-count schedule.

mod chrome;
mod fixture;

pub use chrome::ChromeSurface;
pub use fixture::FixtureSurface;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a render surface
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {timeout_ms}ms waiting for `{selector}`")]
    WaitTimeout { selector: String, timeout_ms: u64 },

    #[error("Browser error: {0}")]
    Browser(String),
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// A single isolated rendering context
///
/// One session serves exactly one URL and is torn down afterwards; no render
/// state is shared between entities.
#[async_trait]
pub trait PageSession: Send {
    /// Navigates to a URL, bounded by a timeout
    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()>;

    /// Waits until at least one element matches the selector
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> RenderResult<()>;

    /// Counts the elements currently matching the selector
    async fn count(&mut self, selector: &str) -> RenderResult<usize>;

    /// Collects an attribute's value from every element matching the selector,
    /// in document order, skipping elements without the attribute
    async fn attr_values(&mut self, selector: &str, attr: &str) -> RenderResult<Vec<String>>;

    /// Scrolls to the bottom of the page to trigger lazy rendering
    async fn scroll_to_bottom(&mut self) -> RenderResult<()>;

    /// Captures the rendered document as HTML
    async fn content(&mut self) -> RenderResult<String>;

    /// Tears the session down; best-effort, never fails
    async fn close(&mut self);
}

/// Mints fresh rendering contexts, one per URL
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn open_session(&self) -> RenderResult<Box<dyn PageSession>>;
}
