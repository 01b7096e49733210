//! Fixture render surface for tests
//!
//! Serves a fixed HTML document through the [`PageSession`] interface so the
//! crawler and extractor can be exercised without a browser. Lazy rendering
//! is simulated with a scripted element-count schedule, and navigation
//! failures can be injected to drive the retry path.

use crate::render::{PageSession, RenderError, RenderResult, RenderSurface};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A render surface backed by a static HTML document
pub struct FixtureSurface {
    html: String,
    navigation_error: Option<String>,
    count_schedule: Arc<Mutex<VecDeque<usize>>>,
    scroll_events: Arc<AtomicUsize>,
    sessions_opened: Arc<AtomicUsize>,
}

impl FixtureSurface {
    /// Creates a surface that serves the given document
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            navigation_error: None,
            count_schedule: Arc::new(Mutex::new(VecDeque::new())),
            scroll_events: Arc::new(AtomicUsize::new(0)),
            sessions_opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every navigation fail with the given message
    pub fn with_navigation_error(mut self, message: impl Into<String>) -> Self {
        self.navigation_error = Some(message.into());
        self
    }

    /// Scripts the values returned by successive `count()` calls
    ///
    /// Once the schedule is drained, `count()` falls back to counting actual
    /// matches in the document.
    pub fn with_count_schedule(self, counts: Vec<usize>) -> Self {
        *self.count_schedule.lock().unwrap() = counts.into();
        self
    }

    /// Number of scroll actions issued across all sessions
    pub fn scroll_events(&self) -> usize {
        self.scroll_events.load(Ordering::SeqCst)
    }

    /// Number of sessions opened on this surface
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    /// Scripted counts not yet consumed
    pub fn remaining_counts(&self) -> usize {
        self.count_schedule.lock().unwrap().len()
    }
}

#[async_trait]
impl RenderSurface for FixtureSurface {
    async fn open_session(&self) -> RenderResult<Box<dyn PageSession>> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(FixtureSession {
            html: self.html.clone(),
            navigation_error: self.navigation_error.clone(),
            count_schedule: Arc::clone(&self.count_schedule),
            scroll_events: Arc::clone(&self.scroll_events),
        }))
    }
}

struct FixtureSession {
    html: String,
    navigation_error: Option<String>,
    count_schedule: Arc<Mutex<VecDeque<usize>>>,
    scroll_events: Arc<AtomicUsize>,
}

fn parse_selector(selector: &str) -> RenderResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| RenderError::Browser(format!("invalid selector `{}`: {:?}", selector, e)))
}

#[async_trait]
impl PageSession for FixtureSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> RenderResult<()> {
        match &self.navigation_error {
            Some(message) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> RenderResult<()> {
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        let present = document.select(&parsed).next().is_some();

        // The fixture either has the element or never will; no point
        // actually sleeping out the timeout in tests
        if present {
            Ok(())
        } else {
            Err(RenderError::WaitTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn count(&mut self, selector: &str) -> RenderResult<usize> {
        if let Some(scripted) = self.count_schedule.lock().unwrap().pop_front() {
            return Ok(scripted);
        }

        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        Ok(document.select(&parsed).count())
    }

    async fn attr_values(&mut self, selector: &str, attr: &str) -> RenderResult<Vec<String>> {
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);

        Ok(document
            .select(&parsed)
            .filter_map(|element| element.value().attr(attr).map(|v| v.to_string()))
            .collect())
    }

    async fn scroll_to_bottom(&mut self) -> RenderResult<()> {
        self.scroll_events.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn content(&mut self) -> RenderResult<String> {
        Ok(self.html.clone())
    }

    async fn close(&mut self) {}
}
