//! Page capability used by the simulated-interaction backend.
//!
//! The discovery source and the UI executor only talk to [`Page`]; the
//! WebDriver-backed implementation lives in [`webdriver`]. Controls are
//! described as [`LocatorChain`]s: ordered alternatives, first match wins.

pub mod locators;
pub mod pacing;
pub mod webdriver;

use crate::types::ElementHandle;
use async_trait::async_trait;
use thiserror::Error;

pub use locators::Locators;
pub use pacing::Pacer;
pub use webdriver::WebDriverPage;

#[derive(Debug, Error)]
pub enum PageError {
    /// The element handle no longer belongs to the live document.
    #[error("stale element: {0}")]
    Stale(String),

    #[error("driver error: {0}")]
    Driver(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(s: &str) -> Self {
        Locator::Css(s.to_string())
    }

    pub fn xpath(s: &str) -> Self {
        Locator::XPath(s.to_string())
    }
}

/// One visible timeline entry as sampled from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub handle: ElementHandle,
    pub permalink: Option<String>,
    pub text: Option<String>,
    pub reposted: bool,
}

#[async_trait]
pub trait Page: Send + Sync {
    /// Entries currently rendered, in document order.
    async fn entries(&self) -> Result<Vec<EntrySnapshot>, PageError>;

    /// Trigger loading of further entries (scroll).
    async fn reveal_more(&self) -> Result<(), PageError>;

    /// Reload the timeline from the top. Invalidates all handles.
    async fn reload(&self) -> Result<(), PageError>;

    /// First element matching `locator`, inside `scope` when given.
    async fn find(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> Result<Option<ElementHandle>, PageError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError>;
}

/// Named, ordered list of alternative locators for a single control.
#[derive(Debug, Clone)]
pub struct LocatorChain {
    pub name: &'static str,
    pub probes: Vec<Locator>,
}

impl LocatorChain {
    pub fn new(name: &'static str, probes: Vec<Locator>) -> Self {
        Self { name, probes }
    }

    /// Try each probe in order and return the first hit. A stale scope is
    /// reported only if no probe matched.
    pub async fn first_match(
        &self,
        page: &dyn Page,
        scope: Option<&ElementHandle>,
    ) -> Result<Option<ElementHandle>, PageError> {
        let mut stale = None;
        for (idx, probe) in self.probes.iter().enumerate() {
            match page.find(scope, probe).await {
                Ok(Some(el)) => {
                    if idx > 0 {
                        tracing::debug!(control = self.name, probe = idx, "Matched fallback locator");
                    }
                    return Ok(Some(el));
                }
                Ok(None) => continue,
                Err(PageError::Stale(msg)) => stale = Some(msg),
                Err(e) => return Err(e),
            }
        }
        match stale {
            Some(msg) => Err(PageError::Stale(msg)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
pub(crate) mod fake;
