use super::{EntrySnapshot, Locator, LocatorChain, Locators, Page, PageError};
use crate::error::Result;
use crate::types::ElementHandle;
use async_trait::async_trait;
use serde_json::Value;
use webdriver_client::{By, ElementId, WebDriver, WebDriverError};

/// [`Page`] over a remote WebDriver session showing the account's profile
/// timeline.
pub struct WebDriverPage {
    driver: WebDriver,
    profile_url: String,
    locators: Locators,
    /// Sessions we attached to belong to someone else and stay open.
    owns_session: bool,
}

impl WebDriverPage {
    /// Open a session and navigate to `profile_url`. The browser profile
    /// (and therefore the logged-in account) comes from `capabilities`.
    pub async fn connect(
        webdriver_url: &str,
        profile_url: &str,
        capabilities: Value,
        locators: Locators,
    ) -> Result<Self> {
        let driver = WebDriver::new_session(webdriver_url, capabilities).await?;
        Self::open(driver, profile_url, locators, true).await
    }

    /// Reuse a session that is already signed in, e.g. one opened by hand.
    pub async fn attach(
        webdriver_url: &str,
        session_id: &str,
        profile_url: &str,
        locators: Locators,
    ) -> Result<Self> {
        let driver = WebDriver::attach(webdriver_url, session_id)?;
        Self::open(driver, profile_url, locators, false).await
    }

    async fn open(
        driver: WebDriver,
        profile_url: &str,
        locators: Locators,
        owns_session: bool,
    ) -> Result<Self> {
        driver.navigate(profile_url).await?;
        tracing::info!(session_id = driver.session_id(), profile_url, "Timeline opened");
        Ok(Self {
            driver,
            profile_url: profile_url.to_string(),
            locators,
            owns_session,
        })
    }

    pub fn locators(&self) -> &Locators {
        &self.locators
    }

    pub async fn close(self) -> Result<()> {
        if !self.owns_session {
            tracing::info!(session_id = self.driver.session_id(), "Leaving attached session open");
            return Ok(());
        }
        self.driver.close().await?;
        Ok(())
    }

    async fn all_entries(&self) -> std::result::Result<Vec<ElementHandle>, PageError> {
        for probe in &self.locators.entry.probes {
            let found = self
                .driver
                .find_elements(None, &to_by(probe))
                .await
                .map_err(page_error)?;
            if !found.is_empty() {
                return Ok(found.into_iter().map(|e| ElementHandle(e.0)).collect());
            }
        }
        Ok(Vec::new())
    }

    async fn snapshot(&self, handle: ElementHandle) -> std::result::Result<EntrySnapshot, PageError> {
        let scope = Some(&handle);
        let permalink = match self.locators.permalink.first_match(self, scope).await? {
            Some(link) => self
                .driver
                .attribute(&to_element(&link), "href")
                .await
                .map_err(page_error)?,
            None => None,
        };
        let text = match self.locators.text.first_match(self, scope).await? {
            Some(el) => Some(self.driver.text(&to_element(&el)).await.map_err(page_error)?),
            None => None,
        };
        let reposted = present(self, &self.locators.social_context, scope).await?
            && present(self, &self.locators.unrepost, scope).await?;
        Ok(EntrySnapshot {
            handle,
            permalink,
            text,
            reposted,
        })
    }
}

async fn present(
    page: &WebDriverPage,
    chain: &LocatorChain,
    scope: Option<&ElementHandle>,
) -> std::result::Result<bool, PageError> {
    Ok(chain.first_match(page, scope).await?.is_some())
}

#[async_trait]
impl Page for WebDriverPage {
    async fn entries(&self) -> std::result::Result<Vec<EntrySnapshot>, PageError> {
        let handles = self.all_entries().await?;
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            match self.snapshot(handle).await {
                Ok(entry) => out.push(entry),
                // Entry re-rendered between listing and sampling; the next
                // sample will pick it up again.
                Err(PageError::Stale(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    async fn reveal_more(&self) -> std::result::Result<(), PageError> {
        self.driver.scroll_page().await.map_err(page_error)
    }

    async fn reload(&self) -> std::result::Result<(), PageError> {
        tracing::debug!(profile_url = %self.profile_url, "Reloading timeline");
        self.driver
            .navigate(&self.profile_url)
            .await
            .map_err(page_error)
    }

    async fn find(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> std::result::Result<Option<ElementHandle>, PageError> {
        let scope_el = scope.map(to_element);
        match self.driver.find_elements(scope_el.as_ref(), &to_by(locator)).await {
            Ok(found) => Ok(found.into_iter().next().map(|e| ElementHandle(e.0))),
            // A scoped search with no hits is an empty list; this error
            // there means the scope element itself is gone.
            Err(WebDriverError::NoSuchElement(_)) if scope.is_none() => Ok(None),
            Err(e) => Err(page_error(e)),
        }
    }

    async fn click(&self, element: &ElementHandle) -> std::result::Result<(), PageError> {
        let el = to_element(element);
        self.driver.scroll_into_view(&el).await.map_err(page_error)?;
        self.driver.click(&el).await.map_err(page_error)
    }
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Css(s) => By::Css(s.clone()),
        Locator::XPath(s) => By::XPath(s.clone()),
    }
}

fn to_element(handle: &ElementHandle) -> ElementId {
    ElementId(handle.0.clone())
}

fn page_error(err: WebDriverError) -> PageError {
    match err {
        WebDriverError::StaleElement(msg) => PageError::Stale(msg),
        // A scope that vanished is reported by some drivers as a missing element.
        WebDriverError::NoSuchElement(msg) => PageError::Stale(msg),
        other => PageError::Driver(other.to_string()),
    }
}
