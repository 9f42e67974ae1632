//! Explicit-wait interaction helpers shared by all page objects
//!
//! Every operation polls its condition against a bounded budget instead of
//! sleeping blind; the short settle pauses layered on top live as named
//! constants at the page-object call sites.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::session::Session;

/// Default budget for every explicit wait
pub const WAIT_BUDGET: Duration = Duration::from_secs(15);

/// Interval between condition polls
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Pause after a scroll so layout can settle before the next interaction
const SCROLL_SETTLE: Duration = Duration::from_millis(500);

pub struct Waiter<'a> {
    client: &'a Client,
    budget: Duration,
}

impl<'a> Waiter<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            client: session.client(),
            budget: WAIT_BUDGET,
        }
    }

    pub fn with_budget(session: &'a Session, budget: Duration) -> Self {
        Self {
            client: session.client(),
            budget,
        }
    }

    /// Poll until the element is present in the DOM
    pub async fn find_present(&self, locator: Locator<'static>) -> E2eResult<Element> {
        let deadline = Instant::now() + self.budget;
        loop {
            match self.client.find(locator).await {
                Ok(element) => return Ok(element),
                Err(_) if Instant::now() < deadline => sleep(POLL_INTERVAL).await,
                Err(_) => {
                    return Err(E2eError::Timeout(format!("element not present: {:?}", locator)))
                }
            }
        }
    }

    /// Poll until the element is present, displayed, and enabled, then click
    pub async fn click_when_clickable(&self, locator: Locator<'static>) -> E2eResult<()> {
        let deadline = Instant::now() + self.budget;
        loop {
            if let Ok(element) = self.client.find(locator).await {
                let clickable = element.is_displayed().await.unwrap_or(false)
                    && element.is_enabled().await.unwrap_or(false);
                if clickable {
                    match element.click().await {
                        Ok(()) => return Ok(()),
                        // A click can still bounce off a mid-transition
                        // element; retry until the budget runs out.
                        Err(e) => debug!("click on {:?} bounced: {}", locator, e),
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!("element not clickable: {:?}", locator)));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Poll until present, clear any existing value, then insert `text`
    /// verbatim. No validation or sanitization happens here.
    pub async fn type_into(&self, locator: Locator<'static>, text: &str) -> E2eResult<()> {
        let element = self.find_present(locator).await?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    /// Poll until present and return the rendered text
    pub async fn read_text(&self, locator: Locator<'static>) -> E2eResult<String> {
        let element = self.find_present(locator).await?;
        Ok(element.text().await?)
    }

    /// Presence check that reports absence as `false` instead of an error
    pub async fn exists(&self, locator: Locator<'static>) -> bool {
        self.find_present(locator).await.is_ok()
    }

    /// Poll until present, scroll the element into view, then pause for
    /// layout to settle
    pub async fn scroll_into_view(&self, locator: Locator<'static>) -> E2eResult<()> {
        let element = self.find_present(locator).await?;
        self.client
            .execute(
                "arguments[0].scrollIntoView(true);",
                vec![serde_json::to_value(&element)?],
            )
            .await?;
        sleep(SCROLL_SETTLE).await;
        Ok(())
    }

    /// Poll for a native alert; accept it if one appears within the budget.
    /// Returns whether an alert was seen. Absence is a normal outcome.
    pub async fn accept_pending_alert(&self) -> bool {
        let deadline = Instant::now() + self.budget;
        loop {
            if self.client.get_alert_text().await.is_ok() {
                return self.client.accept_alert().await.is_ok();
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}
