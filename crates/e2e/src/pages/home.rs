//! Home page: site root, category navigation, product selection

use std::time::Duration;

use fantoccini::Locator;
use tokio::time::sleep;
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::session::Session;
use crate::wait::Waiter;

/// Pause after navigation while the product grid re-renders
const PAGE_SETTLE: Duration = Duration::from_secs(2);

const PHONES_CATEGORY: Locator<'static> = Locator::XPath("//a[contains(text(),'Phones')]");
const LAPTOPS_CATEGORY: Locator<'static> = Locator::XPath("//a[contains(text(),'Laptops')]");
const MONITORS_CATEGORY: Locator<'static> = Locator::XPath("//a[contains(text(),'Monitors')]");

const NEXT_BUTTON: Locator<'static> = Locator::Id("next2");
const PREVIOUS_BUTTON: Locator<'static> = Locator::Id("prev2");

/// Product categories in the site's left-hand navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Phones,
    Laptops,
    Monitors,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Phones => "Phones",
            Category::Laptops => "Laptops",
            Category::Monitors => "Monitors",
        }
    }

    fn locator(self) -> Locator<'static> {
        match self {
            Category::Phones => PHONES_CATEGORY,
            Category::Laptops => LAPTOPS_CATEGORY,
            Category::Monitors => MONITORS_CATEGORY,
        }
    }
}

/// Fixed display-name table for the products the suite knows how to reach.
/// Names must match the site's listing text exactly.
pub(crate) fn product_locator(name: &str) -> Option<Locator<'static>> {
    match name {
        "Samsung galaxy s6" => Some(Locator::XPath("//a[contains(text(),'Samsung galaxy s6')]")),
        "Nokia lumia 1520" => Some(Locator::XPath("//a[contains(text(),'Nokia lumia 1520')]")),
        "Sony vaio i5" => Some(Locator::XPath("//a[contains(text(),'Sony vaio i5')]")),
        "MacBook air" => Some(Locator::XPath("//a[contains(text(),'MacBook air')]")),
        "Apple monitor 24" => Some(Locator::XPath("//a[contains(text(),'Apple monitor 24')]")),
        _ => None,
    }
}

pub struct HomePage<'a> {
    session: &'a Session,
    base_url: String,
}

impl<'a> HomePage<'a> {
    pub fn new(session: &'a Session, base_url: &str) -> Self {
        Self {
            session,
            base_url: base_url.to_string(),
        }
    }

    /// Navigate to the site root
    pub async fn open(&self) -> E2eResult<()> {
        info!("Opening {}", self.base_url);
        self.session.client().goto(&self.base_url).await?;
        sleep(PAGE_SETTLE).await;
        Ok(())
    }

    pub async fn select_category(&self, category: Category) -> E2eResult<()> {
        info!("Selecting category {}", category.label());
        Waiter::new(self.session)
            .click_when_clickable(category.locator())
            .await?;
        sleep(PAGE_SETTLE).await;
        Ok(())
    }

    /// Open a product's detail page by its display name. Unknown names fail
    /// fast without navigating anywhere.
    pub async fn select_product(&self, name: &str) -> E2eResult<()> {
        let locator =
            product_locator(name).ok_or_else(|| E2eError::UnknownProduct(name.to_string()))?;

        info!("Selecting product {:?}", name);
        let waiter = Waiter::new(self.session);
        waiter.scroll_into_view(locator).await?;
        waiter.click_when_clickable(locator).await?;
        sleep(PAGE_SETTLE).await;
        Ok(())
    }

    /// Advance the product listing, if a next control is present
    pub async fn next_page(&self) -> E2eResult<()> {
        let waiter = Waiter::new(self.session);
        if waiter.exists(NEXT_BUTTON).await {
            waiter.click_when_clickable(NEXT_BUTTON).await?;
            sleep(PAGE_SETTLE).await;
        }
        Ok(())
    }

    /// Go back one listing page, if a previous control is present
    pub async fn previous_page(&self) -> E2eResult<()> {
        let waiter = Waiter::new(self.session);
        if waiter.exists(PREVIOUS_BUTTON).await {
            waiter.click_when_clickable(PREVIOUS_BUTTON).await?;
            sleep(PAGE_SETTLE).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Samsung galaxy s6")]
    #[test_case("Nokia lumia 1520")]
    #[test_case("Sony vaio i5")]
    #[test_case("MacBook air")]
    #[test_case("Apple monitor 24")]
    fn known_products_resolve(name: &str) {
        assert!(product_locator(name).is_some());
    }

    #[test_case("Samsung Galaxy S6"; "case must match site markup")]
    #[test_case("iPhone 14")]
    #[test_case("")]
    fn unknown_products_do_not_resolve(name: &str) {
        assert!(product_locator(name).is_none());
    }

    #[test]
    fn category_labels_match_navigation_text() {
        assert_eq!(Category::Phones.label(), "Phones");
        assert_eq!(Category::Laptops.label(), "Laptops");
        assert_eq!(Category::Monitors.label(), "Monitors");
    }
}
