//! Product detail page: name/price reads and add-to-cart

use std::time::Duration;

use fantoccini::Locator;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::E2eResult;
use crate::session::Session;
use crate::wait::Waiter;

const PRODUCT_NAME: Locator<'static> = Locator::XPath("//h2[@class='name']");
const PRODUCT_PRICE: Locator<'static> = Locator::XPath("//h3[@class='price-container']");
const ADD_TO_CART_BUTTON: Locator<'static> = Locator::XPath("//a[contains(text(),'Add to cart')]");
const HOME_LINK: Locator<'static> = Locator::XPath("//a[contains(text(),'Home')]");

/// Pause around the add-to-cart confirmation alert
const ALERT_SETTLE: Duration = Duration::from_secs(1);

/// Pause after navigating back to the listing
const PAGE_SETTLE: Duration = Duration::from_secs(2);

pub struct ProductPage<'a> {
    session: &'a Session,
}

impl<'a> ProductPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn name(&self) -> E2eResult<String> {
        Waiter::new(self.session).read_text(PRODUCT_NAME).await
    }

    pub async fn price(&self) -> E2eResult<String> {
        Waiter::new(self.session).read_text(PRODUCT_PRICE).await
    }

    /// Add the product to the cart and accept the site's confirmation
    /// alert. Returns whether the confirmation was observed; a missing
    /// alert is degraded, not fatal.
    pub async fn add_to_cart(&self) -> E2eResult<bool> {
        let waiter = Waiter::new(self.session);
        waiter.scroll_into_view(ADD_TO_CART_BUTTON).await?;
        waiter.click_when_clickable(ADD_TO_CART_BUTTON).await?;
        sleep(ALERT_SETTLE).await;

        let confirmed = waiter.accept_pending_alert().await;
        if confirmed {
            info!("Add-to-cart confirmed");
            sleep(ALERT_SETTLE).await;
        } else {
            warn!("No confirmation alert after add-to-cart; continuing");
        }
        Ok(confirmed)
    }

    pub async fn back_to_home(&self) -> E2eResult<()> {
        Waiter::new(self.session)
            .click_when_clickable(HOME_LINK)
            .await?;
        sleep(PAGE_SETTLE).await;
        Ok(())
    }
}
