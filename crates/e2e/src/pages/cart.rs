//! Cart page: row enumeration, totals, deletion, and order placement

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::Locator;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::session::Session;
use crate::wait::{Waiter, POLL_INTERVAL};

const CART_LINK: Locator<'static> = Locator::Id("cartur");
const CART_ROWS: Locator<'static> = Locator::XPath("//tbody[@id='tbodyid']/tr");
const ROW_NAME: Locator<'static> = Locator::XPath(".//td[2]");
const ROW_PRICE: Locator<'static> = Locator::XPath(".//td[3]");
const ROW_DELETE: Locator<'static> = Locator::XPath(".//td[4]/a");
const TOTAL_PRICE: Locator<'static> = Locator::Id("totalp");
const PLACE_ORDER_BUTTON: Locator<'static> = Locator::XPath("//button[contains(text(),'Place Order')]");

/// Pause after cart navigation while rows render
const CART_SETTLE: Duration = Duration::from_secs(3);

/// Pause after a row deletion while the table re-renders
const ROW_SETTLE: Duration = Duration::from_secs(2);

/// Pause after Place Order while the checkout modal fades in
const MODAL_SETTLE: Duration = Duration::from_secs(2);

/// One row of the cart table. Transient: rebuilt on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub price: String,
}

pub struct CartPage<'a> {
    session: &'a Session,
}

impl<'a> CartPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Navigate to the cart view
    pub async fn open(&self) -> E2eResult<()> {
        info!("Opening cart");
        Waiter::new(self.session)
            .click_when_clickable(CART_LINK)
            .await?;
        sleep(CART_SETTLE).await;
        Ok(())
    }

    /// Snapshot the cart rows. Gives the table one presence-wait window to
    /// render; a genuinely empty cart comes back as an empty list.
    async fn rows(&self) -> E2eResult<Vec<Element>> {
        let deadline = Instant::now() + self.session.presence_wait();
        loop {
            let rows = self.session.client().find_all(CART_ROWS).await?;
            if !rows.is_empty() || Instant::now() >= deadline {
                return Ok(rows);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Enumerate the cart contents. Rows whose cells cannot be read are
    /// skipped, not fatal.
    pub async fn items(&self) -> E2eResult<Vec<CartItem>> {
        let rows = self.rows().await?;
        let mut items = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match Self::read_row(row).await {
                Ok(item) => {
                    debug!("Cart row {}: {} - {}", index, item.name, item.price);
                    items.push(item);
                }
                Err(e) => {
                    debug!("Skipping unreadable cart row {}: {}", index, e);
                }
            }
        }
        Ok(items)
    }

    async fn read_row(row: &Element) -> E2eResult<CartItem> {
        let name = row.find(ROW_NAME).await?.text().await?;
        let price = row.find(ROW_PRICE).await?.text().await?;
        Ok(CartItem { name, price })
    }

    pub async fn count(&self) -> E2eResult<usize> {
        Ok(self.rows().await?.len())
    }

    pub async fn is_empty(&self) -> E2eResult<bool> {
        Ok(self.count().await? == 0)
    }

    /// Displayed cart total. An absent total (empty cart) reads as "0".
    pub async fn total(&self) -> E2eResult<String> {
        match Waiter::new(self.session).read_text(TOTAL_PRICE).await {
            Ok(total) => Ok(total),
            Err(E2eError::Timeout(_)) => Ok("0".to_string()),
            Err(e) => Err(e),
        }
    }

    /// Delete the row at a zero-based index. Out-of-range indices are a
    /// diagnostic no-op.
    pub async fn delete_item(&self, index: usize) -> E2eResult<()> {
        let rows = self.rows().await?;
        if index >= rows.len() {
            warn!(
                "Cannot delete cart row {}: cart has {} row(s)",
                index,
                rows.len()
            );
            return Ok(());
        }

        info!("Deleting cart row {}", index);
        rows[index].find(ROW_DELETE).await?.click().await?;
        sleep(ROW_SETTLE).await;
        Ok(())
    }

    /// Scroll to and click the Place Order control
    pub async fn place_order(&self) -> E2eResult<()> {
        let waiter = Waiter::new(self.session);
        waiter.scroll_into_view(PLACE_ORDER_BUTTON).await?;
        waiter.click_when_clickable(PLACE_ORDER_BUTTON).await?;
        sleep(MODAL_SETTLE).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_item_serializes_for_reports() {
        let item = CartItem {
            name: "Samsung galaxy s6".to_string(),
            price: "360".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "Samsung galaxy s6");
        assert_eq!(json["price"], "360");
    }
}
