//! Checkout: the order modal, purchase submission, and the confirmation
//! dialog

use std::time::Duration;

use fantoccini::Locator;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::E2eResult;
use crate::session::Session;
use crate::wait::Waiter;

const ORDER_MODAL: Locator<'static> = Locator::Id("orderModal");
const NAME_FIELD: Locator<'static> = Locator::Id("name");
const COUNTRY_FIELD: Locator<'static> = Locator::Id("country");
const CITY_FIELD: Locator<'static> = Locator::Id("city");
const CARD_FIELD: Locator<'static> = Locator::Id("card");
const MONTH_FIELD: Locator<'static> = Locator::Id("month");
const YEAR_FIELD: Locator<'static> = Locator::Id("year");
const PURCHASE_BUTTON: Locator<'static> = Locator::XPath("//button[contains(text(),'Purchase')]");
const CLOSE_BUTTON: Locator<'static> =
    Locator::XPath("//div[@id='orderModal']//button[contains(text(),'Close')]");

const SUCCESS_HEADING: Locator<'static> =
    Locator::XPath("//h2[contains(text(),'Thank you for your purchase!')]");
const ORDER_DETAILS: Locator<'static> = Locator::XPath("//p[@class='lead text-muted']");
const OK_BUTTON: Locator<'static> = Locator::XPath("//button[contains(text(),'OK')]");

/// Pause after the order modal reports present, for its fade-in
const MODAL_SETTLE: Duration = Duration::from_secs(1);

/// Pause after submitting while the site processes the order
const PURCHASE_SETTLE: Duration = Duration::from_secs(3);

/// Pause after dismissing a dialog while it fades out
const DISMISS_SETTLE: Duration = Duration::from_secs(2);

/// Input for one checkout. Immutable for the duration of the form fill.
#[derive(Debug, Clone)]
pub struct CustomerData {
    pub name: String,
    pub country: String,
    pub city: String,
    pub card: String,
    pub month: String,
    pub year: String,
}

impl CustomerData {
    /// A fixed valid customer for scenario runs
    pub fn sample() -> Self {
        Self {
            name: "Juan Pérez".to_string(),
            country: "México".to_string(),
            city: "Ciudad de México".to_string(),
            card: "4111111111111111".to_string(),
            month: "12".to_string(),
            year: "2028".to_string(),
        }
    }
}

pub struct CheckoutPage<'a> {
    session: &'a Session,
}

impl<'a> CheckoutPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Wait for the order modal and populate all six fields verbatim
    pub async fn fill_order_form(&self, customer: &CustomerData) -> E2eResult<()> {
        let waiter = Waiter::new(self.session);
        waiter.find_present(ORDER_MODAL).await?;
        sleep(MODAL_SETTLE).await;

        info!("Filling order form for {}", customer.name);
        waiter.type_into(NAME_FIELD, &customer.name).await?;
        waiter.type_into(COUNTRY_FIELD, &customer.country).await?;
        waiter.type_into(CITY_FIELD, &customer.city).await?;
        waiter.type_into(CARD_FIELD, &customer.card).await?;
        waiter.type_into(MONTH_FIELD, &customer.month).await?;
        waiter.type_into(YEAR_FIELD, &customer.year).await?;
        Ok(())
    }

    /// Submit the purchase
    pub async fn purchase(&self) -> E2eResult<()> {
        info!("Submitting purchase");
        Waiter::new(self.session)
            .click_when_clickable(PURCHASE_BUTTON)
            .await?;
        sleep(PURCHASE_SETTLE).await;
        Ok(())
    }

    /// Whether the confirmation heading appeared within budget. Absence is
    /// a normal "not successful" result, not an error.
    pub async fn is_purchase_successful(&self) -> bool {
        Waiter::new(self.session).exists(SUCCESS_HEADING).await
    }

    /// Confirmation heading text; empty when no confirmation is showing
    pub async fn success_message(&self) -> String {
        match Waiter::new(self.session).read_text(SUCCESS_HEADING).await {
            Ok(message) => message,
            Err(e) => {
                debug!("No success message: {}", e);
                String::new()
            }
        }
    }

    /// Order detail text from the confirmation dialog; empty when absent
    pub async fn order_details(&self) -> String {
        match Waiter::new(self.session).read_text(ORDER_DETAILS).await {
            Ok(details) => details,
            Err(e) => {
                debug!("No order details: {}", e);
                String::new()
            }
        }
    }

    /// Dismiss the confirmation dialog, tolerating its absence
    pub async fn close_success_dialog(&self) {
        match Waiter::new(self.session).click_when_clickable(OK_BUTTON).await {
            Ok(()) => sleep(DISMISS_SETTLE).await,
            Err(e) => warn!("Could not close success dialog: {}", e),
        }
    }

    /// Dismiss the still-open order modal, tolerating its absence
    pub async fn close_order_modal(&self) {
        match Waiter::new(self.session)
            .click_when_clickable(CLOSE_BUTTON)
            .await
        {
            Ok(()) => sleep(DISMISS_SETTLE).await,
            Err(e) => warn!("Could not close order modal: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_customer_fills_every_field() {
        let customer = CustomerData::sample();
        for field in [
            &customer.name,
            &customer.country,
            &customer.city,
            &customer.card,
            &customer.month,
            &customer.year,
        ] {
            assert!(!field.is_empty());
        }
        assert_eq!(customer.card.len(), 16);
    }
}
