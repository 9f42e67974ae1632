//! Scenario orchestration: setup, steps, assertions, guaranteed teardown

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{E2eError, E2eResult};
use crate::pages::{CartPage, Category, CheckoutPage, CustomerData, HomePage, ProductPage};
use crate::session::{Session, SessionConfig};

/// Names of the scenarios the runner knows, in execution order
pub const SCENARIOS: [&str; 3] = [
    "purchase_two_items",
    "add_then_remove",
    "empty_cart_checkout",
];

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    /// Which acquisition strategy served the scenario
    pub browser: String,
    pub error: Option<String>,
}

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn from_results(results: Vec<ScenarioResult>, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub session: SessionConfig,

    /// Root URL of the storefront under test
    pub base_url: String,

    /// Output directory for the results artifact
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            base_url: "https://www.demoblaze.com/".to_string(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs scenarios as Setup -> Steps -> Assertions -> Teardown, with
/// teardown on every exit path.
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run every known scenario in order
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();

        info!("Running {} scenario(s)...", SCENARIOS.len());

        for name in SCENARIOS {
            let result = self.run_scenario(name).await?;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let suite = SuiteResult::from_results(results, start.elapsed().as_millis() as u64);
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            suite.passed, suite.failed, suite.duration_ms
        );
        Ok(suite)
    }

    /// Run one scenario by name against a fresh session. The session is
    /// released on every exit path, including assertion failures; release
    /// problems never mask the scenario outcome. Provisioning failure is
    /// fatal for the run and propagates as an error.
    pub async fn run_scenario(&self, name: &str) -> E2eResult<ScenarioResult> {
        if !SCENARIOS.contains(&name) {
            return Err(E2eError::UnknownScenario(name.to_string()));
        }

        info!("Running scenario: {}", name);
        let start = Instant::now();

        let session = Session::provision(&self.config.session).await?;
        let browser = session.browser().describe().to_string();

        let outcome = self.dispatch(name, &session).await;
        session.release().await;

        let duration_ms = start.elapsed().as_millis() as u64;
        Ok(match outcome {
            Ok(()) => ScenarioResult {
                name: name.to_string(),
                success: true,
                duration_ms,
                browser,
                error: None,
            },
            Err(e) => ScenarioResult {
                name: name.to_string(),
                success: false,
                duration_ms,
                browser,
                error: Some(e.to_string()),
            },
        })
    }

    async fn dispatch(&self, name: &str, session: &Session) -> E2eResult<()> {
        match name {
            "purchase_two_items" => self.purchase_two_items(session).await,
            "add_then_remove" => self.add_then_remove(session).await,
            "empty_cart_checkout" => self.empty_cart_checkout(session).await,
            other => Err(E2eError::UnknownScenario(other.to_string())),
        }
    }

    /// Add two distinct phones, verify the cart, and complete a purchase
    async fn purchase_two_items(&self, session: &Session) -> E2eResult<()> {
        let home = HomePage::new(session, &self.config.base_url);
        let product = ProductPage::new(session);
        let cart = CartPage::new(session);
        let checkout = CheckoutPage::new(session);

        home.open().await?;
        home.select_category(Category::Phones).await?;
        home.select_product("Samsung galaxy s6").await?;
        info!("First product: {} at {}", product.name().await?, product.price().await?);
        product.add_to_cart().await?;
        product.back_to_home().await?;

        home.select_category(Category::Phones).await?;
        home.select_product("Nokia lumia 1520").await?;
        info!("Second product: {} at {}", product.name().await?, product.price().await?);
        product.add_to_cart().await?;

        cart.open().await?;
        let items = cart.items().await?;
        let count = cart.count().await?;
        info!("Cart holds {} item(s), total {}", count, cart.total().await?);
        check(count == 2, format!("expected 2 items in cart, found {}", count))?;
        check(
            items.len() == 2,
            format!("expected 2 readable item rows, found {}", items.len()),
        )?;

        cart.place_order().await?;
        checkout.fill_order_form(&CustomerData::sample()).await?;
        checkout.purchase().await?;

        check(
            checkout.is_purchase_successful().await,
            "purchase did not reach the confirmation dialog",
        )?;
        let message = checkout.success_message().await;
        check(
            message.contains("Thank you for your purchase!"),
            format!("unexpected confirmation text: {:?}", message),
        )?;
        info!("Order details: {}", checkout.order_details().await);

        checkout.close_success_dialog().await;
        Ok(())
    }

    /// Add one product, then delete it and verify the cart drains
    async fn add_then_remove(&self, session: &Session) -> E2eResult<()> {
        let home = HomePage::new(session, &self.config.base_url);
        let product = ProductPage::new(session);
        let cart = CartPage::new(session);

        home.open().await?;
        home.select_category(Category::Phones).await?;
        home.select_product("Samsung galaxy s6").await?;
        product.add_to_cart().await?;

        cart.open().await?;
        let before = cart.count().await?;
        check(before == 1, format!("expected 1 item in cart, found {}", before))?;

        cart.delete_item(0).await?;
        let after = cart.count().await?;
        check(
            after == 0,
            format!("expected empty cart after deletion, found {} item(s)", after),
        )?;
        Ok(())
    }

    /// A fresh cart is empty; attempting checkout must leave the session
    /// usable whether the site opens the modal or rejects the attempt
    async fn empty_cart_checkout(&self, session: &Session) -> E2eResult<()> {
        let home = HomePage::new(session, &self.config.base_url);
        let cart = CartPage::new(session);
        let checkout = CheckoutPage::new(session);

        home.open().await?;
        cart.open().await?;
        check(cart.is_empty().await?, "cart should start empty")?;

        match cart.place_order().await {
            Ok(()) => {
                info!("Order modal opened on an empty cart; dismissing");
                checkout.close_order_modal().await;
            }
            Err(E2eError::Timeout(_)) => {
                info!("Checkout rejected on an empty cart");
            }
            Err(e) => return Err(e),
        }

        // The session must not be left behind a blocking modal
        cart.open().await?;
        check(
            cart.is_empty().await?,
            "cart should still be empty after the aborted checkout",
        )?;
        Ok(())
    }

    /// Write the suite results artifact as JSON
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Scenario assertion: a false condition aborts the remaining steps but
/// still flows through the runner's teardown path.
fn check(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::Assertion(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, success: bool) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            success,
            duration_ms: 10,
            browser: "Chrome (managed driver)".to_string(),
            error: if success { None } else { Some("boom".to_string()) },
        }
    }

    #[test]
    fn suite_result_aggregates_counts() {
        let suite = SuiteResult::from_results(
            vec![result("a", true), result("b", false), result("c", true)],
            30,
        );
        assert_eq!(suite.total, 3);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
        assert!(!suite.all_passed());
    }

    #[test]
    fn empty_suite_passes() {
        let suite = SuiteResult::from_results(vec![], 0);
        assert_eq!(suite.total, 0);
        assert!(suite.all_passed());
    }

    #[test]
    fn suite_result_round_trips_through_json() {
        let suite = SuiteResult::from_results(vec![result("purchase_two_items", true)], 12);
        let json = serde_json::to_string(&suite).unwrap();
        let back: SuiteResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total, 1);
        assert_eq!(back.results[0].name, "purchase_two_items");
        assert!(back.results[0].error.is_none());
    }

    #[test]
    fn check_produces_assertion_errors() {
        assert!(check(true, "fine").is_ok());
        let err = check(false, "expected 2 items").unwrap_err();
        assert!(matches!(err, E2eError::Assertion(_)));
        assert!(err.to_string().contains("expected 2 items"));
    }

    #[tokio::test]
    async fn unknown_scenario_is_rejected_before_provisioning() {
        let runner = ScenarioRunner::new(RunnerConfig::default());
        let err = runner.run_scenario("no_such_scenario").await.unwrap_err();
        assert!(matches!(err, E2eError::UnknownScenario(_)));
    }
}
