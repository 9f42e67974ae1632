//! Demoblaze E2E Test Suite
//!
//! This crate drives the public Demoblaze demo storefront through a full
//! purchase journey over the WebDriver protocol:
//! - Provisions a browser session with a four-strategy fallback chain
//!   (Chrome managed driver, Chrome PATH driver, Firefox managed driver,
//!   Firefox PATH driver)
//! - Wraps every element interaction in explicit polling waits
//! - Models each site screen as a page object with fixed locators
//! - Orchestrates end-to-end scenarios with guaranteed session teardown
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ScenarioRunner                             │
//! │    ├── Session::provision() -> Session                      │
//! │    ├── HomePage / ProductPage / CartPage / CheckoutPage     │
//! │    └── SuiteResult -> test-results.json                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session                                                    │
//! │    ├── DriverServer (chromedriver / geckodriver process)    │
//! │    └── fantoccini::Client (WebDriver connection)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Waiter: poll-with-timeout interaction helpers              │
//! │    click / type / read / exists / scroll / alert            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod driver;
pub mod error;
pub mod pages;
pub mod scenario;
pub mod session;
pub mod wait;

pub use error::{E2eError, E2eResult};
pub use scenario::{RunnerConfig, ScenarioResult, ScenarioRunner, SuiteResult};
pub use session::{BrowserChoice, Session, SessionConfig};
pub use wait::Waiter;
