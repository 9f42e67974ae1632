//! Browser session provisioning with an ordered fallback chain

use std::path::PathBuf;
use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::driver::{self, DriverKind, DriverServer};
use crate::error::{E2eError, E2eResult};

/// Fixed window profile applied to every session
pub const WINDOW_WIDTH: u32 = 1920;
pub const WINDOW_HEIGHT: u32 = 1080;

/// Session-wide default budget for bare element-presence lookups
pub const PRESENCE_WAIT: Duration = Duration::from_secs(10);

/// Which acquisition strategy produced the session. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserChoice {
    ChromeManaged,
    ChromePath,
    FirefoxManaged,
    FirefoxPath,
}

/// The fallback chain, tried in order until one strategy succeeds
pub const STRATEGY_ORDER: [BrowserChoice; 4] = [
    BrowserChoice::ChromeManaged,
    BrowserChoice::ChromePath,
    BrowserChoice::FirefoxManaged,
    BrowserChoice::FirefoxPath,
];

impl BrowserChoice {
    pub fn describe(self) -> &'static str {
        match self {
            BrowserChoice::ChromeManaged => "Chrome (managed driver)",
            BrowserChoice::ChromePath => "Chrome (driver on PATH)",
            BrowserChoice::FirefoxManaged => "Firefox (managed driver)",
            BrowserChoice::FirefoxPath => "Firefox (driver on PATH)",
        }
    }

    fn kind(self) -> DriverKind {
        match self {
            BrowserChoice::ChromeManaged | BrowserChoice::ChromePath => DriverKind::Chromedriver,
            BrowserChoice::FirefoxManaged | BrowserChoice::FirefoxPath => DriverKind::Geckodriver,
        }
    }
}

/// Configuration for session provisioning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Run the browser without a visible window
    pub headless: bool,

    /// Budget for a spawned driver to answer its /status endpoint
    pub driver_startup_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            driver_startup_timeout: Duration::from_secs(20),
        }
    }
}

/// A live browser session: the WebDriver connection plus the driver
/// process serving it. Page objects borrow the session, so they can
/// never outlive it.
pub struct Session {
    client: Client,
    driver: DriverServer,
    choice: BrowserChoice,
    presence_wait: Duration,
}

impl Session {
    /// Try each acquisition strategy in order and return the first session
    /// that connects. Fails only when the whole chain is exhausted.
    pub async fn provision(config: &SessionConfig) -> E2eResult<Self> {
        let mut failures = Vec::new();

        for choice in STRATEGY_ORDER {
            info!("Trying {}", choice.describe());
            match Self::attempt(choice, config).await {
                Ok(session) => {
                    info!("Browser ready via {}", choice.describe());
                    return Ok(session);
                }
                Err(e) => {
                    warn!("{} failed: {}", choice.describe(), e);
                    failures.push(format!("  {}: {}", choice.describe(), e));
                }
            }
        }

        Err(E2eError::Provisioning(failures.join("\n")))
    }

    async fn attempt(choice: BrowserChoice, config: &SessionConfig) -> E2eResult<Self> {
        let program: PathBuf = match choice {
            BrowserChoice::ChromeManaged => driver::ensure_chromedriver().await?,
            BrowserChoice::FirefoxManaged => driver::ensure_geckodriver().await?,
            // PATH strategies let Command resolve the bare binary name
            BrowserChoice::ChromePath | BrowserChoice::FirefoxPath => {
                PathBuf::from(choice.kind().binary_name())
            }
        };

        let driver =
            DriverServer::spawn(&program, choice.kind(), config.driver_startup_timeout).await?;

        let caps = match choice.kind() {
            DriverKind::Chromedriver => chrome_capabilities(config.headless),
            DriverKind::Geckodriver => firefox_capabilities(config.headless),
        };

        // If the browser itself is missing this is where the attempt dies;
        // DriverServer's Drop reaps the orphaned driver process.
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(driver.url())
            .await?;

        client.set_window_size(WINDOW_WIDTH, WINDOW_HEIGHT).await?;

        Ok(Session {
            client,
            driver,
            choice,
            presence_wait: PRESENCE_WAIT,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn browser(&self) -> BrowserChoice {
        self.choice
    }

    /// Session-wide default budget for lookups that bypass the Waiter
    pub fn presence_wait(&self) -> Duration {
        self.presence_wait
    }

    /// Close the WebDriver session and stop the driver process. Never
    /// fails outward: a browser that already exited is not an error here,
    /// and teardown problems must not mask the scenario outcome.
    pub async fn release(self) {
        let Session {
            client,
            mut driver,
            choice,
            ..
        } = self;

        info!("Releasing browser session ({})", choice.describe());

        if let Err(e) = client.close().await {
            warn!("Error closing WebDriver session: {}", e);
        }
        if let Err(e) = driver.stop() {
            warn!("Error stopping driver process: {}", e);
        }
    }
}

/// Chrome capability profile. Stability flags always apply; headless is
/// opt-in.
fn chrome_capabilities(headless: bool) -> Map<String, Value> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        format!("--window-size={},{}", WINDOW_WIDTH, WINDOW_HEIGHT),
        "--log-level=3".to_string(),
        "--disable-logging".to_string(),
        "--disable-background-networking".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "excludeSwitches": ["enable-logging", "enable-automation"],
            "useAutomationExtension": false,
        }),
    );
    caps
}

/// Firefox capability profile
fn firefox_capabilities(headless: bool) -> Map<String, Value> {
    let mut args: Vec<String> = vec![
        format!("--width={}", WINDOW_WIDTH),
        format!("--height={}", WINDOW_HEIGHT),
    ];
    if headless {
        args.push("-headless".to_string());
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("firefox"));
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": args,
            "log": { "level": "fatal" },
        }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome_args(caps: &Map<String, Value>) -> Vec<String> {
        caps["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn strategy_order_is_chrome_first_then_firefox() {
        assert_eq!(
            STRATEGY_ORDER,
            [
                BrowserChoice::ChromeManaged,
                BrowserChoice::ChromePath,
                BrowserChoice::FirefoxManaged,
                BrowserChoice::FirefoxPath,
            ]
        );
    }

    #[test]
    fn chrome_profile_always_carries_stability_flags() {
        let args = chrome_args(&chrome_capabilities(false));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--disable-dev-shm-usage".to_string()));
        assert!(args.contains(&"--disable-gpu".to_string()));
        assert!(args.contains(&format!(
            "--window-size={},{}",
            WINDOW_WIDTH, WINDOW_HEIGHT
        )));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn chrome_profile_adds_headless_only_when_requested() {
        let args = chrome_args(&chrome_capabilities(true));
        assert!(args.contains(&"--headless=new".to_string()));
    }

    #[test]
    fn chrome_profile_disables_automation_banner() {
        let caps = chrome_capabilities(true);
        let switches = caps["goog:chromeOptions"]["excludeSwitches"]
            .as_array()
            .unwrap();
        assert!(switches.contains(&json!("enable-automation")));
        assert_eq!(caps["goog:chromeOptions"]["useAutomationExtension"], json!(false));
    }

    #[test]
    fn firefox_profile_adds_headless_only_when_requested() {
        let visible = firefox_capabilities(false);
        let headless = firefox_capabilities(true);
        assert!(!visible["moz:firefoxOptions"]["args"]
            .as_array()
            .unwrap()
            .contains(&json!("-headless")));
        assert!(headless["moz:firefoxOptions"]["args"]
            .as_array()
            .unwrap()
            .contains(&json!("-headless")));
    }

    #[test]
    fn default_config_is_headless() {
        let config = SessionConfig::default();
        assert!(config.headless);
        assert!(config.driver_startup_timeout >= Duration::from_secs(10));
    }
}
