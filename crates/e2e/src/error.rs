//! Error types for the suite

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error(
        "No browser could be started. Attempts:\n{0}\n\n\
         Remediation:\n\
         \x20 1. Install Google Chrome or Mozilla Firefox\n\
         \x20 2. Ensure network access so a matching driver can be downloaded\n\
         \x20 3. Or place chromedriver/geckodriver on PATH"
    )]
    Provisioning(String),

    #[error("Driver failed to start: {0}")]
    DriverStartup(String),

    #[error("Driver health check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Unknown product: {0:?} is not in the product table")]
    UnknownProduct(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Driver archive error: {0}")]
    Archive(String),

    #[error("WebDriver command error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("WebDriver session error: {0}")]
    NewSession(#[from] fantoccini::error::NewSessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_error_carries_remediation() {
        let err = E2eError::Provisioning("Chrome (managed driver): connect refused".to_string());
        let text = err.to_string();
        assert!(text.contains("Install Google Chrome or Mozilla Firefox"));
        assert!(text.contains("connect refused"));
    }

    #[test]
    fn unknown_product_names_the_offender() {
        let err = E2eError::UnknownProduct("iPhone 14".to_string());
        assert!(err.to_string().contains("iPhone 14"));
    }
}
