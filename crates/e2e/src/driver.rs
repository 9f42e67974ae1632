//! WebDriver server management - spawning, health checking, and managed
//! driver downloads

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Pinned geckodriver release. Its protocol is stable across Firefox
/// versions, so a fixed release is fine; chromedriver must instead track
/// the installed Chrome and is resolved at runtime.
const GECKODRIVER_VERSION: &str = "0.34.0";

/// Chrome-for-Testing endpoint announcing the current stable Chrome version.
const CFT_LATEST_STABLE: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/LATEST_RELEASE_STABLE";

/// Which WebDriver server binary a session attempt runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Chromedriver,
    Geckodriver,
}

impl DriverKind {
    pub fn binary_name(self) -> &'static str {
        match self {
            DriverKind::Chromedriver => {
                if cfg!(windows) {
                    "chromedriver.exe"
                } else {
                    "chromedriver"
                }
            }
            DriverKind::Geckodriver => {
                if cfg!(windows) {
                    "geckodriver.exe"
                } else {
                    "geckodriver"
                }
            }
        }
    }
}

/// Handle to a running WebDriver server process
pub struct DriverServer {
    child: Child,
    url: String,
}

impl DriverServer {
    /// Spawn a driver binary on a free port and wait until it answers
    /// `GET /status`.
    pub async fn spawn(
        program: &Path,
        kind: DriverKind,
        startup_timeout: Duration,
    ) -> E2eResult<Self> {
        let port = find_free_port();
        let url = format!("http://127.0.0.1:{}", port);

        info!("Starting {} on port {}", kind.binary_name(), port);

        let mut cmd = Command::new(program);
        match kind {
            DriverKind::Chromedriver => {
                cmd.arg(format!("--port={}", port)).arg("--silent");
            }
            DriverKind::Geckodriver => {
                cmd.arg("--port")
                    .arg(port.to_string())
                    .arg("--log")
                    .arg("fatal");
            }
        }
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            E2eError::DriverStartup(format!("failed to spawn {}: {}", program.display(), e))
        })?;

        let server = DriverServer { child, url };
        server.wait_for_ready(startup_timeout).await?;

        debug!("{} ready at {}", kind.binary_name(), server.url);
        Ok(server)
    }

    /// Poll the driver's /status endpoint until it responds
    async fn wait_for_ready(&self, timeout: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Driver status returned {}", resp.status());
                }
                Err(e) => {
                    // Connection refused is expected while the driver starts
                    if !e.is_connect() {
                        warn!("Driver status error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::DriverHealthCheck(attempts))
    }

    /// Base URL the WebDriver client should connect to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop the driver process. Safe to call on a process that already
    /// exited.
    pub fn stop(&mut self) -> E2eResult<()> {
        debug!("Stopping driver (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for DriverServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Cache directory for managed driver binaries
fn drivers_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".demoblaze-e2e")
        .join("drivers")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}

/// Resolve a chromedriver binary, downloading the current stable release
/// into the local cache on first use.
pub async fn ensure_chromedriver() -> E2eResult<PathBuf> {
    let dest = drivers_dir().join(DriverKind::Chromedriver.binary_name());
    if dest.exists() {
        debug!("Using cached chromedriver at {}", dest.display());
        return Ok(dest);
    }

    let version = reqwest::get(CFT_LATEST_STABLE)
        .await?
        .error_for_status()?
        .text()
        .await?;
    let version = version.trim();
    let slug = chrome_platform_slug();
    let url = format!(
        "https://storage.googleapis.com/chrome-for-testing-public/{}/{}/chromedriver-{}.zip",
        version, slug, slug
    );

    info!("Downloading chromedriver {} ({})", version, slug);
    let bytes = reqwest::get(&url).await?.error_for_status()?.bytes().await?;
    extract_zip_binary(&bytes, DriverKind::Chromedriver.binary_name(), &dest)?;

    info!("chromedriver installed at {}", dest.display());
    Ok(dest)
}

/// Resolve a geckodriver binary, downloading the pinned release into the
/// local cache on first use.
pub async fn ensure_geckodriver() -> E2eResult<PathBuf> {
    let dest = drivers_dir().join(DriverKind::Geckodriver.binary_name());
    if dest.exists() {
        debug!("Using cached geckodriver at {}", dest.display());
        return Ok(dest);
    }

    let slug = gecko_platform_slug();
    let url = format!(
        "https://github.com/mozilla/geckodriver/releases/download/v{v}/geckodriver-v{v}-{slug}.tar.gz",
        v = GECKODRIVER_VERSION,
        slug = slug
    );

    info!("Downloading geckodriver {} ({})", GECKODRIVER_VERSION, slug);
    let bytes = reqwest::get(&url).await?.error_for_status()?.bytes().await?;
    extract_tar_gz_binary(&bytes, DriverKind::Geckodriver.binary_name(), &dest)?;

    info!("geckodriver installed at {}", dest.display());
    Ok(dest)
}

fn chrome_platform_slug() -> &'static str {
    if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        "mac-arm64"
    } else if cfg!(target_os = "macos") {
        "mac-x64"
    } else if cfg!(target_os = "windows") {
        "win64"
    } else {
        "linux64"
    }
}

fn gecko_platform_slug() -> &'static str {
    if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        "macos-aarch64"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "win64"
    } else {
        "linux64"
    }
}

/// True when an archive entry is the driver executable itself, not a
/// directory or a sidecar file like `LICENSE.chromedriver`.
fn is_binary_entry(entry_name: &str, binary: &str) -> bool {
    !entry_name.ends_with('/') && entry_name.rsplit('/').next() == Some(binary)
}

/// Extract the named binary from a zip archive into `dest`
fn extract_zip_binary(bytes: &[u8], binary: &str, dest: &Path) -> E2eResult<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| E2eError::Archive(format!("zip: {}", e)))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| E2eError::Archive(format!("zip entry: {}", e)))?;
        if !is_binary_entry(file.name(), binary) {
            continue;
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(dest)?;
        std::io::copy(&mut file, &mut out)?;
        mark_executable(dest)?;
        return Ok(());
    }

    Err(E2eError::Archive(format!("no {} entry in archive", binary)))
}

/// Extract the named binary from a tar.gz archive into `dest`
fn extract_tar_gz_binary(bytes: &[u8], binary: &str, dest: &Path) -> E2eResult<()> {
    let decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
    let mut archive = tar::Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        if !is_binary_entry(&name, binary) {
            continue;
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(dest)?;
        mark_executable(dest)?;
        return Ok(());
    }

    Err(E2eError::Archive(format!("no {} entry in archive", binary)))
}

fn mark_executable(path: &Path) -> E2eResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test_case("chromedriver-linux64/chromedriver", "chromedriver", true)]
    #[test_case("chromedriver", "chromedriver", true)]
    #[test_case("chromedriver-linux64/LICENSE.chromedriver", "chromedriver", false)]
    #[test_case("chromedriver-linux64/", "chromedriver", false)]
    #[test_case("geckodriver", "geckodriver", true)]
    #[test_case("geckodriver", "chromedriver", false)]
    fn archive_entry_selection(entry: &str, binary: &str, expected: bool) {
        assert_eq!(is_binary_entry(entry, binary), expected);
    }

    #[test]
    fn platform_slugs_are_known_values() {
        assert!(["mac-arm64", "mac-x64", "win64", "linux64"].contains(&chrome_platform_slug()));
        assert!(["macos-aarch64", "macos", "win64", "linux64"].contains(&gecko_platform_slug()));
    }

    #[test]
    fn drivers_dir_is_under_home_cache() {
        let dir = drivers_dir();
        assert!(dir.ends_with(".demoblaze-e2e/drivers"));
    }
}
