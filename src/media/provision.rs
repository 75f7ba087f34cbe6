use super::{extractor::Extractor, ytdlp::YtDlp};
use crate::config::ExtractorConfig;
use anyhow::{Context, Result};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;

/// Whether the extractor can be used yet. Set once at startup, read by every request.
#[derive(Clone)]
pub enum ExtractorState {
    Uninitialized,
    Ready {
        extractor: Arc<dyn Extractor>,
        version: String,
    },
    Failed {
        reason: String,
    },
}

impl ExtractorState {
    pub fn ready(&self) -> Option<Arc<dyn Extractor>> {
        match self {
            ExtractorState::Ready { extractor, .. } => Some(extractor.clone()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractorState::Uninitialized => "initializing",
            ExtractorState::Ready { .. } => "ready",
            ExtractorState::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Debug for ExtractorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractorState::Uninitialized => write!(f, "Uninitialized"),
            ExtractorState::Ready { extractor, version } => {
                write!(f, "Ready({} {})", extractor.name(), version)
            }
            ExtractorState::Failed { reason } => write!(f, "Failed({})", reason),
        }
    }
}

/// File name of the locally provisioned binary.
pub fn local_binary_name() -> &'static str {
    if cfg!(windows) {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

/// Release asset that runs natively on this platform.
pub fn release_asset() -> &'static str {
    if cfg!(windows) {
        "yt-dlp.exe"
    } else if cfg!(target_os = "macos") {
        "yt-dlp_macos"
    } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
        "yt-dlp_linux"
    } else if cfg!(all(target_os = "linux", target_arch = "aarch64")) {
        "yt-dlp_linux_aarch64"
    } else {
        "yt-dlp"
    }
}

pub fn release_url(base: &str) -> Result<Url> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    Url::parse(&base)
        .and_then(|url| url.join(release_asset()))
        .with_context(|| format!("Invalid release base URL: {}", base))
}

/// Finds a working yt-dlp: the configured or locally provisioned binary first
/// (downloading it if allowed), then whatever is installed on `PATH`.
pub async fn initialize(config: &ExtractorConfig) -> ExtractorState {
    info!("Setting up yt-dlp...");

    let timeout = config.probe_timeout_secs.map(Duration::from_secs);

    let local_error = match prepare_local(config).await {
        Ok(path) => match ready_state(YtDlp::new(path).with_probe_timeout(timeout)).await {
            Ok(state) => return state,
            Err(e) => e,
        },
        Err(e) => e,
    };

    warn!("Failed to initialize yt-dlp: {:#}", local_error);
    warn!("Trying system yt-dlp...");

    let system = which::which(&config.system_binary)
        .with_context(|| format!("{} not found on PATH", config.system_binary));
    let system_error = match system {
        Ok(path) => match ready_state(YtDlp::new(path).with_probe_timeout(timeout)).await {
            Ok(state) => return state,
            Err(e) => e,
        },
        Err(e) => e,
    };

    warn!("System yt-dlp not usable: {:#}", system_error);
    ExtractorState::Failed {
        reason: format!("{:#}; {:#}", local_error, system_error),
    }
}

async fn ready_state(ytdlp: YtDlp) -> Result<ExtractorState> {
    let version = ytdlp.version().await?;
    info!(
        "✅ Using yt-dlp at {}, version: {}",
        ytdlp.binary().display(),
        version
    );
    Ok(ExtractorState::Ready {
        extractor: Arc::new(ytdlp),
        version,
    })
}

/// Path of a binary that should be runnable, provisioning it if needed.
async fn prepare_local(config: &ExtractorConfig) -> Result<PathBuf> {
    if let Some(binary) = &config.binary {
        info!("Using configured yt-dlp binary: {}", binary.display());
        return Ok(binary.clone());
    }

    let path = config.bin_dir.join(local_binary_name());
    if path.exists() {
        info!("Using existing yt-dlp binary: {}", path.display());
        return Ok(path);
    }

    if !config.auto_provision {
        return Err(anyhow::anyhow!(
            "{} does not exist and provisioning is disabled",
            path.display()
        ));
    }

    let url = release_url(&config.release_base_url)?;
    info!("📥 Downloading yt-dlp binary from {}", url);
    download_binary(&url, &path).await?;
    info!("✅ yt-dlp downloaded to {}", path.display());
    Ok(path)
}

async fn download_binary(url: &Url, dest: &Path) -> Result<()> {
    let dir = dest
        .parent()
        .context("Binary path has no parent directory")?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("yt-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let mut response = client
        .get(url.clone())
        .send()
        .await
        .context("Failed to request yt-dlp release")?
        .error_for_status()
        .context("yt-dlp release download was rejected")?;

    // Written next to the destination so the final rename stays on one filesystem.
    let (file, temp_path) = NamedTempFile::new_in(dir)
        .context("Failed to create temporary file")?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read yt-dlp release")?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    info!("Downloaded {} bytes", written);

    mark_executable(&temp_path)?;
    temp_path
        .persist(dest)
        .with_context(|| format!("Failed to move binary into {}", dest.display()))?;
    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
