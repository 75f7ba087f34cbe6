use super::{
    extractor::{ByteStream, Extractor},
    types::VideoInfo,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, stream, StreamExt};
use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

pub struct YtDlp {
    binary: PathBuf,
    probe_timeout: Option<Duration>,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            probe_timeout: None,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn dump_json(&self, url: &str) -> Result<std::process::Output> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--dump-json")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg(url)
            .kill_on_drop(true);
        let output = command.output();

        match self.probe_timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .context("Media metadata extraction timed out")?
                .context("Failed to run yt-dlp"),
            None => output.await.context("Failed to run yt-dlp"),
        }
    }
}

#[async_trait]
impl Extractor for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("yt-dlp --version failed: {}", error.trim()));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if version.is_empty() {
            return Err(anyhow::anyhow!("yt-dlp reported an empty version"));
        }

        Ok(version)
    }

    async fn probe(&self, url: &str) -> Result<VideoInfo> {
        debug!("Extracting metadata with yt-dlp for: {}", url);

        let output = self.dump_json(url).await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!(
                "Media metadata extraction failed: {}",
                error.trim()
            ));
        }

        let info: VideoInfo =
            serde_json::from_slice(&output.stdout).context("Failed to parse media metadata")?;

        debug!(
            "yt-dlp reported {} formats for {}",
            info.formats.len(),
            info.id
        );
        Ok(info)
    }

    async fn stream(&self, url: &str, format_id: &str) -> Result<ByteStream> {
        info!("Streaming format {} with yt-dlp: {}", format_id, url);

        let mut child = Command::new(&self.binary)
            .arg(url)
            .arg("-f")
            .arg(format_id)
            .arg("-o")
            .arg("-")
            .arg("--no-playlist")
            .arg("--no-progress")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to spawn yt-dlp")?;

        let stdout = child.stdout.take().context("Failed to get yt-dlp stdout")?;
        let stderr = child.stderr.take().context("Failed to get yt-dlp stderr")?;

        // Raw reads keep the pipe drained even when yt-dlp prints non-UTF-8 text.
        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut last_line = String::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim();
                        if !line.is_empty() {
                            debug!(target: "yt-dlp", "{}", line);
                            last_line = line.to_string();
                        }
                    }
                }
            }
            last_line
        });

        // Polled only once stdout is exhausted; dropping it early drops (and kills) the child.
        let exit = stream::once(async move {
            let status = match child.wait().await {
                Ok(status) => status,
                Err(e) => return Some(Err::<Bytes, _>(e)),
            };
            if status.success() {
                return None;
            }
            let detail = stderr_task.await.unwrap_or_default();
            Some(Err(io::Error::other(format!(
                "yt-dlp exited with {}: {}",
                status, detail
            ))))
        })
        .filter_map(future::ready);

        Ok(ReaderStream::new(stdout).chain(exit).boxed())
    }
}
