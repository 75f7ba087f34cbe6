//! Stand-ins for yt-dlp used across the crate's tests.

use super::{
    extractor::{ByteStream, Extractor},
    types::VideoInfo,
};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::{
    io,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};
use tempfile::TempDir;

/// Writes an executable shell script standing in for yt-dlp.
#[cfg(unix)]
pub fn fake_ytdlp(dir: &TempDir, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// What the in-memory extractor should emit when asked to stream.
#[derive(Clone)]
pub enum Chunk {
    Data(&'static [u8]),
    Fail(&'static str),
}

/// In-memory extractor with canned metadata and stream contents.
pub struct FakeExtractor {
    pub info: Option<VideoInfo>,
    pub chunks: Vec<Chunk>,
    pub spawn_error: Option<&'static str>,
    pub probes: AtomicUsize,
    pub streams: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(info: VideoInfo) -> Self {
        Self {
            info: Some(info),
            chunks: Vec::new(),
            spawn_error: None,
            probes: AtomicUsize::new(0),
            streams: AtomicUsize::new(0),
        }
    }

    pub fn failing_probe() -> Self {
        Self {
            info: None,
            ..Self::new(VideoInfo::default())
        }
    }

    pub fn with_chunks(mut self, chunks: Vec<Chunk>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn with_spawn_error(mut self, message: &'static str) -> Self {
        self.spawn_error = Some(message);
        self
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn version(&self) -> Result<String> {
        Ok("0.0.0-test".to_string())
    }

    async fn probe(&self, _url: &str) -> Result<VideoInfo> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.info
            .clone()
            .ok_or_else(|| anyhow::anyhow!("ERROR: Video unavailable"))
    }

    async fn stream(&self, _url: &str, _format_id: &str) -> Result<ByteStream> {
        self.streams.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.spawn_error {
            return Err(anyhow::anyhow!(message));
        }

        let items: Vec<io::Result<Bytes>> = self
            .chunks
            .iter()
            .map(|chunk| match chunk {
                Chunk::Data(data) => Ok(Bytes::from_static(data)),
                Chunk::Fail(message) => Err(io::Error::other(*message)),
            })
            .collect();
        Ok(stream::iter(items).boxed())
    }
}
