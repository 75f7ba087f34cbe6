use super::types::VideoInfo;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Media bytes as they come out of the extractor.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable name of the extractor
    fn name(&self) -> &'static str;

    /// Version string reported by the tool; succeeding here is what makes it usable
    async fn version(&self) -> Result<String>;

    /// Fetch metadata and the list of available encodings for a URL
    async fn probe(&self, url: &str) -> Result<VideoInfo>;

    /// Start producing the bytes of one encoding. Dropping the stream stops the extractor.
    async fn stream(&self, url: &str, format_id: &str) -> Result<ByteStream>;
}
