mod extractor;
mod formats;
pub mod provision;
pub mod types;
mod ytdlp;

#[cfg(test)]
pub mod test_helpers;

pub use extractor::{ByteStream, Extractor};
pub use formats::build_metadata;
pub use provision::ExtractorState;
pub use types::MediaMetadata;
