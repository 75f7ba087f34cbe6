use serde::{Deserialize, Deserializer, Serialize};

/// The parts of yt-dlp's `--dump-json` document the relay reads. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formats: Vec<RawFormat>,
}

/// Some extractors emit `"formats": null` instead of leaving the key out.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl VideoInfo {
    pub fn find_format(&self, format_id: &str) -> Option<&RawFormat> {
        self.formats.iter().find(|f| f.format_id == format_id)
    }
}

/// One encoding descriptor as reported by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

impl RawFormat {
    /// A codec is present unless yt-dlp explicitly reports `"none"`.
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    pub fn is_combined_mp4(&self) -> bool {
        self.has_video() && self.has_audio() && self.ext.as_deref() == Some("mp4")
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio() && !self.has_video()
    }

    /// Exact size in bytes, when yt-dlp knows it.
    pub fn exact_size(&self) -> Option<u64> {
        positive_bytes(self.filesize)
    }

    /// Exact size, falling back to yt-dlp's estimate.
    pub fn effective_size(&self) -> Option<u64> {
        self.exact_size().or_else(|| positive_bytes(self.filesize_approx))
    }
}

fn positive_bytes(value: Option<f64>) -> Option<u64> {
    value.filter(|v| *v > 0.0).map(|v| v.round() as u64)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatOption {
    pub quality: String,
    #[serde(rename = "type")]
    pub container: String,
    pub size: String,
    pub format: TrackKind,
    pub format_id: String,
}

/// Response body of the video-info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub video_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration: String,
    pub formats: Vec<FormatOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_info_ignores_unknown_fields() {
        let json = r#"{
            "id": "abc123",
            "title": "Some Video",
            "thumbnail": "https://i.ytimg.com/vi/abc123/hq.jpg",
            "duration": 212.5,
            "uploader": "someone",
            "formats": [
                {"format_id": "18", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a",
                 "height": 360, "filesize": 1048576, "fps": 30, "tbr": 512.3},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a",
                 "height": null, "abr": 129.5, "filesize_approx": 3000000.0}
            ]
        }"#;

        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "abc123");
        assert_eq!(info.formats.len(), 2);
        assert!(info.formats[0].is_combined_mp4());
        assert!(info.formats[1].is_audio_only());
        assert_eq!(info.formats[1].height, None);
        assert_eq!(info.find_format("18").unwrap().exact_size(), Some(1048576));
        assert!(info.find_format("999").is_none());
    }

    #[test]
    fn test_null_or_missing_formats_are_empty() {
        let info: VideoInfo =
            serde_json::from_str(r#"{"id": "abc", "title": "Live", "formats": null}"#).unwrap();
        assert!(info.formats.is_empty());

        let info: VideoInfo = serde_json::from_str(r#"{"id": "abc", "title": "Live"}"#).unwrap();
        assert!(info.formats.is_empty());
    }

    #[test]
    fn test_missing_codec_counts_as_present() {
        let format = RawFormat {
            format_id: "22".to_string(),
            ext: Some("mp4".to_string()),
            ..Default::default()
        };
        assert!(format.has_video());
        assert!(format.has_audio());
        assert!(format.is_combined_mp4());
        assert!(!format.is_audio_only());
    }

    #[test]
    fn test_effective_size_prefers_exact() {
        let format = RawFormat {
            filesize: Some(0.0),
            filesize_approx: Some(2048.0),
            ..Default::default()
        };
        assert_eq!(format.exact_size(), None);
        assert_eq!(format.effective_size(), Some(2048));

        let format = RawFormat {
            filesize: Some(1000.0),
            filesize_approx: Some(2048.0),
            ..Default::default()
        };
        assert_eq!(format.effective_size(), Some(1000));
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = MediaMetadata {
            video_id: "abc".to_string(),
            title: "t".to_string(),
            thumbnail: None,
            duration: "1:00".to_string(),
            formats: vec![FormatOption {
                quality: "720p".to_string(),
                container: "MP4".to_string(),
                size: "Unknown".to_string(),
                format: TrackKind::Video,
                format_id: "22".to_string(),
            }],
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["videoId"], "abc");
        assert_eq!(value["formats"][0]["type"], "MP4");
        assert_eq!(value["formats"][0]["format"], "video");
        assert_eq!(value["formats"][0]["formatId"], "22");
    }
}
