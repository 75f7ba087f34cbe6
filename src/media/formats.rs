use super::types::{FormatOption, MediaMetadata, RawFormat, TrackKind, VideoInfo};
use crate::utils::{format_duration, format_size};

/// Video heights offered to the user, best first.
pub const QUALITY_TIERS: [u32; 4] = [1080, 720, 480, 360];

const DEFAULT_AUDIO_BITRATE: f64 = 128.0;

pub fn build_metadata(info: &VideoInfo) -> MediaMetadata {
    MediaMetadata {
        video_id: info.id.clone(),
        title: info.title.clone(),
        thumbnail: info.thumbnail.clone(),
        duration: format_duration(info.duration),
        formats: curate_formats(&info.formats),
    }
}

/// Picks one combined mp4 per quality tier, then the single best audio-only track.
/// Tiers without a match are left out.
pub fn curate_formats(formats: &[RawFormat]) -> Vec<FormatOption> {
    let mut options: Vec<FormatOption> = QUALITY_TIERS
        .iter()
        .filter_map(|&height| {
            formats
                .iter()
                .find(|f| f.is_combined_mp4() && f.height == Some(height))
                .map(|f| FormatOption {
                    quality: format!("{}p", height),
                    container: "MP4".to_string(),
                    size: format_size(f.effective_size()),
                    format: TrackKind::Video,
                    format_id: f.format_id.clone(),
                })
        })
        .collect();

    if let Some(audio) = best_audio(formats) {
        let bitrate = audio
            .abr
            .filter(|abr| *abr > 0.0)
            .unwrap_or(DEFAULT_AUDIO_BITRATE);
        options.push(FormatOption {
            quality: format!("{}kbps", bitrate.round() as u64),
            container: "MP3".to_string(),
            size: format_size(audio.effective_size()),
            format: TrackKind::Audio,
            format_id: audio.format_id.clone(),
        });
    }

    options
}

/// Highest-bitrate audio-only format; on ties the earliest one wins.
pub fn best_audio(formats: &[RawFormat]) -> Option<&RawFormat> {
    formats
        .iter()
        .filter(|f| f.is_audio_only())
        .fold(None, |best: Option<&RawFormat>, candidate| match best {
            Some(current) if bitrate(candidate) <= bitrate(current) => Some(current),
            _ => Some(candidate),
        })
}

fn bitrate(format: &RawFormat) -> f64 {
    format.abr.unwrap_or(0.0)
}
