use regex::Regex;
use std::sync::LazyLock;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const MAX_FILENAME_LEN: usize = 100;
const FALLBACK_FILENAME: &str = "video";

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+").expect("valid regex")
});

static PICTOGRAPHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}",
        r"\x{1F1E0}-\x{1F1FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}\x{1F900}-\x{1F9FF}]"
    ))
    .expect("valid regex")
});

static ILLEGAL_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

// Everything outside printable ASCII, control characters included.
static NON_PRINTABLE_ASCII: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x20-\x7E]").expect("valid regex"));

static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Loose shape check for YouTube watch/short links.
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// Renders a byte count with binary units, rounded to two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    while exponent < SIZE_UNITS.len() - 1 && bytes >= 1024u64.pow(exponent as u32 + 1) {
        exponent += 1;
    }

    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[exponent])
}

/// Like [`format_bytes`], but an absent or zero size reads as "Unknown".
pub fn format_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) if bytes > 0 => format_bytes(bytes),
        _ => "Unknown".to_string(),
    }
}

pub fn format_duration(seconds: Option<f64>) -> String {
    let seconds = match seconds {
        Some(seconds) if seconds > 0.0 => seconds,
        _ => return "Unknown".to_string(),
    };

    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}

/// Turns a video title into an ASCII, hyphen-joined file stem of at most 100 characters.
pub fn sanitize_filename(title: &str) -> String {
    let name = PICTOGRAPHS.replace_all(title, "");
    let name = ILLEGAL_FILENAME_CHARS.replace_all(&name, "");
    let name = WHITESPACE.replace_all(&name, "-");
    let name = NON_PRINTABLE_ASCII.replace_all(&name, "");
    let name = HYPHEN_RUNS.replace_all(&name, "-");

    // Only ASCII is left, so byte slicing stays on char boundaries.
    let capped = &name[..name.len().min(MAX_FILENAME_LEN)];
    let cleaned = capped.trim().trim_matches('-');

    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
