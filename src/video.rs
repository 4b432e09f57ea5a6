//! YouTube video identifiers and timestamp labels
//! ----------------------------------------------
//! Single source of truth for turning user input (bare ids or any of the
//! common YouTube URL shapes) into the canonical 11-character video id that
//! bookmarks are keyed by.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id pattern"));

pub fn is_video_id(s: &str) -> bool {
    VIDEO_ID.is_match(s)
}

/// Extract the video id from a bare id or a YouTube URL.
/// Supported: `watch?v=`, `youtu.be/<id>`, `/embed/`, `/shorts/`, `/live/`, `/v/`.
pub fn parse_video_id(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() { return None; }
    if is_video_id(s) { return Some(s.to_string()); }

    let url = Url::parse(s).or_else(|_| Url::parse(&format!("https://{}", s))).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").or_else(|| host.strip_prefix("m.")).unwrap_or(&host);
    let mut segments = url.path_segments().map(|it| it.filter(|p| !p.is_empty()).collect::<Vec<_>>()).unwrap_or_default();

    let candidate: Option<String> = match host {
        "youtu.be" => segments.first().map(|p| p.to_string()),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            if segments.first() == Some(&"watch") {
                url.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.into_owned())
            } else if segments.len() >= 2 && matches!(segments[0], "embed" | "shorts" | "live" | "v") {
                Some(segments.swap_remove(1).to_string())
            } else {
                None
            }
        }
        _ => None,
    };
    candidate.filter(|id| is_video_id(id))
}

/// `m:ss` below an hour, `h:mm:ss` above. Fractions are truncated.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}
