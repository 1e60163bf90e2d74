//! Timestamp and video-identifier parsing.
//!
//! Timestamps travel through the system as `"mm:ss"` strings and are only
//! converted to seconds at the playback boundary. Parsing is pure and does
//! no I/O, so callers can re-run it per request.

use regex::Regex;
use url::Url;

use crate::error::{Result, ScholarError};

/// Canonical video identifiers are always 11 characters.
const VIDEO_ID_LEN: usize = 11;

/// Parse an `"mm:ss"` timestamp into total seconds.
///
/// Minutes may exceed 59 (long videos format as `"75:30"`), seconds must be
/// two digits below 60.
pub fn parse_timestamp(timestamp: &str) -> Result<u32> {
    let (minutes, seconds) = timestamp
        .split_once(':')
        .ok_or_else(|| ScholarError::InvalidTimestamp(timestamp.to_string()))?;

    if seconds.len() != 2 {
        return Err(ScholarError::InvalidTimestamp(timestamp.to_string()));
    }

    let minutes: u32 = minutes
        .parse()
        .map_err(|_| ScholarError::InvalidTimestamp(timestamp.to_string()))?;
    let seconds: u32 = seconds
        .parse()
        .map_err(|_| ScholarError::InvalidTimestamp(timestamp.to_string()))?;

    if seconds >= 60 {
        return Err(ScholarError::InvalidTimestamp(timestamp.to_string()));
    }

    Ok(minutes * 60 + seconds)
}

/// Format total seconds as an `"mm:ss"` timestamp.
pub fn format_timestamp(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Extract the canonical 11-character video identifier from a source URL.
///
/// Recognized shapes: `watch?v=`, short `youtu.be/`, `embed/`, and a bare
/// `v=` query parameter. Anything else yields `None`.
pub fn extract_video_id(source_url: &str) -> Option<String> {
    // The watch shape is cleanest through a real URL parse: the v parameter
    // can appear anywhere in the query string.
    if let Ok(parsed) = Url::parse(source_url) {
        if parsed
            .host_str()
            .is_some_and(|h| h == "www.youtube.com" || h == "youtube.com" || h == "m.youtube.com")
        {
            if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v") {
                return canonical_id(&id);
            }
        }
    }

    let path_patterns = [
        r"youtu\.be/([A-Za-z0-9_-]+)",
        r"youtube\.com/embed/([A-Za-z0-9_-]+)",
        r"youtube\.com/\S*[?&]v=([A-Za-z0-9_-]+)",
    ];

    for pattern in &path_patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(captures) = re.captures(source_url) {
                if let Some(id) = captures.get(1) {
                    return canonical_id(id.as_str());
                }
            }
        }
    }

    None
}

fn canonical_id(candidate: &str) -> Option<String> {
    let valid = candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        assert_eq!(parse_timestamp("00:00").unwrap(), 0);
        assert_eq!(parse_timestamp("01:30").unwrap(), 90);
        assert_eq!(parse_timestamp("12:05").unwrap(), 725);
        assert_eq!(format_timestamp(725), "12:05");
        assert_eq!(format_timestamp(0), "00:00");
    }

    #[test]
    fn parse_accepts_minutes_past_an_hour() {
        assert_eq!(parse_timestamp("75:30").unwrap(), 4530);
        assert_eq!(format_timestamp(4530), "75:30");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for bad in ["", "1230", "12:5", "12:60", "ab:cd", "12:345", "-1:30"] {
            assert!(parse_timestamp(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn extracts_id_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        // v does not have to be the first query parameter
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?t=42&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_bare_parameter() {
        assert_eq!(
            extract_video_id("youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=tooshort"), None);
        assert_eq!(extract_video_id("not a url at all"), None);
        assert_eq!(extract_video_id(""), None);
    }
}
