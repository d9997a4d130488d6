use std::sync::LazyLock;

use regex::Regex;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|youtu\.be/|youtube\.com/(?:live|shorts)/)([A-Za-z0-9_-]{11})")
        .expect("video id pattern is valid")
});

/// Pulls the 11 character video id out of a watch, short or live link.
/// Anything else is not a video we track.
pub(crate) fn extract_video_id(url: &str) -> Option<&str> {
    VIDEO_ID
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_short_link() {
        assert_eq!(
            extract_video_id("https://youtu.be/a_B-c1D2e3F?si=tracking"),
            Some("a_B-c1D2e3F")
        );
    }

    #[test]
    fn test_live_and_shorts() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/live/dQw4w9WgXcQ?feature=shared"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_not_a_video() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("https://www.youtube.com/@hotslicer"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_video_id("https://twitch.tv/hotslicer"), None);
    }
}
