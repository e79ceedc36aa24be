use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A playlist entry before its duration is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub title: String,
    pub url: String,
    /// Background image shown while the track is on air.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
}

impl TrackRef {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        TrackRef {
            title: title.into(),
            url: url.into(),
            bg: None,
        }
    }

    pub fn with_bg(mut self, bg: impl Into<String>) -> Self {
        self.bg = Some(bg.into());
        self
    }
}

/// A track with its resolved playback duration. Immutable once scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTrack {
    #[serde(flatten)]
    pub track: TrackRef,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl ScheduledTrack {
    pub fn new(track: TrackRef, duration: Duration) -> Self {
        ScheduledTrack { track, duration }
    }

    pub fn title(&self) -> &str {
        &self.track.title
    }

    pub fn url(&self) -> &str {
        &self.track.url
    }

    /// Background locator, or an empty string when the track has none.
    pub fn bg(&self) -> &str {
        self.track.bg.as_deref().unwrap_or("")
    }

    /// Format duration as M:SS.
    pub fn duration_display(&self) -> String {
        format_clock(self.duration.as_secs_f64())
    }
}

/// Format seconds as `M:SS`: minutes unpadded, seconds zero-padded, both floored.
pub fn format_clock(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let minutes = (secs / 60.0).floor() as u64;
    let seconds = (secs % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, seconds)
}

/// Map an audio locator to a local file path.
///
/// Accepts plain paths and `file://` URLs. Relative paths resolve against
/// `base_dir` (normally the playlist's directory). Any other URL scheme
/// yields `None`.
pub fn local_path(locator: &str, base_dir: Option<&Path>) -> Option<PathBuf> {
    let raw = match locator.strip_prefix("file://") {
        Some(rest) => rest,
        None if has_url_scheme(locator) => return None,
        None => locator,
    };
    let path = PathBuf::from(raw);
    match base_dir {
        Some(base) if path.is_relative() => Some(base.join(path)),
        _ => Some(path),
    }
}

fn has_url_scheme(locator: &str) -> bool {
    match locator.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(dur: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(dur.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_clock_matches_radio_display() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(59.0), "0:59");
        assert_eq!(format_clock(60.0), "1:00");
        assert_eq!(format_clock(125.0), "2:05");
        assert_eq!(format_clock(3599.0), "59:59");
    }

    #[test]
    fn format_clock_floors_fractions() {
        assert_eq!(format_clock(59.999), "0:59");
        assert_eq!(format_clock(125.4), "2:05");
        assert_eq!(format_clock(3600.0), "60:00");
    }

    #[test]
    fn format_clock_clamps_garbage() {
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
    }

    #[test]
    fn duration_display_formats_correctly() {
        let track = ScheduledTrack::new(TrackRef::new("Test", "test.mp3"), Duration::new(185, 0));
        assert_eq!(track.duration_display(), "3:05");
    }

    #[test]
    fn bg_defaults_to_empty() {
        let plain = ScheduledTrack::new(TrackRef::new("A", "a.mp3"), Duration::from_secs(1));
        assert_eq!(plain.bg(), "");
        let art = ScheduledTrack::new(
            TrackRef::new("A", "a.mp3").with_bg("a.jpg"),
            Duration::from_secs(1),
        );
        assert_eq!(art.bg(), "a.jpg");
    }

    #[test]
    fn track_ref_parses_playlist_record() {
        let t: TrackRef =
            serde_json::from_str(r#"{"title":"Intro","url":"music/intro.mp3","extra":1}"#)
                .unwrap();
        assert_eq!(t.title, "Intro");
        assert_eq!(t.url, "music/intro.mp3");
        assert!(t.bg.is_none());
    }

    #[test]
    fn scheduled_track_serializes_duration_as_seconds() {
        let t = ScheduledTrack::new(TrackRef::new("A", "a.mp3"), Duration::from_millis(1500));
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["duration"], 1.5);
        assert_eq!(json["title"], "A");
        let back: ScheduledTrack = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn local_path_resolves_relative_against_base() {
        let base = Path::new("/srv/radio");
        assert_eq!(
            local_path("music/a.mp3", Some(base)),
            Some(PathBuf::from("/srv/radio/music/a.mp3"))
        );
        assert_eq!(
            local_path("/abs/a.mp3", Some(base)),
            Some(PathBuf::from("/abs/a.mp3"))
        );
        assert_eq!(
            local_path("file:///abs/a.mp3", Some(base)),
            Some(PathBuf::from("/abs/a.mp3"))
        );
        assert_eq!(local_path("a.mp3", None), Some(PathBuf::from("a.mp3")));
    }

    #[test]
    fn local_path_rejects_remote_urls() {
        assert!(local_path("https://example.com/a.mp3", None).is_none());
        assert!(local_path("http://example.com/a.mp3", None).is_none());
    }
}
