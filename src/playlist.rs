use crate::error::PlaylistError;
use crate::track::TrackRef;
use std::fs;
use std::path::{Path, PathBuf};

/// The station's playlist as read from disk: ordered track records plus the
/// directory relative locators resolve against.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub tracks: Vec<TrackRef>,
    pub source_dir: Option<PathBuf>,
}

impl Playlist {
    /// Load a playlist file: a JSON array of `{title, url, bg?}` records.
    pub fn load(path: &Path) -> Result<Self, PlaylistError> {
        let data = fs::read_to_string(path).map_err(|source| PlaylistError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tracks: Vec<TrackRef> =
            serde_json::from_str(&data).map_err(|source| PlaylistError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let source_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Ok(Playlist { tracks, source_dir })
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_keeps_file_order_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring1.json");
        let mut f = fs::File::create(&path).unwrap();
        write!(
            f,
            r#"[
                {{"title":"One","url":"one.mp3","bg":"one.jpg"}},
                {{"title":"Two","url":"two.mp3"}},
                {{"title":"Three","url":"https://cdn.example/three.mp3"}}
            ]"#
        )
        .unwrap();

        let pl = Playlist::load(&path).unwrap();
        assert_eq!(pl.track_count(), 3);
        let titles: Vec<&str> = pl.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["One", "Two", "Three"]);
        assert_eq!(pl.tracks[0].bg.as_deref(), Some("one.jpg"));
        assert_eq!(pl.source_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let result = Playlist::load(Path::new("nonexistent-ring.json"));
        assert!(matches!(result, Err(PlaylistError::Read { .. })));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"title":"not an array"}"#).unwrap();
        assert!(matches!(
            Playlist::load(&path),
            Err(PlaylistError::Parse { .. })
        ));
    }

    #[test]
    fn empty_array_is_empty_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, "[]").unwrap();
        assert!(Playlist::load(&path).unwrap().is_empty());
    }
}
