use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("failed to read playlist '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse playlist '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unsupported locator '{0}' (only local files can be probed)")]
    UnsupportedLocator(String),
    #[error("failed to read metadata from '{}': {message}", path.display())]
    Metadata { path: PathBuf, message: String },
    #[error("reported duration {0:?} is not playable")]
    InvalidDuration(Duration),
    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),
    #[error("probe task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("track {index} ('{title}') has zero duration")]
    ZeroDuration { index: usize, title: String },
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to open audio output: {0}")]
    Output(String),
    #[error("cannot open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode '{}': {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("unsupported locator '{0}'")]
    UnsupportedLocator(String),
    #[error("seek failed: {0}")]
    Seek(String),
    #[error("playback refused: {0}")]
    Refused(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid anchor '{value}': {source}")]
    Anchor {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("{0}")]
    Invalid(String),
}
