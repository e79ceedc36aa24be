//! Playback driver: turns each tick's resolved state into audio commands.
//!
//! The driver only touches the audio backend when the on-air track changes.
//! Re-seeking every tick would be audible, so within a track the backend is
//! left to play on its own.

use crate::error::PlaybackError;
use crate::schedule::PlaybackState;
use crate::track::local_path;
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Controllable audio output the driver steers.
pub trait PlaybackControl {
    /// Replace the current source with `locator`, leaving it ready to play.
    fn set_source(&mut self, locator: &str) -> Result<(), PlaybackError>;
    /// Current playback position within the source.
    fn position(&self) -> Duration;
    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;
    /// Start playback. May be refused by the backend.
    fn play(&mut self) -> Result<(), PlaybackError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Same track as last tick; nothing was touched.
    Held,
    /// Switched to a new track.
    Switched,
}

#[derive(Debug, Default)]
pub struct PlaybackDriver {
    current_index: Option<usize>,
}

impl PlaybackDriver {
    pub fn new() -> Self {
        PlaybackDriver::default()
    }

    /// Index of the track last handed to the backend.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Forget the driven track so the next tick switches unconditionally.
    pub fn reset(&mut self) {
        self.current_index = None;
    }

    /// Bring `control` in line with `state`.
    ///
    /// Backend failures are logged and swallowed: the new index is recorded
    /// either way, so a refused start does not cause a re-seek every tick.
    pub fn drive<C: PlaybackControl + ?Sized>(
        &mut self,
        state: &PlaybackState<'_>,
        control: &mut C,
    ) -> DriveOutcome {
        if self.current_index == Some(state.index) {
            return DriveOutcome::Held;
        }
        self.current_index = Some(state.index);
        info!(
            index = state.index,
            title = state.track.title(),
            offset_secs = state.offset.as_secs_f64(),
            "now on air"
        );

        if let Err(e) = control.set_source(state.track.url()) {
            warn!(title = state.track.title(), error = %e, "cannot load track");
            return DriveOutcome::Switched;
        }
        if let Err(e) = control.seek(state.offset) {
            debug!(error = %e, "seek failed, playing from start");
        }
        if let Err(e) = control.play() {
            debug!(error = %e, "playback start refused");
        }
        DriveOutcome::Switched
    }
}

/// Audio output on the default device, backed by a rodio sink.
///
/// Not `Send`: create it on the thread that runs the tick loop.
pub struct RodioControl {
    _stream: OutputStream,
    sink: Sink,
    base_dir: Option<PathBuf>,
}

impl RodioControl {
    /// Open the default output device. Relative locators resolve against `base_dir`.
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self, PlaybackError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Output(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| PlaybackError::Output(e.to_string()))?;
        Ok(RodioControl {
            _stream: stream,
            sink,
            base_dir,
        })
    }
}

impl PlaybackControl for RodioControl {
    fn set_source(&mut self, locator: &str) -> Result<(), PlaybackError> {
        let path = local_path(locator, self.base_dir.as_deref())
            .ok_or_else(|| PlaybackError::UnsupportedLocator(locator.to_string()))?;
        let file = File::open(&path).map_err(|source| PlaybackError::Open {
            path: path.clone(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
            path: path.clone(),
            message: e.to_string(),
        })?;
        // clear() also pauses, so the new source waits for play().
        self.sink.clear();
        self.sink.append(source);
        Ok(())
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(position)
            .map_err(|e| PlaybackError::Seek(e.to_string()))
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.sink.empty() {
            return Err(PlaybackError::Refused("no source loaded".to_string()));
        }
        self.sink.play();
        Ok(())
    }
}
