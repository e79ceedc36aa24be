//! Station — the running session.
//!
//! Owns the anchor, the probed schedule and the playback driver. Built once
//! the probe finishes; a reload replaces the whole value.

use crate::driver::{PlaybackControl, PlaybackDriver};
use crate::schedule::{PlaybackState, Schedule};
use crate::track::format_clock;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Snapshot of what the station is playing, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    pub index: usize,
    pub title: String,
    /// Remaining time as `M:SS`.
    pub remaining: String,
    /// Background image locator, empty when the track has none.
    pub background: String,
    pub offset_secs: f64,
    pub remaining_secs: f64,
    pub next_title: Option<String>,
}

impl NowPlaying {
    pub fn from_state(state: &PlaybackState<'_>, schedule: &Schedule) -> Self {
        let next_title = schedule
            .next_index(state.index)
            .and_then(|i| schedule.get(i))
            .map(|t| t.title().to_string());
        NowPlaying {
            index: state.index,
            title: state.track.title().to_string(),
            remaining: format_clock(state.remaining.as_secs_f64()),
            background: state.track.bg().to_string(),
            offset_secs: state.offset.as_secs_f64(),
            remaining_secs: state.remaining.as_secs_f64(),
            next_title,
        }
    }
}

impl fmt::Display for NowPlaying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "🎵 {} | ⏱️ {} remaining", self.title, self.remaining)
    }
}

pub struct Station {
    anchor: DateTime<Utc>,
    schedule: Schedule,
    driver: PlaybackDriver,
}

impl Station {
    pub fn new(anchor: DateTime<Utc>, schedule: Schedule) -> Self {
        Station {
            anchor,
            schedule,
            driver: PlaybackDriver::new(),
        }
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Track on air at `now`, or None when the schedule is empty.
    pub fn now_playing(&self, now: DateTime<Utc>) -> Option<PlaybackState<'_>> {
        self.schedule.resolve_at(now, self.anchor)
    }

    /// Resolve and render without touching audio.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<NowPlaying> {
        self.now_playing(now)
            .map(|state| NowPlaying::from_state(&state, &self.schedule))
    }

    /// One timer tick: resolve, steer `control` if the track changed, render.
    pub fn tick<C: PlaybackControl + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        control: &mut C,
    ) -> Option<NowPlaying> {
        let state = self.schedule.resolve_at(now, self.anchor)?;
        self.driver.drive(&state, control);
        Some(NowPlaying::from_state(&state, &self.schedule))
    }

    /// Index of the track currently loaded in the backend.
    pub fn driven_index(&self) -> Option<usize> {
        self.driver.current_index()
    }
}
