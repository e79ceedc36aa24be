//! Schedule resolver: maps a wall-clock instant onto the station's endless
//! cycle of tracks.
//!
//! The cycle starts at a fixed anchor and repeats every `total_duration()`
//! seconds. Resolution is a pure function of (instant, anchor, schedule), so
//! every listener computing it at the same moment lands on the same track and
//! offset.

use crate::error::ScheduleError;
use crate::track::ScheduledTrack;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// The track on air at some instant. Derived per tick, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState<'a> {
    pub track: &'a ScheduledTrack,
    pub index: usize,
    /// Time already played into `track`.
    pub offset: Duration,
    /// Time left in `track`.
    pub remaining: Duration,
}

/// Ordered tracks making up one cycle. Order is cycle position.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    tracks: Vec<ScheduledTrack>,
    /// Cumulative end offset (seconds) of each track within the cycle.
    ends: Vec<f64>,
}

impl Schedule {
    /// Build a schedule, rejecting any track whose duration is zero.
    pub fn new(tracks: Vec<ScheduledTrack>) -> Result<Self, ScheduleError> {
        let mut ends = Vec::with_capacity(tracks.len());
        let mut acc = 0.0;
        for (index, t) in tracks.iter().enumerate() {
            if t.duration.is_zero() {
                return Err(ScheduleError::ZeroDuration {
                    index,
                    title: t.title().to_string(),
                });
            }
            acc += t.duration.as_secs_f64();
            ends.push(acc);
        }
        Ok(Schedule { tracks, ends })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScheduledTrack> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTrack> {
        self.tracks.iter()
    }

    /// Length of one full cycle in seconds.
    pub fn total_duration(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }

    /// Offset (seconds) into the cycle at which track `index` begins.
    pub fn start_of(&self, index: usize) -> Option<f64> {
        match index {
            i if i >= self.tracks.len() => None,
            0 => Some(0.0),
            i => Some(self.ends[i - 1]),
        }
    }

    /// Index of the track that follows `index`, wrapping at the end of the cycle.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        if self.tracks.is_empty() {
            None
        } else {
            Some((index + 1) % self.tracks.len())
        }
    }

    /// Find the track on air `elapsed` seconds into the cycle.
    ///
    /// A track owns `[start, end)`: an instant exactly on a boundary belongs
    /// to the following track. Values outside `[0, total)` are wrapped into
    /// the cycle first, so a non-empty schedule always yields a track.
    pub fn resolve(&self, elapsed: f64) -> Option<PlaybackState<'_>> {
        let total = self.total_duration();
        let elapsed = if (0.0..total).contains(&elapsed) {
            elapsed
        } else {
            wrap(elapsed, total)?
        };

        let index = self.ends.partition_point(|&end| end <= elapsed);
        // Rounding in the cumulative sums can leave the last end a hair below `elapsed`.
        let (index, elapsed) = if index < self.tracks.len() {
            (index, elapsed)
        } else {
            (0, 0.0)
        };

        let start = if index == 0 { 0.0 } else { self.ends[index - 1] };
        let end = self.ends[index];
        Some(PlaybackState {
            track: &self.tracks[index],
            index,
            offset: Duration::from_secs_f64((elapsed - start).max(0.0)),
            remaining: Duration::from_secs_f64((end - elapsed).max(0.0)),
        })
    }

    /// Resolve the track on air at wall-clock `now` for a cycle anchored at `anchor`.
    pub fn resolve_at(&self, now: DateTime<Utc>, anchor: DateTime<Utc>) -> Option<PlaybackState<'_>> {
        let elapsed = elapsed_since_anchor(now, anchor, self.total_duration())?;
        self.resolve(elapsed)
    }
}

/// Position of `now` within a cycle of `total` seconds that began at `anchor`.
///
/// Always in `[0, total)`, including when `now` precedes the anchor. Returns
/// `None` when `total` is not a positive finite length.
pub fn elapsed_since_anchor(now: DateTime<Utc>, anchor: DateTime<Utc>, total: f64) -> Option<f64> {
    let delta = now.signed_duration_since(anchor);
    let diff = match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1000.0,
    };
    wrap(diff, total)
}

fn wrap(secs: f64, total: f64) -> Option<f64> {
    if !(total > 0.0) || !total.is_finite() || !secs.is_finite() {
        return None;
    }
    let r = ((secs % total) + total) % total;
    if r >= total { Some(0.0) } else { Some(r) }
}
