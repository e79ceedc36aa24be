//! Duration probe: learns how long every playlist entry plays and assembles
//! the ordered [`Schedule`].
//!
//! Each track is probed as its own task. Results land at their original
//! index, so completion order never affects cycle order. A track whose probe
//! fails, times out or reports a useless duration gets the fallback length
//! instead, and the probe as a whole always completes.

use crate::error::{ProbeError, ScheduleError};
use crate::schedule::Schedule;
use crate::track::{ScheduledTrack, TrackRef, local_path};
use lofty::file::AudioFile;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const DEFAULT_FALLBACK: Duration = Duration::from_secs(120);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capability that reports the playback length of an audio locator.
pub trait DurationProbe: Send + Sync + 'static {
    fn probe(&self, locator: &str) -> impl Future<Output = Result<Duration, ProbeError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOptions {
    /// Duration recorded for a track whose probe failed.
    pub fallback: Duration,
    /// Per-track limit. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions {
            fallback: DEFAULT_FALLBACK,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Probe every track concurrently and build the schedule in input order.
pub async fn probe_durations<P: DurationProbe>(
    tracks: Vec<TrackRef>,
    probe: Arc<P>,
    options: ProbeOptions,
) -> Result<Schedule, ScheduleError> {
    let mut tasks = JoinSet::new();
    for (index, track) in tracks.iter().enumerate() {
        let probe = Arc::clone(&probe);
        let locator = track.url.clone();
        tasks.spawn(async move {
            let outcome = match options.timeout {
                Some(limit) => tokio::time::timeout(limit, probe.probe(&locator))
                    .await
                    .unwrap_or(Err(ProbeError::TimedOut(limit))),
                None => probe.probe(&locator).await,
            };
            (index, outcome.and_then(check_duration))
        });
    }

    let mut durations: Vec<Option<Duration>> = vec![None; tracks.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(duration))) => {
                debug!(track = %tracks[index].title, ?duration, "probed duration");
                durations[index] = Some(duration);
            }
            Ok((index, Err(e))) => {
                warn!(
                    track = %tracks[index].title,
                    error = %e,
                    fallback = ?options.fallback,
                    "failed to load track metadata, using fallback duration"
                );
                durations[index] = Some(options.fallback);
            }
            // The index died with the task; the gap is filled below.
            Err(e) => warn!(error = %e, "probe task aborted"),
        }
    }

    let scheduled: Vec<ScheduledTrack> = tracks
        .into_iter()
        .zip(durations)
        .map(|(track, duration)| {
            let duration = duration.unwrap_or_else(|| {
                warn!(track = %track.title, "no probe result, using fallback duration");
                options.fallback
            });
            ScheduledTrack::new(track, duration)
        })
        .collect();

    let schedule = Schedule::new(scheduled)?;
    info!(
        tracks = schedule.len(),
        cycle_secs = schedule.total_duration(),
        "schedule assembled"
    );
    Ok(schedule)
}

fn check_duration(duration: Duration) -> Result<Duration, ProbeError> {
    if duration.is_zero() {
        Err(ProbeError::InvalidDuration(duration))
    } else {
        Ok(duration)
    }
}

/// Reads durations from local audio files with lofty.
#[derive(Debug, Clone, Default)]
pub struct LoftyProbe {
    base_dir: Option<PathBuf>,
}

impl LoftyProbe {
    /// `base_dir` anchors relative locators, normally the playlist's directory.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        LoftyProbe { base_dir }
    }
}

impl DurationProbe for LoftyProbe {
    fn probe(&self, locator: &str) -> impl Future<Output = Result<Duration, ProbeError>> + Send {
        let path = local_path(locator, self.base_dir.as_deref())
            .ok_or_else(|| ProbeError::UnsupportedLocator(locator.to_string()));
        async move {
            let path = path?;
            tokio::task::spawn_blocking(move || read_duration(&path))
                .await
                .map_err(|e| ProbeError::Task(e.to_string()))?
        }
    }
}

fn read_duration(path: &Path) -> Result<Duration, ProbeError> {
    let tagged = lofty::read_from_path(path).map_err(|e| ProbeError::Metadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(tagged.properties().duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Scripted probe: each locator answers after its own delay.
    struct ScriptedProbe {
        answers: HashMap<String, (Duration, Option<Duration>)>,
    }

    impl ScriptedProbe {
        fn new(script: &[(&str, u64, Option<f64>)]) -> Arc<Self> {
            Arc::new(ScriptedProbe {
                answers: script
                    .iter()
                    .map(|(url, delay_ms, secs)| {
                        (
                            url.to_string(),
                            (
                                Duration::from_millis(*delay_ms),
                                secs.map(Duration::from_secs_f64),
                            ),
                        )
                    })
                    .collect(),
            })
        }
    }

    impl DurationProbe for ScriptedProbe {
        fn probe(&self, locator: &str) -> impl Future<Output = Result<Duration, ProbeError>> + Send {
            let answer = self.answers.get(locator).copied();
            let locator = locator.to_string();
            async move {
                let (delay, duration) =
                    answer.ok_or_else(|| ProbeError::UnsupportedLocator(locator.clone()))?;
                tokio::time::sleep(delay).await;
                duration.ok_or(ProbeError::UnsupportedLocator(locator))
            }
        }
    }

    fn refs(names: &[&str]) -> Vec<TrackRef> {
        names
            .iter()
            .map(|n| TrackRef::new(*n, format!("{}.mp3", n)))
            .collect()
    }

    fn titles(s: &Schedule) -> Vec<String> {
        s.iter().map(|t| t.title().to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_input_order_when_probes_finish_out_of_order() {
        let probe = ScriptedProbe::new(&[
            ("X.mp3", 300, Some(10.0)),
            ("Y.mp3", 5, Some(20.0)),
            ("Z.mp3", 200, Some(30.0)),
        ]);
        let s = probe_durations(refs(&["X", "Y", "Z"]), probe, ProbeOptions::default())
            .await
            .unwrap();
        assert_eq!(titles(&s), ["X", "Y", "Z"]);
        let secs: Vec<u64> = s.iter().map(|t| t.duration.as_secs()).collect();
        assert_eq!(secs, [10, 20, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_track_gets_fallback_and_probe_completes() {
        let probe = ScriptedProbe::new(&[("A.mp3", 10, Some(90.0)), ("B.mp3", 20, None)]);
        let s = probe_durations(refs(&["A", "B", "Unknown"]), probe, ProbeOptions::default())
            .await
            .unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(0).unwrap().duration, Duration::from_secs(90));
        assert_eq!(s.get(1).unwrap().duration, Duration::from_secs(120));
        assert_eq!(s.get(2).unwrap().duration, Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_probe_times_out_to_fallback() {
        let probe = ScriptedProbe::new(&[
            ("Fast.mp3", 1, Some(42.0)),
            ("Hung.mp3", 24 * 60 * 60 * 1000, Some(42.0)),
        ]);
        let options = ProbeOptions {
            fallback: Duration::from_secs(75),
            timeout: Some(Duration::from_secs(5)),
        };
        let s = probe_durations(refs(&["Fast", "Hung"]), probe, options)
            .await
            .unwrap();
        assert_eq!(s.get(0).unwrap().duration, Duration::from_secs(42));
        assert_eq!(s.get(1).unwrap().duration, Duration::from_secs(75));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_length_answer_is_treated_as_failure() {
        let probe = ScriptedProbe::new(&[("Empty.mp3", 1, Some(0.0))]);
        let s = probe_durations(refs(&["Empty"]), probe, ProbeOptions::default())
            .await
            .unwrap();
        assert_eq!(s.get(0).unwrap().duration, DEFAULT_FALLBACK);
    }

    #[tokio::test]
    async fn empty_playlist_yields_empty_schedule() {
        let probe = ScriptedProbe::new(&[]);
        let s = probe_durations(Vec::new(), probe, ProbeOptions::default())
            .await
            .unwrap();
        assert!(s.is_empty());
    }

    #[tokio::test]
    async fn zero_fallback_is_rejected_by_schedule() {
        let probe = ScriptedProbe::new(&[]);
        let options = ProbeOptions {
            fallback: Duration::ZERO,
            timeout: None,
        };
        let result = probe_durations(refs(&["Missing"]), probe, options).await;
        assert!(matches!(result, Err(ScheduleError::ZeroDuration { index: 0, .. })));
    }

    #[tokio::test]
    async fn lofty_probe_rejects_remote_locator() {
        let probe = LoftyProbe::new(None);
        let result = probe.probe("https://example.com/stream.mp3").await;
        assert!(matches!(result, Err(ProbeError::UnsupportedLocator(_))));
    }

    #[tokio::test]
    async fn lofty_probe_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("noise.mp3"), b"definitely not audio").unwrap();
        let probe = LoftyProbe::new(Some(dir.path().to_path_buf()));
        let result = probe.probe("noise.mp3").await;
        assert!(matches!(result, Err(ProbeError::Metadata { .. })));
        let missing = probe.probe("missing.mp3").await;
        assert!(matches!(missing, Err(ProbeError::Metadata { .. })));
    }
}
