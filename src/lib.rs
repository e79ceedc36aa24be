//! ring_radio — core library for an anchor-synchronized virtual radio station.
//!
//! Schedule resolution, duration probing and playback driving live here.
//! The CLI consumes this crate.

pub mod config;
pub mod driver;
pub mod error;
pub mod playlist;
pub mod probe;
pub mod schedule;
pub mod station;
pub mod track;
