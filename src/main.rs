use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use ring_radio::config::StationConfig;
use ring_radio::driver::RodioControl;
use ring_radio::playlist::Playlist;
use ring_radio::probe::{LoftyProbe, probe_durations};
use ring_radio::station::Station;
use ring_radio::track::format_clock;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ring_radio", about = "Anchor-synchronized virtual radio station")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tune in: play the station on the default audio device until Ctrl-C
    Play {
        #[command(flatten)]
        station: StationArgs,
    },
    /// Show what is on air right now
    Now {
        #[command(flatten)]
        station: StationArgs,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the broadcast cycle
    Schedule {
        #[command(flatten)]
        station: StationArgs,
        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct StationArgs {
    /// Playlist file (JSON array of {title, url, bg?})
    #[arg(short, long)]
    playlist: Option<PathBuf>,
    /// Config file (default: ring_radio.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Cycle anchor, RFC 3339 (e.g. 2025-11-16T00:00:00Z)
    #[arg(long)]
    anchor: Option<String>,
    /// Duration in seconds assumed for unreadable tracks
    #[arg(long)]
    fallback: Option<f64>,
    /// Per-track probe timeout in seconds (0 = none)
    #[arg(long)]
    timeout: Option<f64>,
    /// Resync interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,
}

impl StationArgs {
    fn resolve_config(&self) -> anyhow::Result<StationConfig> {
        let mut config = StationConfig::load(self.config.as_deref())?;
        if let Some(p) = &self.playlist {
            config.playlist = p.clone();
        }
        if let Some(a) = &self.anchor {
            config.anchor = StationConfig::parse_anchor(a)?;
        }
        if let Some(f) = self.fallback {
            config.fallback_secs = f;
        }
        if let Some(t) = self.timeout {
            config.probe_timeout_secs = t;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_interval_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Load the playlist, probe every track and build the station.
async fn tune_in(config: &StationConfig) -> anyhow::Result<(Station, Playlist)> {
    let playlist = Playlist::load(&config.playlist)?;
    if playlist.is_empty() {
        bail!("playlist '{}' has no tracks", config.playlist.display());
    }
    info!(
        playlist = %config.playlist.display(),
        tracks = playlist.track_count(),
        "probing track durations"
    );
    let probe = Arc::new(LoftyProbe::new(playlist.source_dir.clone()));
    let schedule = probe_durations(playlist.tracks.clone(), probe, config.probe_options()?)
        .await
        .context("cannot build schedule")?;
    Ok((Station::new(config.anchor, schedule), playlist))
}

async fn play(config: StationConfig) -> anyhow::Result<()> {
    let (mut station, playlist) = tune_in(&config).await?;
    let mut control =
        RodioControl::new(playlist.source_dir.clone()).context("cannot open audio output")?;

    println!(
        "Tuned in: {} track(s), {} cycle, anchored at {}",
        station.schedule().len(),
        format_clock(station.schedule().total_duration()),
        station.anchor().to_rfc3339()
    );

    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdout = std::io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(np) = station.tick(Utc::now(), &mut control) {
                    print!("\r\x1b[2K{}", np);
                    let _ = stdout.flush();
                }
            }
            _ = &mut ctrl_c => {
                println!();
                info!("signing off");
                break;
            }
        }
    }
    Ok(())
}

async fn now(config: StationConfig, json: bool) -> anyhow::Result<()> {
    let (station, _) = tune_in(&config).await?;
    let Some(np) = station.snapshot(Utc::now()) else {
        bail!("nothing on air");
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&np)?);
    } else {
        println!("{}", np);
        if !np.background.is_empty() {
            println!("Background: {}", np.background);
        }
        if let Some(next) = &np.next_title {
            println!("Up next: {}", next);
        }
    }
    Ok(())
}

async fn schedule(config: StationConfig, json: bool) -> anyhow::Result<()> {
    let (station, _) = tune_in(&config).await?;
    let schedule = station.schedule();
    if json {
        let tracks: Vec<_> = schedule.iter().collect();
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }
    let on_air = station.now_playing(Utc::now()).map(|s| s.index);
    println!(
        "Cycle: {} track(s), {} total",
        schedule.len(),
        format_clock(schedule.total_duration())
    );
    for (i, t) in schedule.iter().enumerate() {
        let marker = if on_air == Some(i) { ">" } else { " " };
        println!(
            "{} {:>3}. [{:>6}] {:>6}  {}",
            marker,
            i + 1,
            format_clock(schedule.start_of(i).unwrap_or(0.0)),
            t.duration_display(),
            t.title()
        );
    }
    Ok(())
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Play { station } => play(station.resolve_config()?).await,
        Commands::Now { station, json } => now(station.resolve_config()?, json).await,
        Commands::Schedule { station, json } => schedule(station.resolve_config()?, json).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = run(cli.command).await;

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
