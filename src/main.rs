//! # Departure Sign Entry Point
//!
//! Wires the library to a settings file, a tokio runtime and a panel, then
//! hands control to the schedule coordinator.
//!
//! ```text
//! departure-sign [--config <path>] [--stdout] [--once]
//! ```
//!
//! - `--config <path>`: settings file (default `sign-config.toml`)
//! - `--stdout`: draw frames in the terminal instead of the headless panel
//! - `--once`: fetch one board, show one frame and exit
//!
//! The process exits with an error when the connectivity self-test fails, so
//! the service supervisor can restart the device.

use anyhow::{bail, Context};
use departure_sign_lib::{
    clock::SyncedClock,
    config::{self, Config},
    connectivity::{Reachability, TcpProbe},
    departures::HttpDepartureSource,
    frame::{HeadlessPanel, Panel, TerminalPanel},
    renderer::SignRenderer,
    scheduler::{Coordinator, ScheduleSettings},
};
use log::{error, info};
use std::env;
use std::path::PathBuf;

/// Command line options.
#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: PathBuf,
    stdout: bool,
    once: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut parsed = Args {
        config: PathBuf::from(config::DEFAULT_PATH),
        stdout: false,
        once: false,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => parsed.config = PathBuf::from(path),
                None => bail!("--config needs a path"),
            },
            "--stdout" => parsed.stdout = true,
            "--once" => parsed.once = true,
            other => bail!("unknown argument {other:?}"),
        }
    }
    Ok(parsed)
}

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .filter_module("rustls", log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    init_logging();

    let args = parse_args(env::args().skip(1))?;
    let config = Config::load_from_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    // One thread: the fetch, render and night loops cooperate on it.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if args.stdout {
        runtime.block_on(run(TerminalPanel::stdout(), &config, args.once))
    } else {
        runtime.block_on(run(HeadlessPanel::default(), &config, args.once))
    }
}

async fn run<P: Panel>(panel: P, config: &Config, once: bool) -> anyhow::Result<()> {
    let probe = TcpProbe::new(config.network.probe_host.clone(), config.probe_timeout());
    probe.probe().await?;
    info!("Connected to internet via {}", probe.host());

    let source = HttpDepartureSource::new(&config.api, &config.filter)
        .context("building HTTP client")?;
    info!("Fetching departures from {}", source.url());

    let geometry = config.geometry();
    let settings = ScheduleSettings {
        countdown: config.countdown_settings(geometry.row_capacity()),
        night: config.night_window()?,
        utc_offset_hours: config.night.utc_offset_hours,
        probe_after_failures: config.network.probe_after_failures,
    };
    let renderer = SignRenderer::new(geometry, panel);
    let mut coordinator = Coordinator::new(source, SyncedClock::new(), renderer, probe, settings);

    if once {
        let count = coordinator.run_once().await?;
        info!("Showed {count} departures");
        return Ok(());
    }

    match coordinator.run().await {
        Ok(never) => match never {},
        Err(loss) => {
            error!("No Internet, restarting: {loss}");
            Err(loss.into())
        }
    }
}
