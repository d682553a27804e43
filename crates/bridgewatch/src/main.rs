//! bridgewatch: drive the jackbridge poll loop from the command line
//!
//! Connects to the audio server, prints what the device looks like, then
//! polls on a fixed interval and logs removed hardware MIDI ports, bypass relay
//! changes and underruns until interrupted.

mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bridgeconf::BridgeConfig;
use clap::{Parser, ValueEnum};
use jackbridge::fake::{FakeMixer, FakeServer};
use jackbridge::{
    AudioServer, Bridge, BypassState, Channel, HardwareSide, MixerBackend, PortDirection,
    PortInfo, PortKind,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-memory server and mixer with a few demo ports
    Fake,
    /// Running JACK server and ALSA bypass mixer
    Jack,
}

/// Watch the audio server and bypass relays
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (replaces ./jackbridge.toml)
    #[arg(short, long, env = "JACKBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "fake")]
    backend: Backend,

    /// Poll interval, overrides [poll] interval_ms
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many polls
    #[arg(long)]
    count: Option<u64>,

    /// Don't open the bypass mixer
    #[arg(long)]
    no_mixer: bool,

    /// Print each health snapshot as a JSON line on stdout
    #[arg(long)]
    json: bool,
}

struct WatchOptions {
    interval: Duration,
    count: Option<u64>,
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = BridgeConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(ms) = cli.interval_ms {
        config.poll.interval_ms = ms;
    }
    if cli.no_mixer {
        config.mixer.enabled = false;
    }

    telemetry::init(&config.telemetry.log_level)?;
    info!("bridgewatch {} starting", env!("CARGO_PKG_VERSION"));

    let options = WatchOptions {
        interval: Duration::from_millis(config.poll.interval_ms.max(1)),
        count: cli.count,
        json: cli.json,
    };

    match cli.backend {
        Backend::Fake => {
            let server = FakeServer::new();
            seed_demo_ports(&server);
            let mixer = FakeMixer::with_switches(&[
                (config.mixer.left_control.as_str(), false),
                (config.mixer.right_control.as_str(), false),
            ]);
            watch(Bridge::new(server, mixer, config), &options).await
        }
        Backend::Jack => watch_hardware(config, &options).await,
    }
}

#[cfg(feature = "hardware")]
async fn watch_hardware(config: BridgeConfig, options: &WatchOptions) -> Result<()> {
    use jackbridge::{AlsaMixer, JackServer};

    watch(Bridge::new(JackServer::new(), AlsaMixer::new(), config), options).await
}

#[cfg(not(feature = "hardware"))]
async fn watch_hardware(_config: BridgeConfig, _options: &WatchOptions) -> Result<()> {
    anyhow::bail!("bridgewatch was built without the `hardware` feature")
}

/// A small Duo-like port layout for the fake server.
fn seed_demo_ports(server: &FakeServer) {
    server.set_sample_rate(48_000.0);
    for (name, direction) in [
        ("system:capture_1", PortDirection::Output),
        ("system:capture_2", PortDirection::Output),
        ("system:playback_1", PortDirection::Input),
        ("system:playback_2", PortDirection::Input),
    ] {
        server.add_port(PortInfo::new(name, PortKind::Audio, direction).physical());
    }
    server.add_port(
        PortInfo::new("system:midi_capture_1", PortKind::Midi, PortDirection::Output).physical(),
    );
    server.add_port(
        PortInfo::new("system:midi_playback_1", PortKind::Midi, PortDirection::Input).physical(),
    );
}

async fn watch<S: AudioServer, M: MixerBackend>(
    mut bridge: Bridge<S, M>,
    options: &WatchOptions,
) -> Result<()> {
    bridge.register_callbacks(
        Some(Box::new(|name: &str, alias: &str| {
            info!(port = name, alias, "hardware MIDI port removed");
        })),
        Some(Box::new(|state: BypassState| {
            info!(left = state.left, right = state.right, "true-bypass changed");
        })),
    );

    match bridge.connect() {
        Ok(()) => log_summary(&mut bridge),
        Err(e) => warn!("{e}, will retry every tick"),
    }

    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut polls = 0u64;
    let mut last_xruns = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Received SIGINT, shutting down");
                break;
            }
        }

        if !bridge.is_connected() {
            match bridge.connect() {
                Ok(()) => log_summary(&mut bridge),
                Err(e) => debug!("reconnect failed: {e}"),
            }
        }

        let snapshot = bridge.poll();
        if options.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else if snapshot.xrun_count != last_xruns {
            info!(
                cpu_load = snapshot.cpu_load,
                xruns = snapshot.xrun_count,
                "xrun count changed"
            );
        } else {
            debug!(cpu_load = snapshot.cpu_load, xruns = snapshot.xrun_count, "poll");
        }
        last_xruns = snapshot.xrun_count;

        polls += 1;
        if options.count.is_some_and(|n| polls >= n) {
            info!(polls, "poll count reached");
            break;
        }
    }

    bridge.disconnect();
    info!("bridgewatch shutdown complete");
    Ok(())
}

fn log_summary<S: AudioServer, M: MixerBackend>(bridge: &mut Bridge<S, M>) {
    info!("sample rate: {}", bridge.sample_rate());

    for (kind, side) in [
        (PortKind::Audio, HardwareSide::Capture),
        (PortKind::Audio, HardwareSide::Playback),
        (PortKind::Midi, HardwareSide::Capture),
        (PortKind::Midi, HardwareSide::Playback),
    ] {
        let ports = bridge
            .hardware_ports(kind, side)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        info!("{kind:?} {side:?} ports: {ports:?}");
    }

    info!(
        input = bridge.has_serial_midi_input(),
        output = bridge.has_serial_midi_output(),
        "serial MIDI"
    );

    if bridge.has_mixer() {
        info!(
            left = bridge.bypass(Channel::Left),
            right = bridge.bypass(Channel::Right),
            "true-bypass"
        );
    } else {
        info!("true-bypass control unavailable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["bridgewatch"]).unwrap();
        assert_eq!(cli.backend, Backend::Fake);
        assert_eq!(cli.interval_ms, None);
        assert!(!cli.no_mixer);
        assert!(!cli.json);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "bridgewatch",
            "--backend",
            "jack",
            "--interval-ms",
            "250",
            "--count",
            "3",
            "--no-mixer",
            "--json",
            "--config",
            "/tmp/bw.toml",
        ])
        .unwrap();

        assert_eq!(cli.backend, Backend::Jack);
        assert_eq!(cli.interval_ms, Some(250));
        assert_eq!(cli.count, Some(3));
        assert!(cli.no_mixer);
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/bw.toml")));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["bridgewatch", "--backend", "pulse"]).is_err());
    }

    #[tokio::test]
    async fn test_watch_stops_after_count() {
        let server = FakeServer::new();
        seed_demo_ports(&server);
        let bridge = Bridge::new(server.clone(), FakeMixer::new(), BridgeConfig::default());
        let options = WatchOptions {
            interval: Duration::from_millis(1),
            count: Some(3),
            json: false,
        };

        watch(bridge, &options).await.unwrap();
        assert_eq!(server.open_count(), 1);
        assert_eq!(server.close_count(), 1);
    }
}
