use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use tiltgun::orientation::OrientationClassifier;
use tiltgun::playback::RodioSfx;
use tiltgun::presentation::TerminalPresenter;
use tiltgun::sensor::{LineSensor, ScriptedSensor, SensorSource};
use tiltgun::session::GunSession;
use tiltgun::settings::SettingsStore;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Tilt to fire, tilt back to reload.
///
/// Reads orientation samples (`h`, `v`, or `x y z` accelerometer lines) from a
/// script or stdin and plays the matching sound effects.
#[derive(Debug, Parser)]
#[command(name = "tiltgun", version)]
struct Cli {
    /// Sensor script to replay instead of reading stdin.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Replay the script forever.
    #[arg(long = "loop", requires = "script")]
    looping: bool,

    /// Delay between scripted samples (defaults to the settings value).
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Directory with fire.wav / blocked.wav / reload.wav overrides.
    #[arg(long, value_name = "DIR")]
    sounds: Option<PathBuf>,

    /// Disable audio output.
    #[arg(long)]
    mute: bool,

    /// Settings file (defaults to TILTGUN_SETTINGS_PATH or the XDG config dir).
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Write the evaluation trace as JSON on exit.
    #[arg(long, value_name = "PATH")]
    trace_out: Option<PathBuf>,
}

enum Wake {
    Sample(Option<bool>),
    Frame,
    Shutdown,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let store = cli
        .settings
        .clone()
        .map(SettingsStore::at)
        .unwrap_or_else(SettingsStore::from_env);
    let mut settings = store.load();
    if cli.mute {
        settings.audio.mute_all = true;
    }
    info!(path = %store.path().display(), "settings loaded");

    let audio = if settings.audio.effective_sfx_gain() > 0.0 {
        match RodioSfx::open(&settings.audio, cli.sounds.as_deref()) {
            Ok(sfx) => Some(sfx),
            Err(err) => {
                warn!(error = %err, "audio unavailable, continuing silently");
                None
            }
        }
    } else {
        None
    };

    let presenter = TerminalPresenter::new(io::stdout(), settings.presentation.rotation_tween());
    let mut session = GunSession::new(audio, presenter);

    let classifier = OrientationClassifier::new(settings.sensor.horizontal_threshold);
    let mut sensor: Box<dyn SensorSource> = match cli.script.as_ref() {
        Some(path) => {
            let interval = cli
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| settings.sensor.sample_interval());
            Box::new(
                ScriptedSensor::from_file(path, classifier)
                    .with_context(|| format!("loading sensor script {}", path.display()))?
                    .with_interval(interval)
                    .looping(cli.looping),
            )
        }
        None => Box::new(LineSensor::stdin(classifier)),
    };

    session.resume(sensor.as_mut()).context("starting sensor")?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut frames = tokio::time::interval(FRAME_INTERVAL);

    loop {
        let wake = tokio::select! {
            sample = session.next_sample() => Wake::Sample(sample),
            _ = frames.tick() => Wake::Frame,
            _ = &mut shutdown => Wake::Shutdown,
        };
        match wake {
            Wake::Sample(Some(horizontal)) => {
                session.evaluate(horizontal);
            }
            Wake::Sample(None) => {
                info!("sensor finished");
                break;
            }
            Wake::Frame => {
                session.presenter_mut().tick(FRAME_INTERVAL)?;
            }
            Wake::Shutdown => {
                info!("interrupted");
                break;
            }
        }
    }

    session.pause(sensor.as_mut());

    // Draw the last rotation settled rather than mid-animation.
    session.presenter_mut().tick(settings.presentation.rotation_tween())?;
    session.presenter_mut().finish()?;

    let state = session.state();
    info!(
        evaluations = session.trace().frame(),
        ammo = state.ammo,
        needs_reload = state.needs_reload,
        "session ended"
    );

    if let Some(path) = cli.trace_out.as_ref() {
        session
            .trace()
            .save_json_file(path)
            .with_context(|| format!("writing trace {}", path.display()))?;
        info!(path = %path.display(), "trace written");
    }

    Ok(())
}
