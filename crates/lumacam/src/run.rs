use std::path::Path;

use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use engine::{ControlEvent, HostBindings, IntervalClock, Session, SessionConfig, StageSettings};
use kernels::FrameBuffer;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::pattern::OrbitingDiscSource;
use crate::sink::{BackendFlip, HeadlessSink, LogReadout, SharedFrameStore};

pub fn run(args: Cli) -> Result<()> {
    let settings = StageSettings {
        light_level: args.light_level,
        highlight: args.highlight,
        matrix: args.matrix,
    };
    let config = SessionConfig {
        resolution: args.size,
        backend: args.backend,
        settings,
        frame_limit: Some(args.frames),
    };

    let (sender, receiver) = unbounded();
    if args.no_filter {
        sender
            .send(ControlEvent::SetFilterEnabled(false))
            .context("control channel closed before startup")?;
    }
    let flip = args
        .flip_backend_after
        .map(|after| BackendFlip::new(after, args.backend.other(), sender.clone()));

    let store = SharedFrameStore::new();
    let bindings = HostBindings {
        source: Box::new(OrbitingDiscSource::new(
            args.size,
            args.seed,
            args.warmup_frames,
        )),
        sink: Box::new(HeadlessSink::new(store.clone(), flip)),
        readout: Box::new(LogReadout::new()),
    };
    let clock = Box::new(IntervalClock::from_hz(args.refresh_hz));

    tracing::info!(
        resolution = %args.size,
        backend = %args.backend,
        frames = args.frames,
        "starting headless session"
    );
    let mut session =
        Session::new(config, bindings, clock, receiver).context("failed to build the session")?;
    let stats = session.run();
    tracing::info!(
        frames = stats.frames_presented,
        skipped = stats.skipped_ticks,
        switches = stats.backend_switches,
        "session complete"
    );

    if let Some(path) = args.export_last.as_ref() {
        let frame = store
            .take_last()
            .context("no frame was presented, nothing to export")?;
        export_png(&frame, path)?;
        tracing::info!(path = %path.display(), "exported last frame");
    }

    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn export_png(frame: &FrameBuffer, path: &Path) -> Result<()> {
    let resolution = frame.resolution();
    let image = image::RgbaImage::from_raw(resolution.width, resolution.height, frame.to_rgba8())
        .context("frame bytes do not match its resolution")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
