//! Session layer: owns the live loop, the frame clock, and the control
//! channel, and turns control events into loop transitions.
//!
//! Backend switches rebuild the loop through the take/rebuild pattern: the
//! old loop is shut down (sink detached, pool released) and its collaborators
//! are rewired into a fresh loop before the next tick runs.

use crossbeam_channel::{Receiver, TryRecvError};
use kernels::Resolution;

use crate::error::EngineError;
use crate::executor::ExecutionBackend;
use crate::host::HostBindings;
use crate::pipeline::{Pipeline, StageSettings};
use crate::run_loop::{RenderLoop, TickOutcome};
use crate::timing::BoxedFrameClock;

/// Commands the embedder can send into a running session. Events are drained
/// once per refresh tick; a disconnected sender leaves the session running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Toggle the stage chain on or off without stopping presentation.
    SetFilterEnabled(bool),
    /// Tear down the current backend and rebuild the loop on the requested
    /// one. Selecting the backend that is already active does nothing.
    SelectBackend(ExecutionBackend),
    /// End the session; the loop is disposed before `run` returns.
    Shutdown,
}

/// Static description of a session. Collaborators and the clock are passed
/// to [`Session::new`] separately.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub resolution: Resolution,
    pub backend: ExecutionBackend,
    pub settings: StageSettings,
    /// Stop after this many presented frames; `None` runs until a
    /// [`ControlEvent::Shutdown`] arrives.
    pub frame_limit: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(1024, 768),
            backend: ExecutionBackend::default(),
            settings: StageSettings::default(),
            frame_limit: None,
        }
    }
}

/// Counters accumulated across every loop a session drives, including
/// rebuilt ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub frames_presented: u64,
    pub skipped_ticks: u64,
    pub backend_switches: u64,
}

pub struct Session {
    config: SessionConfig,
    clock: BoxedFrameClock,
    controls: Receiver<ControlEvent>,
    render_loop: Option<RenderLoop>,
    stats: SessionStats,
}

impl Session {
    /// Builds the first render loop and wires it to the collaborators.
    ///
    /// Fails fast on configuration problems: a source whose frames do not
    /// match the configured resolution, or stage settings that do not
    /// validate. An unavailable accelerated backend is not fatal; the
    /// session falls back to the scalar executor and keeps going.
    pub fn new(
        config: SessionConfig,
        bindings: HostBindings,
        clock: BoxedFrameClock,
        controls: Receiver<ControlEvent>,
    ) -> Result<Self, EngineError> {
        let render_loop = build_loop(&config, config.backend, bindings)?;
        tracing::info!(resolution = %config.resolution, "session ready");

        Ok(Self {
            config,
            clock,
            controls,
            render_loop: Some(render_loop),
            stats: SessionStats::default(),
        })
    }

    /// Drives the loop until a shutdown event arrives or the configured
    /// frame limit is reached. The loop is disposed before this returns, so
    /// the sink always sees its detach.
    pub fn run(&mut self) -> SessionStats {
        loop {
            if let Some(limit) = self.config.frame_limit {
                if self.stats.frames_presented >= limit {
                    break;
                }
            }
            if !self.apply_pending_controls() {
                break;
            }
            let Some(render_loop) = self.render_loop.as_mut() else {
                break;
            };

            let now = self.clock.wait_for_refresh();
            match render_loop.tick(now) {
                TickOutcome::Presented { .. } => self.stats.frames_presented += 1,
                TickOutcome::SkippedNoFrame => self.stats.skipped_ticks += 1,
                TickOutcome::Disposed => break,
            }
        }
        self.dispose();
        tracing::info!(
            frames = self.stats.frames_presented,
            skipped = self.stats.skipped_ticks,
            switches = self.stats.backend_switches,
            "session finished"
        );
        self.stats
    }

    /// Disposes the live loop. Runs automatically at the end of
    /// [`Session::run`]; calling it again is a no-op.
    pub fn dispose(&mut self) {
        if let Some(render_loop) = self.render_loop.as_mut() {
            render_loop.dispose();
        }
    }

    /// Applies every queued control event. Returns `false` when a shutdown
    /// was requested.
    fn apply_pending_controls(&mut self) -> bool {
        loop {
            match self.controls.try_recv() {
                Ok(ControlEvent::SetFilterEnabled(enabled)) => {
                    if let Some(render_loop) = self.render_loop.as_mut() {
                        render_loop.set_filter_enabled(enabled);
                    }
                }
                Ok(ControlEvent::SelectBackend(backend)) => {
                    if let Err(error) = self.select_backend(backend) {
                        tracing::warn!(error = %error, "backend switch failed, stopping");
                    }
                }
                Ok(ControlEvent::Shutdown) => return false,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return true,
            }
        }
    }

    /// Rebuilds the loop on `backend`. The old loop is fully disposed before
    /// the successor is constructed, so at most one backend handle exists at
    /// any moment; the filter toggle survives the rebuild.
    fn select_backend(&mut self, backend: ExecutionBackend) -> Result<(), EngineError> {
        let Some(render_loop) = self.render_loop.take() else {
            return Ok(());
        };
        if render_loop.backend() == Some(backend) {
            self.render_loop = Some(render_loop);
            return Ok(());
        }

        tracing::debug!(%backend, "switching execution backend");
        let filter_enabled = render_loop.filter_enabled();
        let bindings = render_loop.shutdown();
        let mut successor = build_loop(&self.config, backend, bindings)?;
        successor.set_filter_enabled(filter_enabled);
        self.render_loop = Some(successor);
        self.stats.backend_switches += 1;
        Ok(())
    }
}

/// Builds a pipeline on the requested backend and wires a loop around it,
/// dropping to the scalar executor when the accelerated one cannot start.
fn build_loop(
    config: &SessionConfig,
    backend: ExecutionBackend,
    bindings: HostBindings,
) -> Result<RenderLoop, EngineError> {
    let pipeline = match Pipeline::build(backend, config.resolution, config.settings) {
        Ok(pipeline) => pipeline,
        Err(EngineError::BackendUnavailable(error)) => {
            tracing::warn!(error = %error, "accelerated backend unavailable, falling back to scalar");
            Pipeline::build(ExecutionBackend::Scalar, config.resolution, config.settings)?
        }
        Err(error) => return Err(error),
    };
    RenderLoop::new(pipeline, bindings)
}
