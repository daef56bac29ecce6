//! The frame loop body: capture, process, present.
//!
//! A [`RenderLoop`] owns the stage chain and the host collaborators for one
//! lifetime; the session paces it and feeds it refresh timestamps. Disposal
//! is cooperative: nothing here touches signal handlers or threads, the
//! embedder calls [`RenderLoop::dispose`] (or drops the loop) when it wants
//! the backend torn down.

use std::time::Instant;

use kernels::FrameBuffer;

use crate::error::EngineError;
use crate::executor::ExecutionBackend;
use crate::host::{FrameStatus, HostBindings};
use crate::pipeline::Pipeline;
use crate::timing::FrameRateEstimator;

/// A disposed loop keeps answering queries but never processes another frame.
/// The pipeline lives inside the running variant so that the transition to
/// `Disposed` releases the executor and its thread pool.
enum LoopState {
    Running { pipeline: Pipeline },
    Disposed,
}

/// What a single turn of the loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame went through the stage chain and reached the sink. `fps`
    /// carries the refresh estimate once a previous presentation establishes
    /// the measurement window.
    Presented { fps: Option<u32> },
    /// The source had nothing ready; the tick ended without presenting and
    /// the next estimate covers the widened gap.
    SkippedNoFrame,
    /// The loop has been disposed; ticking it is a no-op.
    Disposed,
}

pub struct RenderLoop {
    state: LoopState,
    bindings: HostBindings,
    estimator: FrameRateEstimator,
    capture: FrameBuffer,
    filter_enabled: bool,
    frames_presented: u64,
}

impl RenderLoop {
    /// Wires a built pipeline to the host collaborators. Fails when the
    /// source produces frames of a different size than the stage buffers.
    pub fn new(pipeline: Pipeline, bindings: HostBindings) -> Result<Self, EngineError> {
        let resolution = pipeline.resolution();
        let source_resolution = bindings.source.resolution();
        if source_resolution != resolution {
            return Err(EngineError::ResolutionMismatch {
                expected: resolution,
                actual: source_resolution,
            });
        }
        tracing::debug!(%resolution, "render loop ready");

        Ok(Self {
            state: LoopState::Running { pipeline },
            bindings,
            estimator: FrameRateEstimator::new(),
            capture: FrameBuffer::new(resolution),
            filter_enabled: true,
            frames_presented: 0,
        })
    }

    /// Runs one turn of the loop at refresh timestamp `now`: pull a frame,
    /// push it through the stage chain and hand the result to the sink. A
    /// source with no frame ready skips the turn without touching the rate
    /// estimator, so the eventual estimate reflects the real gap between
    /// presentations.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let pipeline = match &mut self.state {
            LoopState::Running { pipeline } => pipeline,
            LoopState::Disposed => return TickOutcome::Disposed,
        };

        match self.bindings.source.capture(&mut self.capture) {
            FrameStatus::Captured => {}
            FrameStatus::Pending => {
                tracing::trace!("no frame ready, skipping tick");
                return TickOutcome::SkippedNoFrame;
            }
        }

        let output = pipeline.run(&self.capture, self.filter_enabled);
        self.bindings.sink.present(output);
        self.frames_presented += 1;

        let fps = self.estimator.sample(now).map(|rate| rate.round() as u32);
        if let Some(fps) = fps {
            self.bindings.readout.report(fps);
        }
        TickOutcome::Presented { fps }
    }

    /// Enables or bypasses the stage chain. Bypassed frames still flow from
    /// source to sink unmodified.
    pub fn set_filter_enabled(&mut self, enabled: bool) {
        if self.filter_enabled != enabled {
            tracing::debug!(enabled, "kernel filter toggled");
        }
        self.filter_enabled = enabled;
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    /// Frames handed to the sink over this loop's lifetime.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Backend the stage chain currently executes on, `None` once disposed.
    pub fn backend(&self) -> Option<ExecutionBackend> {
        match &self.state {
            LoopState::Running { pipeline } => Some(pipeline.backend()),
            LoopState::Disposed => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, LoopState::Disposed)
    }

    /// Detaches the sink and releases the pipeline together with its thread
    /// pool. Safe to call any number of times; only the first has an effect.
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.bindings.sink.detach();
        self.state = LoopState::Disposed;
        tracing::debug!(frames = self.frames_presented, "render loop disposed");
    }

    /// Disposes the loop and hands the host collaborators back so a
    /// successor loop can be wired to them.
    pub fn shutdown(mut self) -> HostBindings {
        self.dispose();
        self.bindings
    }
}
