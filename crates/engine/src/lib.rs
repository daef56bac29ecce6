//! Execution engine for the lumacam frame pipeline.
//!
//! The crate glues frame capture, the fixed stage chain, and presentation
//! into a paced render loop. The overall flow is:
//!
//! ```text
//!   ControlEvent channel ──▶ Session::run
//!                                │ per refresh tick
//!                                ▼
//!   FrameSource ──▶ RenderLoop::tick ──▶ Pipeline::run ──▶ DisplaySink
//!                        │                    │
//!                        │                    └─▶ KernelExecutor (accelerated | scalar)
//!                        └─▶ FrameRateEstimator ──▶ RateReadout
//! ```
//!
//! [`Session`] owns the live [`RenderLoop`] and rebuilds it whenever the
//! backend selection changes; the old loop is fully disposed first so only
//! one backend handle exists at a time. Both executor paths run the same
//! row-fill routine, so switching backends never changes a single pixel.

mod error;
mod executor;
mod host;
mod pipeline;
mod run_loop;
mod session;
mod timing;

pub use error::EngineError;
pub use executor::{ExecutionBackend, KernelExecutor};
pub use host::{
    BoxedDisplaySink, BoxedFrameSource, BoxedRateReadout, DisplaySink, FrameSource, FrameStatus,
    HostBindings, RateReadout,
};
pub use pipeline::{Pipeline, PipelineStage, StageSettings};
pub use run_loop::{RenderLoop, TickOutcome};
pub use session::{ControlEvent, Session, SessionConfig, SessionStats};
pub use timing::{
    BoxedFrameClock, FrameClock, FrameRateEstimator, IntervalClock, ManualClock,
};
