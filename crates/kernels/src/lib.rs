//! Per-pixel transform core for the lumacam pipeline.
//!
//! Everything in this crate is pure data and pure functions: [`Rgba`] samples
//! with normalized `[0, 1]` channels, dense row-major [`FrameBuffer`]s, and the
//! [`PixelKernel`] transforms evaluated one coordinate at a time. Execution
//! strategy (parallel vs sequential), stage composition, and pacing all live in
//! the `engine` crate; keeping this layer free of threads and clocks is what
//! lets both backends share one kernel implementation and produce identical
//! pixels.

mod buffer;
mod kernel;

pub use buffer::{BufferError, FrameBuffer, Resolution, Rgba};
pub use kernel::{KernelParams, PixelKernel, BLUR_3X3, OUTLINE_3X3};
