//! Traits the embedding application implements.
//!
//! The engine never talks to a camera, a window, or a UI directly; it drives
//! these three collaborators and leaves their wiring to the host. The demo
//! binary ships synthetic implementations, tests ship counting stubs.

use kernels::{FrameBuffer, Resolution};

/// Result of polling the frame source for a new video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A fresh frame was written into the capture buffer.
    Captured,
    /// No frame is ready yet; the loop skips this tick and tries again on
    /// the next refresh.
    Pending,
}

/// Upstream producer of video frames (camera, decoder, synthetic pattern).
pub trait FrameSource: Send {
    /// Native size of the frames this source produces. Sessions refuse to
    /// start when it differs from the configured resolution.
    fn resolution(&self) -> Resolution;

    /// Copies the newest frame into `target`, or reports that none is ready.
    ///
    /// `target` always matches [`resolution`](Self::resolution); on
    /// [`FrameStatus::Pending`] its previous contents are left untouched.
    fn capture(&mut self, target: &mut FrameBuffer) -> FrameStatus;
}

/// Downstream consumer of processed frames (surface, window, encoder).
pub trait DisplaySink: Send {
    /// Replaces the currently displayed content with `frame`. The buffer is
    /// only valid for the duration of the call.
    fn present(&mut self, frame: &FrameBuffer);

    /// Releases the display surface. Called once per loop lifetime at
    /// disposal; a detached sink may be handed to a successor loop, whose
    /// first `present` reattaches it.
    fn detach(&mut self);
}

/// Receives the rounded frames-per-second estimate, once per presented frame
/// as soon as a previous frame establishes the measurement window.
pub trait RateReadout: Send {
    fn report(&mut self, fps: u32);
}

/// The collaborator set a session is wired to.
pub struct HostBindings {
    pub source: BoxedFrameSource,
    pub sink: BoxedDisplaySink,
    pub readout: BoxedRateReadout,
}

pub type BoxedFrameSource = Box<dyn FrameSource + Send>;
pub type BoxedDisplaySink = Box<dyn DisplaySink + Send>;
pub type BoxedRateReadout = Box<dyn RateReadout + Send>;
