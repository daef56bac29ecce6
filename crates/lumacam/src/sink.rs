use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use engine::{ControlEvent, DisplaySink, ExecutionBackend, RateReadout};
use kernels::FrameBuffer;

/// Last frame the sink saw, shared with the export step that runs after the
/// session finishes.
#[derive(Clone, Default)]
pub struct SharedFrameStore {
    inner: Arc<Mutex<Option<FrameBuffer>>>,
}

impl SharedFrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_last(&self) -> Option<FrameBuffer> {
        self.inner.lock().ok().and_then(|mut slot| slot.take())
    }

    fn store(&self, frame: &FrameBuffer) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(frame.clone());
        }
    }
}

/// Scripted backend switch, requested through the control channel once a
/// fixed number of frames has been presented.
pub struct BackendFlip {
    after: u64,
    to: ExecutionBackend,
    sender: Sender<ControlEvent>,
    sent: bool,
}

impl BackendFlip {
    pub fn new(after: u64, to: ExecutionBackend, sender: Sender<ControlEvent>) -> Self {
        Self {
            after,
            to,
            sender,
            sent: false,
        }
    }
}

/// Records frames instead of putting them on a screen. The presentation
/// counter survives loop rebuilds because the session hands the same sink to
/// the successor loop.
pub struct HeadlessSink {
    store: SharedFrameStore,
    presented: u64,
    flip: Option<BackendFlip>,
}

impl HeadlessSink {
    pub fn new(store: SharedFrameStore, flip: Option<BackendFlip>) -> Self {
        Self {
            store,
            presented: 0,
            flip,
        }
    }
}

impl DisplaySink for HeadlessSink {
    fn present(&mut self, frame: &FrameBuffer) {
        self.presented += 1;
        self.store.store(frame);

        if let Some(flip) = self.flip.as_mut() {
            if self.presented >= flip.after && !flip.sent {
                tracing::info!(backend = %flip.to, "requesting backend flip");
                if flip.sender.send(ControlEvent::SelectBackend(flip.to)).is_err() {
                    tracing::warn!("control channel closed, backend flip dropped");
                }
                flip.sent = true;
            }
        }
    }

    fn detach(&mut self) {
        tracing::debug!(frames = self.presented, "display sink detached");
    }
}

/// Logs the frame-rate estimate about once a second instead of once per
/// frame.
#[derive(Default)]
pub struct LogReadout {
    last_logged: Option<Instant>,
}

impl LogReadout {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateReadout for LogReadout {
    fn report(&mut self, fps: u32) {
        let now = Instant::now();
        let due = self
            .last_logged
            .map_or(true, |last| now.duration_since(last) >= Duration::from_secs(1));
        if due {
            tracing::info!(fps, "estimated frame rate");
            self.last_logged = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;
    use kernels::{Resolution, Rgba};

    use super::*;

    fn frame(fill: Rgba) -> FrameBuffer {
        let mut frame = FrameBuffer::new(Resolution::new(2, 2));
        frame.fill(fill);
        frame
    }

    #[test]
    fn store_hands_out_the_last_frame_once() {
        let store = SharedFrameStore::new();
        let mut sink = HeadlessSink::new(store.clone(), None);

        sink.present(&frame(Rgba::new(0.25, 0.25, 0.25, 1.0)));
        let last = frame(Rgba::new(0.75, 0.5, 0.25, 1.0));
        sink.present(&last);

        assert_eq!(store.take_last(), Some(last));
        assert_eq!(store.take_last(), None);
    }

    #[test]
    fn backend_flip_fires_exactly_once() {
        let (sender, receiver) = unbounded();
        let flip = BackendFlip::new(2, ExecutionBackend::Scalar, sender);
        let mut sink = HeadlessSink::new(SharedFrameStore::new(), Some(flip));
        let white = frame(Rgba::new(1.0, 1.0, 1.0, 1.0));

        sink.present(&white);
        assert!(receiver.try_recv().is_err());
        sink.present(&white);
        assert_eq!(
            receiver.try_recv(),
            Ok(ControlEvent::SelectBackend(ExecutionBackend::Scalar))
        );
        sink.present(&white);
        assert!(receiver.try_recv().is_err());
    }
}
