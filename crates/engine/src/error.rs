use kernels::Resolution;
use thiserror::Error;

/// Failures raised while constructing or reconfiguring the engine.
///
/// All of these surface before any pixel is dispatched; per-tick conditions
/// such as a source with no frame ready are statuses, not errors, and never
/// reach the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("frame source delivers {actual} frames but the session expects {expected}")]
    ResolutionMismatch {
        expected: Resolution,
        actual: Resolution,
    },

    #[error("accelerated backend unavailable: {0}")]
    BackendUnavailable(#[from] rayon::ThreadPoolBuildError),

    #[error("light level {0} is outside the normalized range 0.0..=1.0")]
    InvalidLightLevel(f32),
}
