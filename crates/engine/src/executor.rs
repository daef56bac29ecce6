use std::fmt;

use kernels::{FrameBuffer, KernelParams, PixelKernel, Rgba};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::EngineError;

/// Which execution strategy runs the per-pixel kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionBackend {
    /// Row-parallel dispatch across a dedicated worker pool.
    #[default]
    Accelerated,
    /// Sequential row-major dispatch on the calling thread.
    Scalar,
}

impl ExecutionBackend {
    /// The backend this one switches to.
    pub fn other(self) -> Self {
        match self {
            ExecutionBackend::Accelerated => ExecutionBackend::Scalar,
            ExecutionBackend::Scalar => ExecutionBackend::Accelerated,
        }
    }
}

impl fmt::Display for ExecutionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionBackend::Accelerated => f.write_str("accelerated"),
            ExecutionBackend::Scalar => f.write_str("scalar"),
        }
    }
}

/// Runs a pixel kernel over every coordinate of an output buffer.
///
/// The accelerated executor owns its worker pool; dropping the executor
/// releases the pool, which is how a disposed pipeline gives its backend
/// handle back. Both paths hand rows to [`fill_row`], so the produced pixels
/// are identical whichever backend is active.
pub struct KernelExecutor {
    backend: ExecutionBackend,
    pool: Option<ThreadPool>,
}

impl KernelExecutor {
    /// Builds an executor for the requested backend.
    ///
    /// Accelerated construction fails when no worker threads can be spawned;
    /// callers decide whether to surface that or fall back to scalar.
    pub fn new(backend: ExecutionBackend) -> Result<Self, EngineError> {
        let pool = match backend {
            ExecutionBackend::Accelerated => {
                let pool = ThreadPoolBuilder::new().build()?;
                tracing::debug!(
                    threads = pool.current_num_threads(),
                    "accelerated executor ready"
                );
                Some(pool)
            }
            ExecutionBackend::Scalar => None,
        };

        Ok(Self { backend, pool })
    }

    pub fn backend(&self) -> ExecutionBackend {
        self.backend
    }

    /// Evaluates `kernel` at every coordinate of `input`, writing the results
    /// into `output`. Both buffers must share a resolution.
    ///
    /// The parallel path splits the output by row and joins before returning,
    /// so the caller never observes a partially written buffer.
    pub fn dispatch_into(
        &self,
        kernel: PixelKernel,
        input: &FrameBuffer,
        params: &KernelParams,
        output: &mut FrameBuffer,
    ) {
        debug_assert_eq!(
            input.resolution(),
            output.resolution(),
            "dispatch buffers must share a resolution"
        );

        let width = input.width() as usize;
        if width == 0 {
            return;
        }

        match &self.pool {
            Some(pool) => pool.install(|| {
                output
                    .pixels_mut()
                    .par_chunks_mut(width)
                    .enumerate()
                    .for_each(|(y, row)| fill_row(kernel, input, y as u32, row, params));
            }),
            None => {
                output
                    .pixels_mut()
                    .chunks_mut(width)
                    .enumerate()
                    .for_each(|(y, row)| fill_row(kernel, input, y as u32, row, params));
            }
        }
    }

    /// Convenience wrapper that allocates a fresh output buffer.
    pub fn dispatch(
        &self,
        kernel: PixelKernel,
        input: &FrameBuffer,
        params: &KernelParams,
    ) -> FrameBuffer {
        let mut output = FrameBuffer::new(input.resolution());
        self.dispatch_into(kernel, input, params, &mut output);
        output
    }
}

/// Evaluates one output row. Shared verbatim by both backends; any change
/// here changes both identically.
fn fill_row(
    kernel: PixelKernel,
    input: &FrameBuffer,
    y: u32,
    row: &mut [Rgba],
    params: &KernelParams,
) {
    for (x, slot) in row.iter_mut().enumerate() {
        *slot = kernel.evaluate(input, x as u32, y, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernels::Resolution;

    /// Deterministic non-uniform test frame; neighbouring pixels differ so
    /// convolution and threshold results vary across the buffer.
    fn checker_gradient(resolution: Resolution) -> FrameBuffer {
        let mut buffer = FrameBuffer::new(resolution);
        for y in 0..resolution.height {
            for x in 0..resolution.width {
                let mix = ((x * 31 + y * 17) % 64) as f32 / 64.0;
                buffer.set(x, y, Rgba::new(mix, 1.0 - mix, mix * 0.5, 1.0));
            }
        }
        buffer
    }

    #[test]
    fn accelerated_matches_scalar_for_every_kernel() {
        let input = checker_gradient(Resolution::new(33, 21));
        let params = KernelParams::default();
        let accelerated = KernelExecutor::new(ExecutionBackend::Accelerated).unwrap();
        let scalar = KernelExecutor::new(ExecutionBackend::Scalar).unwrap();

        for kernel in [
            PixelKernel::Greyscale,
            PixelKernel::LightThreshold,
            PixelKernel::ColorReplace,
            PixelKernel::Convolve3x3,
        ] {
            let fast = accelerated.dispatch(kernel, &input, &params);
            let slow = scalar.dispatch(kernel, &input, &params);
            assert_eq!(fast.pixels(), slow.pixels(), "{kernel:?} diverged");
        }
    }

    #[test]
    fn dispatch_overwrites_every_coordinate() {
        let input = checker_gradient(Resolution::new(7, 5));
        let params = KernelParams {
            filter_enabled: false,
            ..KernelParams::default()
        };
        let executor = KernelExecutor::new(ExecutionBackend::Scalar).unwrap();

        let mut output = FrameBuffer::new(input.resolution());
        output.fill(Rgba::new(9.0, 9.0, 9.0, 9.0));
        executor.dispatch_into(PixelKernel::Greyscale, &input, &params, &mut output);

        // Pass-through mode must have replaced the sentinel everywhere.
        assert_eq!(output.pixels(), input.pixels());
    }

    #[test]
    fn uniform_buffer_at_the_threshold_lights_every_pixel() {
        let mut input = FrameBuffer::new(Resolution::new(6, 4));
        input.fill(Rgba::new(0.5, 0.5, 0.5, 1.0));
        let params = KernelParams {
            light_level: 0.5,
            ..KernelParams::default()
        };
        let executor = KernelExecutor::new(ExecutionBackend::Scalar).unwrap();

        let output = executor.dispatch(PixelKernel::LightThreshold, &input, &params);
        assert!(output
            .pixels()
            .iter()
            .all(|pixel| *pixel == Rgba::new(1.0, 1.0, 1.0, 1.0)));
    }

    #[test]
    fn executor_reports_its_backend() {
        let scalar = KernelExecutor::new(ExecutionBackend::Scalar).unwrap();
        assert_eq!(scalar.backend(), ExecutionBackend::Scalar);
        assert_eq!(scalar.backend().to_string(), "scalar");
    }
}
