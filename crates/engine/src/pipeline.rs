use kernels::{FrameBuffer, KernelParams, PixelKernel, Resolution, BLUR_3X3};

use crate::error::EngineError;
use crate::executor::{ExecutionBackend, KernelExecutor};

/// Stage constants bound when a pipeline is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSettings {
    /// Brightness cutoff for the lit-object stage.
    pub light_level: f32,
    /// Colour painted over lit regions by the final stage.
    pub highlight: [f32; 3],
    /// Convolution matrix for the middle stage.
    pub matrix: [f32; 9],
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            light_level: 0.1,
            highlight: [1.0, 0.0, 0.0],
            matrix: BLUR_3X3,
        }
    }
}

impl StageSettings {
    /// Checks the settings before a pipeline accepts them.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.light_level) {
            return Err(EngineError::InvalidLightLevel(self.light_level));
        }
        Ok(())
    }
}

/// One link of the chain: a kernel plus the buffer it renders into.
///
/// The output buffer is allocated once at build time and rewritten in full on
/// every frame; it doubles as the read-only input of the next stage.
pub struct PipelineStage {
    kernel: PixelKernel,
    output: FrameBuffer,
}

impl PipelineStage {
    fn new(kernel: PixelKernel, resolution: Resolution) -> Self {
        Self {
            kernel,
            output: FrameBuffer::new(resolution),
        }
    }

    pub fn kernel(&self) -> PixelKernel {
        self.kernel
    }

    /// The stage's most recently rendered output.
    pub fn output(&self) -> &FrameBuffer {
        &self.output
    }
}

/// The fixed three-stage chain: lit-object threshold, 3x3 convolution, colour
/// replace.
///
/// Built once per backend instantiation; switching backends tears the whole
/// pipeline down (releasing the executor's pool) and builds a fresh one.
pub struct Pipeline {
    executor: KernelExecutor,
    settings: StageSettings,
    stages: [PipelineStage; 3],
}

impl Pipeline {
    /// Validates the settings, constructs the executor, and allocates the
    /// per-stage output buffers.
    pub fn build(
        backend: ExecutionBackend,
        resolution: Resolution,
        settings: StageSettings,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        let executor = KernelExecutor::new(backend)?;
        let stages = [
            PipelineStage::new(PixelKernel::LightThreshold, resolution),
            PipelineStage::new(PixelKernel::Convolve3x3, resolution),
            PipelineStage::new(PixelKernel::ColorReplace, resolution),
        ];
        tracing::debug!(backend = %executor.backend(), %resolution, "pipeline built");

        Ok(Self {
            executor,
            settings,
            stages,
        })
    }

    pub fn backend(&self) -> ExecutionBackend {
        self.executor.backend()
    }

    /// Size of every stage buffer in the chain.
    pub fn resolution(&self) -> Resolution {
        self.stages[0].output().resolution()
    }

    pub fn settings(&self) -> StageSettings {
        self.settings
    }

    /// The stages in execution order.
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Runs every stage in order against `video` and returns the final
    /// stage's output.
    ///
    /// Stage `i + 1` reads the fully materialized output of stage `i`; the
    /// first stage reads the supplied video frame. `filter_enabled` is bound
    /// into this frame's parameters only, so a toggle takes effect on the
    /// next call without touching the buffers.
    pub fn run(&mut self, video: &FrameBuffer, filter_enabled: bool) -> &FrameBuffer {
        let params = KernelParams {
            filter_enabled,
            light_level: self.settings.light_level,
            replace_color: self.settings.highlight,
            matrix: self.settings.matrix,
        };

        for index in 0..self.stages.len() {
            let (finished, remaining) = self.stages.split_at_mut(index);
            let stage = &mut remaining[0];
            let input = match finished.last() {
                Some(previous) => &previous.output,
                None => video,
            };
            self.executor
                .dispatch_into(stage.kernel, input, &params, &mut stage.output);
        }

        &self.stages[2].output
    }
}
