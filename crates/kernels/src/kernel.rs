use crate::buffer::{FrameBuffer, Rgba};

/// 3x3 Gaussian-style blur; the weights sum to one so uniform regions keep
/// their brightness.
pub const BLUR_3X3: [f32; 9] = [
    0.0625, 0.125, 0.0625, //
    0.125, 0.25, 0.125, //
    0.0625, 0.125, 0.0625,
];

/// 3x3 edge-detection matrix; the weights sum to zero so flat regions go dark.
pub const OUTLINE_3X3: [f32; 9] = [
    -1.0, -1.0, -1.0, //
    -1.0, 8.0, -1.0, //
    -1.0, -1.0, -1.0,
];

/// Parameter bag bound once per frame and shared by every kernel evaluation
/// in that frame. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    /// When false every kernel copies its input sample through unchanged.
    pub filter_enabled: bool,
    /// Brightness cutoff for [`PixelKernel::LightThreshold`]; equality counts
    /// as lit.
    pub light_level: f32,
    /// Colour painted by [`PixelKernel::ColorReplace`] over non-black pixels.
    pub replace_color: [f32; 3],
    /// Weights for [`PixelKernel::Convolve3x3`], rows ordered bottom-up.
    pub matrix: [f32; 9],
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            filter_enabled: true,
            light_level: 0.1,
            replace_color: [1.0, 0.0, 0.0],
            matrix: BLUR_3X3,
        }
    }
}

/// The per-pixel transforms the pipeline can dispatch.
///
/// Each variant is a pure function of the input buffer, one coordinate, and
/// the frame's [`KernelParams`]; evaluation never touches neighbouring output
/// pixels, which is what makes row-parallel dispatch safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelKernel {
    /// Replaces the colour channels with their average.
    Greyscale,
    /// Maps each pixel to pure white or pure black around a brightness cutoff.
    LightThreshold,
    /// Paints every non-black pixel with a fixed colour.
    ColorReplace,
    /// Weights the 3x3 neighbourhood of interior pixels by a matrix.
    Convolve3x3,
}

impl PixelKernel {
    /// Evaluates the kernel at `(x, y)` of `input`.
    ///
    /// The coordinate must lie inside the buffer. With the filter disabled the
    /// input sample comes back untouched, alpha included.
    pub fn evaluate(self, input: &FrameBuffer, x: u32, y: u32, params: &KernelParams) -> Rgba {
        let sample = input.get(x, y);
        if !params.filter_enabled {
            return sample;
        }

        match self {
            PixelKernel::Greyscale => {
                let avg = sample.brightness();
                Rgba::new(avg, avg, avg, 1.0)
            }
            PixelKernel::LightThreshold => {
                if sample.brightness() < params.light_level {
                    Rgba::new(0.0, 0.0, 0.0, 1.0)
                } else {
                    Rgba::new(1.0, 1.0, 1.0, 1.0)
                }
            }
            PixelKernel::ColorReplace => {
                if sample.r > 0.0 || sample.g > 0.0 || sample.b > 0.0 {
                    let [r, g, b] = params.replace_color;
                    Rgba::new(r, g, b, 1.0)
                } else {
                    sample
                }
            }
            PixelKernel::Convolve3x3 => convolve(input, x, y, sample, &params.matrix),
        }
    }
}

/// Applies the 3x3 matrix at interior coordinates; everything else passes
/// through.
///
/// Interior excludes one pixel on the low edges and two on the high edges, so
/// the untouched border is asymmetric. Matrix rows map to buffer rows `y + 1`,
/// `y`, `y - 1` in that order, each row scanning `x - 1`, `x`, `x + 1`.
fn convolve(input: &FrameBuffer, x: u32, y: u32, sample: Rgba, matrix: &[f32; 9]) -> Rgba {
    let interior = y > 0 && y + 2 < input.height() && x > 0 && x + 2 < input.width();
    if !interior {
        return sample;
    }

    let rows = [y + 1, y, y - 1];
    let columns = [x - 1, x, x + 1];
    let mut sum = [0.0f32; 3];
    for (row_index, &ny) in rows.iter().enumerate() {
        for (column_index, &nx) in columns.iter().enumerate() {
            let weight = matrix[row_index * 3 + column_index];
            let neighbour = input.get(nx, ny);
            sum[0] += neighbour.r * weight;
            sum[1] += neighbour.g * weight;
            sum[2] += neighbour.b * weight;
        }
    }
    Rgba::new(sum[0], sum[1], sum[2], 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Resolution;

    fn single_pixel(sample: Rgba) -> FrameBuffer {
        let mut buffer = FrameBuffer::new(Resolution::new(1, 1));
        buffer.set(0, 0, sample);
        buffer
    }

    /// Matrix with a single unit weight at `index`; convolving with it reads
    /// exactly one neighbour back out.
    fn probe_matrix(index: usize) -> [f32; 9] {
        let mut matrix = [0.0f32; 9];
        matrix[index] = 1.0;
        matrix
    }

    #[test]
    fn disabled_filter_passes_samples_through_unchanged() {
        let sample = Rgba::new(0.3, 0.5, 0.7, 0.25);
        let buffer = single_pixel(sample);
        let params = KernelParams {
            filter_enabled: false,
            ..KernelParams::default()
        };

        for kernel in [
            PixelKernel::Greyscale,
            PixelKernel::LightThreshold,
            PixelKernel::ColorReplace,
            PixelKernel::Convolve3x3,
        ] {
            assert_eq!(kernel.evaluate(&buffer, 0, 0, &params), sample);
        }
    }

    #[test]
    fn greyscale_averages_the_colour_channels() {
        let buffer = single_pixel(Rgba::new(0.25, 0.5, 0.75, 0.125));
        let result = PixelKernel::Greyscale.evaluate(&buffer, 0, 0, &KernelParams::default());
        assert_eq!(result, Rgba::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn threshold_counts_equality_as_lit() {
        let buffer = single_pixel(Rgba::new(0.5, 0.5, 0.5, 1.0));
        let params = KernelParams {
            light_level: 0.5,
            ..KernelParams::default()
        };
        let result = PixelKernel::LightThreshold.evaluate(&buffer, 0, 0, &params);
        assert_eq!(result, Rgba::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn threshold_darkens_below_the_level() {
        let buffer = single_pixel(Rgba::new(0.25, 0.25, 0.25, 0.5));
        let params = KernelParams {
            light_level: 0.5,
            ..KernelParams::default()
        };
        let result = PixelKernel::LightThreshold.evaluate(&buffer, 0, 0, &params);
        assert_eq!(result, Rgba::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn color_replace_leaves_pure_black_alone() {
        let sample = Rgba::new(0.0, 0.0, 0.0, 0.5);
        let buffer = single_pixel(sample);
        let result = PixelKernel::ColorReplace.evaluate(&buffer, 0, 0, &KernelParams::default());
        assert_eq!(result, sample);
    }

    #[test]
    fn color_replace_paints_even_the_faintest_pixel() {
        let buffer = single_pixel(Rgba::new(0.01, 0.0, 0.0, 1.0));
        let result = PixelKernel::ColorReplace.evaluate(&buffer, 0, 0, &KernelParams::default());
        assert_eq!(result, Rgba::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn convolve_reads_the_neighbourhood_in_matrix_order() {
        let mut buffer = FrameBuffer::new(Resolution::new(4, 4));
        for y in 0..4 {
            for x in 0..4 {
                let value = (y * 4 + x) as f32 / 16.0;
                buffer.set(x, y, Rgba::new(value, value, value, 1.0));
            }
        }

        // (1, 1) is the only interior coordinate of a 4x4 buffer.
        let expectations = [
            (0, (0u32, 2u32)), // first matrix row starts at (x - 1, y + 1)
            (4, (1, 1)),       // centre weight reads the pixel itself
            (8, (2, 0)),       // last matrix row ends at (x + 1, y - 1)
        ];
        for (index, (nx, ny)) in expectations {
            let params = KernelParams {
                matrix: probe_matrix(index),
                ..KernelParams::default()
            };
            let result = PixelKernel::Convolve3x3.evaluate(&buffer, 1, 1, &params);
            let neighbour = buffer.get(nx, ny);
            assert_eq!(
                result,
                Rgba::new(neighbour.r, neighbour.g, neighbour.b, 1.0),
                "matrix index {index} should read neighbour ({nx}, {ny})"
            );
        }
    }

    #[test]
    fn convolve_passes_non_interior_coordinates_through() {
        let mut buffer = FrameBuffer::new(Resolution::new(4, 4));
        for y in 0..4 {
            for x in 0..4 {
                buffer.set(x, y, Rgba::new(0.8, 0.1, 0.2, 0.3));
            }
        }

        let params = KernelParams::default();
        for y in 0..4 {
            for x in 0..4 {
                if x == 1 && y == 1 {
                    continue;
                }
                let result = PixelKernel::Convolve3x3.evaluate(&buffer, x, y, &params);
                assert_eq!(result, buffer.get(x, y), "({x}, {y}) is not interior");
            }
        }
    }

    #[test]
    fn blur_preserves_uniform_dyadic_colours_at_interior_pixels() {
        // Dyadic channel values keep every partial sum exact, so the unit-sum
        // blur must reproduce the input bit for bit.
        for value in [0.25f32, 0.5, 0.75, 1.0] {
            let mut buffer = FrameBuffer::new(Resolution::new(5, 5));
            buffer.fill(Rgba::new(value, value, value, 1.0));
            let result = PixelKernel::Convolve3x3.evaluate(&buffer, 1, 1, &KernelParams::default());
            assert_eq!(result, Rgba::new(value, value, value, 1.0));
        }
    }

    #[test]
    fn outline_zeroes_flat_regions() {
        let mut buffer = FrameBuffer::new(Resolution::new(5, 5));
        buffer.fill(Rgba::new(0.5, 0.5, 0.5, 1.0));
        let params = KernelParams {
            matrix: OUTLINE_3X3,
            ..KernelParams::default()
        };
        let result = PixelKernel::Convolve3x3.evaluate(&buffer, 2, 2, &params);
        assert_eq!(result, Rgba::new(0.0, 0.0, 0.0, 1.0));
    }
}
