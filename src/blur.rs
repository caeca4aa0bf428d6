//! Separable à-trous B-spline blur, the wavelet decomposition kernel.

use rayon::prelude::*;

/// 1-D binomial B-spline filter.
pub const BSPLINE_KERNEL: [f32; 5] = [
    1.0 / 16.0,
    4.0 / 16.0,
    6.0 / 16.0,
    4.0 / 16.0,
    1.0 / 16.0,
];

/// Footprint of [`BSPLINE_KERNEL`].
pub const BSPLINE_FSIZE: usize = 5;

const CHANNELS: usize = 4;

/// Horizontal pass. Taps are spread `mult` pixels apart (à-trous
/// dilation) and their indices clamped at the image borders. Channels
/// 0..3 are filtered, channel 3 is copied through.
pub fn blur_horizontal(input: &[f32], output: &mut [f32], width: usize, height: usize, mult: usize) {
    debug_assert_eq!(input.len(), width * height * CHANNELS);
    debug_assert_eq!(output.len(), input.len());

    output
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &input[y * width * CHANNELS..(y + 1) * width * CHANNELS];
            for x in 0..width {
                let mut acc = [0.0f32; 3];
                for (i, weight) in BSPLINE_KERNEL.iter().enumerate() {
                    let offset = (i as isize - 2) * mult as isize;
                    let tap = (x as isize + offset).clamp(0, width as isize - 1) as usize;
                    for (c, value) in acc.iter_mut().enumerate() {
                        *value += weight * row_in[tap * CHANNELS + c];
                    }
                }
                let o = x * CHANNELS;
                row_out[o] = acc[0];
                row_out[o + 1] = acc[1];
                row_out[o + 2] = acc[2];
                row_out[o + 3] = row_in[o + 3];
            }
        });
}

/// Vertical pass, same clamping and dilation as [`blur_horizontal`].
/// Output rows are disjoint, so rows parallelise freely.
pub fn blur_vertical(input: &[f32], output: &mut [f32], width: usize, height: usize, mult: usize) {
    debug_assert_eq!(input.len(), width * height * CHANNELS);
    debug_assert_eq!(output.len(), input.len());

    output
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, row_out)| {
            for x in 0..width {
                let mut acc = [0.0f32; 3];
                for (i, weight) in BSPLINE_KERNEL.iter().enumerate() {
                    let offset = (i as isize - 2) * mult as isize;
                    let tap = (y as isize + offset).clamp(0, height as isize - 1) as usize;
                    let idx = (tap * width + x) * CHANNELS;
                    for (c, value) in acc.iter_mut().enumerate() {
                        *value += weight * input[idx + c];
                    }
                }
                let o = x * CHANNELS;
                row_out[o] = acc[0];
                row_out[o + 1] = acc[1];
                row_out[o + 2] = acc[2];
                row_out[o + 3] = input[(y * width + x) * CHANNELS + 3];
            }
        });
}

/// Full separable blur at dilation `mult = 2^s`: horizontal into `temp`,
/// then vertical into `output`.
pub fn blur_2d_bspline(
    input: &[f32],
    output: &mut [f32],
    temp: &mut [f32],
    width: usize,
    height: usize,
    mult: usize,
) {
    blur_horizontal(input, temp, width, height, mult);
    blur_vertical(temp, output, width, height, mult);
}
