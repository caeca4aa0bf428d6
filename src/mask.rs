//! Soft clipping mask over the Euclidean pixel norm.

use rayon::prelude::*;

const CHANNELS: usize = 4;

/// Builds the clipped-highlights mask and counts noticeably clipped
/// pixels. The mask is a base-2 sigmoid of `sqrt(R² + G² + B²)` centred
/// on the clipping threshold, with `feather / threshold` setting the
/// transition steepness. The census counts sigmoid arguments below 4,
/// i.e. mask opacities above ~5.88 %.
pub fn mask_clipped_pixels(input: &[f32], mask: &mut [f32], threshold: f32, feather: f32) -> usize {
    debug_assert_eq!(input.len(), mask.len() * CHANNELS);

    let normalize = feather / threshold;

    input
        .par_chunks(CHANNELS)
        .zip(mask.par_iter_mut())
        .map(|(pixel, weight)| {
            let norm =
                (pixel[0] * pixel[0] + pixel[1] * pixel[1] + pixel[2] * pixel[2]).sqrt();
            let argument = -norm * normalize + feather;
            *weight = (1.0 / (1.0 + argument.exp2())).clamp(0.0, 1.0);
            usize::from(argument < 4.0)
        })
        .sum()
}

/// Reconstruction is only worth running past a handful of clipped
/// pixels.
pub fn needs_reconstruction(clipped: usize) -> bool {
    clipped > 9
}
