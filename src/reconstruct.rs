//! Multi-scale à-trous wavelet inpainting of clipped highlights.
//!
//! The decomposition splits the image into per-scale low and high
//! frequencies; the high frequencies are blurred into the masked holes
//! (inpainting) and the bands re-synthesised into the clipped regions as
//! an achromatic structure term plus recovered color detail.

use std::collections::TryReserveError;

use rayon::prelude::*;
use tracing::warn;

use crate::blur::{blur_2d_bspline, blur_horizontal, blur_vertical, BSPLINE_FSIZE};
use crate::math::{self, WorkProfile, NORM_MIN};
use crate::params::PreserveColor;
use crate::processor::{PipelinePiece, Roi};
use crate::runtime::FilmicRuntime;

const CHANNELS: usize = 4;

/// Hard cap on the wavelet decomposition depth.
pub const MAX_SCALES: usize = 12;

/// Which detail and synthesis rules a reconstruction pass runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructVariant {
    /// First pass, straight on RGB.
    Rgb,
    /// Second pass on chromaticity ratios (high quality mode).
    Ratios,
}

/// Number of wavelet scales such that the coarsest filter covers a
/// scale-invariant fraction of the image at the current zoom.
pub fn scale_count(roi_in: &Roi, piece: &PipelinePiece) -> usize {
    let zoom = roi_in.scale / piece.iscale;
    let size = (piece.buf_width as f32 * piece.iscale).max(piece.buf_height as f32 * piece.iscale);
    let fsize = BSPLINE_FSIZE as f32;
    let scales = (2.0 * size * zoom / ((fsize - 1.0) * fsize) - 1.0)
        .log2()
        .floor() as isize;
    scales.clamp(1, MAX_SCALES as isize) as usize
}

/// Fallible buffer allocation so an oversized scratch request degrades
/// into a logged warning instead of an abort.
pub(crate) fn try_buffer(len: usize) -> Result<Vec<f32>, TryReserveError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, 0.0);
    Ok(buf)
}

/// Valid pixels pass straight through, weighted by the inverse mask; the
/// wavelet synthesis then accumulates into the clipped remainder.
fn init_reconstruct(input: &[f32], mask: &[f32], reconstructed: &mut [f32]) {
    reconstructed
        .par_chunks_mut(CHANNELS)
        .zip(input.par_chunks(CHANNELS))
        .zip(mask.par_iter())
        .for_each(|((out, pixel), &alpha)| {
            let keep = 1.0 - alpha;
            for c in 0..3 {
                out[c] = pixel[c] * keep;
            }
            out[3] = pixel[3];
        });
}

/// Splits a level into its high frequencies and records the per-pixel
/// texture extremum over the RGB channels. The RGB rules keep the
/// strongest gradient (the sharpest channel is the valid one); the ratio
/// rules keep the weakest, since a clipped ratio goes flat.
fn wavelets_detail_level(
    detail: &[f32],
    lf: &[f32],
    hf: &mut [f32],
    texture: &mut [f32],
    variant: ReconstructVariant,
) {
    hf.par_chunks_mut(CHANNELS)
        .zip(texture.par_iter_mut())
        .enumerate()
        .for_each(|(k, (hf_pix, tex))| {
            let base = k * CHANNELS;
            let mut extremum = 0.0f32;
            for c in 0..3 {
                let value = detail[base + c] - lf[base + c];
                hf_pix[c] = value;
                let replace = match variant {
                    ReconstructVariant::Rgb => value.abs() > extremum.abs(),
                    ReconstructVariant::Ratios => c == 0 || value.abs() < extremum.abs(),
                };
                if replace {
                    extremum = value;
                }
            }
            hf_pix[3] = detail[base + 3];
            *tex = extremum;
        });
}

/// Accumulates one band into the reconstructed image, inside the mask
/// only. The achromatic terms fill holes with structure shared across
/// channels; the color terms bring back chroma on top, weighted by the
/// user mixes.
#[allow(clippy::too_many_arguments)]
fn wavelets_reconstruct(
    reconstructed: &mut [f32],
    hf: &[f32],
    lf: &[f32],
    texture: &[f32],
    mask: &[f32],
    variant: ReconstructVariant,
    data: &FilmicRuntime,
    scales: usize,
) {
    let gamma = data.reconstruct_structure_vs_texture;
    let gamma_comp = 1.0 - gamma;
    let beta = data.reconstruct_grey_vs_color;
    let beta_comp = 1.0 - beta;
    let delta = data.reconstruct_bloom_vs_details;
    let scales_f = scales as f32;

    reconstructed
        .par_chunks_mut(CHANNELS)
        .enumerate()
        .for_each(|(k, out)| {
            let alpha = mask[k];
            if alpha == 0.0 {
                return;
            }
            let base = k * CHANNELS;
            let hf_pix = &hf[base..base + 4];
            let lf_pix = &lf[base..base + 4];

            let grey_texture = gamma * texture[k];
            let grey_details =
                gamma_comp * hf_pix[0].abs().max(hf_pix[1].abs()).max(hf_pix[2].abs());
            let grey_hf = beta_comp * (grey_details + grey_texture);
            let grey_lf = beta_comp
                * match variant {
                    ReconstructVariant::Rgb => lf_pix[0].min(lf_pix[1]).min(lf_pix[2]),
                    ReconstructVariant::Ratios => lf_pix[0].max(lf_pix[1]).max(lf_pix[2]),
                };

            for c in 0..3 {
                let color_lf = beta * lf_pix[c];
                let color_hf = beta * gamma_comp * hf_pix[c];
                out[c] += alpha * (delta * (grey_hf + color_hf) + (grey_lf + color_lf) / scales_f);
            }
        });
}

/// Fills the clipped regions of `input` into `reconstructed`. On
/// allocation failure the partial buffers are dropped, a memory warning
/// is logged and the caller keeps tone-mapping the untouched input.
#[allow(clippy::too_many_arguments)]
pub fn reconstruct_highlights(
    input: &[f32],
    mask: &[f32],
    reconstructed: &mut [f32],
    variant: ReconstructVariant,
    data: &FilmicRuntime,
    width: usize,
    height: usize,
    scales: usize,
) -> Result<(), TryReserveError> {
    let pixels = width * height;
    let alloc = |len: usize| {
        try_buffer(len).map_err(|e| {
            warn!("filmic highlight reconstruction could not allocate its scratch buffers");
            e
        })
    };

    // two LF buffers ping-pong across scales so only a pair stays live
    let mut lf_prev = alloc(pixels * CHANNELS)?;
    let mut lf_cur = alloc(pixels * CHANNELS)?;
    let mut hf = alloc(pixels * CHANNELS)?;
    let mut texture = alloc(pixels)?;
    let mut temp = alloc(pixels * CHANNELS)?;

    init_reconstruct(input, mask, reconstructed);

    for s in 0..scales {
        let mult = 1usize << s;

        {
            let detail: &[f32] = if s == 0 { input } else { &lf_prev };
            blur_2d_bspline(detail, &mut lf_cur, &mut temp, width, height, mult);
            wavelets_detail_level(detail, &lf_cur, &mut hf, &mut texture, variant);
        }

        // interpolate the high frequencies into the masked holes
        blur_horizontal(&hf, &mut temp, width, height, mult);
        blur_vertical(&temp, &mut hf, width, height, mult);

        wavelets_reconstruct(
            reconstructed,
            &hf,
            &lf_cur,
            &texture,
            mask,
            variant,
            data,
            scales,
        );

        std::mem::swap(&mut lf_prev, &mut lf_cur);
    }

    Ok(())
}

/// Chromaticity norms and ratios feeding the high quality second pass.
pub fn compute_ratios(
    input: &[f32],
    norms: &mut [f32],
    ratios: &mut [f32],
    variant: PreserveColor,
    profile: Option<&WorkProfile>,
) {
    ratios
        .par_chunks_mut(CHANNELS)
        .zip(norms.par_iter_mut())
        .zip(input.par_chunks(CHANNELS))
        .for_each(|((ratio, norm), pixel)| {
            let n = math::get_pixel_norm(pixel, variant, profile).max(NORM_MIN);
            *norm = n;
            for c in 0..3 {
                ratio[c] = pixel[c] / n;
            }
            ratio[3] = pixel[3];
        });
}

/// Restores RGB from reconstructed chromaticity ratios.
pub fn restore_ratios(reconstructed: &mut [f32], norms: &[f32]) {
    reconstructed
        .par_chunks_mut(CHANNELS)
        .zip(norms.par_iter())
        .for_each(|(pixel, &norm)| {
            for c in 0..3 {
                pixel[c] *= norm;
            }
        });
}
