//! Per-pixel tone-mapping variants: split (independent channels) and
//! chroma-preserving (single norm), each in both color-science versions.
//!
//! All four share the same tail: evaluate the spline, clamp to the
//! display range, raise to the output transfer exponent.

use rayon::prelude::*;

use crate::math::{self, WorkProfile, NORM_MIN};
use crate::params::PreserveColor;
use crate::runtime::FilmicRuntime;

const CHANNELS: usize = 4;

/// Independent per-channel curves, color science v1.
pub fn filmic_split_v1(
    input: &[f32],
    output: &mut [f32],
    data: &FilmicRuntime,
    profile: Option<&WorkProfile>,
) {
    output
        .par_chunks_mut(CHANNELS)
        .zip(input.par_chunks(CHANNELS))
        .for_each(|(out, pixel)| {
            let mut temp = [0.0f32; 3];
            for c in 0..3 {
                temp[c] = math::log_tonemapping_v1(
                    pixel[c].max(NORM_MIN),
                    data.grey_source,
                    data.black_source,
                    data.dynamic_range,
                );
            }

            // desaturate on the non-linear parts of the curve
            let lum = math::get_pixel_norm(&temp, PreserveColor::Luminance, profile);
            let desaturation =
                math::filmic_desaturate_v1(lum, data.sigma_toe, data.sigma_shoulder, data.saturation);

            for c in 0..3 {
                let value = math::linear_saturation(temp[c], lum, desaturation);
                out[c] = data
                    .spline
                    .eval(value)
                    .clamp(0.0, 1.0)
                    .powf(data.output_power);
            }
            out[3] = pixel[3];
        });
}

/// Independent per-channel curves, color science v2.
pub fn filmic_split_v2(
    input: &[f32],
    output: &mut [f32],
    data: &FilmicRuntime,
    profile: Option<&WorkProfile>,
) {
    output
        .par_chunks_mut(CHANNELS)
        .zip(input.par_chunks(CHANNELS))
        .for_each(|(out, pixel)| {
            let mut temp = [0.0f32; 3];
            for c in 0..3 {
                temp[c] = math::log_tonemapping_v2(
                    pixel[c].max(NORM_MIN),
                    data.grey_source,
                    data.black_source,
                    data.dynamic_range,
                );
            }

            let lum = math::get_pixel_norm(&temp, PreserveColor::Luminance, profile);
            let desaturation =
                math::filmic_desaturate_v2(lum, data.sigma_toe, data.sigma_shoulder, data.saturation);

            for c in 0..3 {
                let value = math::linear_saturation(temp[c], lum, desaturation);
                out[c] = data
                    .spline
                    .eval(value)
                    .clamp(0.0, 1.0)
                    .powf(data.output_power);
            }
            out[3] = pixel[3];
        });
}

/// Chroma-preserving pipeline, color science v1: the curve is applied to
/// a scalar norm and the RGB ratios are desaturated around it.
pub fn filmic_chroma_v1(
    input: &[f32],
    output: &mut [f32],
    data: &FilmicRuntime,
    profile: Option<&WorkProfile>,
) {
    output
        .par_chunks_mut(CHANNELS)
        .zip(input.par_chunks(CHANNELS))
        .for_each(|(out, pixel)| {
            let mut norm = math::get_pixel_norm(pixel, data.preserve_color, profile).max(NORM_MIN);

            let mut ratios = [0.0f32; 3];
            for c in 0..3 {
                ratios[c] = pixel[c] / norm;
            }

            // a negative channel would corrupt the desaturation weights
            let min_ratio = ratios[0].min(ratios[1]).min(ratios[2]);
            if min_ratio < 0.0 {
                for ratio in &mut ratios {
                    *ratio -= min_ratio;
                }
            }

            norm = math::log_tonemapping_v1(
                norm,
                data.grey_source,
                data.black_source,
                data.dynamic_range,
            );
            let desaturation = math::filmic_desaturate_v1(
                norm,
                data.sigma_toe,
                data.sigma_shoulder,
                data.saturation,
            );

            for ratio in &mut ratios {
                *ratio *= norm;
            }
            let lum = math::get_pixel_norm(&ratios, PreserveColor::Luminance, profile);
            for ratio in &mut ratios {
                *ratio = math::linear_saturation(*ratio, lum, desaturation) / norm;
            }

            norm = data
                .spline
                .eval(norm)
                .clamp(0.0, 1.0)
                .powf(data.output_power);

            for c in 0..3 {
                out[c] = ratios[c] * norm;
            }
            out[3] = pixel[3];
        });
}

/// Chroma-preserving pipeline, color science v2: desaturation pulls the
/// ratios toward white after the curve, and the result is gamut-mapped
/// back under the display white.
pub fn filmic_chroma_v2(
    input: &[f32],
    output: &mut [f32],
    data: &FilmicRuntime,
    profile: Option<&WorkProfile>,
) {
    output
        .par_chunks_mut(CHANNELS)
        .zip(input.par_chunks(CHANNELS))
        .for_each(|(out, pixel)| {
            let mut norm = math::get_pixel_norm(pixel, data.preserve_color, profile).max(NORM_MIN);

            let mut ratios = [0.0f32; 3];
            for c in 0..3 {
                ratios[c] = pixel[c] / norm;
            }

            let min_ratio = ratios[0].min(ratios[1]).min(ratios[2]);
            if min_ratio < 0.0 {
                for ratio in &mut ratios {
                    *ratio -= min_ratio;
                }
            }

            norm = math::log_tonemapping_v2(
                norm,
                data.grey_source,
                data.black_source,
                data.dynamic_range,
            );
            let desaturation = math::filmic_desaturate_v2(
                norm,
                data.sigma_toe,
                data.sigma_shoulder,
                data.saturation,
            );
            norm = data
                .spline
                .eval(norm)
                .clamp(0.0, 1.0)
                .powf(data.output_power);

            // pull the ratios toward white by the desaturation amount
            for ratio in &mut ratios {
                *ratio = (*ratio + (1.0 - *ratio) * (1.0 - desaturation)).max(0.0);
            }

            for c in 0..3 {
                out[c] = ratios[c] * norm;
            }

            // gamut mapping: bleed the loudest channel's overflow back
            // into the ratios, then clamp
            let max_pix = out[0].max(out[1]).max(out[2]);
            if max_pix > 1.0 {
                for c in 0..3 {
                    ratios[c] = (ratios[c] + (1.0 - max_pix)).max(0.0);
                    out[c] = (ratios[c] * norm).clamp(0.0, 1.0);
                }
            }
            out[3] = pixel[3];
        });
}
