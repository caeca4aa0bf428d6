//! Derivation of the per-piece runtime data from committed parameters.

use tracing::warn;

use crate::params::{ColorScience, FilmicParams, PreserveColor};
use crate::spline::{compute_spline_with_anchors, FilmicSpline, ToneAnchors};

/// Everything the pixel pipeline needs, derived once per parameter
/// commit and owned immutably for the duration of a `process` call.
#[derive(Debug, Clone, Copy)]
pub struct FilmicRuntime {
    pub spline: FilmicSpline,
    pub white_source: f32,
    pub black_source: f32,
    /// Scene middle grey as a fraction.
    pub grey_source: f32,
    pub dynamic_range: f32,
    pub output_power: f32,
    pub contrast: f32,
    pub sigma_toe: f32,
    pub sigma_shoulder: f32,
    /// Effective desaturation divisor, 1.0 at the neutral slider.
    pub saturation: f32,
    /// Clipping threshold as a scene-referred norm.
    pub reconstruct_threshold: f32,
    /// Sigmoid steepness of the clipping mask.
    pub reconstruct_feather: f32,
    /// 0 = bloom only, 1 = sharp details only.
    pub reconstruct_bloom_vs_details: f32,
    /// 0 = achromatic reconstruction, 1 = full color.
    pub reconstruct_grey_vs_color: f32,
    /// 0 = inpainted structure, 1 = duplicated texture.
    pub reconstruct_structure_vs_texture: f32,
    pub preserve_color: PreserveColor,
    pub version: ColorScience,
    pub high_quality_reconstruction: bool,
}

/// Turns user parameters into runtime data. A degenerate spline system
/// is logged and replaced with the identity curve; the pipeline keeps
/// running.
pub fn commit(p: &FilmicParams) -> FilmicRuntime {
    let anchors = ToneAnchors::from_params(p);
    let spline = match compute_spline_with_anchors(p, &anchors) {
        Some(spline) => spline,
        None => {
            warn!("filmic curve synthesis hit a degenerate system, using the identity curve");
            FilmicSpline::identity()
        }
    };

    // -100..+100 sliders become 0..1 blending weights
    let remap = |v: f32| (v / 100.0 + 1.0) / 2.0;

    FilmicRuntime {
        white_source: anchors.white_source,
        black_source: anchors.black_source,
        grey_source: anchors.grey_source,
        dynamic_range: anchors.dynamic_range,
        output_power: anchors.output_power,
        contrast: anchors.contrast,
        sigma_toe: (spline.latitude_min / 3.0).powi(2),
        sigma_shoulder: ((1.0 - spline.latitude_max) / 3.0).powi(2),
        saturation: 2.0 * p.saturation / 100.0 + 1.0,
        reconstruct_threshold: (anchors.white_source + p.reconstruct_threshold).exp2()
            * anchors.grey_source,
        reconstruct_feather: (12.0 / p.reconstruct_feather).exp2(),
        reconstruct_bloom_vs_details: remap(p.reconstruct_bloom_vs_details),
        reconstruct_grey_vs_color: remap(p.reconstruct_grey_vs_color),
        reconstruct_structure_vs_texture: remap(p.reconstruct_structure_vs_texture),
        preserve_color: p.preserve_color,
        version: p.version,
        high_quality_reconstruction: p.high_quality_reconstruction,
        spline,
    }
}
