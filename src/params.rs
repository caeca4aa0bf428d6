//! User-facing parameters, their persisted schema, and legacy migration.

use serde::{Deserialize, Serialize};

/// Chroma-preservation strategy of the pixel transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreserveColor {
    /// Independent per-channel curves (the "split" pipeline).
    None,
    MaxRgb,
    Luminance,
    PowerNorm,
}

/// Polynomial order of an outer spline segment. The quartic adds a flat
/// first derivative at the curve end; the cubic lets the end run free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    Poly4,
    Poly3,
}

/// Color-science generation. V2 refines the log clamp, the desaturation
/// weighting and the chroma pipeline's gamut handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorScience {
    V1,
    V2,
}

/// Persisted parameter record, schema version 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilmicParams {
    /// Scene-referred middle grey, percent.
    pub grey_point_source: f32,
    /// Black relative exposure, EV below middle grey. Negative.
    pub black_point_source: f32,
    /// White relative exposure, EV above middle grey. Positive.
    pub white_point_source: f32,
    /// Clipping threshold, EV relative to the scene white point.
    pub reconstruct_threshold: f32,
    /// Transition width around the clipping threshold, EV.
    pub reconstruct_feather: f32,
    /// Details at +100, bloom at -100.
    pub reconstruct_bloom_vs_details: f32,
    /// Full color at +100, achromatic reconstruction at -100.
    pub reconstruct_grey_vs_color: f32,
    /// Duplicated texture at +100, inpainted structure at -100.
    pub reconstruct_structure_vs_texture: f32,
    /// Symmetric enlargement of the source range, percent.
    pub security_factor: f32,
    /// Display-referred middle grey target, percent.
    pub grey_point_target: f32,
    pub black_point_target: f32,
    pub white_point_target: f32,
    /// Display transfer exponent ("hardness").
    pub output_power: f32,
    /// Width of the linear latitude, percent of the dynamic range.
    pub latitude: f32,
    /// Slope of the latitude segment.
    pub contrast: f32,
    /// Extreme-luminance saturation, percent offset.
    pub saturation: f32,
    /// Shadows/highlights shift of the latitude along its own slope.
    pub balance: f32,
    pub preserve_color: PreserveColor,
    pub shadows: CurveType,
    pub highlights: CurveType,
    pub version: ColorScience,
    /// Derive `output_power` from the grey placement instead of the
    /// stored value.
    pub auto_hardness: bool,
    /// Use the custom grey points instead of the 18.45 % standard.
    pub custom_grey: bool,
    /// Run a second reconstruction pass on chromaticity ratios.
    pub high_quality_reconstruction: bool,
}

impl Default for FilmicParams {
    fn default() -> Self {
        Self {
            grey_point_source: 18.45,
            black_point_source: -7.5,
            white_point_source: 2.45,
            reconstruct_threshold: 3.0,
            reconstruct_feather: 3.0,
            reconstruct_bloom_vs_details: 100.0,
            reconstruct_grey_vs_color: 100.0,
            reconstruct_structure_vs_texture: 0.0,
            security_factor: 0.0,
            grey_point_target: 18.45,
            black_point_target: 0.0,
            white_point_target: 100.0,
            output_power: 2.2,
            latitude: 33.0,
            contrast: 1.40,
            saturation: 0.0,
            balance: 0.0,
            preserve_color: PreserveColor::PowerNorm,
            shadows: CurveType::Poly4,
            highlights: CurveType::Poly4,
            version: ColorScience::V2,
            auto_hardness: true,
            custom_grey: false,
            high_quality_reconstruction: false,
        }
    }
}

/// Persisted parameter record, schema version 1, from before highlight
/// reconstruction and the per-segment curve controls existed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilmicParamsV1 {
    pub grey_point_source: f32,
    pub black_point_source: f32,
    pub white_point_source: f32,
    pub security_factor: f32,
    pub grey_point_target: f32,
    pub black_point_target: f32,
    pub white_point_target: f32,
    pub output_power: f32,
    pub latitude: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub balance: f32,
    pub preserve_color: PreserveColor,
}

/// Upgrades an on-disk parameter record to the current schema. Returns
/// `None` for version pairs this build cannot migrate.
pub fn migrate(old: &FilmicParamsV1, old_version: u32, new_version: u32) -> Option<FilmicParams> {
    if old_version != 1 || new_version != 2 {
        return None;
    }
    Some(FilmicParams {
        grey_point_source: old.grey_point_source,
        black_point_source: old.black_point_source,
        white_point_source: old.white_point_source,
        // +3 EV over the white point keeps reconstruction disabled for
        // edits made before it existed
        reconstruct_threshold: 3.0,
        reconstruct_feather: 3.0,
        reconstruct_bloom_vs_details: 100.0,
        reconstruct_grey_vs_color: 100.0,
        reconstruct_structure_vs_texture: 0.0,
        security_factor: old.security_factor,
        grey_point_target: old.grey_point_target,
        black_point_target: old.black_point_target,
        white_point_target: old.white_point_target,
        output_power: old.output_power,
        latitude: old.latitude,
        contrast: old.contrast,
        saturation: old.saturation,
        balance: old.balance,
        preserve_color: old.preserve_color,
        shadows: CurveType::Poly4,
        highlights: CurveType::Poly3,
        version: ColorScience::V1,
        auto_hardness: true,
        custom_grey: true,
        high_quality_reconstruction: false,
    })
}
