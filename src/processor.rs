//! Top-level processing entry points: ROI processing over raw buffers
//! and the full-image convenience wrapper.

use std::fmt;

use image::Rgba32FImage;
use tracing::{debug, error, info, instrument, warn};

use crate::mask;
use crate::math::WorkProfile;
use crate::params::{ColorScience, FilmicParams, PreserveColor};
use crate::reconstruct::{self, ReconstructVariant};
use crate::runtime::{commit, FilmicRuntime};
use crate::tonemap;

const CHANNELS: usize = 4;

/// Region of interest over an interleaved 4-channel f32 buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roi {
    pub width: usize,
    pub height: usize,
    /// Rendering zoom of this region relative to the full image.
    pub scale: f32,
}

/// Zoom context of the pipeline piece owning the buffers, consumed by
/// the wavelet scale count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelinePiece {
    pub channels: usize,
    pub iscale: f32,
    pub buf_width: usize,
    pub buf_height: usize,
}

impl PipelinePiece {
    /// Piece covering one full-resolution image.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            channels: CHANNELS,
            iscale: 1.0,
            buf_width: width,
            buf_height: height,
        }
    }
}

/// Errors surfaced to the host. Soft failures inside the pipeline
/// (scratch allocation, degenerate solver) are logged and absorbed
/// instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilmicError {
    /// The buffers do not carry 4 interleaved channels.
    UnsupportedChannels(usize),
}

impl fmt::Display for FilmicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilmicError::UnsupportedChannels(channels) => write!(
                f,
                "filmic works only on 4-channel interleaved buffers, got {channels} channels"
            ),
        }
    }
}

impl std::error::Error for FilmicError {}

/// Tone-maps `input` into `output` over matching regions of interest.
///
/// Both buffers are 4-channel interleaved f32 of the ROI size; the
/// alpha channel is copied through. Clipped highlights are
/// reconstructed first when enough pixels trip the clipping census.
#[instrument(skip(input, output, data, work_profile))]
pub fn process(
    input: &[f32],
    output: &mut [f32],
    roi_in: &Roi,
    roi_out: &Roi,
    piece: &PipelinePiece,
    data: &FilmicRuntime,
    work_profile: Option<&WorkProfile>,
) -> Result<(), FilmicError> {
    if piece.channels != CHANNELS {
        error!(
            "filmic works only on 4-channel interleaved buffers, got {} channels",
            piece.channels
        );
        return Err(FilmicError::UnsupportedChannels(piece.channels));
    }

    // this stage neither crops nor scales
    assert_eq!(roi_in.width, roi_out.width);
    assert_eq!(roi_in.height, roi_out.height);

    let width = roi_out.width;
    let height = roi_out.height;
    assert_eq!(input.len(), width * height * CHANNELS);
    assert_eq!(output.len(), width * height * CHANNELS);

    let reconstructed = reconstruct_pipeline(input, roi_in, piece, data, work_profile, width, height);
    let source: &[f32] = reconstructed.as_deref().unwrap_or(input);

    match (data.preserve_color, data.version) {
        (PreserveColor::None, ColorScience::V1) => {
            tonemap::filmic_split_v1(source, output, data, work_profile)
        }
        (PreserveColor::None, ColorScience::V2) => {
            tonemap::filmic_split_v2(source, output, data, work_profile)
        }
        (_, ColorScience::V1) => tonemap::filmic_chroma_v1(source, output, data, work_profile),
        (_, ColorScience::V2) => tonemap::filmic_chroma_v2(source, output, data, work_profile),
    }
    Ok(())
}

/// Runs the clipping census and, when warranted, the wavelet
/// reconstruction passes. Returns `None` whenever tone mapping should
/// proceed on the original input.
fn reconstruct_pipeline(
    input: &[f32],
    roi_in: &Roi,
    piece: &PipelinePiece,
    data: &FilmicRuntime,
    work_profile: Option<&WorkProfile>,
    width: usize,
    height: usize,
) -> Option<Vec<f32>> {
    let pixels = width * height;

    let mut clip_mask = match reconstruct::try_buffer(pixels) {
        Ok(buffer) => buffer,
        Err(_) => {
            warn!("filmic could not allocate its clipping mask, skipping highlight reconstruction");
            return None;
        }
    };

    let clipped = mask::mask_clipped_pixels(
        input,
        &mut clip_mask,
        data.reconstruct_threshold,
        data.reconstruct_feather,
    );
    debug!(clipped, "clipping census");
    if !mask::needs_reconstruction(clipped) {
        return None;
    }

    let mut reconstructed = reconstruct::try_buffer(pixels * CHANNELS).ok()?;
    let scales = reconstruct::scale_count(roi_in, piece);
    info!(clipped, scales, "reconstructing clipped highlights");

    reconstruct::reconstruct_highlights(
        input,
        &clip_mask,
        &mut reconstructed,
        ReconstructVariant::Rgb,
        data,
        width,
        height,
        scales,
    )
    .ok()?;

    if data.high_quality_reconstruction {
        // second pass on chromaticity ratios; a failure here keeps the
        // plain RGB reconstruction
        let variant = match data.preserve_color {
            PreserveColor::None => PreserveColor::MaxRgb,
            other => other,
        };
        let ratios_pass = (|| -> Result<(), std::collections::TryReserveError> {
            let mut norms = reconstruct::try_buffer(pixels)?;
            let mut ratios = reconstruct::try_buffer(pixels * CHANNELS)?;
            reconstruct::compute_ratios(&reconstructed, &mut norms, &mut ratios, variant, work_profile);
            reconstruct::reconstruct_highlights(
                &ratios,
                &clip_mask,
                &mut reconstructed,
                ReconstructVariant::Ratios,
                data,
                width,
                height,
                scales,
            )?;
            reconstruct::restore_ratios(&mut reconstructed, &norms);
            Ok(())
        })();
        if ratios_pass.is_err() {
            warn!("high quality reconstruction pass skipped");
        }
    }

    Some(reconstructed)
}

/// Commits `params` and tone-maps a full frame, the way an interactive
/// host drives the pipeline for an export.
#[instrument(skip(input, params, work_profile))]
pub fn process_image(
    input: &Rgba32FImage,
    params: &FilmicParams,
    work_profile: Option<&WorkProfile>,
) -> Result<Rgba32FImage, FilmicError> {
    info!("starting filmic tone mapping");
    let data = commit(params);
    let width = input.width() as usize;
    let height = input.height() as usize;
    let roi = Roi {
        width,
        height,
        scale: 1.0,
    };
    let piece = PipelinePiece::full(width, height);

    let mut output = vec![0.0f32; width * height * CHANNELS];
    process(
        input.as_raw(),
        &mut output,
        &roi,
        &roi,
        &piece,
        &data,
        work_profile,
    )?;

    // dimensions are unchanged, from_raw cannot fail here
    Ok(Rgba32FImage::from_raw(input.width(), input.height(), output).unwrap())
}
