use filmic_rgb::blur::blur_2d_bspline;
use filmic_rgb::mask::{mask_clipped_pixels, needs_reconstruction};
use filmic_rgb::params::FilmicParams;
use filmic_rgb::processor::{process_image, PipelinePiece, Roi};
use filmic_rgb::reconstruct::{reconstruct_highlights, scale_count, ReconstructVariant};
use filmic_rgb::runtime::commit;
use filmic_rgb::WorkProfile;
use image::{Rgba, Rgba32FImage};

#[test]
fn mask_weight_grows_with_the_pixel_norm_and_centres_on_the_threshold() {
    let threshold = 1.0f32;
    let feather = 16.0f32;

    let weight_at = |value: f32| {
        let input = [value, value, value, 1.0f32];
        let mut mask = [0.0f32];
        mask_clipped_pixels(&input, &mut mask, threshold, feather);
        mask[0]
    };

    // strictly increasing in the norm
    let mut previous = weight_at(0.0);
    for i in 1..=60 {
        let weight = weight_at(0.02 * i as f32);
        assert!(weight > previous, "mask not increasing at step {i}");
        previous = weight;
    }

    // half weight where the Euclidean norm hits the threshold
    let at_threshold = weight_at(threshold / 3.0f32.sqrt());
    assert!((at_threshold - 0.5).abs() < 1e-4);
}

#[test]
fn fully_clipped_white_frame_triggers_reconstruction() {
    let mut params = FilmicParams::default();
    params.reconstruct_threshold = 0.0;
    let data = commit(&params);

    let pixels = 32 * 32;
    let input: Vec<f32> = std::iter::repeat([4.0f32, 4.0, 4.0, 1.0])
        .take(pixels)
        .flatten()
        .collect();
    let mut mask = vec![0.0f32; pixels];

    let clipped = mask_clipped_pixels(
        &input,
        &mut mask,
        data.reconstruct_threshold,
        data.reconstruct_feather,
    );
    assert_eq!(clipped, pixels);
    assert!(needs_reconstruction(clipped));
    assert!(mask.iter().all(|&weight| weight >= 0.95));
}

#[test]
fn a_handful_of_clipped_pixels_is_not_worth_a_reconstruction() {
    assert!(!needs_reconstruction(0));
    assert!(!needs_reconstruction(9));
    assert!(needs_reconstruction(10));
}

#[test]
fn wavelet_decomposition_conserves_energy() {
    let width = 64usize;
    let height = 64usize;

    // smooth gradients with channel-dependent structure
    let mut input = vec![0.0f32; width * height * 4];
    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) * 4;
            let fx = x as f32 / 63.0;
            let fy = y as f32 / 63.0;
            input[i] = 0.1 + 0.8 * fx;
            input[i + 1] = 0.1 + 0.8 * fy;
            input[i + 2] = 0.2 + 0.5 * fx * fy;
            input[i + 3] = 1.0;
        }
    }

    let scales = 3;
    let mut residual = input.clone();
    let mut lf = vec![0.0f32; input.len()];
    let mut temp = vec![0.0f32; input.len()];
    let mut accumulated = vec![0.0f32; input.len()];

    for s in 0..scales {
        blur_2d_bspline(&residual, &mut lf, &mut temp, width, height, 1 << s);
        for i in 0..input.len() {
            accumulated[i] += residual[i] - lf[i];
        }
        residual.copy_from_slice(&lf);
    }

    // the high-frequency bands plus the coarsest residual rebuild the input
    for i in 0..input.len() {
        let rebuilt = accumulated[i] + residual[i];
        assert!((rebuilt - input[i]).abs() < 1e-3);
    }
}

#[test]
fn lone_clipped_pixel_is_filled_from_its_neighbourhood() {
    let width = 64usize;
    let height = 64usize;

    // bloom-only synthesis averages the low frequencies into the hole
    let mut params = FilmicParams::default();
    params.reconstruct_bloom_vs_details = -100.0;
    params.reconstruct_grey_vs_color = 100.0;
    let data = commit(&params);

    let mut input = vec![0.0f32; width * height * 4];
    for pixel in input.chunks_mut(4) {
        pixel.copy_from_slice(&[0.5, 0.5, 0.5, 1.0]);
    }
    let centre = (32 * width + 32) * 4;
    input[centre] = 1.0;
    input[centre + 1] = 1.0;
    input[centre + 2] = 1.0;

    let mut mask = vec![0.0f32; width * height];
    mask[32 * width + 32] = 1.0;

    let mut reconstructed = vec![0.0f32; input.len()];
    reconstruct_highlights(
        &input,
        &mask,
        &mut reconstructed,
        ReconstructVariant::Rgb,
        &data,
        width,
        height,
        2,
    )
    .unwrap();

    // the hole lands near its neighbourhood average instead of staying hot
    for c in 0..3 {
        let got = reconstructed[centre + c];
        assert!((got - 0.5).abs() < 0.1, "channel {c} filled with {got}");
        assert!(got < 1.0);
    }

    // valid pixels pass through untouched
    assert!((reconstructed[0] - 0.5).abs() < 1e-6);
    assert!((reconstructed[4 * (width + 1)] - 0.5).abs() < 1e-6);
}

#[test]
fn scale_count_follows_the_zoom_invariant_coverage_rule() {
    let piece = PipelinePiece::full(4000, 6000);

    let full = Roi {
        width: 4000,
        height: 6000,
        scale: 1.0,
    };
    assert_eq!(scale_count(&full, &piece), 9);

    let zoomed_out = Roi {
        width: 400,
        height: 600,
        scale: 0.1,
    };
    assert_eq!(scale_count(&zoomed_out, &piece), 5);

    // tiny previews still decompose at least once
    let thumbnail = Roi {
        width: 4,
        height: 6,
        scale: 0.001,
    };
    assert_eq!(scale_count(&thumbnail, &piece), 1);
}

#[test]
fn clipped_frame_reconstructs_and_tonemaps_cleanly() {
    let mut params = FilmicParams::default();
    params.reconstruct_threshold = 0.0;
    params.high_quality_reconstruction = true;

    let mut input = Rgba32FImage::from_pixel(48, 48, Rgba([0.4, 0.35, 0.3, 1.0]));
    for y in 16..32 {
        for x in 16..32 {
            input.put_pixel(x, y, Rgba([6.0, 5.5, 6.0, 1.0]));
        }
    }

    let output = process_image(&input, &params, Some(&WorkProfile::rec709())).unwrap();
    for pixel in output.pixels() {
        for c in 0..3 {
            assert!(pixel[c].is_finite());
            assert!((0.0..=1.0).contains(&pixel[c]));
        }
    }
}
