use filmic_rgb::params::{ColorScience, FilmicParams, PreserveColor};
use filmic_rgb::processor::{process, process_image, FilmicError, PipelinePiece, Roi};
use filmic_rgb::runtime::commit;
use filmic_rgb::tonemap::{filmic_chroma_v2, filmic_split_v1};
use image::{Rgba, Rgba32FImage};

fn constant_image(width: u32, height: u32, value: [f32; 4]) -> Rgba32FImage {
    Rgba32FImage::from_pixel(width, height, Rgba(value))
}

#[test]
fn middle_grey_lands_on_the_display_grey_target() {
    let params = FilmicParams::default();
    let data = commit(&params);

    // hardness is auto-derived from the grey target and its log placement
    assert!((data.output_power - 5.98).abs() < 0.01);

    // in display space, the grey node sits at 0.1845^(1/hardness)
    let grey_log = data.black_source.abs() / data.dynamic_range;
    let display_grey = 0.1845f32.powf(1.0 / data.output_power);
    assert!((data.spline.eval(grey_log) - display_grey).abs() < 1e-4);

    // end to end, a constant grey frame comes out at the linear grey target
    let input = constant_image(16, 16, [0.1845, 0.1845, 0.1845, 1.0]);
    let output = process_image(&input, &params, None).unwrap();
    let pixel = output.get_pixel(8, 8);
    for c in 0..3 {
        assert!(
            (pixel[c] - 0.1845).abs() < 1e-3,
            "channel {c} came out at {}",
            pixel[c]
        );
    }
}

#[test]
fn split_pipeline_preserves_middle_grey() {
    for version in [ColorScience::V1, ColorScience::V2] {
        let mut params = FilmicParams::default();
        params.preserve_color = PreserveColor::None;
        params.version = version;

        let input = constant_image(8, 8, [0.1845, 0.1845, 0.1845, 1.0]);
        let output = process_image(&input, &params, None).unwrap();
        let pixel = output.get_pixel(4, 4);
        for c in 0..3 {
            assert!((pixel[c] - 0.1845).abs() < 1e-3);
        }
    }
}

#[test]
fn black_input_floors_to_the_display_black_target() {
    for version in [ColorScience::V1, ColorScience::V2] {
        let mut params = FilmicParams::default();
        params.preserve_color = PreserveColor::None;
        params.version = version;

        let input = constant_image(8, 8, [0.0, 0.0, 0.0, 1.0]);
        let output = process_image(&input, &params, None).unwrap();
        let expected = params.black_point_target / 100.0;
        let pixel = output.get_pixel(4, 4);
        for c in 0..3 {
            assert!((pixel[c] - expected).abs() < 1e-4);
        }
    }
}

#[test]
fn chroma_v1_sanitises_negative_channels() {
    let mut params = FilmicParams::default();
    params.preserve_color = PreserveColor::MaxRgb;
    params.version = ColorScience::V1;

    let input = constant_image(8, 8, [-0.1, 0.5, 0.5, 1.0]);
    let output = process_image(&input, &params, None).unwrap();
    let pixel = output.get_pixel(4, 4);
    for c in 0..3 {
        assert!(pixel[c].is_finite());
        assert!(pixel[c] >= 0.0);
    }
    assert!(pixel[0] <= pixel[1]);
    assert!(pixel[0] <= pixel[2]);
}

#[test]
fn chroma_v2_output_stays_inside_the_display_range() {
    let mut params = FilmicParams::default();
    params.preserve_color = PreserveColor::PowerNorm;
    params.version = ColorScience::V2;
    let data = commit(&params);

    // HDR, negative, near-black and clipped samples
    let samples: [[f32; 4]; 6] = [
        [12.0, 0.3, 0.1, 1.0],
        [-0.4, 6.0, 2.0, 1.0],
        [0.02, 0.02, 0.02, 1.0],
        [4.0, 4.0, 4.0, 1.0],
        [0.9, 1.1, 0.2, 1.0],
        [100.0, 0.0, 0.0, 1.0],
    ];
    let input: Vec<f32> = samples.concat();
    let mut output = vec![0.0f32; input.len()];
    filmic_chroma_v2(&input, &mut output, &data, None);

    for pixel in output.chunks(4) {
        for c in 0..3 {
            assert!(pixel[c].is_finite());
            assert!(
                (0.0..=1.0).contains(&pixel[c]),
                "channel {c} escaped the display range: {}",
                pixel[c]
            );
        }
    }
}

#[test]
fn committed_contrast_is_clamped_to_keep_the_latitude_solvable() {
    let mut params = FilmicParams::default();
    params.contrast = 0.5;
    params.auto_hardness = false;
    params.output_power = 2.2;

    let data = commit(&params);
    let grey_log = data.black_source.abs() / data.dynamic_range;
    let grey_display = 0.1845f32.powf(1.0 / 2.2);
    assert!(data.contrast > grey_display / grey_log);
}

#[test]
fn few_clipped_pixels_skip_reconstruction() {
    let params = FilmicParams::default();
    let data = commit(&params);

    let width = 16usize;
    let height = 16usize;
    let mut input = vec![0.0f32; width * height * 4];
    for pixel in input.chunks_mut(4) {
        pixel.copy_from_slice(&[0.2, 0.2, 0.2, 1.0]);
    }
    // a lone clipped pixel stays below the reconstruction census
    input[0] = 50.0;
    input[1] = 50.0;
    input[2] = 50.0;

    let roi = Roi {
        width,
        height,
        scale: 1.0,
    };
    let piece = PipelinePiece::full(width, height);

    let mut with_pipeline = vec![0.0f32; input.len()];
    process(&input, &mut with_pipeline, &roi, &roi, &piece, &data, None).unwrap();

    let mut plain_tonemap = vec![0.0f32; input.len()];
    filmic_chroma_v2(&input, &mut plain_tonemap, &data, None);

    assert_eq!(with_pipeline, plain_tonemap);
}

#[test]
fn non_rgba_buffers_are_rejected() {
    let params = FilmicParams::default();
    let data = commit(&params);

    let input = vec![0.0f32; 4 * 4 * 4];
    let mut output = vec![0.0f32; input.len()];
    let roi = Roi {
        width: 4,
        height: 4,
        scale: 1.0,
    };
    let mut piece = PipelinePiece::full(4, 4);
    piece.channels = 3;

    let result = process(&input, &mut output, &roi, &roi, &piece, &data, None);
    assert_eq!(result, Err(FilmicError::UnsupportedChannels(3)));
}

#[test]
fn split_v1_log_floor_keeps_shadows_finite() {
    let mut params = FilmicParams::default();
    params.preserve_color = PreserveColor::None;
    params.version = ColorScience::V1;
    let data = commit(&params);

    let input = [0.0f32, 1e-9, 0.5, 1.0];
    let mut output = [0.0f32; 4];
    filmic_split_v1(&input, &mut output, &data, None);
    for c in 0..3 {
        assert!(output[c].is_finite());
        assert!(output[c] >= 0.0);
    }
}
