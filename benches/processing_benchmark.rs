use criterion::{criterion_group, criterion_main, Criterion};
use filmic_rgb::params::FilmicParams;
use filmic_rgb::processor::process_image;
use filmic_rgb::runtime::commit;
use filmic_rgb::tonemap::filmic_chroma_v2;
use image::{Rgba, Rgba32FImage};

fn benchmark_processing(c: &mut Criterion) {
    let params = FilmicParams::default();

    // 720p - faster for CI
    let width = 1280u32;
    let height = 720u32;
    let input = Rgba32FImage::from_fn(width, height, |x, y| {
        let fx = x as f32 / width as f32;
        let fy = y as f32 / height as f32;
        Rgba([2.0 * fx, 0.5 + fy, 4.0 * fx * fy, 1.0])
    });

    let mut group = c.benchmark_group("filmic_tone_mapping");
    group.sample_size(10); // Reduced sample size for heavy operations

    group.bench_function("720p_process", |b| {
        b.iter(|| process_image(&input, &params, None))
    });

    let data = commit(&params);
    let raw = input.as_raw().clone();
    let mut output = vec![0.0f32; raw.len()];
    group.bench_function("720p_chroma_v2_tonemap", |b| {
        b.iter(|| filmic_chroma_v2(&raw, &mut output, &data, None))
    });

    group.finish();
}

criterion_group!(benches, benchmark_processing);
criterion_main!(benches);
