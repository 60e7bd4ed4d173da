use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hsvmask::prelude::*;
use image::{Rgb, RgbImage};

fn synthetic_frame(width: u32, height: u32) -> Frame {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, ((x + y) % 256) as u8])
    })
}

fn bench_pipeline(c: &mut Criterion) {
    let frame = synthetic_frame(640, 360);

    let threshold_only = FramePipeline::new(FilterConfig {
        h_min: 30,
        h_max: 90,
        ..FilterConfig::default()
    });
    c.bench_function("threshold_640x360", |b| {
        b.iter(|| threshold_only.mask_frame(black_box(&frame)))
    });

    let full = FramePipeline::new(FilterConfig {
        clahe: 1,
        close: 3,
        ..FilterConfig::gui_defaults()
    });
    c.bench_function("full_pipeline_640x360", |b| {
        b.iter(|| full.mask_frame(black_box(&frame)))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
