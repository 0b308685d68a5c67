// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the imagewhiz-document crate: histogram
// equalisation and a rotate stage through the codec on a synthetic image.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use imagewhiz_core::{MediaFormat, MediaItem, RotateOption};
use imagewhiz_document::{BitmapCodec, ImageCodec, ImageProcessor, RasterOperator};

/// A 256x256 gradient squeezed into the middle of the tonal range.
fn synthetic() -> DynamicImage {
    let img = RgbImage::from_fn(256, 256, |x, y| {
        Rgb([64 + (x / 2) as u8, 64 + (y / 2) as u8, 100])
    });
    DynamicImage::ImageRgb8(img)
}

fn bench_equalize(c: &mut Criterion) {
    let image = synthetic();
    c.bench_function("equalize (256x256)", |b| {
        b.iter(|| {
            let out = ImageProcessor::from_dynamic(black_box(image.clone())).equalize();
            black_box(out.into_dynamic());
        });
    });
}

fn bench_rotate_stage(c: &mut Criterion) {
    let bytes = ImageCodec
        .encode(&synthetic(), MediaFormat::Png, 90)
        .expect("encode fixture");
    let item = MediaItem::new("bench.png", MediaFormat::Png, bytes, 256, 256);
    let op = RasterOperator::RotateFlip {
        option: RotateOption::Rotate90,
        quality: 90,
    };

    c.bench_function("rotate90 png (256x256)", |b| {
        b.iter(|| {
            let outcome = op.apply(black_box(item.clone()), &ImageCodec).expect("apply");
            black_box(outcome.item);
        });
    });
}

criterion_group!(benches, bench_equalize, bench_rotate_stage);
criterion_main!(benches);
