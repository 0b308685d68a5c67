// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmark for a two-stage pipeline run (rotate, then reformat to
// JPEG) over a small batch, including packaging.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use imagewhiz_core::{
    ItemSelection, MediaFormat, MediaItem, RotateOption, TargetFormat, ToolId, ToolSelection,
    ToolSettings, ToolSettingsMap, ToolkitConfig,
};
use imagewhiz_document::{BitmapCodec, ImageCodec};
use imagewhiz_pipeline::{OutputPackager, PipelineExecutor};

fn batch(count: usize) -> Vec<MediaItem> {
    (0..count)
        .map(|i| {
            let img = RgbImage::from_fn(320, 240, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, i as u8]));
            let bytes = ImageCodec
                .encode(&DynamicImage::ImageRgb8(img), MediaFormat::Png, 90)
                .expect("encode fixture");
            MediaItem::new(format!("frame-{i}.png"), MediaFormat::Png, bytes, 320, 240)
        })
        .collect()
}

fn bench_two_stage_run(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let config = ToolkitConfig::default();
    let codec: Arc<dyn BitmapCodec> = Arc::new(ImageCodec);
    let executor = PipelineExecutor::new(Arc::clone(&codec), &config);
    let packager = OutputPackager::new(codec, config);

    let items = batch(8);
    let order = ToolSelection::of([ToolId::RotateFlip, ToolId::Reformat]);
    let mut settings = ToolSettingsMap::new();
    settings
        .set(ToolSettings::RotateFlip {
            option: RotateOption::Rotate90,
        })
        .expect("settings");
    settings
        .set(ToolSettings::Reformat {
            target: TargetFormat::Jpeg,
        })
        .expect("settings");

    c.bench_function("rotate + jpeg, 8 x 320x240", |b| {
        b.iter(|| {
            let output = runtime
                .block_on(executor.run(black_box(&items), &ItemSelection::all(), &order, &settings))
                .expect("run");
            black_box(packager.package(output).expect("package"));
        });
    });
}

criterion_group!(benches, bench_two_stage_run);
criterion_main!(benches);
