// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for docquad-document: boundary detection and
// perspective rectification on a synthetic page photo.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use docquad_core::config::{DetectorConfig, RectifierConfig};
use docquad_core::{CornerSet, Point};
use docquad_document::{BoundaryDetector, PerspectiveRectifier};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 640x480 dark table with a bright page from (120, 80) to (520, 400).
fn synthetic_page() -> DynamicImage {
    let (width, height) = (640u32, 480u32);
    let mut img = GrayImage::from_pixel(width, height, Luma([30u8]));
    for y in 80..400 {
        for x in 120..520 {
            img.put_pixel(x, y, Luma([240u8]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let page = synthetic_page();
    let detector = BoundaryDetector::new(DetectorConfig::default());

    c.bench_function("detect (640x480, otsu)", |b| {
        b.iter(|| black_box(detector.detect(black_box(&page))));
    });
}

/// A skewed quadrilateral, so the homography is non-trivial.
fn bench_rectification(c: &mut Criterion) {
    let page = synthetic_page();
    let rectifier = PerspectiveRectifier::new(RectifierConfig::default());
    let corners = CornerSet::new(
        Point::new(130.0, 90.0),
        Point::new(510.0, 70.0),
        Point::new(530.0, 410.0),
        Point::new(110.0, 390.0),
    );

    c.bench_function("rectify (skewed page)", |b| {
        b.iter(|| black_box(rectifier.rectify(black_box(&page), &corners)));
    });
}

criterion_group!(benches, bench_detection, bench_rectification);
criterion_main!(benches);
