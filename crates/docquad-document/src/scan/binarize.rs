// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization: turn a blurred intensity image into a foreground map
// (255 = foreground, 0 = background) ready for contour extraction.

use docquad_core::config::Binarization;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::edges::canny;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use tracing::debug;

type IntegralImage = ImageBuffer<Luma<u64>, Vec<u64>>;

/// Binarize `gray` with the configured method.
pub fn binarize(gray: &GrayImage, method: Binarization) -> GrayImage {
    match method {
        Binarization::Otsu => {
            let level = otsu_level(gray);
            debug!(level, "Otsu threshold computed");
            threshold_above(gray, level)
        }
        Binarization::Adaptive {
            block_radius,
            offset,
        } => adaptive_threshold(gray, block_radius, offset),
        Binarization::Canny { low, high } => canny(gray, low, high),
    }
}

/// Pixels strictly brighter than `level` become foreground.
pub fn threshold_above(gray: &GrayImage, level: u8) -> GrayImage {
    threshold(gray, level, ThresholdType::Binary)
}

/// Local-mean threshold.
///
/// A pixel is foreground when it is brighter than the mean of its
/// `(2 * block_radius + 1)^2` neighbourhood by more than `offset`. Uniform
/// regions (bright or dark) stay background, so a bright document on a dark
/// table shows up as a ring just inside its edges.
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let sums: IntegralImage = integral_image(gray);
    let offset = f64::from(offset);

    let output = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = f64::from(gray.get_pixel(x, y).0[0]);
        if value > window_mean(&sums, gray.dimensions(), x, y, block_radius) + offset {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    debug!(block_radius, offset, "Adaptive binarization complete");
    output
}

/// Spread between the darkest and brightest pixel.
pub fn intensity_range(gray: &GrayImage) -> u8 {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    max.saturating_sub(min)
}

/// Mean of the window of `radius` around `(x, y)`, cropped to the image.
fn window_mean(sums: &IntegralImage, (width, height): (u32, u32), x: u32, y: u32, radius: u32) -> f64 {
    let left = x.saturating_sub(radius);
    let top = y.saturating_sub(radius);
    let right = x.saturating_add(radius).min(width - 1);
    let bottom = y.saturating_add(radius).min(height - 1);

    let [sum] = sum_image_pixels(sums, left, top, right, bottom);
    let count = u64::from(right - left + 1) * u64::from(bottom - top + 1);
    sum as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(width: u32, height: u32, dark: u8, bright: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Luma([dark]) } else { Luma([bright]) }
        })
    }

    #[test]
    fn otsu_splits_two_tone_image() {
        let img = two_tone(40, 10, 30, 220);
        let t = otsu_level(&img);
        assert!((30..220).contains(&t), "threshold {t}");
        let bin = threshold_above(&img, t);
        assert_eq!(bin.get_pixel(0, 0).0[0], 0);
        assert_eq!(bin.get_pixel(39, 9).0[0], 255);
    }

    #[test]
    fn intensity_range_of_uniform_image_is_zero() {
        let img = GrayImage::from_pixel(8, 8, Luma([97]));
        assert_eq!(intensity_range(&img), 0);
        assert_eq!(intensity_range(&two_tone(8, 8, 10, 250)), 240);
    }

    #[test]
    fn adaptive_marks_only_the_bright_side_of_edges() {
        let mut img = GrayImage::from_pixel(60, 60, Luma([0]));
        for y in 15..45 {
            for x in 15..45 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let bin = adaptive_threshold(&img, 4, 10);
        // Just inside the edge: brighter than its neighbourhood.
        assert_eq!(bin.get_pixel(15, 30).0[0], 255);
        // Centre of the bright square and the dark table stay background.
        assert_eq!(bin.get_pixel(30, 30).0[0], 0);
        assert_eq!(bin.get_pixel(2, 2).0[0], 0);
        assert_eq!(bin.get_pixel(14, 30).0[0], 0);
    }

    #[test]
    fn window_mean_is_cropped_at_borders() {
        let img = GrayImage::from_fn(5, 5, |x, _| Luma([if x == 0 { 10 } else { 100 }]));
        let sums: IntegralImage = integral_image(&img);
        // The corner window covers columns 0..=1 only.
        assert_eq!(window_mean(&sums, (5, 5), 0, 0, 1), 55.0);
        assert_eq!(window_mean(&sums, (5, 5), 4, 4, 10), (10.0 + 4.0 * 100.0) / 5.0);
    }
}
