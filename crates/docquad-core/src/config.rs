// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration, loadable from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// 40 megapixels: large phone photos fit, runaway buffers do not.
pub const DEFAULT_MAX_PIXELS: u64 = 40_000_000;

/// All tunables for detection, rectification, editing, and the live loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detector: DetectorConfig,
    pub rectifier: RectifierConfig,
    pub editor: EditorConfig,
    pub realtime: RealtimeConfig,
}

impl ScanConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values that would make a component misbehave.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if !(d.blur_sigma > 0.0 && d.blur_sigma.is_finite()) {
            return Err(ScanError::invalid("detector.blur_sigma must be positive"));
        }
        if !(d.approx_epsilon_ratio > 0.0 && d.approx_epsilon_ratio < 1.0) {
            return Err(ScanError::invalid(
                "detector.approx_epsilon_ratio must be in (0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&d.min_area_ratio) {
            return Err(ScanError::invalid("detector.min_area_ratio must be in [0, 1)"));
        }
        if let Binarization::Canny { low, high } = d.binarization {
            if !(low > 0.0 && high >= low) {
                return Err(ScanError::invalid(
                    "detector.binarization canny thresholds must satisfy 0 < low <= high",
                ));
            }
        }
        if d.max_pixels == 0 || self.rectifier.max_pixels == 0 || self.realtime.max_frame_pixels == 0
        {
            return Err(ScanError::invalid("max_pixels must be non-zero"));
        }
        let e = &self.editor;
        if !(e.mouse_hit_radius > 0.0 && e.touch_hit_radius > 0.0) {
            return Err(ScanError::invalid("editor hit radii must be positive"));
        }
        let r = &self.realtime;
        if r.min_interval_ms == 0 || r.tick_interval_ms == 0 {
            return Err(ScanError::invalid("realtime intervals must be non-zero"));
        }
        Ok(())
    }
}

/// How the blurred intensity image is turned into a binary map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binarization {
    /// Global Otsu threshold; bright regions become foreground.
    Otsu,
    /// Pixels brighter than the mean of their `(2r+1)^2` window by more than
    /// `offset` are foreground.
    Adaptive { block_radius: u32, offset: i32 },
    /// Canny edge map with hysteresis thresholds.
    Canny { low: f32, high: f32 },
}

/// How the winning contour is reduced to four corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerStrategy {
    /// Quadrant-extreme points of the raw contour.
    QuadrantExtremes,
    /// Polygon approximation that must collapse to exactly four vertices.
    PolygonApprox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Gaussian sigma; 1.1 matches a 5x5 kernel.
    pub blur_sigma: f32,
    pub binarization: Binarization,
    pub corner_strategy: CornerStrategy,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Intensity spread (max - min) below which a frame is treated as blank.
    pub min_contrast: u8,
    /// Smallest accepted contour area as a fraction of the frame area.
    pub min_area_ratio: f64,
    pub max_pixels: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            binarization: Binarization::Otsu,
            corner_strategy: CornerStrategy::QuadrantExtremes,
            approx_epsilon_ratio: 0.02,
            min_contrast: 12,
            min_area_ratio: 0.01,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifierConfig {
    /// RGBA fill for output pixels that map outside the source.
    pub background: [u8; 4],
    pub max_pixels: u64,
}

impl Default for RectifierConfig {
    fn default() -> Self {
        Self {
            background: [0, 0, 0, 255],
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Hit-test radius in image pixels for fine pointers.
    pub mouse_hit_radius: f64,
    /// Hit-test radius in image pixels for touch contact.
    pub touch_hit_radius: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            mouse_hit_radius: 20.0,
            touch_hit_radius: 35.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Throttle floor between processed frames.
    pub min_interval_ms: u64,
    /// Scheduling period of the loop (one display refresh).
    pub tick_interval_ms: u64,
    /// Largest frame the loop will allocate a snapshot buffer for.
    pub max_frame_pixels: u64,
}

impl RealtimeConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 100,
            tick_interval_ms: 16,
            max_frame_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ScanConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "editor": { "touch_hit_radius": 48.0 },
                        "detector": { "binarization": { "kind": "canny", "low": 50.0, "high": 150.0 } } }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.editor.touch_hit_radius, 48.0);
        assert_eq!(config.editor.mouse_hit_radius, 20.0);
        assert_eq!(
            config.detector.binarization,
            Binarization::Canny { low: 50.0, high: 150.0 }
        );
        assert_eq!(config.realtime.min_interval(), Duration::from_millis(100));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = ScanConfig::default();
        config.realtime.min_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ScanError::InvalidInput(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docquad.json");
        let mut config = ScanConfig::default();
        config.detector.corner_strategy = CornerStrategy::PolygonApprox;
        config.save(&path).unwrap();
        assert_eq!(ScanConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScanConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ScanError::Io(_)));
    }
}
