// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docquad: Document detection and perspective correction.
//
// Entry point. Initialises logging, loads configuration, and runs the
// requested subcommand against a still image.

mod args;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use docquad_core::human_errors::humanize_error;
use docquad_core::{CornerIndex, CornerSet, DetectionResult, Result, ScanConfig, ScanError};
use docquad_document::image::load_image;
use docquad_document::{BoundaryDetector, ExportFormat, ExportOptions, PerspectiveRectifier};
use tracing::{info, warn};

use args::{Cli, Command};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, class = ?err.class(), "docquad failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };

    match cli.command {
        Command::Detect {
            image,
            json,
            fallback,
        } => detect(&config, &image, json, fallback),
        Command::Rectify {
            image,
            output,
            corners,
            format,
            quality,
        } => {
            let format = format
                .map(ExportFormat::from)
                .or_else(|| ExportFormat::from_extension(&output))
                .unwrap_or_default();
            let options = ExportOptions { format, quality };
            rectify(&config, &image, &output, corners, options)
        }
    }
}

fn detect(config: &ScanConfig, path: &Path, json: bool, fallback: bool) -> Result<()> {
    let image = load_image(path)?;
    let mut result = BoundaryDetector::new(config.detector.clone()).detect(&image)?;

    if !result.is_found() {
        if !fallback {
            return Err(ScanError::NoDetection);
        }
        warn!("No document found; reporting full-frame corners");
        result = DetectionResult::found(result.corners_or_full_frame(), result.width, result.height);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_corners(&result.require()?);
    }
    Ok(())
}

fn rectify(
    config: &ScanConfig,
    path: &Path,
    output: &Path,
    corners: Option<CornerSet>,
    options: ExportOptions,
) -> Result<()> {
    let image = load_image(path)?;
    let corners = match corners {
        Some(corners) => corners,
        None => {
            let result = BoundaryDetector::new(config.detector.clone()).detect(&image)?;
            if !result.is_found() {
                warn!("No document found; rectifying the full frame");
            }
            result.corners_or_full_frame()
        }
    };

    let rectified = PerspectiveRectifier::new(config.rectifier.clone()).rectify(&image, &corners)?;
    rectified.save(output, options)?;
    info!(
        width = rectified.width(),
        height = rectified.height(),
        "Rectified page saved"
    );
    Ok(())
}

fn print_corners(corners: &CornerSet) {
    for corner in CornerIndex::ALL {
        let p = corners[corner];
        println!("{:<12} {:>9.1} {:>9.1}", format!("{corner:?}"), p.x, p.y);
    }
}
