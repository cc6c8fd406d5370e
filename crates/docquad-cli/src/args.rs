// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use docquad_core::{CornerSet, Point};
use docquad_document::ExportFormat;

#[derive(Parser, Debug)]
#[command(name = "docquad", version)]
#[command(about = "Find a document in a photo and flatten it")]
pub struct Cli {
    /// JSON configuration file; missing fields take their defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the four corners of the document in an image
    Detect {
        /// Input photo
        image: PathBuf,

        /// Emit the detection result as JSON
        #[arg(long)]
        json: bool,

        /// Report full-frame corners instead of failing when nothing is found
        #[arg(long)]
        fallback: bool,
    },

    /// Write a perspective-corrected copy of the document
    Rectify {
        /// Input photo
        image: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Corners as x0,y0,x1,y1,x2,y2,x3,y3 (top-left, top-right,
        /// bottom-right, bottom-left). Detected when omitted.
        #[arg(long, value_parser = parse_corners)]
        corners: Option<CornerSet>,

        /// Output format; guessed from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// JPEG quality (1-100)
        #[arg(long, default_value_t = 92, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
        }
    }
}

/// Parse `x0,y0,x1,y1,x2,y2,x3,y3` in canonical corner order.
pub fn parse_corners(raw: &str) -> Result<CornerSet, String> {
    let values = raw
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("bad coordinate {v:?}: {e}"))
        })
        .collect::<Result<Vec<f64>, String>>()?;
    if values.len() != 8 {
        return Err(format!("expected 8 numbers, got {}", values.len()));
    }
    let points: Vec<Point> = values
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0], xy[1]))
        .collect();
    CornerSet::try_from_slice(&points).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn corners_parse_in_canonical_order() {
        let set = parse_corners("1,2, 30,2 ,30,40,1,40").unwrap();
        assert_eq!(set.top_left(), Point::new(1.0, 2.0));
        assert_eq!(set.bottom_right(), Point::new(30.0, 40.0));
        assert_eq!(set.bottom_left(), Point::new(1.0, 40.0));
    }

    #[test]
    fn wrong_corner_count_is_rejected() {
        assert!(parse_corners("1,2,3,4,5,6").unwrap_err().contains("expected 8"));
        assert!(parse_corners("1,2,3,4,5,6,7,x").is_err());
        assert!(parse_corners("1,2,3,4,5,6,7,inf").is_err());
    }

    #[test]
    fn rectify_arguments() {
        let cli = Cli::try_parse_from([
            "docquad",
            "rectify",
            "in.jpg",
            "-o",
            "out.jpg",
            "--corners",
            "0,0,10,0,10,10,0,10",
            "--format",
            "jpeg",
            "--quality",
            "70",
        ])
        .unwrap();
        match cli.command {
            Command::Rectify {
                corners,
                format,
                quality,
                ..
            } => {
                assert!(corners.is_some());
                assert_eq!(format, Some(FormatArg::Jpeg));
                assert_eq!(quality, 70);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let parsed = Cli::try_parse_from(["docquad", "rectify", "a.png", "-o", "b.jpg", "--quality", "0"]);
        assert!(parsed.is_err());
    }
}
