//! `boule` command-line interface: JSON in, JSON out.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use boule_vision::prelude::*;
use boule_vision::{PairDistance, PlanarView};
use clap::{Parser, Subcommand};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "boule")]
#[command(about = "Measure pétanque distances and analyze throws")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank boules by distance to the cochonnet.
    Rank {
        /// JSON file with `{ "detections": [...] }`.
        #[arg(long)]
        input: PathBuf,
        /// Optional MeasureConfig JSON. Defaults are used if omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Use the uncalibrated pixel scale instead of the cochonnet size.
        #[arg(long)]
        pixel_scale: bool,
    },

    /// Analyze one throw from per-frame positions.
    Analyze {
        /// JSON file with `{ "fps": 30.0, "positions": [[x, y] | null, ...] }`.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Calibrate the camera from pre-detected checkerboard corners.
    Calibrate {
        #[arg(long)]
        input: PathBuf,
        /// Optional PlanarCalibrationOptions JSON.
        #[arg(long)]
        options: Option<PathBuf>,
    },

    /// Remove lens distortion from an image.
    Undistort {
        #[arg(long)]
        image: PathBuf,
        /// CalibrationRecord JSON.
        #[arg(long)]
        calibration: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Triangulate a rectified stereo match.
    Stereo {
        /// Left image point as `x,y`.
        #[arg(long, value_parser = parse_point)]
        left: Pt2,
        /// Right image point as `x,y`.
        #[arg(long, value_parser = parse_point)]
        right: Pt2,
        /// Camera baseline (meters).
        #[arg(long)]
        baseline: f64,
        /// Focal length (pixels).
        #[arg(long)]
        focal: f64,
        /// CalibrationRecord JSON supplying the principal point.
        #[arg(long)]
        calibration: Option<PathBuf>,
    },
}

fn parse_point(s: &str) -> Result<Pt2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok(Pt2::new(x, y))
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<MeasureConfig> {
    match path {
        Some(path) => MeasureConfig::from_json_file(path),
        None => Ok(MeasureConfig::default()),
    }
}

#[derive(Debug, Deserialize)]
struct RankInput {
    detections: Vec<DetectedObject>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RankOutput {
    target: Option<DetectedObject>,
    candidates: Vec<DetectedObject>,
    ranking: Vec<DistanceResult>,
    pairwise: Vec<PairDistance>,
    /// Pair distances scaled by the boules' own size.
    pairwise_by_boule_size: Vec<PairDistance>,
}

fn run_rank(input: &Path, config: Option<&Path>, pixel_scale: bool) -> Result<String> {
    let input: RankInput = load_json_file(input)?;
    let config = load_config(config)?;

    let target = input
        .detections
        .iter()
        .filter(|d| d.class == Some(PieceClass::Cochonnet))
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .copied();
    let candidates: Vec<DetectedObject> = input
        .detections
        .iter()
        .filter(|d| d.may_be_boule())
        .copied()
        .collect();
    if target.is_none() {
        log::warn!("no cochonnet among {} detections", input.detections.len());
    }

    let engine = RankingEngine::new(config.scale);
    let use_reference_size = !pixel_scale;
    let output = RankOutput {
        ranking: engine.rank(&candidates, target.as_ref(), use_reference_size)?,
        pairwise: engine.pairwise(&candidates, target.as_ref(), use_reference_size)?,
        pairwise_by_boule_size: engine.pairwise_by_boule_size(&candidates)?,
        target,
        candidates,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

#[derive(Debug, Deserialize)]
struct AnalyzeInput {
    #[serde(default)]
    fps: Option<f64>,
    positions: Vec<Option<Pt2>>,
}

fn run_analyze(input: &Path, config: Option<&Path>) -> Result<String> {
    let input: AnalyzeInput = load_json_file(input)?;
    let config = load_config(config)?;
    let analysis = ThrowAnalyzer::new(&config).analyze_frames(&input.positions, input.fps)?;
    Ok(serde_json::to_string_pretty(&analysis)?)
}

#[derive(Debug, Serialize, Deserialize)]
struct CalibrateInput {
    image_width: u32,
    image_height: u32,
    columns: usize,
    rows: usize,
    square_size: f64,
    views: Vec<Vec<Pt2>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CalibrateOutput {
    record: CalibrationRecord,
    calibration: PlanarCalibration,
}

fn run_calibrate(input: &Path, options: Option<&Path>) -> Result<String> {
    let input: CalibrateInput = load_json_file(input)?;
    let opts = match options {
        Some(path) => load_json_file::<PlanarCalibrationOptions>(path)?,
        None => PlanarCalibrationOptions::default(),
    };

    let pattern = CheckerboardPattern {
        columns: input.columns,
        rows: input.rows,
        square_size: input.square_size,
    };
    let board = pattern.board_points();
    let views = input
        .views
        .into_iter()
        .enumerate()
        .filter_map(|(idx, corners)| {
            if corners.len() == board.len() {
                Some(PlanarView::new(board.clone(), corners))
            } else {
                log::warn!(
                    "skipping view {idx}: {} corners, expected {}",
                    corners.len(),
                    board.len()
                );
                None
            }
        })
        .collect::<MeasureResult<Vec<_>>>()?;

    let model = CameraModel::uncalibrated();
    let calibration =
        model.calibrate_views(&views, (input.image_width, input.image_height), &opts)?;
    let output = CalibrateOutput {
        record: model.record()?,
        calibration,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

#[derive(Debug, Serialize)]
struct UndistortOutput {
    width: u32,
    height: u32,
}

fn run_undistort(image: &Path, calibration: &Path, out: &Path) -> Result<String> {
    let record: CalibrationRecord = load_json_file(calibration)?;
    let model = CameraModel::uncalibrated();
    model.load(&record)?;

    let img = image::open(image).with_context(|| format!("failed to open {}", image.display()))?;
    let (width, height) = match img {
        DynamicImage::ImageLuma8(gray) => {
            let undistorted = model.undistort(&gray)?;
            undistorted.save(out)?;
            undistorted.dimensions()
        }
        other => {
            let undistorted = model.undistort(&other.to_rgb8())?;
            undistorted.save(out)?;
            undistorted.dimensions()
        }
    };
    log::info!("wrote {}x{} image to {}", width, height, out.display());
    Ok(serde_json::to_string_pretty(&UndistortOutput { width, height })?)
}

fn run_stereo(
    left: Pt2,
    right: Pt2,
    baseline: f64,
    focal: f64,
    calibration: Option<&Path>,
) -> Result<String> {
    let model = CameraModel::new();
    if let Some(path) = calibration {
        model.load(&load_json_file(path)?)?;
    }
    let estimator = DistanceEstimator::new(Arc::new(model));
    let point = estimator.triangulate_stereo(&left, &right, baseline, focal)?;
    Ok(serde_json::to_string_pretty(&point)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = match cli.command {
        Commands::Rank {
            input,
            config,
            pixel_scale,
        } => run_rank(&input, config.as_deref(), pixel_scale)?,
        Commands::Analyze { input, config } => run_analyze(&input, config.as_deref())?,
        Commands::Calibrate { input, options } => run_calibrate(&input, options.as_deref())?,
        Commands::Undistort {
            image,
            calibration,
            out,
        } => run_undistort(&image, &calibration, &out)?,
        Commands::Stereo {
            left,
            right,
            baseline,
            focal,
            calibration,
        } => run_stereo(left, right, baseline, focal, calibration.as_deref())?,
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boule_vision::core::synthetic::{noise::UniformPixelNoise, planar};
    use tempfile::NamedTempFile;

    fn write_json<T: Serialize>(value: &T) -> Result<NamedTempFile> {
        let file = NamedTempFile::new()?;
        serde_json::to_writer_pretty(fs::File::create(file.path())?, value)?;
        Ok(file)
    }

    fn write_text(text: &str) -> Result<NamedTempFile> {
        let file = NamedTempFile::new()?;
        fs::write(file.path(), text)?;
        Ok(file)
    }

    #[test]
    fn point_argument_parsing() {
        assert_eq!(parse_point("500,490.5"), Ok(Pt2::new(500.0, 490.5)));
        assert_eq!(parse_point(" 1 , -2 "), Ok(Pt2::new(1.0, -2.0)));
        assert!(parse_point("500").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn rank_uses_cochonnet_as_target() -> Result<()> {
        let input = write_text(
            r#"{ "detections": [
                { "center": [100.0, 0.0], "radius": 37.0, "confidence": 0.9, "class": "boule" },
                { "center": [0.0, 0.0], "radius": 15.0, "confidence": 0.8, "class": "cochonnet" },
                { "center": [0.0, 45.0], "radius": 36.0, "confidence": 0.6 }
            ] }"#,
        )?;
        let json = run_rank(input.path(), None, false)?;
        let output: RankOutput = serde_json::from_str(&json)?;

        assert_eq!(output.candidates.len(), 2);
        assert_eq!(output.ranking[0].candidate, 1);
        assert!((output.ranking[0].distance - 0.045).abs() < 1e-12);
        assert!((output.ranking[1].distance - 0.1).abs() < 1e-12);
        assert_eq!(output.pairwise.len(), 1);
        // Mean boule diameter 73 px for the default 0.0755 m.
        let expected = (100.0_f64.powi(2) + 45.0_f64.powi(2)).sqrt() * 0.0755 / 73.0;
        assert!((output.pairwise_by_boule_size[0].distance - expected).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn rank_without_cochonnet_is_empty() -> Result<()> {
        let input = write_text(
            r#"{ "detections": [ { "center": [1.0, 2.0], "radius": 30.0, "confidence": 0.9 } ] }"#,
        )?;
        let output: RankOutput = serde_json::from_str(&run_rank(input.path(), None, true)?)?;
        assert!(output.target.is_none());
        assert!(output.ranking.is_empty());
        assert!(output.pairwise_by_boule_size.is_empty());
        Ok(())
    }

    #[test]
    fn rank_rejects_invalid_detections() -> Result<()> {
        let input = write_text(
            r#"{ "detections": [ { "center": [1.0, 2.0], "radius": -3.0, "confidence": 0.9 } ] }"#,
        )?;
        assert!(run_rank(input.path(), None, false).is_err());
        Ok(())
    }

    #[test]
    fn analyze_reads_sparse_positions() -> Result<()> {
        let input = write_text(
            r#"{ "positions": [[0.0, 0.0], null, [5.0, 5.0], [10.0, 10.0], null] }"#,
        )?;
        let analysis: ThrowAnalysis = serde_json::from_str(&run_analyze(input.path(), None)?)?;
        assert_eq!(analysis.point_count, 3);
        assert_eq!(analysis.accuracy, 100.0);
        assert!((analysis.angle - 45.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn calibrate_from_corner_file() -> Result<()> {
        let pattern = CheckerboardPattern {
            columns: 8,
            rows: 5,
            square_size: 0.04,
        };
        let camera = PinholeCamera::ideal(CameraIntrinsics::new(900.0, 900.0, 640.0, 360.0)?);
        let poses = planar::board_poses(&pattern, 4, 0.8);
        let views = planar::project_views(&camera, &pattern, &poses, UniformPixelNoise::default())?;

        let mut corners: Vec<Vec<Pt2>> = views.into_iter().map(|v| v.pixel_points).collect();
        corners.push(vec![Pt2::new(1.0, 1.0); 3]);
        let input = write_json(&CalibrateInput {
            image_width: 1280,
            image_height: 720,
            columns: pattern.columns,
            rows: pattern.rows,
            square_size: pattern.square_size,
            views: corners,
        })?;

        let output: CalibrateOutput = serde_json::from_str(&run_calibrate(input.path(), None)?)?;
        assert_eq!(output.calibration.views_used, 4);
        assert!((output.record.camera_matrix[0] - 900.0).abs() < 0.5);
        assert!((output.record.camera_matrix[2] - 640.0).abs() < 0.5);
        Ok(())
    }

    #[test]
    fn stereo_with_default_intrinsics() -> Result<()> {
        let json = run_stereo(Pt2::new(500.0, 500.0), Pt2::new(490.0, 500.0), 1.0, 1000.0, None)?;
        let p: Pt3 = serde_json::from_str(&json)?;
        assert!((p - Pt3::new(-46.0, -4.0, 100.0)).norm() < 1e-9);

        let json = run_stereo(Pt2::new(5.0, 5.0), Pt2::new(5.0, 9.0), 1.0, 1000.0, None)?;
        assert_eq!(serde_json::from_str::<Pt3>(&json)?, Pt3::origin());
        assert!(run_stereo(Pt2::new(5.0, 5.0), Pt2::new(4.0, 5.0), 0.0, 1000.0, None).is_err());
        Ok(())
    }

    #[test]
    fn undistort_writes_image() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("in.png");
        let dst = dir.path().join("out.png");
        image::GrayImage::from_fn(64, 48, |x, y| image::Luma([((x + y) * 2) as u8]))
            .save(&src)?;

        let camera = PinholeCamera::new(
            CameraIntrinsics::new(80.0, 80.0, 32.0, 24.0)?,
            DistortionCoefficients {
                k1: -0.1,
                ..Default::default()
            },
        );
        let record = write_json(&CalibrationRecord::from(&camera))?;

        run_undistort(&src, record.path(), &dst)?;
        let out = image::open(&dst)?;
        assert!(out.width() <= 64 && out.height() <= 48);
        assert!(out.width() > 0 && out.height() > 0);
        Ok(())
    }
}
