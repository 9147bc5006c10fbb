use std::{
    env,
    path::{Path, PathBuf},
};

use fractal_markers::{FractalDetectConfig, FractalDetectReport, GrayImageView};
use image::ImageReader;
use log::LevelFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fractal_markers_core::init_with_level(LevelFilter::Info)?;

    let config_path = parse_config_path();
    let cfg = FractalDetectConfig::load_json(&config_path)?;
    let img = load_image(Path::new(&cfg.image_path))?;
    let view = GrayImageView::from_luma(&img);

    let detector = cfg.build_detector()?;
    let mut report = FractalDetectReport::new(&cfg, &config_path);

    let result = if cfg.correspondences {
        detector.detect_with_correspondences(&view)
    } else {
        detector.detect(&view).map(|markers| fractal_markers::FractalDetection {
            markers,
            ..Default::default()
        })
    };

    match result {
        Ok(res) => {
            log::info!(
                "{} markers, {} correspondences",
                res.markers.len(),
                res.correspondences.len()
            );
            report.set_detection(detector.set().units(), res);
        }
        Err(err) => report.set_error(err),
    }

    let output_path = cfg.output_path();
    report.write_json(&output_path)?;
    println!("wrote report JSON to {}", output_path.display());
    Ok(())
}

fn parse_config_path() -> PathBuf {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("testdata/fractal_detect_config.json"))
}

fn load_image(path: &Path) -> Result<image::GrayImage, Box<dyn std::error::Error>> {
    Ok(ImageReader::open(path)?.decode()?.to_luma8())
}
