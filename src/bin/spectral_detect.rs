//! spectral-detect - classify images as AI-generated or real and inspect
//! their spectral fingerprint.

use std::{path::PathBuf, process, sync::Arc, thread};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use spectral_detect::{
    ImageInspector,
    analysis::fingerprint::{SpectralFingerprintAnalyzer, UNANALYZABLE_MESSAGE},
    config::DetectorConfig,
    detection::{engine::DetectionEngine, huggingface::HuggingFaceLoader},
    report::{JsonReport, visualization::Visualizer},
};

#[derive(Parser, Debug)]
#[command(name = "spectral-detect")]
#[command(about = "AI image detection with spectral fingerprint analysis")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the spectral fingerprint figure
    Fingerprint {
        image: PathBuf,
        /// Output PNG path
        #[arg(short, long, default_value = "spectrum.png")]
        output: PathBuf,
    },
    /// Print the heuristic spectral verdict
    Analyze { image: PathBuf },
    /// Classify the image with the detection model
    Classify { image: PathBuf },
    /// Classification, spectral verdict and figure together
    Inspect {
        image: PathBuf,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
        /// Save the image and its spectrum side by side
        #[arg(long)]
        figure: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<DetectorConfig> {
    match path {
        Some(path) => DetectorConfig::load_from_file(path)
            .with_context(|| format!("reading config {}", path.display())),
        None => Ok(DetectorConfig::default()),
    }
}

fn build_engine(config: &DetectorConfig) -> Arc<DetectionEngine> {
    Arc::new(DetectionEngine::with_config(
        Box::new(HuggingFaceLoader::with_config(config.huggingface.clone())),
        config.models.clone(),
    ))
}

fn build_analyzer(config: &DetectorConfig) -> SpectralFingerprintAnalyzer {
    SpectralFingerprintAnalyzer::with_config(config.spectral.clone())
        .with_visualizer(Visualizer::with_config(config.visualization.clone()))
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Fingerprint { image, output } => {
            let fingerprint = build_analyzer(&config)
                .compute_fingerprint(&image)
                .with_context(|| format!("fingerprinting {}", image.display()))?;
            fingerprint.save(&output)?;
            println!("Spectrum saved to {}", output.display());
        }
        Command::Analyze { image } => {
            let summary = build_analyzer(&config).pattern_summary(&image);
            println!("{}", summary);
            if summary == UNANALYZABLE_MESSAGE {
                process::exit(1);
            }
        }
        Command::Classify { image } => {
            let engine = build_engine(&config);
            if let Err(e) = engine.initialize() {
                warn!("{}", e);
            }
            let inspector = ImageInspector::new(&image)
                .with_context(|| format!("loading {}", image.display()))?;
            println!("{}", inspector.classify(&engine)?.formatted());
        }
        Command::Inspect { image, json, figure } => {
            let engine = build_engine(&config);

            // Model loading runs alongside the image work.
            let loader = {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    if let Err(e) = engine.initialize() {
                        warn!("{}", e);
                    }
                })
            };

            let inspector = ImageInspector::new(&image)
                .with_context(|| format!("loading {}", image.display()))?
                .with_config(&config);

            if loader.join().is_err() {
                warn!("model loader thread panicked");
            }

            let report = inspector.full_analysis(&engine)?;

            if let Some(path) = figure {
                let original = inspector.image().to_rgb8();
                let comparison = Visualizer::with_config(config.visualization.clone())
                    .create_comparison(&[
                        ("Image", &original),
                        ("Spectrum", &report.fingerprint.figure),
                    ]);
                comparison.save(&path)?;
            }

            if json {
                println!("{}", JsonReport::from_report(&report, false)?.to_json()?);
            } else {
                println!(
                    "Image:     {} ({}x{})",
                    inspector.path().unwrap_or("-"),
                    report.width,
                    report.height
                );
                println!("Detection: {}", report.detection.formatted());
                if report.detection.ambiguous {
                    println!("           (label did not map cleanly; treat with caution)");
                }
                println!();
                println!("{}", report.patterns.message());
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
