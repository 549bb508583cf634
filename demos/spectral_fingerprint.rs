//! Spectral Fingerprint Example
//!
//! Computes the frequency-domain fingerprint of an image, saves the
//! figure, and prints the spectral statistics behind the verdict.
//!
//! Run with: cargo run --example spectral_fingerprint -- <image_path> [output_dir]

use std::env;
use std::fs;
use std::path::Path;

use spectral_detect::{
    analysis::fingerprint::{SpectralConfig, SpectralFingerprintAnalyzer},
    error::Result,
    report::visualization::{ColorScheme, VisualizationConfig, Visualizer},
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Spectral Fingerprint Example");
        println!("============================");
        println!();
        println!("Usage: {} <image_path> [output_dir]", args[0]);
        println!();
        println!("Arguments:");
        println!("  image_path  - Path to the image to analyze");
        println!("  output_dir  - Optional output directory (default: ./output)");
        return Ok(());
    }

    let image_path = &args[1];
    let output_dir = args.get(2).map(|s| s.as_str()).unwrap_or("./output");

    if !Path::new(image_path).exists() {
        eprintln!("Error: Image file '{}' not found", image_path);
        std::process::exit(1);
    }

    fs::create_dir_all(output_dir)?;

    println!("Input:  {}", image_path);
    println!("Output: {}", output_dir);
    println!();

    // One figure per colour scheme; the verdict does not depend on it.
    for (name, color_scheme) in [
        ("magma", ColorScheme::Magma),
        ("viridis", ColorScheme::Viridis),
        ("heat", ColorScheme::HeatMap),
    ] {
        let visualizer = Visualizer::with_config(VisualizationConfig {
            color_scheme,
            ..VisualizationConfig::default()
        });
        let analyzer = SpectralFingerprintAnalyzer::new().with_visualizer(visualizer);

        let fingerprint = analyzer.compute_fingerprint(image_path)?;
        let output = format!("{}/spectrum_{}.png", output_dir, name);
        fingerprint.save(&output)?;
        println!("  Saved {}", output);
    }
    println!();

    let analyzer = SpectralFingerprintAnalyzer::new();
    let verdict = analyzer.analyze_patterns(image_path)?;
    let stats = &verdict.statistics;

    println!("Spectral statistics (outside radius {}):", stats.exclusion_radius);
    println!("  Cells examined:   {}", stats.outer_cells);
    println!("  Mean magnitude:   {:.2}", stats.mean);
    println!("  Std deviation:    {:.2}", stats.std_deviation);
    println!("  Max magnitude:    {:.2}", stats.max);
    println!("  Threshold:        {:.2}", stats.threshold);
    println!("  Anomalies:        {}", stats.anomaly_count);
    println!();
    println!("{}", verdict.message());
    println!();

    // A stricter count threshold shows how sensitive the verdict is.
    let strict = SpectralFingerprintAnalyzer::with_config(SpectralConfig {
        anomaly_count_threshold: 25,
        ..SpectralConfig::default()
    })
    .analyze_patterns(image_path)?;
    println!(
        "With a threshold of 25 anomalies: {}",
        if strict.anomalous { "anomalous" } else { "natural" }
    );

    Ok(())
}
