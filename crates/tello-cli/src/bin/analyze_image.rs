//! Run the Azure vision analysis on a still image.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tello_vision::analyzer::DEFAULT_CONFIDENCE_THRESHOLD;
use tello_vision::{AzureVisionClient, Focus, VisualFeature};

/// Analyze an image the way the agent analyzes camera frames
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JPEG or PNG image
    image: PathBuf,

    /// obstacles, objects, navigation or landing_spot
    #[arg(long, default_value = "objects")]
    focus: Focus,

    /// Minimum confidence for reported results
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    threshold: f64,

    /// Print the raw API response as JSON instead
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tello_cli::init_logging();
    let args = Args::parse();

    let (Ok(endpoint), Ok(key)) = (
        std::env::var("AZURE_AI_VISION_ENDPOINT"),
        std::env::var("AZURE_AI_VISION_KEY"),
    ) else {
        bail!("AZURE_AI_VISION_ENDPOINT and AZURE_AI_VISION_KEY must be set");
    };
    let client = AzureVisionClient::new(endpoint, key)?;

    let image = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("reading {}", args.image.display()))?;
    println!("Analyzing {} ({} bytes)...", args.image.display(), image.len());

    let analysis = client.analyze(image, &VisualFeature::ALL).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let report = analysis.filtered(args.threshold);
    print!("{}", tello_cli::render_report(&report, args.focus));
    Ok(())
}
