use anyhow::{Result, anyhow};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quake_map::feed::{self, PB2002_PLATES, USGS_ALL_WEEK};
use quake_map::legend::Legend;
use quake_map::map::{Layout, MapConfig};
use quake_map::output::MapDocument;
use quake_map::render::FeatureRenderer;
use quake_map::style::{DEFAULT_SCALE_FACTOR, DepthScale, StyleResolver};

#[derive(Parser)]
#[command(about = "Build an earthquake map document from the USGS feed")]
struct Cli {
    /// Earthquake GeoJSON feed (URL or local path)
    #[arg(long, default_value = USGS_ALL_WEEK)]
    feed: String,

    /// Tectonic plate boundaries GeoJSON (URL or local path)
    #[arg(long, default_value = PB2002_PLATES)]
    plates: String,

    /// Built-in depth color scale
    #[arg(long, default_value = "fine", value_parser = ["fine", "coarse"])]
    scale: String,

    /// JSON depth scale file, overrides --scale
    #[arg(long)]
    scale_file: Option<PathBuf>,

    /// Marker radius per unit of magnitude
    #[arg(long, default_value_t = DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Layer organization of the map
    #[arg(long, value_enum, default_value_t = Layout::Switcher)]
    layout: Layout,

    /// Output map document path
    #[arg(long, default_value = "quake-map.json")]
    output: PathBuf,

    /// Add a legend swatch for depths above the first threshold
    #[arg(long)]
    legend_below: bool,

    /// Hide progress bars
    #[arg(long)]
    quiet: bool,
}

fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let scale = match &cli.scale_file {
        Some(path) => DepthScale::from_json_file(path)?,
        None => DepthScale::named(&cli.scale)
            .ok_or_else(|| anyhow!("Unknown scale {}", cli.scale))?,
    };
    info!(scale = scale.name(), buckets = scale.buckets().len(), "Using depth scale");

    let resolver = StyleResolver::new(scale, cli.scale_factor);
    let config = MapConfig::new(cli.layout);
    let renderer = FeatureRenderer::new(&config, &resolver);
    let mut legend = Legend::new(&resolver, config.legend_position);
    if cli.legend_below {
        legend = legend.with_below_swatch(&resolver);
    }
    let mut document = MapDocument::new(&config, legend);

    let client = feed::client()?;

    let pb = spinner(cli.quiet, format!("Fetching earthquakes from {}...", cli.feed));
    let quakes = feed::earthquakes_or_empty(&client, &cli.feed);
    pb.finish_and_clear();
    info!("Loaded {} earthquakes", quakes.len());

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(quakes.len() as u64)
    };
    pb.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message("Styling markers");
    let summary = renderer.render_earthquakes(&quakes, &mut document, Some(&pb));
    pb.finish_and_clear();
    info!(
        drawn = summary.drawn,
        skipped = summary.skipped,
        "Rendered earthquakes onto {}",
        config.earthquake_layer
    );

    if config.plate_layer.is_some() {
        let pb = spinner(cli.quiet, format!("Fetching plate boundaries from {}...", cli.plates));
        let plates = feed::plates_or_none(&client, &cli.plates);
        pb.finish_and_clear();
        if let Some(plates) = plates {
            let count = plates.features.len();
            renderer.render_plates(plates, &mut document);
            info!("Added {} plate boundaries", count);
        }
    }

    document.write(&cli.output)?;
    info!("Wrote {}", cli.output.display());

    Ok(())
}
