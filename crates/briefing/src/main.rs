use std::process::ExitCode;

use clap::Parser;
use fireline_overlay::acquisition::StrategyClient;
use fireline_overlay::config::OverlayConfig;
use fireline_overlay::geocode::MapboxGeocoder;
use fireline_overlay::render::ImageIcons;
use fireline_overlay::surface::{MapEvent, RecordingSurface};
use fireline_overlay::terrain::MapboxTerrain;
use fireline_overlay::OverlayController;
use fireline_shared::models::{AssetFilter, Incident};
use tracing_subscriber::EnvFilter;

mod report;

/// Headless incident briefing: runs the overlay against a recording map and prints the result.
#[derive(Parser, Debug)]
#[command(name = "fireline-briefing", version)]
struct Args {
    /// Incident longitude
    #[arg(long, default_value_t = 129.2, allow_hyphen_values = true)]
    lon: f64,

    /// Incident latitude
    #[arg(long, default_value_t = 35.8, allow_hyphen_values = true)]
    lat: f64,

    /// Asset categories to show: all, firefighter, helicopter or fireengine
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    filter: AssetFilter,

    /// Map zoom used for contour visibility
    #[arg(long, default_value_t = 13.0)]
    zoom: f64,

    /// Override BACKEND_API_URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Base path for marker icons
    #[arg(long, default_value = "/images")]
    icon_base: String,

    /// Print the final overlay state as JSON
    #[arg(long)]
    json: bool,
}

fn parse_filter(s: &str) -> Result<AssetFilter, String> {
    AssetFilter::parse(s).ok_or_else(|| format!("unknown asset filter: {s}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = OverlayConfig::from_env();
    if let Some(url) = args.backend_url {
        config.backend_url = Some(url);
    }

    let incident = Incident::new(args.lon, args.lat);
    let mut overlay = OverlayController::with_icons(
        RecordingSurface::new(args.zoom),
        incident,
        config.contour,
        ImageIcons::new(args.icon_base),
    );
    overlay.handle_event(MapEvent::Load);
    overlay.select_filter(args.filter);

    let plans = StrategyClient::new(config.clone());
    let terrain = MapboxTerrain::new(&config);
    let addresses = MapboxGeocoder::new(&config);
    overlay.start(&plans, &terrain, &addresses).await;

    let snap = overlay.snapshot();
    if args.json {
        match serde_json::to_string_pretty(&snap) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize overlay state");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report::render_briefing(&snap));
        if let Some(surface) = overlay.surface() {
            for visual in surface.markers() {
                println!("  {} -> {}", visual.label, visual.icon);
            }
        }
    }

    if let Some(surface) = overlay.release() {
        tracing::debug!(disposed = surface.dispose_count(), "Map released");
    }

    if snap.decision.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
