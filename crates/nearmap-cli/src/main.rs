use std::sync::Arc;

use clap::{Parser, Subcommand};
use nearmap_client::CycleOutcome;
use nearmap_core::{Coordinate, Environment};

mod console;
mod interactive;
mod text_map;
mod wiring;

use console::ConsoleView;
use wiring::{build_app, PositionMode};

#[derive(Debug, Parser)]
#[command(name = "nearmap")]
#[command(about = "Nearby businesses around you, in the terminal")]
struct Cli {
    /// Use this position instead of IP geolocation (e.g. 39.7392,-104.9903)
    #[arg(long, global = true, value_parser = parse_coordinate, conflicts_with = "no_geolocation")]
    at: Option<Coordinate>,
    /// Behave as if no position capability exists
    #[arg(long, global = true)]
    no_geolocation: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the map and resolve businesses around the current position
    Locate,
    /// Resolve businesses around a ZIP code or address
    Search {
        /// ZIP code or free-text address
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Start an interactive session (the default)
    Interactive,
}

/// Parses `LAT,LNG` into a validated coordinate.
pub(crate) fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{raw}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;
    Coordinate::new(lat, lng).map_err(|e| e.to_string())
}

/// Production logs are plain text for collectors; elsewhere they are
/// colored.
fn colored_logs(env: &Environment) -> bool {
    !matches!(env, Environment::Production)
}

impl Cli {
    fn position_mode(&self) -> PositionMode {
        match (self.at, self.no_geolocation) {
            (Some(coord), _) => PositionMode::Fixed(coord),
            (None, true) => PositionMode::Disabled,
            (None, false) => PositionMode::Ip,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = nearmap_core::load_app_config()
        .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(colored_logs(&config.env))
        .with_target(matches!(config.env, Environment::Development))
        .init();

    let cli = Cli::parse();
    tracing::debug!(?config, "configuration loaded");

    let app = build_app(&config, cli.position_mode(), Arc::new(ConsoleView::default()))?;
    let state = app.orchestrator.bootstrap().await;
    tracing::info!(?state, "initial load finished");
    print!("{}", app.map.render());

    match cli.command {
        Some(Commands::Locate) => {}
        Some(Commands::Search { query }) => {
            let query = query.join(" ");
            match app.orchestrator.search(&query).await {
                Some(CycleOutcome::Unavailable) => {
                    anyhow::bail!("map did not load; search is unavailable")
                }
                Some(_) => print!("{}", app.map.render()),
                None => anyhow::bail!("could not resolve '{query}'"),
            }
        }
        Some(Commands::Interactive) | None => interactive::run_interactive(&app).await?,
    }

    Ok(())
}
