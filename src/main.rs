mod config;
mod data;
mod error;
mod feed;
mod gtfs;
mod page;
mod render;
mod search;
mod seats;
mod templating;
mod widget;

use std::fs;
use std::path::{Path, PathBuf};

use askama::Template;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::feed::fetch_live_buses;
use crate::gtfs::Timetable;
use crate::search::search_buses;
use crate::seats::{seat_map, seat_page_name};
use crate::templating::{BusSeatsTemplate, MapBlock, MapTemplate, ResultsTemplate};

#[derive(Parser)]
#[command(about = "Finds live buses between two stops and draws them on a map.")]
struct Cli {
    #[arg(long, default_value = "busmap.toml", help = "The TOML configuration file to read.")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    #[command(about = "Search for buses between two stops and write results.html.")]
    Search(SearchOptions),

    #[command(about = "Write the seat map of a bus.")]
    Seats(SeatsOptions),

    #[command(about = "Draw a serialized bus list onto a map page.")]
    Render(RenderOptions),
}

#[derive(Parser)]
struct SearchOptions {
    #[arg(help = "Name (or pattern) of the stop to board at.")]
    pub source: String,

    #[arg(help = "Name (or pattern) of the stop to leave at.")]
    pub destination: String,
}

#[derive(Parser)]
struct SeatsOptions {
    #[arg(help = "The bus whose seats to show.")]
    pub bus_id: String,
}

#[derive(Parser)]
struct RenderOptions {
    #[arg(help = "JSON file containing the array of bus records.")]
    pub buses_json: PathBuf,

    #[arg(default_value = "map.html", help = "The HTML page to write.")]
    pub target_html: PathBuf,
}

fn write_page<T: Template>(path: &Path, page: &T) -> Result<(), AppError> {
    let rendered = page.render()?;
    fs::write(path, rendered).map_err(|source| AppError::Io {
        path: path.to_owned(),
        source,
    })?;
    info!("wrote {}", path.display());
    Ok(())
}

fn search(config: &Config, options: SearchOptions) -> Result<(), AppError> {
    let timetable = Timetable::load(&config.gtfs_dir)?;
    let entities = fetch_live_buses(&config.feed_path);
    let buses = search_buses(
        &timetable,
        &entities,
        &options.source,
        &options.destination,
        &config.search,
        &mut rand::thread_rng(),
    )?;

    let bus_data = serde_json::to_string(&buses).map_err(AppError::Serialize)?;
    let block = MapBlock::build(bus_data)?;
    let page = ResultsTemplate::new(options.source, options.destination, buses, block);
    write_page(&config.output_dir.join("results.html"), &page)
}

fn seats(config: &Config, options: SeatsOptions) -> Result<(), AppError> {
    let seats = seat_map(config.seats.seat_count, &mut rand::thread_rng());
    let path = config.output_dir.join(seat_page_name(&options.bus_id));
    let page = BusSeatsTemplate {
        bus_id: options.bus_id,
        seats,
    };
    write_page(&path, &page)
}

fn render(options: RenderOptions) -> Result<(), AppError> {
    let bus_data = fs::read_to_string(&options.buses_json).map_err(|source| AppError::Io {
        path: options.buses_json.clone(),
        source,
    })?;
    let block = MapBlock::build(bus_data)?;
    write_page(&options.target_html, &MapTemplate::from(block))
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.mode {
        Mode::Search(options) => search(&Config::load(&cli.config)?, options),
        Mode::Seats(options) => seats(&Config::load(&cli.config)?, options),
        Mode::Render(options) => render(options),
    }
}

fn main() {
    let cli = Cli::parse();

    let exit_code = {
        // set up tracing; the guard flushes pending events when dropped
        let (stderr_non_blocking, _guard) = tracing_appender::non_blocking::NonBlockingBuilder::default()
            .lossy(false)
            .finish(std::io::stderr());
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(stderr_non_blocking)
            .init();

        match run(cli) {
            Ok(()) => 0,
            Err(e) => {
                error!("{}", e);
                1
            },
        }
    };
    std::process::exit(exit_code);
}
