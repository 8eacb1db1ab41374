#![forbid(unsafe_code)]

use anyhow::Result;
use charts::config::DEFAULT_CONFIG;
use charts::export::{write_dashboard, write_json};
use charts::fetch::fetch_reference_data;
use charts::penguins::{Axis, Brush, PenguinExplorer, load_penguins};
use charts::plot::{plot_bar_chart_svg, plot_penguins_svg, plot_trend_svg};
use charts::view::TrendSeries;
use charts::{Config, CountryCodes, DataStore, DisplayMode, RankingRow, UpdateCoordinator, Week};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Explore weekly music streaming charts across Europe")]
struct Cli {
    /// Configuration file (defaults are used if it doesn't exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Overrides the data directory of the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Overrides the output directory of the configuration
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Renders the dashboard for a selection
    Dashboard {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        week: Option<String>,
        #[arg(long, conflicts_with = "no_song")]
        song: Option<String>,
        /// Clears the song selection
        #[arg(long)]
        no_song: bool,
        #[arg(long)]
        mode: Option<DisplayMode>,
    },
    /// Writes a binary snapshot of the rankings for the web front-end
    Snapshot,
    /// Downloads the country-code reference and the penguin dataset
    Fetch,
    /// Explores the penguin measurements
    Penguins {
        #[arg(short, long)]
        x: Option<Axis>,
        #[arg(short, long)]
        y: Option<Axis>,
        /// Species to show (all by default)
        #[arg(long)]
        species: Vec<String>,
        #[arg(long, num_args = 4, value_names = ["X0", "X1", "Y0", "Y1"], allow_negative_numbers = true)]
        brush: Option<Vec<f64>>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(out) = cli.out {
        config.out_dir = out;
    }
    debug!("Config: {config:?}");

    match cli.command {
        Commands::Dashboard {
            country,
            week,
            song,
            no_song,
            mode,
        } => {
            let song = if no_song { Some(None) } else { song.map(Some) };
            dashboard(&config, country, week.map(Week::new), song, mode)
        }
        Commands::Snapshot => {
            let path = config.snapshot_path();
            info!("Writing snapshot to {path:?}");
            DataStore::load(&config)?.serialize(path)
        }
        Commands::Fetch => fetch_reference_data(&config),
        Commands::Penguins {
            x,
            y,
            species,
            brush,
        } => penguins(&config, x, y, species, brush),
    }
}

fn country_codes(config: &Config) -> Result<CountryCodes> {
    let mut codes = CountryCodes::builtin();
    let path = config.country_codes_path();
    if path.exists() {
        codes.merge(CountryCodes::load(path)?);
    } else {
        warn!("No country-code reference at {path:?}, using built-in codes");
    }
    Ok(codes)
}

fn dashboard(
    config: &Config,
    country: Option<String>,
    week: Option<Week>,
    song: Option<Option<String>>,
    mode: Option<DisplayMode>,
) -> Result<()> {
    let store = DataStore::load(config)?;
    let mut coordinator = UpdateCoordinator::new(store, country_codes(config)?)?;

    // Same order as the cascade: each control may reset the following ones.
    if let Some(country) = country {
        coordinator.set_country(&country)?;
    }
    if let Some(week) = week {
        coordinator.set_week(&week)?;
    }
    if let Some(song) = song {
        coordinator.set_song(song.as_deref())?;
    }
    if let Some(mode) = mode {
        coordinator.set_mode(mode)?;
    }

    let state = coordinator.state();
    println!(
        "### {} / {} ###",
        state.country(),
        state
            .week()
            .map_or_else(|| "no week".to_owned(), |w| w.to_string())
    );
    let weeks: Vec<String> = coordinator
        .week_options()
        .into_iter()
        .map(|w| w.to_string())
        .collect();
    println!("Weeks: {}", weeks.join(", "));

    let dashboard = coordinator.dashboard();
    println!("### Top songs ###");
    print_rows(dashboard.ranking_table.top());
    println!("### Full weekly ranking ###");
    print_rows(&dashboard.ranking_table.rows);
    println!("### Song ###");
    match state.song() {
        Some(song) => {
            println!("Selected: {song} ({} mode)", state.mode());
            print_rows(&dashboard.song_detail);
        }
        None => println!("No song selected"),
    }
    if let Some(trend) = &dashboard.trend {
        print_trend(trend);
    }

    write_dashboard(&config.out_dir, dashboard)?;
    plot_bar_chart_svg(&dashboard.bar_chart, &config.out_dir.join("bars.svg"))?;
    plot_trend_svg(dashboard.trend.as_ref(), &config.out_dir.join("trend.svg"))?;
    Ok(())
}

fn print_rows(rows: &[RankingRow]) {
    println!("| rank | track_name | artist_names | streams |");
    for row in rows {
        println!(
            "| {:>4} | {} | {} | {:>10.0} |",
            row.rank, row.track_name, row.artist_names, row.streams
        );
    }
}

fn print_trend(trend: &TrendSeries) {
    println!("### {} ###", trend.title);
    for point in &trend.points {
        match point.streams {
            Some(streams) => println!("| {} | {:>10.0} |", point.week, streams),
            None => println!("| {} | {:>10} |", point.week, "-"),
        }
    }
}

fn penguins(
    config: &Config,
    x: Option<Axis>,
    y: Option<Axis>,
    species: Vec<String>,
    brush: Option<Vec<f64>>,
) -> Result<()> {
    let mut explorer = PenguinExplorer::new(load_penguins(config.penguins_path())?);
    if let Some(x) = x {
        explorer.set_x_axis(x)?;
    }
    if let Some(y) = y {
        explorer.set_y_axis(y);
    }
    if !species.is_empty() {
        explorer.set_species(species)?;
    }
    if let Some([x0, x1, y0, y1]) = brush.as_deref() {
        explorer.set_brush(Some(Brush {
            x: (*x0, *x1),
            y: (*y0, *y1),
        }));
    }

    println!(
        "### {} vs {} ###",
        explorer.x_axis().name(),
        explorer.y_axis().name()
    );
    println!("| species | total | selected |");
    let counts = explorer.species_counts();
    for count in &counts {
        println!(
            "| {} | {:>5} | {:>8} |",
            count.species, count.total, count.selected
        );
    }

    std::fs::create_dir_all(&config.out_dir)?;
    write_json(&config.out_dir.join("penguins.json"), &explorer.filtered())?;
    plot_penguins_svg(&explorer, &config.out_dir.join("penguins.svg"))?;
    Ok(())
}
