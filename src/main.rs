use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fluid_height::config::RunConfig;
use fluid_height::markers::VideoMarkers;
use fluid_height::row::FrameRowCalculator;
use fluid_height::tank::TankSettings;
use fluid_height::video::{FrameSource, VideoFile};
use fluid_height::{batch, filter, Result};

#[derive(Parser, Debug)]
#[command(name = "fluid-height", about = "Liquid heights from experiment video")]
struct Args {
    /// Run configuration.
    #[arg(long, default_value = "analysis.toml")]
    config: PathBuf,
    /// Overrides slice_count from the configuration.
    #[arg(long)]
    slices: Option<usize>,
    /// Overrides workers from the configuration.
    #[arg(long)]
    workers: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a raw height table for every marked section.
    Raw,
    /// Smooth every raw table in the output directory.
    Filter,
    /// Raw, then filter.
    Both,
    /// Print the row of a single frame.
    Row {
        #[arg(long)]
        frame: usize,
    },
    /// Toggle the marker at a frame and save the markers.
    Mark {
        #[arg(long)]
        frame: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = RunConfig::from_toml(&args.config)?;
    if let Some(slices) = args.slices {
        config.slice_count = slices;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate()?;

    match args.command {
        Command::Raw => write_raw_tables(&config),
        Command::Filter => write_filtered_tables(&config),
        Command::Both => write_raw_tables(&config).and_then(|_| write_filtered_tables(&config)),
        Command::Row { frame } => print_row(&config, frame),
        Command::Mark { frame } => toggle_marker(&config, frame),
    }
}

fn write_raw_tables(config: &RunConfig) -> Result<()> {
    let written = batch::run(config)?;
    log::info!("Wrote {} raw table(s)", written.len());
    Ok(())
}

fn write_filtered_tables(config: &RunConfig) -> Result<()> {
    let written = filter::filter_directory(&config.out_dir)?;
    log::info!("Wrote {} filtered table(s)", written.len());
    Ok(())
}

fn print_row(config: &RunConfig, frame: usize) -> Result<()> {
    let settings = TankSettings::load(&config.tank_settings)?;
    let markers = VideoMarkers::load(&config.markers)?;
    let mut video = VideoFile::open(&config.video)?;
    let calculator = FrameRowCalculator::new(settings.tanks, config.row_params(video.fps()))?;

    let start = markers.section_start(frame).unwrap_or(0);
    let raw = video.read_frame(frame)?;
    let row = calculator.calculate(&raw, frame, start)?;
    println!("{}", calculator.columns().join(","));
    println!("{}", row.to_csv_line());
    Ok(())
}

fn toggle_marker(config: &RunConfig, frame: usize) -> Result<()> {
    let mut markers = if config.markers.exists() {
        VideoMarkers::load(&config.markers)?
    } else {
        log::info!("{} not found, starting without markers", config.markers.display());
        VideoMarkers::default()
    };
    let marked = markers.toggle(frame);
    markers.save(&config.markers)?;
    log::info!(
        "Frame {frame} {}, {} marker(s) saved",
        if marked { "marked" } else { "unmarked" },
        markers.len()
    );
    Ok(())
}
