use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};

use tier_net::encoding::{encode_record, AgeBounds, PersonRecord};
use tier_net::model::{self, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE};
use tier_net::parsing::{people, reference, table, Dataset};
use tier_net::{TierError, TrainConfig};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// People CSV to train on (name,age,color,location,tier)
    /// If neither this nor --table is given, the built-in reference people are used
    #[arg(short, long, conflicts_with = "table")]
    data: Option<String>,

    /// JSON file with already-encoded "features" and "labels" tables
    #[arg(short, long)]
    table: Option<String>,

    /// Name of the person to classify
    #[arg(long, default_value = "Bruno")]
    name: String,

    /// Age of the person to classify
    #[arg(long, default_value_t = 28)]
    age: u32,

    /// Favorite color: blue, red or green
    #[arg(long, default_value = "red")]
    color: String,

    /// Location: São Paulo, Rio or Curitiba
    #[arg(long, default_value = "Rio")]
    location: String,

    /// Age mapped to 0 when normalizing
    #[arg(long, default_value_t = 0.0)]
    min_age: f64,

    /// Age mapped to 1 when normalizing
    #[arg(long, default_value_t = 100.0)]
    max_age: f64,

    /// Number of epochs to train the network for
    #[arg(short, long, default_value_t = DEFAULT_EPOCHS)]
    epochs: usize,

    /// Learning rate of the Adam optimizer
    #[arg(short, long, default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f64,

    /// Seed for weight initialization and shuffling
    #[arg(short, long)]
    seed: Option<u64>,

    /// Debug mode (save loss in a "epoch     loss" format)
    #[arg(long)]
    debug_path: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Write the log to this file instead of stderr
    #[arg(long)]
    log_file: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Write the losses to a debug file
fn write_losses(debug_path: &str, losses: &[(usize, f64)]) -> std::io::Result<()> {
    let mut file = File::create(debug_path)?;

    for (x, y) in losses {
        file.write_all(format!("{}    {}\n", x, y).as_bytes())?;
    }

    Ok(())
}

fn init_logger(args: &Args) -> Result<(), TierError> {
    let level = LevelFilter::from(args.log_level);

    // Fails only if a logger is already installed
    let _ = match &args.log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?),
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    };

    Ok(())
}

fn load_dataset(args: &Args, bounds: AgeBounds) -> Result<Dataset, TierError> {
    let dataset = match (&args.data, &args.table) {
        (Some(path), _) => people::parse_dataset(path, bounds)?,
        (None, Some(path)) => table::parse_dataset(path)?,
        (None, None) => reference::dataset(),
    };
    info!("Loaded {} training rows", dataset.len());

    Ok(dataset)
}

fn run(args: Args) -> Result<(), TierError> {
    let bounds = AgeBounds::new(args.min_age, args.max_age)?;
    let dataset = load_dataset(&args, bounds)?;

    let config = TrainConfig {
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        seed: args.seed,
        ..TrainConfig::default()
    };

    let mut losses = vec![];
    let neural_net = model::train(&dataset, &config, |stats| {
        println!("Epoch {}: loss = {}", stats.epoch, stats.loss);
        losses.push((stats.epoch, stats.loss));
    })?;

    if let Some(debug_path) = &args.debug_path {
        write_losses(debug_path, &losses)?;
    }

    let person = PersonRecord {
        name: args.name,
        age: args.age,
        color: args.color,
        location: args.location,
    };
    let features = encode_record(&person, bounds)?;
    let result = model::predict(&neural_net, &features)?;
    let top = result.rank();

    info!("{} scored {:?}", person.name, result.entries());
    println!("{} {:.2}% de certeza", top.label(), top.percentage());

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_logger(&args) {
        eprintln!("Could not start logging: {}", err);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
