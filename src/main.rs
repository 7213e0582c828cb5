use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;

use clipmon::app::{self, App, Command};
use clipmon::clipboard;
use clipmon::host::{Cue, FileSink, StdoutSink, TextSink};
use clipmon::logging;
use clipmon::storage::{ensure_directories, Config, ConfigStorage, TomlConfigStorage};
use clipmon::transform::TextFilter;
use clipmon::watcher::WatcherOptions;

#[derive(Parser)]
#[command(name = "clipmon")]
#[command(about = "Clipboard monitor that inserts new clipboard text", long_about = None)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/clipmon/clipmon.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard; reads toggle/start/stop/status/quit from stdin
    Run(RunArgs),

    /// Apply the configured transform to stdin and print the result
    Transform,

    /// Show the config file path and effective configuration
    Config {
        /// Write the default config file if it does not exist
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Append pasted text to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start watching immediately
    #[arg(long)]
    start: bool,

    /// Polling interval in seconds
    #[arg(long)]
    interval: Option<f64>,

    /// Idle timeout in minutes, 0 to never stop
    #[arg(long)]
    timeout: Option<u64>,

    /// Disable sounds
    #[arg(long)]
    silent: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (data_dir, config_dir) = ensure_directories()?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("clipmon.toml"));
    let storage = TomlConfigStorage::new(config_path);

    if let Some(Commands::Config { init: true }) = &cli.command {
        env_logger::init();
        return cmd_config_init(&storage);
    }

    let config = storage.load()?;
    init_logging(&config, data_dir.join("clipmon.log"))?;

    match cli.command {
        Some(Commands::Run(args)) => cmd_run(config, args),
        Some(Commands::Transform) => cmd_transform(&config),
        Some(Commands::Config { .. }) => cmd_config(&storage, &config),
        None => cmd_run(config, RunArgs::default()),
    }
}

/// Set up the file logger, or env_logger when file logging is off
fn init_logging(config: &Config, log_path: PathBuf) -> Result<()> {
    if config.general.log_to_file {
        logging::init_logger(
            log_path,
            &config.general.log_level,
            &config.general.echo_level,
        )
    } else {
        env_logger::init();
        Ok(())
    }
}

/// Run the interactive watcher loop
fn cmd_run(mut config: Config, args: RunArgs) -> Result<()> {
    if let Some(interval) = args.interval {
        config.autoinsert.interval_seconds = interval;
    }
    if let Some(timeout) = args.timeout {
        config.autoinsert.timeout_minutes = timeout;
    }
    if args.silent {
        config.autoinsert.sound = Cue::Silent;
    }

    let options = WatcherOptions::from_config(&config).context("Invalid watcher settings")?;
    let reader = clipboard::create_reader().context("Failed to open clipboard")?;

    let sink: Box<dyn TextSink> = match &args.output {
        Some(path) => Box::new(FileSink::open(path)?),
        None => Box::new(StdoutSink::new()),
    };
    log::info!("Inserting clips into {}", sink.describe());

    let mut app = App::new(options, reader, sink);

    let (tx, rx) = mpsc::channel();
    app::spawn_command_reader(tx)?;

    if args.start {
        app.handle_command(Command::Start);
    } else {
        eprintln!("clipmon: type \"toggle\" to start watching, \"quit\" to exit.");
    }

    app.run(rx)
}

/// Print stdin after the configured transform
fn cmd_transform(config: &Config) -> Result<()> {
    let filter = TextFilter::from_config(&config.transform)?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read from stdin")?;

    let mut out = io::stdout().lock();
    out.write_all(filter.apply(&input).as_bytes())
        .context("Failed to write to stdout")?;
    out.flush()?;
    Ok(())
}

/// Show config location and values
fn cmd_config(storage: &TomlConfigStorage, config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize configuration")?;

    println!("# {}", storage.path().display());
    print!("{}", rendered);
    Ok(())
}

fn cmd_config_init(storage: &TomlConfigStorage) -> Result<()> {
    if storage.path().exists() {
        println!("Config already exists at {}", storage.path().display());
        return Ok(());
    }

    storage.create_default()?;
    println!("Wrote default config to {}", storage.path().display());
    Ok(())
}
