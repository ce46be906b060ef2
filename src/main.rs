//! sieveplay — edit a Sieve script, watch the Cloudflare Email Worker it compiles to.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use sieveplay::config::{self, PlaygroundConfig};
use sieveplay::demo::DEFAULT_SCRIPT;
use sieveplay::logging::{init_logging, LogConfig};
use sieveplay::pipeline::CompilePipeline;
use sieveplay::state::StalePolicy;
use sieveplay::tui::App;

#[derive(Parser)]
#[command(
    name = "sieveplay",
    version,
    about = "Live Sieve → Cloudflare Email Worker playground"
)]
struct Cli {
    /// Sieve script to start from (default: built-in demo).
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Compile once, print the worker to stdout and exit.
    #[arg(long)]
    print: bool,

    /// Config file (default: ~/.sieveplay/config.yaml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs here instead of ~/.sieveplay/sieveplay.log.
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// What to do with results of runs superseded by a newer edit.
    #[arg(long = "stale-results", value_enum)]
    stale_results: Option<StalePolicy>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => PlaygroundConfig::load_from(path),
        None => PlaygroundConfig::load(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(policy) = cli.stale_results {
        config.stale_results = policy;
    }

    let logging = log_config(&cli, &config);
    // Said before the TUI takes over the terminal.
    if let Err(e) = logging.validate() {
        eprintln!("warning: {e}; using the default filter");
    }
    if let Err(e) = init_logging(&logging) {
        eprintln!("error: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let source = match &cli.file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                error!(path = %path.display(), "cannot read script: {e}");
                eprintln!("error: cannot read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_SCRIPT.to_string(),
    };

    if cli.print {
        print_once(&source, &config)
    } else {
        interactive(&source, &config)
    }
}

/// Stderr for `--print`; a file while the TUI owns the terminal.
fn log_config(cli: &Cli, config: &PlaygroundConfig) -> LogConfig {
    let log_file = if cli.print {
        cli.log_file.clone()
    } else {
        cli.log_file
            .clone()
            .or_else(|| config.log_file.clone())
            .or_else(config::default_log_path)
    };
    let directive = if cli.verbose > 0 {
        None
    } else {
        config.log_level.clone()
    };
    LogConfig::from_verbosity(cli.verbose)
        .with_directive(directive)
        .with_ansi(log_file.is_none())
        .with_log_file(log_file)
}

fn print_once(source: &str, config: &PlaygroundConfig) -> ExitCode {
    let pipeline = CompilePipeline::sieve(config.generate_opts());
    match pipeline.run(source) {
        Ok(code) => {
            print!("{code}");
            ExitCode::SUCCESS
        }
        Err(fault) => {
            eprintln!("Failed to compile\n{}", fault.message);
            ExitCode::FAILURE
        }
    }
}

fn interactive(source: &str, config: &PlaygroundConfig) -> ExitCode {
    info!(policy = ?config.stale_results, "starting interactive session");
    let mut app = App::new(source, config);
    // Give the mount run a moment so the first frame usually has output.
    app.wait_for_resolution(Duration::from_millis(200));

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("terminal error: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
