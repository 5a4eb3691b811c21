use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{CommandFactory, Parser, Subcommand};
use solar::{SOLAR_VERSION, compile_source, config::Config, error::Error, interpreter::runtime::headless::HeadlessHost,
            run_source};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Solar is a line-oriented scripting language with a sandboxed expression
/// evaluator.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, disable_help_subcommand = true)]
struct Args {
    /// Log more: `-v` for run progress, `-vv` for every instruction.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file. Defaults to `solar.toml` in the working directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs a Solar program.
    Run {
        /// The program file.
        file: PathBuf,
    },
    /// Prints the intermediate program a file compiles to.
    Compile {
        /// The program file.
        file: PathBuf,
    },
    /// Prints the version.
    Version,
    /// Prints this help.
    Help,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Oh noes! Solar threw an error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "solar=warn",
        1 => "solar=info",
        _ => "solar=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .init();
}

fn execute(args: &Args) -> Result<(), Error> {
    let Some(command) = &args.command else {
        print_help();
        return Ok(());
    };

    match command {
        Command::Run { file } => {
            let config = Config::discover(args.config.as_deref())?;
            let source = read_source(file)?;
            debug!(file = %file.display(), "running");
            run_source(&source, HeadlessHost::new(config.runtime.echo_output), &config)?;
        },
        Command::Compile { file } => {
            let config = Config::discover(args.config.as_deref())?;
            let program = compile_source(&read_source(file)?, &config)?;
            print!("{program}");
        },
        Command::Version => println!("solar {SOLAR_VERSION}"),
        Command::Help => print_help(),
    }
    Ok(())
}

fn print_help() {
    println!("{}", Args::command().render_help());
}

fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(),
                                                          source })
}
