pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::route::RouteArgs;

#[derive(Debug, Parser)]
#[command(
    name = "procura",
    about = "Procura approval routing CLI",
    long_about = "Inspect configuration, validate the approval catalog, and resolve approval paths.",
    after_help = "Examples:\n  procura doctor --json\n  procura catalog\n  procura route --amount 250000000 --department finance --worksite SERA --destination KAL-BPN"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog coverage, and template determinism")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Summarize amount ranges, path templates, and matrix size as JSON")]
    Catalog,
    #[command(about = "Resolve the approval path for a proposal and print it as JSON")]
    Route(RouteArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = logging::init_from_env() {
        eprintln!("logging disabled: {error:#}");
    }

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Catalog => commands::catalog::run(),
        Command::Route(args) => commands::route::run(&args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
