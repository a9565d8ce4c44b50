use anyhow::Result;
use clap::Parser;
use colored::*;
use layoutmap::cli::{Cli, Commands};
use layoutmap::commands::CompareConfig;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    if let Err(err) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        if let Some(hint) = err
            .downcast_ref::<layoutmap::Error>()
            .and_then(|e| e.recovery())
        {
            eprintln!("{} {}", "Suggestion:".blue(), hint);
        }
        std::process::exit(1);
    }
}

// Main orchestrator function
fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Compare {
            project_root,
            docs,
            output,
            status_file,
            generate_scripts,
            scripts_output,
            no_validation,
        } => layoutmap::commands::run_compare(CompareConfig {
            project_root,
            docs,
            output,
            status_file,
            generate_scripts,
            scripts_output,
            no_validation,
            verbosity: cli.verbosity,
        }),
        Commands::Status { file, action } => layoutmap::commands::handle_status(&file, action),
        Commands::Init { force } => layoutmap::commands::init_config(force),
    }
}

/// `-v` shows info, `-vv` debug; `RUST_LOG` takes precedence.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
