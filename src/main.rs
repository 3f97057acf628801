mod cleaner;
mod cli;
mod error;
mod export;
mod fmt;
mod input;
mod models;
mod normalize;
mod partition;
mod pipeline;
mod reference;
mod report;
mod resolver;
mod settings;
mod table;

use clap::Parser;

use cli::{Cli, Commands, ProfileCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process(args) => cli::process::run(args),
        Commands::Check(args) => cli::check::run(args),
        Commands::Status {
            employees,
            cost_centers,
            categories,
        } => cli::status::run(&employees, &cost_centers, &categories),
        Commands::Profile { command } => match command {
            ProfileCommands::Set { name, url, token } => cli::profile::set(&name, &url, &token),
            ProfileCommands::List => cli::profile::list(),
            ProfileCommands::Remove { name } => cli::profile::remove(&name),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
