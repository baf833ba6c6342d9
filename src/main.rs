mod ads;
mod cli;
mod context;
mod db;
mod error;
mod fmt;
mod html;
mod models;
mod registry;
mod report;
mod request;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, default_user } => cli::init::run(data_dir, default_user),
        Commands::Demo => cli::demo::run(),
        Commands::Reports { as_user, quick, format } => cli::report::list(as_user, quick, format),
        Commands::Report {
            name,
            as_user,
            page,
            per_page,
            sort,
            dir,
            query,
            format,
        } => cli::report::show(cli::report::ReportArgs {
            name,
            as_user,
            page,
            per_page,
            sort,
            dir,
            query,
            format,
        }),
        Commands::SyncAds { source } => cli::sync::run(source),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
