use billbook::api::BillbookApi;
use billbook::config::BillbookConfig;
use billbook::error::{BillbookError, Result};
use billbook::server::Server;
use billbook::store::fs::FileStore;
use billbook::tools;
use clap::Parser;
use serde_json::Value;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod args;
use args::{get_version, Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve => handle_serve(init_api(&cli.data_dir)?),
        Commands::Tools => handle_tools(),
        Commands::Call { tool, args } => handle_call(&init_api(&cli.data_dir)?, &tool, &args),
    }
}

fn init_logging(verbose: bool) {
    // Logs go to stderr; stdout carries protocol output.
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn init_api(data_dir: &Path) -> Result<BillbookApi<FileStore>> {
    let config = BillbookConfig::load(data_dir)?;
    let store = FileStore::from_config(data_dir.to_path_buf(), &config);
    Ok(BillbookApi::new(store, config))
}

fn handle_serve(api: BillbookApi<FileStore>) -> Result<()> {
    let server = Server::new(api, get_version());
    let stdin = std::io::stdin();
    server.run(stdin.lock(), std::io::stdout().lock())
}

fn handle_tools() -> Result<()> {
    for definition in tools::definitions() {
        println!("{:<24} {}", definition.name, definition.description);
    }
    Ok(())
}

fn handle_call(api: &BillbookApi<FileStore>, tool: &str, raw_args: &str) -> Result<()> {
    let args: Value = serde_json::from_str(raw_args).map_err(|e| BillbookError::InvalidArguments {
        tool: tool.to_string(),
        reason: format!("arguments are not valid JSON: {}", e),
    })?;
    let result = tools::call_by_name(api, tool, args)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
