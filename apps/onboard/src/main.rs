mod config;
mod layout;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client_core::{ContactImporter, HttpPageFetcher, ImportError, ImportReport};
use storage::StateStore;
use tracing::{info, warn};

use crate::config::{load_settings, DEFAULT_CONFIG_PATH};
use crate::layout::{apply_layout, load_layout};

#[derive(Parser, Debug)]
#[command(name = "onboard", about = "Prototype a company's workspace and client structure")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print illustrative SQL INSERT statements for the assembled org.
    Sql(Sources),
    /// Print the assembled org as JSON.
    State(Sources),
}

#[derive(Args, Debug, Default)]
struct Sources {
    /// CSV file with `name,email` rows to import.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Import contacts from the directory service.
    #[arg(long)]
    directory: bool,
    /// TOML layout of workspaces, clients, and role assignments.
    #[arg(long)]
    layout: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.config);
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| settings.log_filter.clone());
    tracing_subscriber::fmt()
        .with_env_filter(filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let fetcher = HttpPageFetcher::new(settings.directory_base_url.clone())?;
    let importer = ContactImporter::new(Arc::new(fetcher), settings.directory_options());
    let token = settings.directory_access_token.clone().unwrap_or_default();

    let (sources, as_sql) = match cli.command {
        Command::Sql(sources) => (sources, true),
        Command::State(sources) => (sources, false),
    };

    let mut store = StateStore::new();
    assemble(&mut store, &importer, &sources, &token).await?;

    if as_sql {
        println!("{}", projection::generate_sql(store.state()));
    } else {
        println!("{}", projection::state_json(store.state())?);
    }
    Ok(())
}

/// Runs the requested imports, then the layout. Import failures are reported
/// and skipped; a broken layout file aborts.
async fn assemble(
    store: &mut StateStore,
    importer: &ContactImporter,
    sources: &Sources,
    access_token: &str,
) -> Result<()> {
    if let Some(path) = &sources.csv {
        let existing = store.existing_emails();
        let result = match importer.load_csv_file(path, &existing).await {
            Ok(pending) => pending.apply(store),
            Err(err) => Err(err),
        };
        report(result);
    }

    if sources.directory {
        let result = match importer.load_directory(access_token).await {
            Ok(pending) => pending.apply(store),
            Err(err) => Err(err),
        };
        report(result);
    }

    if let Some(path) = &sources.layout {
        let layout = load_layout(path).await?;
        let summary = apply_layout(store, &layout);
        for message in &summary.skipped {
            eprintln!("layout: {message}");
        }
        info!(
            contacts = summary.contacts_added,
            workspaces = summary.workspaces,
            clients = summary.clients,
            assignments = summary.assignments,
            skipped = summary.skipped.len(),
            "applied layout"
        );
    }

    Ok(())
}

fn report(result: Result<ImportReport, ImportError>) {
    match result {
        Ok(report) => info!(
            source = %report.source,
            imported = report.imported,
            skipped = report.skipped,
            "import finished"
        ),
        Err(err) => {
            let notice = err.notice();
            warn!(code = ?notice.code, error = %err, "import failed");
            eprintln!("{}", notice.message);
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
