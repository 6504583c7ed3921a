mod config;
mod csv_import;
mod lists;
mod search;
mod select;
mod store;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use lists::Lists;
use store::Store;

#[derive(Parser, Debug)]
#[command(name = "sitedeck")]
struct Cli {
    /// Configuration file. Defaults to the per-user config directory.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Store file. Overrides the configured location.
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a stack,name,url CSV into the site list
    Import(ImportArgs),
    /// Query sites by name (tab-separated output for scripts)
    Query(QueryArgs),
    /// Clear the imported site list
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Replace the site list instead of merging into it
    #[arg(long, default_value_t = false)]
    replace: bool,

    #[arg(value_name = "FILE")]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search term (case-insensitive substring of the site name)
    query: String,
}

#[derive(Args, Debug)]
struct ClearArgs {
    /// Also clear the favorites list
    #[arg(long, default_value_t = false)]
    all: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let store_path = match cli.store {
        Some(path) => path,
        None => match &config.store_path {
            Some(path) => path.clone(),
            None => Store::default_path()?,
        },
    };
    let store = Store::open(store_path)?;
    let lists = Lists::load(store)?;

    if let Some(command) = cli.command {
        match command {
            Command::Import(args) => return handle_import(args, lists),
            Command::Query(args) => return handle_query(args, &lists),
            Command::Clear(args) => return handle_clear(args, lists),
        }
    }

    let mut app = ui::app::App::new(&config, lists);
    app.run()?;

    Ok(())
}

fn handle_import(args: ImportArgs, mut lists: Lists) -> Result<()> {
    let report = csv_import::read_csv_file(&args.input)?;
    if report.skipped > 0 {
        eprintln!("warning: skipped {} malformed lines", report.skipped);
    }

    let outcome = if args.replace {
        lists.import_replace(&report.sites)?
    } else {
        lists.import_merge(&report.sites)?
    };

    println!(
        "Imported {} sites ({} new, {} duplicates). Site list holds {}.",
        report.sites.len(),
        outcome.added,
        outcome.duplicates,
        outcome.total
    );
    if outcome.dropped_favorites > 0 {
        println!(
            "Dropped {} favorites no longer backed by the site list.",
            outcome.dropped_favorites
        );
    }

    Ok(())
}

fn handle_query(args: QueryArgs, lists: &Lists) -> Result<()> {
    let results: Vec<_> = match search::normalize_query(&args.query) {
        None => lists.sites().to_vec(),
        Some(q) => lists
            .sites()
            .iter()
            .filter(|site| search::matches(&site.name, &q))
            .cloned()
            .collect(),
    };

    // Header line, ignored by scripts that read the tab-separated rows
    if results.is_empty() {
        println!("No matches for \"{}\"", args.query);
    } else {
        println!("Found {} site(s) matching \"{}\"", results.len(), args.query);
    }

    // Results: name<TAB>url<TAB>stack
    for site in results {
        println!("{}\t{}\t{}", site.name, site.url, site.stack);
    }

    Ok(())
}

fn handle_clear(args: ClearArgs, mut lists: Lists) -> Result<()> {
    if args.all {
        lists.clear_all()?;
        println!("Cleared the site list and favorites.");
    } else {
        lists.clear_sites()?;
        println!("Cleared the site list. Favorites are kept.");
    }
    Ok(())
}
