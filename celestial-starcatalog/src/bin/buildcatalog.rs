//! Load the merged catalog into an SQLite database.

use anyhow::Context;
use celestial_starcatalog::catalogs::{
    Bsc, CutoverCondition, CutoverMagnitudes, DatabaseBackendCreator, Hipparcos, Tycho2, Ucac4,
};
use celestial_starcatalog::{Catalog, CatalogConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "buildcatalog")]
#[command(about = "Add stars from the file catalogs to a database catalog")]
#[command(version)]
struct Cli {
    /// Database file to create or extend
    database: PathBuf,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base directory for all catalogs; used when no single catalog is named
    #[arg(short = 'a', long)]
    all: Option<PathBuf>,

    /// Bright Star Catalogue directory
    #[arg(short = 'B', long)]
    bsc: Option<PathBuf>,

    /// Hipparcos catalog directory or file
    #[arg(short = 'H', long)]
    hipparcos: Option<PathBuf>,

    /// Tycho-2 catalog directory or file
    #[arg(short = 'T', long)]
    tycho2: Option<PathBuf>,

    /// UCAC4 catalog directory
    #[arg(short = 'U', long)]
    ucac4: Option<PathBuf>,

    /// Remove existing stars before loading
    #[arg(long)]
    clear: bool,

    /// Log progress every this many stars added
    #[arg(long, default_value = "100000")]
    log_interval: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

struct Sources {
    bsc: Option<PathBuf>,
    hipparcos: Option<PathBuf>,
    tycho2: Option<PathBuf>,
    ucac4: Option<PathBuf>,
}

impl Sources {
    fn from_cli(cli: &Cli, config: &CatalogConfig) -> Self {
        let named = cli.bsc.is_some()
            || cli.hipparcos.is_some()
            || cli.tycho2.is_some()
            || cli.ucac4.is_some();
        if named {
            return Self {
                bsc: cli.bsc.clone(),
                hipparcos: cli.hipparcos.clone(),
                tycho2: cli.tycho2.clone(),
                ucac4: cli.ucac4.clone(),
            };
        }
        let basedir = cli.all.clone().unwrap_or_else(|| config.basedir.clone());
        Self {
            bsc: Some(basedir.join("bsc")),
            hipparcos: Some(basedir.join("hipparcos")),
            tycho2: Some(basedir.join("tycho2")),
            ucac4: Some(basedir.join("u4")),
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Add every star of `catalog` that `condition` accepts; returns the count.
fn add_from_catalog(
    creator: &mut DatabaseBackendCreator,
    catalog: &dyn Catalog,
    mut condition: CutoverCondition,
    log_interval: u64,
) -> anyhow::Result<u64> {
    let mut added = 0u64;
    let mut steps = 0u64;
    let mut failed = 0u64;
    for star in catalog.begin()? {
        steps += 1;
        let star = match star {
            Ok(star) => star,
            Err(e) => {
                debug!("{} record {} skipped: {}", catalog.name(), steps, e);
                failed += 1;
                continue;
            }
        };
        if !condition.accepts(&star) {
            continue;
        }
        creator.add(&star)?;
        added += 1;
        if log_interval > 0 && added % log_interval == 0 {
            info!("{} stars added from {}, {} skipped", added, catalog.name(), steps - added);
        }
    }
    info!("{} stars added from {}, {} unreadable, {}", added, catalog.name(), failed, condition);
    Ok(added)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CatalogConfig::load(cli.config.as_deref())
        .with_context(|| format!("cannot load configuration {:?}", cli.config))?;
    let cutover: CutoverMagnitudes = config.cutover;
    let sources = Sources::from_cli(&cli, &config);

    let mut creator = DatabaseBackendCreator::open(&cli.database)
        .with_context(|| format!("cannot open database {:?}", cli.database))?;
    if cli.clear {
        creator.clear()?;
    }
    info!("database {:?}, next star id {}", cli.database, creator.next_id());
    creator.prepare()?;

    let mut total = 0u64;
    if let Some(dir) = &sources.bsc {
        let catalog = Bsc::open(dir).with_context(|| format!("cannot open BSC at {:?}", dir))?;
        let condition = CutoverCondition::bsc(&cutover);
        total += add_from_catalog(&mut creator, &catalog, condition, cli.log_interval)?;
    } else {
        debug!("BSC disabled");
    }
    if let Some(path) = &sources.hipparcos {
        let catalog = Hipparcos::open(path)
            .with_context(|| format!("cannot open Hipparcos at {:?}", path))?;
        let condition = CutoverCondition::hipparcos(&cutover);
        total += add_from_catalog(&mut creator, &catalog, condition, cli.log_interval)?;
    } else {
        debug!("Hipparcos disabled");
    }
    if let Some(path) = &sources.tycho2 {
        let catalog = Tycho2::open(path)
            .with_context(|| format!("cannot open Tycho-2 at {:?}", path))?;
        let condition = CutoverCondition::tycho2(&cutover);
        total += add_from_catalog(&mut creator, &catalog, condition, cli.log_interval)?;
    } else {
        debug!("Tycho-2 disabled");
    }
    if let Some(dir) = &sources.ucac4 {
        let catalog = Ucac4::open(dir).with_context(|| format!("cannot open UCAC4 at {:?}", dir))?;
        let condition = CutoverCondition::ucac4(&cutover);
        total += add_from_catalog(&mut creator, &catalog, condition, cli.log_interval)?;
    } else {
        debug!("UCAC4 disabled");
    }

    creator.finalize()?;
    info!("{} stars added", total);

    info!("creating index");
    match creator.create_index() {
        Ok(()) => info!("index created"),
        Err(e) => warn!("error while creating index: {}", e),
    }
    Ok(())
}
