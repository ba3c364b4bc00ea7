//! Look stars up by name or list the stars in an area of the sky.

use anyhow::Context;
use celestial_starcatalog::angle::parse_sexagesimal;
use celestial_starcatalog::deepsky::{
    DeepSkyCatalog, DeepSkyCatalogCache, DeepSkyCatalogKind, DeepSkyObject,
};
use celestial_starcatalog::{
    open_configured, Angle, Catalog, CatalogConfig, CatalogKind, MagnitudeRange, RaDec, SkyWindow,
    Star,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeepSkySource {
    Ngcic,
    Pgc,
    Stellarium,
}

impl From<DeepSkySource> for DeepSkyCatalogKind {
    fn from(source: DeepSkySource) -> Self {
        match source {
            DeepSkySource::Ngcic => DeepSkyCatalogKind::NgcIc,
            DeepSkySource::Pgc => DeepSkyCatalogKind::Pgc,
            DeepSkySource::Stellarium => DeepSkyCatalogKind::Stellarium,
        }
    }
}

#[derive(Parser)]
#[command(name = "starcatalog")]
#[command(about = "Query the star and deep-sky catalogs")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog base directory, overrides the configuration
    #[arg(short = 'p', long, global = true)]
    basedir: Option<PathBuf>,

    /// SQLite catalog file, overrides the configuration
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Backend to query: bsc, hipparcos, sao, tycho2, ucac4, combined, database
    #[arg(short, long, global = true, default_value = "combined")]
    backend: CatalogKind,

    /// Output format
    #[arg(long, value_enum, global = true, default_value = "table")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stars by name, e.g. HIP032349 or "T5949 02777 1"
    Star {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List stars in a rectangle around a center
    Area {
        /// Right ascension of the center (hours, or h:m:s)
        #[arg(short = 'R', long, default_value = "0")]
        ra: String,
        /// Declination of the center (degrees, or d:m:s)
        #[arg(short = 'D', long, default_value = "0", allow_hyphen_values = true)]
        dec: String,
        /// Width in right ascension (degrees)
        #[arg(short = 'W', long, default_value = "1.0")]
        width: f64,
        /// Height in declination (degrees)
        #[arg(short = 'H', long, default_value = "1.0")]
        height: f64,
        /// Faintest magnitude listed
        #[arg(default_value = "6.0", allow_hyphen_values = true)]
        faintest: f32,
    },
    /// Print the backend name and its number of stars
    Info,
    /// Look up deep-sky objects
    Deepsky {
        /// Catalog to search
        #[arg(long, value_enum, default_value = "ngcic")]
        catalog: DeepSkySource,
        /// Treat the names as prefixes and list matching names
        #[arg(long)]
        like: bool,
        /// Maximum number of names listed with --like
        #[arg(long, default_value = "20")]
        max: usize,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(serde::Serialize)]
struct JsonStar<'a> {
    name: &'a str,
    longname: &'a str,
    catalog: char,
    catalognumber: u64,
    ra_deg: f64,
    dec_deg: f64,
    pm_ra_mas: f64,
    pm_dec_mas: f64,
    mag: f32,
}

impl<'a> From<&'a Star> for JsonStar<'a> {
    fn from(star: &'a Star) -> Self {
        Self {
            name: &star.name,
            longname: star.longname.trim(),
            catalog: star.catalog,
            catalognumber: star.catalognumber,
            ra_deg: star.ra().degrees(),
            dec_deg: star.dec().degrees(),
            pm_ra_mas: star.pm.ra.degrees() * 3_600_000.0,
            pm_dec_mas: star.pm.dec.degrees() * 3_600_000.0,
            mag: star.mag,
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

fn load_config(cli: &Cli) -> anyhow::Result<CatalogConfig> {
    let mut config = CatalogConfig::load(cli.config.as_deref())
        .with_context(|| format!("cannot load configuration {:?}", cli.config))?;
    if let Some(basedir) = &cli.basedir {
        config.basedir = basedir.clone();
    }
    if let Some(database) = &cli.database {
        config.database = Some(database.clone());
    }
    debug!("configuration: {:?}", config);
    Ok(config)
}

fn print_stars<'a>(
    stars: impl IntoIterator<Item = &'a Star>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let stars: Vec<&Star> = stars.into_iter().collect();
    match format {
        OutputFormat::Table => {
            for star in &stars {
                println!(
                    "{:<18} {:<10} {} {:6.2}",
                    star.name,
                    star.longname.trim(),
                    star.position,
                    star.mag
                );
            }
        }
        OutputFormat::Json => {
            let json: Vec<JsonStar<'_>> = stars.iter().map(|s| JsonStar::from(*s)).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            println!("name,longname,catalog,catalognumber,ra_deg,dec_deg,pm_ra_mas,pm_dec_mas,mag");
            for star in &stars {
                let s = JsonStar::from(*star);
                println!(
                    "{},{},{},{},{},{},{},{},{}",
                    s.name,
                    s.longname,
                    s.catalog,
                    s.catalognumber,
                    s.ra_deg,
                    s.dec_deg,
                    s.pm_ra_mas,
                    s.pm_dec_mas,
                    s.mag
                );
            }
        }
    }
    Ok(())
}

fn print_object(object: &DeepSkyObject, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(object)?),
        OutputFormat::Table | OutputFormat::Csv => {
            let mag = object.mag.map(|m| format!("{:.1}", m)).unwrap_or_default();
            let size = object
                .major_axis
                .map(|a| format!("{:.1}'", a.degrees() * 60.0))
                .unwrap_or_default();
            println!(
                "{:<12} {} {:<3} {:>5} {:>7} {}",
                object.name, object.position, object.constellation, mag, size, object.classification
            );
            if !object.names.is_empty() {
                let names: Vec<&str> = object.names.iter().map(String::as_str).collect();
                println!("             also: {}", names.join(", "));
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Star { names } => {
            let catalog = open_configured(cli.backend, &config)
                .with_context(|| format!("cannot open {} catalog", cli.backend))?;
            let mut stars = Vec::with_capacity(names.len());
            for name in names {
                stars.push(catalog.find(name).with_context(|| format!("star {}", name))?);
            }
            print_stars(&stars, cli.format)?;
        }
        Commands::Area {
            ra,
            dec,
            width,
            height,
            faintest,
        } => {
            let center = RaDec::from_hours_degrees(
                parse_sexagesimal(ra).with_context(|| format!("cannot parse RA '{}'", ra))?,
                parse_sexagesimal(dec).with_context(|| format!("cannot parse Dec '{}'", dec))?,
            );
            let window = SkyWindow::new(
                center,
                Angle::from_degrees(*width),
                Angle::from_degrees(*height),
            );
            let magrange = MagnitudeRange::new(MagnitudeRange::NO_BRIGHT_LIMIT, *faintest);
            debug!("listing stars in {} {}", window, magrange);

            let catalog = open_configured(cli.backend, &config)
                .with_context(|| format!("cannot open {} catalog", cli.backend))?;
            let stars = catalog.find_window(&window, &magrange)?;
            print_stars(&stars, cli.format)?;
            debug!("{} stars found", stars.len());
        }
        Commands::Info => {
            let catalog = open_configured(cli.backend, &config)
                .with_context(|| format!("cannot open {} catalog", cli.backend))?;
            println!("{}: {} stars", catalog.name(), catalog.number_of_stars()?);
        }
        Commands::Deepsky {
            catalog,
            like,
            max,
            names,
        } => {
            let mut cache = DeepSkyCatalogCache::new(config.deepsky_dir());
            let catalog = cache.get((*catalog).into())?;
            for name in names {
                if *like {
                    for found in catalog.find_like(name, *max) {
                        println!("{}", found);
                    }
                } else {
                    let object = catalog.find(name).with_context(|| format!("object {}", name))?;
                    print_object(&object, cli.format)?;
                }
            }
        }
    }

    Ok(())
}
