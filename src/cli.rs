use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "eve-killmail-to-csv")]
#[command(version, about = "Flatten EVE Online killmail JSON files into a CSV table")]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Catalog CSV locations
#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Ship catalog CSV (id,name,type)
    #[arg(long)]
    pub ships: Option<PathBuf>,

    /// Type catalog CSV (type id and name columns)
    #[arg(long)]
    pub types: Option<PathBuf>,

    /// Solar system catalog CSV (mapSolarSystems layout)
    #[arg(long)]
    pub systems: Option<PathBuf>,

    /// Config file (default: config.json in the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a directory or zip archive of killmail JSON files to CSV
    Convert {
        /// Directory of *.json killmails, or a .zip archive of them
        input: PathBuf,

        /// Output CSV path
        output: PathBuf,

        #[command(flatten)]
        catalogs: CatalogArgs,

        /// Records read and flattened per chunk
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Worker threads used for flattening
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Write values as found instead of coercing them to column types
        #[arg(long)]
        no_narrow: bool,

        /// Show the full-screen progress interface
        #[arg(long)]
        tui: bool,
    },

    /// Load the catalogs and report what was found
    Catalogs {
        #[command(flatten)]
        catalogs: CatalogArgs,
    },

    /// List the output columns in order
    Columns,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

impl CatalogArgs {
    /// Settings given on the command line, as config overrides
    pub fn overrides(&self) -> Config {
        Config {
            ships: self.ships.clone(),
            types: self.types.clone(),
            systems: self.systems.clone(),
            ..Default::default()
        }
    }
}
