use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use ecosync::types::{Action, DayNight};

#[derive(Parser)]
#[command(name = "ecosync", version, about = "ECOSYNC CLI")]
pub struct CliArgs {
    /// Config file (TOML); when omitted, ecosync.toml is used if present
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stages to run (download, upload or both)
    #[arg(short, long, value_enum)]
    pub action: Option<Action>,

    /// Product short name, e.g. ECO_L2T_LSTE
    #[arg(long)]
    pub short_name: Option<String>,

    /// MGRS tile to search, e.g. 18TUN
    #[arg(short, long)]
    pub tile: Option<String>,

    /// Start of the acquisition date range (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// End of the acquisition date range (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Day or night acquisitions
    #[arg(long, value_enum)]
    pub day_night: Option<DayNight>,

    /// File-type suffixes to process, comma separated (e.g. LST.tif,QC.tif)
    #[arg(long, value_delimiter = ',')]
    pub file_types: Option<Vec<String>>,

    /// Root directory for downloads; files land under <root>/<band>/
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    /// Base manifest CSV; per-band manifests are derived from it
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Destination collection prefix, e.g. projects/p/assets/Ecostress
    #[arg(long)]
    pub collection: Option<String>,

    /// Upload account email
    #[arg(short, long)]
    pub user_email: Option<String>,

    /// Enable debug logging regardless of the configured level
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
