#![doc = r#"
ECOSYNC — an ECOSTRESS tiled-product sync toolkit.

This crate searches the NASA Earthdata CMR archive for tiled ECOSTRESS
granules, downloads selected file types into band-named folders, extracts
granule metadata into upload manifests, and hands the staged folders to the
`geeup` command line tool for ingestion into Google Earth Engine image
collections. It powers the ECOSYNC CLI and can be embedded in your own Rust
applications.

Stability
---------
The public library API is experimental in initial releases. It is built on
top of a working MVP used by the CLI and is robust, but may evolve as the
crate stabilizes. Breaking changes can occur.

Requirements
------------
- An Earthdata bearer token in `EARTHDATA_TOKEN` for protected downloads.
- The `geeup` tool on `PATH` (or configured explicitly) for upload runs.
- Rust 2024 edition toolchain.

Add dependency
--------------
```toml
[dependencies]
ecosync = "0.1"
```

Quick start: run the configured workflow
----------------------------------------
```rust,no_run
use ecosync::config::WorkflowConfig;
use ecosync::pipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WorkflowConfig::default();
    let report = pipeline::run_workflow(&config)?;

    println!(
        "downloaded={} skipped={} errors={}",
        report.download.downloaded, report.download.skipped, report.download.errors
    );
    Ok(())
}
```

Parse granule names and resolve tiles
-------------------------------------
```rust
use ecosync::{GranuleId, epsg_label};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let id: GranuleId =
        "ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01_LST.tif".parse()?;

    assert_eq!(id.tile, "18TUN");
    assert_eq!(id.band.as_deref(), Some("LST"));
    assert_eq!(epsg_label(&id.tile)?, "EPSG32618");
    Ok(())
}
```

Search the archive directly
---------------------------
```rust,no_run
use chrono::NaiveDate;
use ecosync::earthdata::{EarthdataClient, SearchQuery};
use ecosync::types::DayNight;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = EarthdataClient::new(std::env::var("EARTHDATA_TOKEN").ok())?;
    let query = SearchQuery {
        short_name: "ECO_L2T_LSTE".to_string(),
        tile: "18TUN".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        day_night: DayNight::Day,
    };

    let hits = client.search_granules(&query)?;
    println!("{} granules", hits.len());
    Ok(())
}
```

Error handling
--------------
All public functions return `ecosync::Result<T>` or a module error type;
match on `ecosync::Error` to handle specific cases, e.g. search or download
failures.

```rust,no_run
use ecosync::config::WorkflowConfig;
use ecosync::{Error, pipeline};

fn main() {
    let config = WorkflowConfig::default();
    match pipeline::run_workflow(&config) {
        Ok(report) => println!("tracked {} files", report.tracked_files),
        Err(Error::Search(e)) => eprintln!("search error: {e}"),
        Err(Error::Download(e)) => eprintln!("download error: {e}"),
        Err(other) => eprintln!("other error: {other}"),
    }
}
```

Useful modules
--------------
- [`pipeline`] — high-level, end-to-end workflow entry point.
- [`config`] — TOML-backed workflow configuration.
- [`granule`] — granule naming, MGRS tile geodesy, and metadata extraction.
- [`earthdata`] — CMR search client and authenticated downloads.
- [`download`] — skip-aware download loop and band folder layout.
- [`manifest`] — upload manifest enhancement.
- [`upload`] — `geeup` invocation.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod config;
pub mod download;
pub mod earthdata;
pub mod error;
pub mod granule;
pub mod manifest;
pub mod pipeline;
pub mod types;
pub mod upload;

// Curated public API surface
// Types
pub use config::WorkflowConfig;
pub use error::{Error, Result};
pub use types::{Action, DayNight};

// Granule naming and tile geodesy
pub use granule::{GranuleId, GranuleRecord, InvalidTileError, ParseError, epsg_label, utm_epsg};

// Archive access
pub use earthdata::{EarthdataClient, GranuleHit, SearchQuery};
pub use download::{DownloadReport, DownloadedFile};

// Staging and upload
pub use manifest::{EnhanceSummary, enhance_manifest};
pub use upload::GeeUploader;

// High-level API re-exports
pub use pipeline::{PipelineReport, run_workflow};
