//! Upload manifest enhancement.
//!
//! The upload tool generates a bare manifest CSV (one row per file, keyed by
//! `id_no`). Enhancement appends the metadata columns the asset catalog
//! expects and fills them for every row whose `id_no` matches a downloaded
//! file, leaving unmatched rows and foreign columns untouched.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::download::DownloadedFile;
use crate::granule::{GranuleId, epsg_label};

/// Metadata columns appended to the manifest, in append order.
///
/// This is a fixed mapping table: record fields fill columns of the same
/// name, `system:time_start`/`system:time_end`/`EPSG`/`band_type` are
/// derived, and columns not listed here are never written to.
pub const METADATA_COLUMNS: [&str; 43] = [
    "system:time_start",
    "system:time_end",
    "EPSG",
    "band_type",
    "attr_identifier_product_doi",
    "attr_identifier_product_doi_authority",
    "begin_orbit_number",
    "beginning_date_time",
    "collection_concept_id",
    "concept_id",
    "concept_type",
    "day_night_flag",
    "east_lon",
    "end_orbit_number",
    "ending_date_time",
    "format",
    "granule_ur",
    "mgrs_tile",
    "native_id",
    "north_lat",
    "orbit_number",
    "orbit_number_from_filename",
    "parameter_names",
    "pge_version",
    "platform_short_name",
    "processing_ID",
    "processing_level",
    "production_date_time",
    "provider_date_insert",
    "provider_date_update",
    "provider_id",
    "revision_date",
    "revision_id",
    "sensor",
    "short_name",
    "size_mb",
    "south_lat",
    "time_start",
    "version",
    "version_from_filename",
    "west_lon",
    "scene",
    "orbit_scene",
];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    NotFound(PathBuf),

    #[error("manifest {path} has no {column} column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Row counts reported back from an enhancement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnhanceSummary {
    pub matched: usize,
    pub unmatched: usize,
}

struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Table { headers, rows })
    }

    fn ensure_metadata_columns(&mut self) {
        for col in METADATA_COLUMNS {
            if !self.headers.iter().any(|h| h == col) {
                self.headers.push(col.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require_column(&self, name: &str, path: &Path) -> Result<usize, ManifestError> {
        self.column(name).ok_or_else(|| ManifestError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    }

    fn metadata_indices(&self) -> HashMap<&'static str, usize> {
        METADATA_COLUMNS
            .iter()
            .filter_map(|&col| self.column(col).map(|i| (col, i)))
            .collect()
    }

    fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn fill_row(row: &mut [String], meta_idx: &HashMap<&'static str, usize>, file: &DownloadedFile) {
    for &i in meta_idx.values() {
        row[i].clear();
    }

    let fields = file.record.to_fields();
    for (col, &i) in meta_idx {
        if let Some(value) = fields.get(*col) {
            row[i] = value.clone();
        }
    }

    if let Some(&i) = meta_idx.get("system:time_start") {
        if let Some(ms) = file.record.time_start {
            row[i] = ms.to_string();
        }
    }
    if let Some(&i) = meta_idx.get("system:time_end") {
        if let Some(ms) = file.record.time_end {
            row[i] = ms.to_string();
        }
    }
    if let Some(&i) = meta_idx.get("band_type") {
        row[i] = file.band.clone();
    }
    if let Some(&i) = meta_idx.get("EPSG") {
        match epsg_label(&file.record.id.tile) {
            Ok(label) => row[i] = label,
            Err(err) => warn!("cannot resolve EPSG for {}: {}", file.record.id.tile, err),
        }
    }
}

/// Merge downloaded-file metadata into the manifest at `path`.
///
/// Rows match on `id_no` equal to the file name without extension. Matched
/// rows have every metadata column rewritten from the file's record;
/// unmatched rows are counted and left as they were.
pub fn enhance_manifest(
    path: &Path,
    files: &[DownloadedFile],
) -> Result<EnhanceSummary, ManifestError> {
    info!("enhancing manifest {}", path.display());

    let mut table = Table::load(path)?;
    table.ensure_metadata_columns();
    let id_idx = table.require_column("id_no", path)?;
    let meta_idx = table.metadata_indices();

    let by_stem: HashMap<String, &DownloadedFile> =
        files.iter().map(|f| (f.stem(), f)).collect();

    let mut summary = EnhanceSummary::default();
    for row in &mut table.rows {
        match by_stem.get(row[id_idx].as_str()) {
            Some(file) => {
                fill_row(row, &meta_idx, file);
                summary.matched += 1;
            }
            None => summary.unmatched += 1,
        }
    }

    table.save(path)?;
    info!(
        "enhanced manifest {}: {} matched, {} unmatched",
        path.display(),
        summary.matched,
        summary.unmatched
    );
    Ok(summary)
}

/// Fallback enhancement for upload-only runs, where no download records
/// exist. Scans `folder` for `.tif` files and fills only the fields the
/// filename itself carries: band type, MGRS tile, and EPSG code.
pub fn enhance_manifest_from_folder(
    path: &Path,
    folder: &Path,
) -> Result<EnhanceSummary, ManifestError> {
    let band = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut table = Table::load(path)?;
    table.ensure_metadata_columns();
    let id_idx = table.require_column("id_no", path)?;
    let meta_idx = table.metadata_indices();

    let mut stems = HashSet::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(stem) = name.to_string_lossy().strip_suffix(".tif") {
            stems.insert(stem.to_string());
        }
    }

    let mut summary = EnhanceSummary::default();
    for row in &mut table.rows {
        if !stems.contains(row[id_idx].as_str()) {
            summary.unmatched += 1;
            continue;
        }
        summary.matched += 1;

        if let Some(&i) = meta_idx.get("band_type") {
            row[i] = band.clone();
        }
        match row[id_idx].parse::<GranuleId>() {
            Ok(id) => {
                if let Some(&i) = meta_idx.get("mgrs_tile") {
                    row[i] = id.tile.clone();
                }
                if let Some(&i) = meta_idx.get("EPSG") {
                    match epsg_label(&id.tile) {
                        Ok(label) => row[i] = label,
                        Err(err) => warn!("cannot resolve EPSG for {}: {}", id.tile, err),
                    }
                }
            }
            Err(err) => debug!("file name {} does not parse: {}", row[id_idx], err),
        }
    }

    table.save(path)?;
    Ok(summary)
}
