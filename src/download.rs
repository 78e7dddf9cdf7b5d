//! Granule download loop.
//!
//! Walks search hits, classifies each data link against the requested
//! file-type suffixes, and fetches what is not already on disk. Presence is
//! judged by path and non-zero size only; a zero-byte file is treated as a
//! broken earlier attempt and refetched. Per-file failures are logged and
//! counted, never fatal.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::earthdata::{EarthdataClient, GranuleHit};
use crate::granule::GranuleRecord;
use crate::types::band_name;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("downloaded file failed verification (empty or missing): {0}")]
    Verification(PathBuf),
}

/// On-disk state of a download target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Missing,
    Empty,
    Ready,
}

pub fn target_state(path: &Path) -> TargetState {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => TargetState::Ready,
        Ok(_) => TargetState::Empty,
        Err(_) => TargetState::Missing,
    }
}

/// One file tracked by the download stage, whether freshly fetched or
/// already present, together with the granule record it belongs to.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub band: String,
    pub record: GranuleRecord,
}

impl DownloadedFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension; what the manifest's `id_no` column holds.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Counters for one pass over the search hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub errors: usize,
    pub unparsed: usize,
}

fn fetch_into<F>(fetch: &mut F, url: &str, dir: &Path, target: &Path) -> Result<(), DownloadError>
where
    F: FnMut(&str, &Path) -> Result<(), DownloadError>,
{
    fs::create_dir_all(dir)?;
    fetch(url, target)?;
    if target_state(target) != TargetState::Ready {
        return Err(DownloadError::Verification(target.to_path_buf()));
    }
    Ok(())
}

/// Download matching files for every hit, fetching with `fetch`.
///
/// Files land under `<root>/<band>/<filename>`. Hits whose granule UR does
/// not parse are skipped with a warning and counted as unparsed. Fetch and
/// verification failures are counted and the loop moves on to the next file.
pub fn download_granules_with<F>(
    hits: &[GranuleHit],
    file_types: &[String],
    root: &Path,
    mut fetch: F,
) -> (Vec<DownloadedFile>, DownloadReport)
where
    F: FnMut(&str, &Path) -> Result<(), DownloadError>,
{
    let mut files = Vec::new();
    let mut report = DownloadReport::default();

    for hit in hits {
        let record = match GranuleRecord::from_umm(&hit.meta, &hit.umm) {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping unparseable granule: {}", err);
                report.unparsed += 1;
                continue;
            }
        };

        for url in hit.data_links() {
            let filename = url.rsplit('/').next().unwrap_or_default();

            let mut matched_suffix = false;
            for suffix in file_types {
                if !filename.ends_with(suffix.as_str()) {
                    continue;
                }
                matched_suffix = true;

                let band = band_name(suffix);
                let dir = root.join(band);
                let target = dir.join(filename);

                match target_state(&target) {
                    TargetState::Ready => {
                        info!("already present, skipping: {}", filename);
                        files.push(DownloadedFile {
                            path: target,
                            band: band.to_string(),
                            record: record.clone(),
                        });
                        report.skipped += 1;
                    }
                    state => {
                        if state == TargetState::Empty {
                            warn!("empty file on disk, refetching: {}", filename);
                            if let Err(err) = fs::remove_file(&target) {
                                error!("cannot remove {}: {}", target.display(), err);
                                report.errors += 1;
                                break;
                            }
                        }
                        info!("downloading: {} -> {}", filename, dir.display());
                        match fetch_into(&mut fetch, &url, &dir, &target) {
                            Ok(()) => {
                                files.push(DownloadedFile {
                                    path: target,
                                    band: band.to_string(),
                                    record: record.clone(),
                                });
                                report.downloaded += 1;
                            }
                            Err(err) => {
                                error!("error downloading {}: {}", filename, err);
                                report.errors += 1;
                            }
                        }
                    }
                }
                break;
            }

            if !matched_suffix {
                debug!("skipping unrelated file: {}", filename);
            }
        }
    }

    (files, report)
}

/// Download matching files for every hit over the Earthdata client.
pub fn download_granules(
    client: &EarthdataClient,
    hits: &[GranuleHit],
    file_types: &[String],
    root: &Path,
) -> (Vec<DownloadedFile>, DownloadReport) {
    download_granules_with(hits, file_types, root, |url, target| {
        client.fetch(url, target)
    })
}

/// Group tracked files by band, preserving a stable band order.
pub fn organize_by_band(files: Vec<DownloadedFile>) -> BTreeMap<String, Vec<DownloadedFile>> {
    let mut by_band: BTreeMap<String, Vec<DownloadedFile>> = BTreeMap::new();
    for file in files {
        by_band.entry(file.band.clone()).or_default().push(file);
    }
    by_band
}
