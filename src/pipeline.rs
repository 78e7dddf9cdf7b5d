//! Workflow orchestration: search, download, enhance, upload.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use crate::Result;
use crate::config::WorkflowConfig;
use crate::download::{self, DownloadError, DownloadReport, DownloadedFile};
use crate::earthdata::{EarthdataClient, GranuleHit, SearchError, SearchQuery};
use crate::types::band_name;
use crate::upload::GeeUploader;

/// Counters describing one workflow run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineReport {
    /// Search failed but the run continued into the upload stage
    pub search_failed: bool,
    pub download: DownloadReport,
    /// Files tracked for enhancement, freshly fetched or already present
    pub tracked_files: usize,
    pub uploads_completed: usize,
    pub upload_errors: usize,
    pub rows_matched: usize,
    pub rows_unmatched: usize,
}

fn folder_has_files(folder: &Path) -> bool {
    fs::read_dir(folder)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Run the configured stages end to end, searching and fetching with the
/// given closures.
///
/// Per-file download failures and per-band upload failures are logged,
/// counted, and stepped over. A search failure is fatal only when nothing
/// else can proceed: with an upload stage configured, the run carries on
/// against whatever is already on disk.
pub fn run_workflow_with<S, F>(
    config: &WorkflowConfig,
    search: S,
    fetch: F,
) -> Result<PipelineReport>
where
    S: FnOnce(&SearchQuery) -> std::result::Result<Vec<GranuleHit>, SearchError>,
    F: FnMut(&str, &Path) -> std::result::Result<(), DownloadError>,
{
    let mut report = PipelineReport::default();
    let mut by_band: BTreeMap<String, Vec<DownloadedFile>> = BTreeMap::new();

    if config.action.includes_download() {
        match search(&config.search_query()) {
            Ok(hits) => {
                let (files, download_report) = download::download_granules_with(
                    &hits,
                    &config.search.file_types,
                    &config.download.root,
                    fetch,
                );
                report.download = download_report;
                report.tracked_files = files.len();
                info!("tracking {} files for enhancement", files.len());
                by_band = download::organize_by_band(files);
            }
            Err(err) if config.action.includes_upload() => {
                error!("search failed, continuing with upload stage: {}", err);
                report.search_failed = true;
            }
            Err(err) => return Err(err.into()),
        }
    }

    if config.action.includes_upload() {
        let uploader = GeeUploader::new(&config.upload.program, &config.upload.user_email);

        for file_type in &config.search.file_types {
            let band = band_name(file_type);
            let folder = config.download.root.join(band);
            if !folder_has_files(&folder) {
                debug!("no files under {}, skipping", folder.display());
                continue;
            }

            let destination = config.upload.collection_for(band);
            info!("processing folder {} -> {}", folder.display(), destination);

            let files = by_band.get(band).map(|files| files.as_slice());
            match uploader.stage_and_upload(&folder, &destination, &config.upload.manifest, files)
            {
                Ok(summary) => {
                    info!("uploaded {} data to {}", band, destination);
                    report.uploads_completed += 1;
                    report.rows_matched += summary.matched;
                    report.rows_unmatched += summary.unmatched;
                }
                Err(err) => {
                    error!("failed to upload {} data: {}", band, err);
                    report.upload_errors += 1;
                }
            }
        }
    }

    Ok(report)
}

/// Run the configured stages end to end over the Earthdata archive.
pub fn run_workflow(config: &WorkflowConfig) -> Result<PipelineReport> {
    if !config.action.includes_download() {
        // the closures are never called without a download stage
        return run_workflow_with(config, |_| Ok(Vec::new()), |_, _| Ok(()));
    }

    let token = std::env::var("EARTHDATA_TOKEN").ok();
    if token.is_none() {
        debug!("EARTHDATA_TOKEN not set, fetching without authentication");
    }
    let client = EarthdataClient::new(token)?;
    run_workflow_with(
        config,
        |query| client.search_granules(query),
        |url, target| client.fetch(url, target),
    )
}
