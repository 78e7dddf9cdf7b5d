//! Asset catalog upload through the external `geeup` tool.
//!
//! Uploading one band folder is a three-step sequence: `geeup getmeta`
//! writes a bare manifest for the folder, the manifest is enhanced with
//! granule metadata, and `geeup upload` pushes the folder against that
//! manifest. The tool is invoked as a subprocess and owns its own
//! authentication.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;
use tracing::info;

use crate::download::DownloadedFile;
use crate::manifest::{self, EnhanceSummary, ManifestError};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{command} exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Per-folder manifest path: `metadata.csv` + folder `LST` gives
/// `metadata_LST.csv` next to the base manifest.
pub fn folder_manifest_path(base: &Path, folder: &Path) -> PathBuf {
    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = base
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_{folder_name}");
    if let Some(ext) = base.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    base.with_file_name(name)
}

/// Wrapper around the `geeup` command line.
pub struct GeeUploader {
    program: String,
    user_email: String,
}

impl GeeUploader {
    pub fn new(program: &str, user_email: &str) -> Self {
        GeeUploader {
            program: program.to_string(),
            user_email: user_email.to_string(),
        }
    }

    fn check(&self, status: ExitStatus, subcommand: &str) -> Result<(), UploadError> {
        if status.success() {
            Ok(())
        } else {
            Err(UploadError::CommandFailed {
                command: format!("{} {}", self.program, subcommand),
                status,
            })
        }
    }

    /// Run `getmeta` to write the bare manifest for `folder`.
    pub fn generate_manifest(&self, folder: &Path, manifest: &Path) -> Result<(), UploadError> {
        info!(
            "running command: {} getmeta --input {} --metadata {}",
            self.program,
            folder.display(),
            manifest.display()
        );
        let status = Command::new(&self.program)
            .arg("getmeta")
            .arg("--input")
            .arg(folder)
            .arg("--metadata")
            .arg(manifest)
            .status()?;
        self.check(status, "getmeta")
    }

    /// Run `upload` for `folder` against an already-enhanced manifest.
    pub fn upload_folder(
        &self,
        folder: &Path,
        destination: &str,
        manifest: &Path,
    ) -> Result<(), UploadError> {
        info!(
            "running command: {} upload --source {} --dest {} -m {} -u {}",
            self.program,
            folder.display(),
            destination,
            manifest.display(),
            self.user_email
        );
        let status = Command::new(&self.program)
            .arg("upload")
            .arg("--source")
            .arg(folder)
            .arg("--dest")
            .arg(destination)
            .arg("-m")
            .arg(manifest)
            .arg("-u")
            .arg(&self.user_email)
            .status()?;
        self.check(status, "upload")
    }

    /// Full staging sequence for one band folder.
    ///
    /// With download records in hand the manifest is enhanced from them;
    /// without (upload-only runs) it falls back to what the folder's file
    /// names carry.
    pub fn stage_and_upload(
        &self,
        folder: &Path,
        destination: &str,
        manifest_base: &Path,
        files: Option<&[DownloadedFile]>,
    ) -> Result<EnhanceSummary, UploadError> {
        info!("uploading {} to {}", folder.display(), destination);
        let folder_manifest = folder_manifest_path(manifest_base, folder);
        self.generate_manifest(folder, &folder_manifest)?;

        let summary = match files {
            Some(files) => manifest::enhance_manifest(&folder_manifest, files)?,
            None => manifest::enhance_manifest_from_folder(&folder_manifest, folder)?,
        };

        self.upload_folder(folder, destination, &folder_manifest)?;
        Ok(summary)
    }
}
