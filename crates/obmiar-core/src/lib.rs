use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod building;
pub mod codec;
mod dispatch;
mod options;
mod view;

pub use dispatch::dispatch_uploads;
pub use options::{ReportKind, UnknownReportKind};
pub use view::{Fragment, ReportView};

#[derive(Error, Debug)]
pub enum UploadError {
    /// The file precondition failed: nothing was selected for upload.
    #[error("no input file selected")]
    NoFile,
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A file chosen for upload, held in memory for the duration of one run.
///
/// The same bytes are attached to every request of the run; nothing is
/// retained afterwards.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read a file from disk, keeping its file name for the form part.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let data = std::fs::read(path).map_err(|source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "building.json".to_string());
        Ok(Self { name, data })
    }
}

/// Configuration for the upload dispatcher.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the calculation server, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout. `None` lets requests run to completion.
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: None,
        }
    }
}

/// Progress events emitted while uploads are in flight.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A request for this kind has been handed to the HTTP client.
    Dispatched {
        kind: ReportKind,
        index: usize,
        total: usize,
    },
    /// A request settled; its fragment was appended to the view.
    Settled { fragment: Fragment },
}

/// Summary counters for a complete upload run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}
