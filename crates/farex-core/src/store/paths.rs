//! Content path resolution for fetched documents.

use std::path::{Path, PathBuf};

use url::Url;

/// Fallback filename for URLs with no usable path segment.
const DEFAULT_FILENAME: &str = "invoice.pdf";

/// Maps (trip, document URL) pairs to filesystem destinations.
///
/// The mapping is deterministic: the same pair always resolves to the same
/// path, so a repeated download overwrites rather than accumulates. Parent
/// directories are created lazily by the download manager.
#[derive(Debug, Clone)]
pub struct MediaPaths {
    root: PathBuf,
}

impl MediaPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination for one invoice document:
    /// `<root>/<trip_id>/<url filename>`.
    pub fn invoice_path(&self, trip_id: &str, download_url: &str) -> PathBuf {
        let filename = Url::parse(download_url)
            .ok()
            .and_then(|url| {
                url.path_segments().and_then(|segments| {
                    segments
                        .filter(|segment| !segment.is_empty())
                        .next_back()
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        self.root.join(trip_id).join(filename)
    }
}
