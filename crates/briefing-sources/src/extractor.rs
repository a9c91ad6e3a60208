//! PDF text extraction through poppler's `pdftotext`

use async_trait::async_trait;
use briefing_core::{SourceError, TextExtractor};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

const ADAPTER: &str = "pdftotext";
/// Page separator emitted by pdftotext
const FORM_FEED: char = '\x0c';

/// Split pdftotext output into pages
///
/// pdftotext ends every page with a form feed, so the trailing empty chunk is dropped.
fn split_pages(output: &str) -> Vec<String> {
    let mut pages: Vec<String> = output.split(FORM_FEED).map(str::to_string).collect();
    if pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// [`TextExtractor`] running the `pdftotext` binary
pub struct PdfToText {
    binary: PathBuf,
}

impl Default for PdfToText {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfToText {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("pdftotext"),
        }
    }

    /// Use a specific executable instead of the one on `PATH`
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl TextExtractor for PdfToText {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok()
    }

    #[instrument(skip(self), fields(adapter = ADAPTER))]
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let output = Command::new(&self.binary)
            .args(["-layout", "-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SourceError::unavailable(ADAPTER, e.to_string()))?;

        if !output.status.success() {
            return Err(SourceError::parse(
                ADAPTER,
                format!(
                    "{} exited with {}: {}",
                    path.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let pages = split_pages(&text);
        debug!("{} pages from {}", pages.len(), path.display());
        Ok(pages)
    }
}
