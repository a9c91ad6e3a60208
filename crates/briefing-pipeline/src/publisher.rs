//! Write finished documents to the output directory

use crate::document::Document;
use briefing_core::{BriefingError, Result, VariantSettings};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `{YYYY-MM-DD}_{suffix}.md`
pub fn briefing_file_name(date: NaiveDate, settings: &VariantSettings) -> String {
    format!("{}_{}.md", date.format("%Y-%m-%d"), settings.file_suffix)
}

/// Writes whole files only: content lands in a hidden sibling that is then
/// renamed over the target, so readers never see a partial briefing.
#[derive(Debug, Clone)]
pub struct Publisher {
    output_dir: PathBuf,
}

impl Publisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Publish a briefing, replacing any earlier file for the same date and variant
    pub async fn publish(
        &self,
        document: &Document,
        date: NaiveDate,
        settings: &VariantSettings,
    ) -> Result<PathBuf> {
        self.publish_named(document, &briefing_file_name(date, settings))
            .await
    }

    pub async fn publish_named(&self, document: &Document, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let staging = self.output_dir.join(format!(".{file_name}.tmp"));
        let publish_error = |source: std::io::Error| BriefingError::Publish {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(publish_error)?;

        let content = document.render();
        if let Err(e) = tokio::fs::write(&staging, content.as_bytes()).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(publish_error(e));
        }
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(publish_error(e));
        }

        debug!("Wrote {} bytes", content.len());
        info!("Published {}", path.display());
        Ok(path)
    }
}
