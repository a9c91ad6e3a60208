//! Research-report pipeline: crawl, extract, summarize
//!
//! Stages run in order; the skip flags drop crawl or extract independently.
//! Crawl and extract failures shrink the working set but never stop the run;
//! the summarize stage is the only one whose failure reaches the caller.

pub mod ledger;

pub use ledger::DownloadLedger;

use crate::document::{Document, HEADER, Section};
use crate::prompts::{RESEARCH_SYSTEM_PROMPT, render_research_prompt};
use crate::publisher::Publisher;
use briefing_core::{
    BriefingError, NarrativeGenerator, NarrativeRequest, ReportFile, ReportSource,
    ResearchSettings, Result, TextExtractor,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const DIGEST_TEMPERATURE: f32 = 0.3;
const FOOTER: &str = "*Generated automatically from the day's research reports. \
Copyright of the source reports remains with their publisher.*";

/// Progress of one research run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pending,
    Crawled,
    Extracted,
    Summarized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Crawled => "crawled",
            Self::Extracted => "extracted",
            Self::Summarized => "summarized",
        };
        f.write_str(name)
    }
}

/// Which stages a run performs; the flags are independent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearchOptions {
    pub date: NaiveDate,
    /// Use the PDFs already in the working folder
    pub skip_crawl: bool,
    /// Use the text files already in the working folder
    pub skip_extract: bool,
}

impl ResearchOptions {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            skip_crawl: false,
            skip_extract: false,
        }
    }
}

/// What a completed run did
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub downloaded: Vec<ReportFile>,
    pub extracted: Vec<PathBuf>,
    pub reports_summarized: usize,
    pub digest: PathBuf,
}

/// One extracted report ready for summarization
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReportText {
    name: String,
    text: String,
}

pub struct ResearchPipeline {
    source: Arc<dyn ReportSource>,
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn NarrativeGenerator>,
    publisher: Publisher,
    settings: ResearchSettings,
}

impl ResearchPipeline {
    pub fn new(
        source: Arc<dyn ReportSource>,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn NarrativeGenerator>,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            source,
            extractor,
            generator,
            publisher: Publisher::new(&settings.output_dir),
            settings,
        }
    }

    /// Run the stages the options leave enabled, then summarize
    #[instrument(skip(self), fields(date = %options.date))]
    pub async fn run(&self, options: ResearchOptions) -> Result<ResearchOutcome> {
        let mut downloaded = Vec::new();
        if options.skip_crawl {
            info!("Skipping crawl, using existing PDFs");
        } else {
            downloaded = self.crawl(options.date).await;
            info!("Crawl finished: {} new reports", downloaded.len());
        }
        debug!("Research stage: {}", Stage::Crawled);

        let mut extracted = Vec::new();
        if options.skip_extract {
            info!("Skipping extraction, using existing text files");
        } else {
            extracted = self.extract().await;
            info!("Extraction finished: {} text files", extracted.len());
        }
        debug!("Research stage: {}", Stage::Extracted);

        let (digest, reports_summarized) = self.summarize(options.date).await?;
        info!("Research stage: {} ({})", Stage::Summarized, digest.display());
        Ok(ResearchOutcome {
            downloaded,
            extracted,
            reports_summarized,
            digest,
        })
    }

    /// Download the target date's reports that the ledger does not know yet
    pub async fn crawl(&self, date: NaiveDate) -> Vec<ReportFile> {
        let mut ledger = match DownloadLedger::load(&self.settings.ledger_path).await {
            Ok(ledger) => ledger,
            Err(e) => {
                error!("Skipping crawl: {}", e);
                return Vec::new();
            }
        };

        let entries = match self.source.list_reports(date).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list reports from {}: {}", self.source.name(), e);
                return Vec::new();
            }
        };

        let board_date = date.format("%Y.%m.%d").to_string();
        let candidates: Vec<_> = entries
            .into_iter()
            .filter(|entry| entry.date == board_date)
            .filter(|entry| {
                if entry.link.is_none() {
                    debug!("No download link for '{}'", entry.title);
                    return false;
                }
                true
            })
            .collect();
        info!("{} reports listed for {}", candidates.len(), board_date);

        // Listings can repeat a row: check the ledger per download and
        // attempt each identifier once per run.
        let mut attempted = HashSet::new();
        let mut downloaded = Vec::new();
        for entry in &candidates {
            let id = entry.id();
            if ledger.contains(&id) {
                debug!("Already downloaded: {}", id);
                continue;
            }
            if !attempted.insert(id.clone()) {
                debug!("Already attempted this run: {}", id);
                continue;
            }
            if attempted.len() > 1 {
                tokio::time::sleep(self.settings.download_delay()).await;
            }

            match self.source.download(entry, &self.settings.work_dir).await {
                Ok(file) => {
                    info!("Downloaded {}", file.path.display());
                    downloaded.push(file);
                    if let Err(e) = ledger.record(id).await {
                        error!("Stopping crawl, ledger not saved: {}", e);
                        break;
                    }
                }
                Err(e) => warn!("Failed to download '{}': {}", entry.title, e),
            }
        }

        downloaded
    }

    /// Convert every PDF in the working folder to a sibling `.txt`
    pub async fn extract(&self) -> Vec<PathBuf> {
        if !self.extractor.is_available().await {
            warn!("{} is not available, skipping extraction", self.extractor.name());
            return Vec::new();
        }

        let pdfs = match files_with_extension(&self.settings.work_dir, "pdf").await {
            Ok(pdfs) => pdfs,
            Err(e) => {
                warn!("Failed to read {}: {}", self.settings.work_dir.display(), e);
                return Vec::new();
            }
        };
        info!("Found {} PDF files", pdfs.len());

        let mut written = Vec::new();
        for pdf in pdfs {
            let pages = match self.extractor.extract_pages(&pdf).await {
                Ok(pages) => pages,
                Err(e) => {
                    warn!("Failed to extract {}: {}", pdf.display(), e);
                    continue;
                }
            };

            let text = join_pages(&pages);
            if text.trim().is_empty() {
                warn!("No text in {}", pdf.display());
                continue;
            }

            let target = pdf.with_extension("txt");
            match tokio::fs::write(&target, text).await {
                Ok(()) => {
                    debug!("Wrote {}", target.display());
                    written.push(target);
                }
                Err(e) => warn!("Failed to write {}: {}", target.display(), e),
            }
        }

        written
    }

    /// Summarize the date's texts into the research digest
    ///
    /// Returns the digest path and the number of reports it covers.
    pub async fn summarize(&self, date: NaiveDate) -> Result<(PathBuf, usize)> {
        self.summarize_at(date, Local::now().naive_local()).await
    }

    async fn summarize_at(&self, date: NaiveDate, now: NaiveDateTime) -> Result<(PathBuf, usize)> {
        let reports = self.load_texts(date).await;
        if reports.is_empty() {
            return Err(BriefingError::NoReportTexts { date });
        }
        if !self.generator.is_available() {
            return Err(BriefingError::NarrativeUnavailable(
                "no narrative provider configured".to_string(),
            ));
        }

        let date_label = date.format("%Y-%m-%d").to_string();
        let prompt = render_research_prompt(
            &date_label,
            &combine_reports(&reports, self.settings.char_budget),
        )
        .map_err(|e| BriefingError::NarrativeUnavailable(format!("prompt template: {e}")))?;

        info!(
            "Summarizing {} reports with {}",
            reports.len(),
            self.generator.model()
        );
        let narrative = self
            .generator
            .generate(NarrativeRequest {
                system: RESEARCH_SYSTEM_PROMPT.to_string(),
                prompt,
                max_tokens: self.settings.max_tokens,
                temperature: DIGEST_TEMPERATURE,
            })
            .await?;

        let document = digest_document(date, now, &reports, &narrative.text);
        let path = self
            .publisher
            .publish_named(&document, &digest_file_name(date))
            .await?;
        Ok((path, reports.len()))
    }

    async fn load_texts(&self, date: NaiveDate) -> Vec<ReportText> {
        let compact = date.format("%Y%m%d").to_string();
        let dashed = date.format("%Y-%m-%d").to_string();

        let files = match files_with_extension(&self.settings.work_dir, "txt").await {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to read {}: {}", self.settings.work_dir.display(), e);
                return Vec::new();
            }
        };

        let mut reports = Vec::new();
        for path in files {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if !name.contains(&compact) && !name.contains(&dashed) {
                continue;
            }
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => reports.push(ReportText { name, text }),
                Err(e) => warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        info!("Loaded {} report texts for {}", reports.len(), dashed);
        reports
    }
}

/// `{YYYY-MM-DD}_research_digest.md`
pub fn digest_file_name(date: NaiveDate) -> String {
    format!("{}_research_digest.md", date.format("%Y-%m-%d"))
}

/// Files in `dir` with `extension`, sorted by path
async fn files_with_extension(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e),
    };
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| format!("\n--- Page {} ---\n{}", i + 1, page))
        .collect()
}

fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn combine_reports(reports: &[ReportText], budget: usize) -> String {
    reports
        .iter()
        .map(|report| {
            format!(
                "\n\n### {}\n\n{}",
                report.name,
                truncate_chars(&report.text, budget)
            )
        })
        .collect()
}

fn digest_document(
    date: NaiveDate,
    generated: NaiveDateTime,
    reports: &[ReportText],
    summary: &str,
) -> Document {
    let mut document = Document::new();
    document.push(Section::plain(
        HEADER,
        format!(
            "# Daily Research Digest\n\n**Date**: {}\n**Generated**: {}\n**Reports analyzed**: {}",
            date.format("%Y-%m-%d"),
            generated.format("%Y-%m-%d %H:%M:%S"),
            reports.len()
        ),
    ));
    document.push(Section::plain("summary", summary.trim()));

    let mut table = String::from("| File | Status |\n|------|--------|");
    for report in reports {
        table.push_str(&format!("\n| {} | Analyzed |", report.name));
    }
    document.push(Section::new("sources", "Source Reports", table));
    document.push(Section::plain("footer", FOOTER));
    document
}
