//! Subcommand handlers

use crate::output;
use anyhow::Context;
use async_trait::async_trait;
use briefing_core::{BriefingConfig, NarrativeGenerator, ReportVariant, ScheduledJob, SourceKey};
use briefing_pipeline::{
    Aggregator, BriefingService, JobRunner, NarrativeInjector, Publisher, ResearchOptions,
    ResearchPipeline, Schedule, ScheduledEntry, StatusInputs,
};
use briefing_sources::factory;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{error, info, warn};

fn briefing_service(config: &BriefingConfig) -> BriefingService {
    let narrator: Arc<dyn NarrativeGenerator> = Arc::new(factory::narrator(config));
    BriefingService::new(
        Aggregator::new(factory::source_adapters(config)),
        NarrativeInjector::new(narrator, &config.narrative),
        Publisher::new(&config.output_dir),
        ReportVariant::ALL.map(|variant| config.variant_settings(variant)),
    )
}

fn research_pipeline(config: &BriefingConfig) -> ResearchPipeline {
    ResearchPipeline::new(
        Arc::new(factory::research_board(config)),
        Arc::new(factory::text_extractor()),
        Arc::new(factory::research_narrator(config)),
        config.research.clone(),
    )
}

pub async fn run(
    config: &BriefingConfig,
    variant: ReportVariant,
    narrative: bool,
) -> anyhow::Result<()> {
    if narrative && !config.narrative.enabled {
        warn!("--narrative given but narratives are disabled in the configuration");
    }

    let outcome = briefing_service(config)
        .run(variant, narrative)
        .await
        .with_context(|| format!("Failed to generate the {variant} briefing"))?;

    println!(
        "Published {} ({}/{} sections{})",
        outcome.path.display(),
        outcome.available_sections,
        outcome.total_sections,
        if outcome.narrative_included {
            ", with narrative"
        } else {
            ""
        }
    );
    Ok(())
}

pub async fn research(
    config: &BriefingConfig,
    date: Option<NaiveDate>,
    skip_crawl: bool,
    skip_extract: bool,
) -> anyhow::Result<()> {
    let options = ResearchOptions {
        date: date.unwrap_or_else(|| Local::now().date_naive()),
        skip_crawl,
        skip_extract,
    };

    let outcome = research_pipeline(config)
        .run(options)
        .await
        .with_context(|| format!("Research digest for {} failed", options.date))?;

    println!(
        "Published {} ({} reports, {} downloaded, {} extracted)",
        outcome.digest.display(),
        outcome.reports_summarized,
        outcome.downloaded.len(),
        outcome.extracted.len()
    );
    Ok(())
}

pub async fn diagnose(
    config: &BriefingConfig,
    source: SourceKey,
    variant: ReportVariant,
) -> anyhow::Result<()> {
    let aggregator = Aggregator::new(factory::source_adapters(config));
    let settings = config.variant_settings(variant);

    let section = aggregator
        .collect_section(source, &settings, Local::now().naive_local())
        .await
        .with_context(|| format!("No adapter is configured for {source}"))?;

    output::print_section(source, &section);
    Ok(())
}

pub async fn status(config: &BriefingConfig) -> anyhow::Result<()> {
    let adapters = factory::source_adapters(config);
    let narrator = factory::narrator(config);
    let extractor = factory::text_extractor();

    let rows = briefing_pipeline::status(StatusInputs {
        adapters: &adapters,
        generator: &narrator,
        narrative: &config.narrative,
        extractor: &extractor,
        credentials: &config.credentials,
    })
    .await;

    output::print_status(&rows);
    Ok(())
}

/// Runs scheduled jobs, logging failures instead of returning them
struct ScheduledJobs {
    service: BriefingService,
    research: ResearchPipeline,
}

#[async_trait]
impl JobRunner for ScheduledJobs {
    async fn run_job(&self, entry: &ScheduledEntry) {
        match entry.job {
            ScheduledJob::Briefing(variant) => {
                match self.service.run(variant, entry.narrative).await {
                    Ok(outcome) => info!("Published {}", outcome.path.display()),
                    Err(e) => error!("Scheduled {} briefing failed: {}", variant, e),
                }
            }
            ScheduledJob::Research => {
                let options = ResearchOptions::for_date(Local::now().date_naive());
                match self.research.run(options).await {
                    Ok(outcome) => info!("Published {}", outcome.digest.display()),
                    Err(e) => error!("Scheduled research digest failed: {}", e),
                }
            }
        }
    }
}

pub async fn daemon(config: &BriefingConfig) -> anyhow::Result<()> {
    let schedule = Schedule::from_specs(&config.schedule).context("Invalid schedule")?;
    let jobs = ScheduledJobs {
        service: briefing_service(config),
        research: research_pipeline(config),
    };

    info!("Daemon started with {} scheduled jobs", schedule.entries().len());
    tokio::select! {
        result = briefing_pipeline::run_daemon(&schedule, &jobs) => {
            result.context("Daemon stopped")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Interrupted, shutting down");
        }
    }
    Ok(())
}
