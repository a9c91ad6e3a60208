//! One briefing run: aggregate, compose, narrate, publish

use crate::aggregator::Aggregator;
use crate::composer::compose;
use crate::document::NARRATIVE;
use crate::injector::NarrativeInjector;
use crate::publisher::Publisher;
use briefing_core::{ReportVariant, Result, VariantSettings};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Result of a published briefing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub path: PathBuf,
    pub available_sections: usize,
    pub total_sections: usize,
    pub narrative_included: bool,
}

pub struct BriefingService {
    aggregator: Aggregator,
    injector: NarrativeInjector,
    publisher: Publisher,
    variants: BTreeMap<ReportVariant, VariantSettings>,
}

impl BriefingService {
    /// `settings` is consulted by variant; variants missing from it use built-in defaults
    pub fn new(
        aggregator: Aggregator,
        injector: NarrativeInjector,
        publisher: Publisher,
        settings: impl IntoIterator<Item = VariantSettings>,
    ) -> Self {
        Self {
            aggregator,
            injector,
            publisher,
            variants: settings.into_iter().map(|s| (s.variant, s)).collect(),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn settings(&self, variant: ReportVariant) -> VariantSettings {
        self.variants
            .get(&variant)
            .cloned()
            .unwrap_or_else(|| variant.default_settings())
    }

    pub async fn run(&self, variant: ReportVariant, narrative: bool) -> Result<RunOutcome> {
        self.run_at(variant, narrative, Local::now().naive_local()).await
    }

    /// Run with a fixed clock
    #[instrument(skip(self), fields(variant = %variant))]
    pub async fn run_at(
        &self,
        variant: ReportVariant,
        narrative: bool,
        now: NaiveDateTime,
    ) -> Result<RunOutcome> {
        let settings = self.settings(variant);
        info!("Generating {}", settings.title);

        let snapshot = self.aggregator.collect_at(&settings, now).await;
        let document = compose(&snapshot);
        let document = self.injector.inject(document, &snapshot, narrative).await;
        let path = self
            .publisher
            .publish(&document, snapshot.run_timestamp().date(), &settings)
            .await?;

        Ok(RunOutcome {
            path,
            available_sections: snapshot.available_count(),
            total_sections: snapshot.total_count(),
            narrative_included: document.section(NARRATIVE).is_some(),
        })
    }
}
