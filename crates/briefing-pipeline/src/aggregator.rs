//! Collect every section of a briefing into one snapshot

use briefing_core::{
    FetchWindow, SectionResult, Snapshot, SourceAdapter, SourceKey, VariantSettings,
};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Calls each configured adapter once per run
///
/// Adapter failures never escape: an unavailable or failing adapter yields
/// its placeholder section and the run moves on to the next source.
pub struct Aggregator {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn adapters(&self) -> &[Box<dyn SourceAdapter>] {
        &self.adapters
    }

    pub async fn collect(&self, settings: &VariantSettings) -> Snapshot {
        self.collect_at(settings, Local::now().naive_local()).await
    }

    /// Collect with a fixed clock
    #[instrument(skip(self, settings), fields(variant = %settings.variant))]
    pub async fn collect_at(&self, settings: &VariantSettings, now: NaiveDateTime) -> Snapshot {
        let window = FetchWindow::for_variant(settings, now);
        let mut sections = BTreeMap::new();

        for adapter in &self.adapters {
            let key = adapter.key();
            if sections.contains_key(&key) {
                warn!("{} is configured twice for {}, keeping the first", adapter.name(), key);
                continue;
            }
            sections.insert(key, collect_one(adapter.as_ref(), &window).await);
        }

        let snapshot = Snapshot::new(now, settings.clone(), sections);
        info!(
            "Collected {}/{} sections",
            snapshot.available_count(),
            snapshot.total_count()
        );
        snapshot
    }

    /// Collect a single section, for diagnostics
    pub async fn collect_section(
        &self,
        key: SourceKey,
        settings: &VariantSettings,
        now: NaiveDateTime,
    ) -> Option<SectionResult> {
        let adapter = self.adapters.iter().find(|a| a.key() == key)?;
        let window = FetchWindow::for_variant(settings, now);
        Some(collect_one(adapter.as_ref(), &window).await)
    }
}

#[instrument(skip(adapter, window), fields(source = %adapter.key(), adapter = adapter.name()))]
async fn collect_one(adapter: &dyn SourceAdapter, window: &FetchWindow) -> SectionResult {
    if !adapter.is_available() {
        info!("{} is not available: {}", adapter.name(), adapter.status_detail());
        return SectionResult::unavailable(adapter.placeholder());
    }

    match adapter.fetch(window).await {
        Ok(records) => {
            info!("{} returned {} records", adapter.name(), records.len());
            let text = adapter.format_for_briefing(&records, window);
            SectionResult::populated(records, text)
        }
        Err(e) => {
            warn!("Failed to get {} data from {}: {}", adapter.key(), adapter.name(), e);
            SectionResult::unavailable(adapter.placeholder())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeAdapter;
    use briefing_core::{NOT_CONFIGURED_PLACEHOLDER, ReportVariant};
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_three_available_one_unavailable() {
        let aggregator = Aggregator::new(vec![
            Box::new(FakeAdapter::ok(SourceKey::Market, &["KOSPI 2,607"])),
            Box::new(FakeAdapter::ok(SourceKey::Macro, &["Base rate 3.50%"])),
            Box::new(FakeAdapter::unavailable(SourceKey::Disclosures)),
            Box::new(FakeAdapter::ok(SourceKey::News, &["Chip exports rise"])),
        ]);
        let settings = ReportVariant::PostClose.default_settings();

        let snapshot = aggregator.collect_at(&settings, now()).await;
        assert_eq!(snapshot.available_count(), 3);
        assert_eq!(snapshot.total_count(), 4);

        let disclosures = snapshot.section(SourceKey::Disclosures).unwrap();
        assert!(!disclosures.is_available());
        assert_eq!(disclosures.rendered_text(), "_disclosures placeholder_");

        let market = snapshot.section(SourceKey::Market).unwrap();
        assert_eq!(market.rendered_text(), "- KOSPI 2,607");
        assert_eq!(market.raw_records().len(), 1);
        assert_eq!(snapshot.run_timestamp(), now());
    }

    #[tokio::test]
    async fn test_failure_becomes_placeholder() {
        let failing = FakeAdapter::failing(SourceKey::News);
        let aggregator = Aggregator::new(vec![Box::new(failing)]);
        let settings = ReportVariant::Intraday.default_settings();

        let snapshot = aggregator.collect_at(&settings, now()).await;
        let news = snapshot.section(SourceKey::News).unwrap();
        assert!(!news.is_available());
        assert_eq!(news.rendered_text(), "_news placeholder_");
    }

    #[tokio::test]
    async fn test_missing_adapters_get_not_configured() {
        let aggregator = Aggregator::new(Vec::new());
        let settings = ReportVariant::PreOpen.default_settings();

        let snapshot = aggregator.collect_at(&settings, now()).await;
        assert_eq!(snapshot.total_count(), SourceKey::ALL.len());
        for (_, section) in snapshot.sections() {
            assert_eq!(section.rendered_text(), NOT_CONFIGURED_PLACEHOLDER);
        }
    }

    #[tokio::test]
    async fn test_each_adapter_called_once() {
        let adapter = FakeAdapter::ok(SourceKey::Market, &["x"]);
        let settings = ReportVariant::PostClose.default_settings();
        let window = FetchWindow::for_variant(&settings, now());

        collect_one(&adapter, &window).await;
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);

        let unavailable = FakeAdapter::unavailable(SourceKey::Market);
        collect_one(&unavailable, &window).await;
        assert_eq!(unavailable.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_collect_section() {
        let aggregator =
            Aggregator::new(vec![Box::new(FakeAdapter::ok(SourceKey::News, &["a", "b"]))]);
        let settings = ReportVariant::PostClose.default_settings();

        let section = aggregator
            .collect_section(SourceKey::News, &settings, now())
            .await
            .unwrap();
        assert_eq!(section.rendered_text(), "- a\n- b");
        assert!(
            aggregator
                .collect_section(SourceKey::Market, &settings, now())
                .await
                .is_none()
        );
    }
}
