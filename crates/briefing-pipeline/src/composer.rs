//! Snapshot to document
//!
//! Every variant shares this one layout; only the labels, title and
//! description come from the variant settings.

use crate::document::{DISCLAIMER, Document, HEADER, Section};
use briefing_core::Snapshot;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Compose the briefing document for a snapshot
pub fn compose(snapshot: &Snapshot) -> Document {
    let settings = snapshot.variant();
    let mut document = Document::new();

    document.push(Section::plain(
        HEADER,
        format!(
            "# {}\n\n**Generated**: {}\n**Purpose**: {}",
            settings.title,
            snapshot.run_timestamp().format(TIMESTAMP_FORMAT),
            settings.description
        ),
    ));

    for (number, (key, section)) in snapshot.sections().enumerate() {
        document.push(Section::new(
            key.as_str(),
            format!("{}. {}", number + 1, settings.headers.get(key)),
            section.rendered_text(),
        ));
    }

    document.push(Section::plain(DISCLAIMER, settings.disclaimer()));
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefing_core::{
        NOT_CONFIGURED_PLACEHOLDER, ReportVariant, SectionResult, SourceKey, VariantSettings,
    };
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::BTreeMap;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(8, 0, 5)
            .unwrap()
    }

    fn snapshot(
        settings: VariantSettings,
        sections: BTreeMap<SourceKey, SectionResult>,
    ) -> Snapshot {
        Snapshot::new(at(), settings, sections)
    }

    #[test]
    fn test_each_header_once_in_order() {
        for variant in ReportVariant::ALL {
            let settings = variant.default_settings();
            let rendered = compose(&snapshot(settings.clone(), BTreeMap::new())).render();

            let mut last = 0;
            for (number, key) in SourceKey::ALL.iter().enumerate() {
                let heading = format!("## {}. {}", number + 1, settings.headers.get(*key));
                assert_eq!(rendered.matches(&heading).count(), 1, "{heading}");
                let position = rendered.find(&heading).unwrap();
                assert!(position > last);
                last = position;
            }
        }
    }

    #[test]
    fn test_all_unavailable_is_well_formed() {
        let settings = ReportVariant::PostClose.default_settings();
        let document = compose(&snapshot(settings.clone(), BTreeMap::new()));

        let names: Vec<&str> = document.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["header", "market", "macro", "disclosures", "news", "disclaimer"]);

        let rendered = document.render();
        assert_eq!(rendered.matches(NOT_CONFIGURED_PLACEHOLDER).count(), 4);
        assert!(rendered.trim_end().ends_with(&settings.disclaimer()));
    }

    #[test]
    fn test_header_content() {
        let settings = ReportVariant::PreOpen.default_settings();
        let rendered = compose(&snapshot(settings.clone(), BTreeMap::new())).render();
        assert!(rendered.starts_with(&format!(
            "# {}\n\n**Generated**: 2024-01-03 08:00:05\n",
            settings.title
        )));
        assert!(rendered.contains(&format!("**Purpose**: {}", settings.description)));
    }

    #[test]
    fn test_compose_is_pure() {
        let mut sections = BTreeMap::new();
        sections.insert(SourceKey::News, SectionResult::populated(Vec::new(), "- headline"));
        let snapshot = snapshot(ReportVariant::Intraday.default_settings(), sections);

        assert_eq!(compose(&snapshot), compose(&snapshot));
        assert_eq!(
            compose(&snapshot).section("news").unwrap().body,
            "- headline"
        );
    }
}
