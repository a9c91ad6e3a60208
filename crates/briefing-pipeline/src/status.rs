//! Offline availability report

use briefing_core::{
    Credentials, NarrativeGenerator, NarrativeSettings, SourceAdapter, TextExtractor,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Source,
    Narrative,
    Extractor,
    Credential,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Narrative => "narrative",
            Self::Extractor => "extractor",
            Self::Credential => "credential",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub kind: ComponentKind,
    pub name: String,
    pub available: bool,
    pub detail: String,
}

/// Everything a status report looks at
pub struct StatusInputs<'a> {
    pub adapters: &'a [Box<dyn SourceAdapter>],
    pub generator: &'a dyn NarrativeGenerator,
    pub narrative: &'a NarrativeSettings,
    pub extractor: &'a dyn TextExtractor,
    pub credentials: &'a Credentials,
}

/// One row per adapter, the narrative generator, the extractor and each credential
///
/// Nothing here touches the network; the extractor check only spawns the local tool.
pub async fn status(inputs: StatusInputs<'_>) -> Vec<StatusRow> {
    let mut rows: Vec<StatusRow> = inputs
        .adapters
        .iter()
        .map(|adapter| StatusRow {
            kind: ComponentKind::Source,
            name: format!("{} ({})", adapter.name(), adapter.key()),
            available: adapter.is_available(),
            detail: adapter.status_detail(),
        })
        .collect();

    let generator_ready = inputs.generator.is_available();
    rows.push(StatusRow {
        kind: ComponentKind::Narrative,
        name: inputs.narrative.provider.to_string(),
        available: generator_ready && inputs.narrative.enabled,
        detail: match (generator_ready, inputs.narrative.enabled) {
            (true, true) => format!("model {}", inputs.generator.model()),
            (true, false) => format!("model {}, disabled in config", inputs.generator.model()),
            (false, _) => "API key is not set".to_string(),
        },
    });

    let extractor_ready = inputs.extractor.is_available().await;
    rows.push(StatusRow {
        kind: ComponentKind::Extractor,
        name: inputs.extractor.name().to_string(),
        available: extractor_ready,
        detail: if extractor_ready {
            "ready".to_string()
        } else {
            "not found on PATH".to_string()
        },
    });

    let credentials = [
        ("DART_API_KEY", &inputs.credentials.dart_api_key),
        ("ECOS_API_KEY", &inputs.credentials.ecos_api_key),
        ("FRED_API_KEY", &inputs.credentials.fred_api_key),
        ("OPENAI_API_KEY", &inputs.credentials.openai_api_key),
        ("ANTHROPIC_API_KEY", &inputs.credentials.anthropic_api_key),
    ];
    rows.extend(credentials.into_iter().map(|(name, value)| {
        let set = value.as_deref().is_some_and(|v| !v.trim().is_empty());
        StatusRow {
            kind: ComponentKind::Credential,
            name: name.to_string(),
            available: set,
            detail: if set { "set" } else { "not set" }.to_string(),
        }
    }));

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeAdapter, FakeExtractor, FakeNarrator};
    use briefing_core::SourceKey;

    #[tokio::test]
    async fn test_rows_cover_every_component() {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(FakeAdapter::ok(SourceKey::Market, &[])),
            Box::new(FakeAdapter::unavailable(SourceKey::Disclosures)),
        ];
        let credentials = Credentials {
            dart_api_key: Some("secret-value".to_string()),
            ..Credentials::default()
        };
        let narrative = NarrativeSettings {
            enabled: true,
            ..NarrativeSettings::default()
        };

        let rows = status(StatusInputs {
            adapters: &adapters,
            generator: &FakeNarrator::replying("x"),
            narrative: &narrative,
            extractor: &FakeExtractor::unavailable(),
            credentials: &credentials,
        })
        .await;

        assert_eq!(rows.len(), 2 + 1 + 1 + 5);
        assert!(rows[0].available);
        assert!(!rows[1].available);
        assert_eq!(rows[2].kind, ComponentKind::Narrative);
        assert!(rows[2].available);
        assert!(!rows[3].available);

        let dart = rows.iter().find(|r| r.name == "DART_API_KEY").unwrap();
        assert!(dart.available);
        assert_eq!(dart.detail, "set");
        assert!(rows.iter().all(|r| !r.detail.contains("secret-value")));
    }

    #[tokio::test]
    async fn test_disabled_narrative_is_not_available() {
        let rows = status(StatusInputs {
            adapters: &[],
            generator: &FakeNarrator::replying("x"),
            narrative: &NarrativeSettings::default(),
            extractor: &FakeExtractor::new(&[]),
            credentials: &Credentials::default(),
        })
        .await;

        assert!(!rows[0].available);
        assert!(rows[0].detail.contains("disabled"));
        assert!(rows[1].available);
    }
}
