//! Prompt templates for narrative generation
//!
//! Templates use Jinja syntax and are rendered with MiniJinja. The composed
//! briefing is passed in as `briefing`; research texts as `reports`.

use briefing_core::ReportVariant;
use minijinja::{Environment, context};

/// System prompt shared by every briefing variant
pub const ANALYST_SYSTEM_PROMPT: &str = "\
You are an equity analyst covering the Korean stock market. Turn the collected \
market data into concise, practical insight.

Principles:
1. Ground every statement in the data provided; avoid emotional language.
2. Always connect global macro moves (US rates, dollar strength, oil) to the \
domestic market.
3. Pick out policy announcements, political events, diplomatic meetings and \
central bank remarks from the headlines and assess their market impact.
4. When discussing watch-list stocks, cite change %, high/low and volume.
5. Never add disclaimers; one is appended separately.

Rules:
- Every evaluative sentence carries a number (\"rose 1.2% versus the prior close\", \
not \"showed a positive trend\").
- Stocks moving 3% or more in either direction need a stated cause.
- Do not describe two stocks with the same pattern of sentences.

Output markdown using `###` subheadings.";

const PRE_OPEN_PROMPT: &str = "\
Below is the market data collected for today's {{ title }} ({{ date }}).

{{ briefing }}

Using this data, write four sections:

1. **Overnight global and domestic recap**: the US session, dollar and rate \
moves, and major global events, tied to yesterday's KOSPI/KOSDAQ close.
2. **What to watch today**: two or three domestic or global issues before the \
open, including any scheduled releases mentioned in the headlines.
3. **Watch-list implications**: mention every watch-list stock, using the \
prior session's change, high/low and any disclosures.
4. **Today's strategy**: two or three approaches suited to the market's tone.

Keep it brief.";

const INTRADAY_PROMPT: &str = "\
Below is the intraday market data collected for today's {{ title }} ({{ date }}).

{{ briefing }}

Using this data, write four sections:

1. **Intraday flow**: morning KOSPI/KOSDAQ moves, how FX and rates are \
shaping the session, and the morning's main headlines.
2. **Notable changes**: stocks or sectors standing out this morning, and \
disclosures or news that moved the market.
3. **Watch-list check**: mention every watch-list stock, using the current \
change, high/low spread and volume.
4. **Afternoon outlook**: points to watch and two scenarios (up and down) \
with a response for each.

Keep it brief.";

const POST_CLOSE_PROMPT: &str = "\
Below is the market data collected for today's {{ title }} ({{ date }}).

{{ briefing }}

Using this data, write four sections:

1. **Global and domestic wrap-up**: today's global issues (US rates and \
dollar, policy announcements, geopolitical risk) and their effect on the \
domestic market, then the KOSPI/KOSDAQ tone tied to rates and FX.
2. **Key issues**: two to four issues that moved the market and their \
effect on sectors or stocks.
3. **Watch-list review**: mention every watch-list stock with close, change, \
high/low spread and volume; explain any move of 3% or more or any spread \
of 5% or more.
4. **Tomorrow's strategy**: macro events or stock issues to watch, closing \
with two or three concrete points.

Keep it brief.";

/// System prompt for the research digest
pub const RESEARCH_SYSTEM_PROMPT: &str = "\
You are an investment analyst who condenses sell-side research into one \
daily digest for portfolio managers. Stay close to what the reports say.";

const RESEARCH_PROMPT: &str = "\
Read the research reports below and write one combined daily report for \
{{ date }}.

Cover:
1. **Key takeaways**: the three to five main issues of the day.
2. **By theme**: each report's main points grouped by theme (economy, \
bonds, global, China and so on).
3. **Connections**: issues that recur across reports or relate to each other.
4. **Investment insights**: points that help actual investment decisions.
5. **Risks**: risk factors and open uncertainties.

Format the answer as markdown with headings, bullet points, **bold** key \
figures and dates, and `>` quotes for investment insights.

## Reports
{{ reports }}";

/// User prompt template for a briefing variant
pub fn briefing_template(variant: ReportVariant) -> &'static str {
    match variant {
        ReportVariant::PreOpen => PRE_OPEN_PROMPT,
        ReportVariant::Intraday => INTRADAY_PROMPT,
        ReportVariant::PostClose => POST_CLOSE_PROMPT,
    }
}

/// Render the briefing prompt with the composed document as context
pub fn render_briefing_prompt(
    variant: ReportVariant,
    title: &str,
    date: &str,
    briefing: &str,
) -> Result<String, minijinja::Error> {
    Environment::new().render_str(
        briefing_template(variant),
        context! { title, date, briefing },
    )
}

pub fn render_research_prompt(date: &str, reports: &str) -> Result<String, minijinja::Error> {
    Environment::new().render_str(RESEARCH_PROMPT, context! { date, reports })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_template() {
        for variant in ReportVariant::ALL {
            let prompt =
                render_briefing_prompt(variant, "Briefing", "2024-01-03", "## 1. Market\n\nKOSPI")
                    .unwrap();
            assert!(prompt.contains("## 1. Market\n\nKOSPI"));
            assert!(prompt.contains("2024-01-03"));
            assert!(!prompt.contains("{{"));
        }
    }

    #[test]
    fn test_variant_templates_differ() {
        assert_ne!(
            briefing_template(ReportVariant::PreOpen),
            briefing_template(ReportVariant::PostClose)
        );
        assert!(briefing_template(ReportVariant::Intraday).contains("Afternoon outlook"));
    }

    #[test]
    fn test_briefing_is_not_escaped() {
        let prompt = render_briefing_prompt(
            ReportVariant::PostClose,
            "After-Market Briefing",
            "2024-01-03",
            "- [Chips & Autos](https://example.com/?a=1&b=2)",
        )
        .unwrap();
        assert!(prompt.contains("- [Chips & Autos](https://example.com/?a=1&b=2)"));
    }

    #[test]
    fn test_research_prompt() {
        let prompt =
            render_research_prompt("2024-01-02", "\n\n### 20240102_strategy\n\ntext").unwrap();
        assert!(prompt.ends_with("### 20240102_strategy\n\ntext"));
        assert!(prompt.contains("daily report for 2024-01-02"));
    }
}
