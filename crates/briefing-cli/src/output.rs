//! Terminal rendering for status and diagnostics

use briefing_core::{SectionResult, SourceKey};
use briefing_pipeline::StatusRow;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

fn availability_cell(available: bool) -> Cell {
    if available {
        Cell::new("yes").fg(Color::Green)
    } else {
        Cell::new("no").fg(Color::Red)
    }
}

pub fn status_table(rows: &[StatusRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Kind").fg(Color::Cyan),
            Cell::new("Component").fg(Color::Cyan),
            Cell::new("Available").fg(Color::Cyan),
            Cell::new("Detail").fg(Color::Cyan),
        ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(row.kind.as_str()),
            Cell::new(&row.name),
            availability_cell(row.available),
            Cell::new(&row.detail),
        ]);
    }
    table
}

pub fn print_status(rows: &[StatusRow]) {
    println!("{}", status_table(rows));
}

pub fn print_section(key: SourceKey, section: &SectionResult) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .add_row(vec![Cell::new("Source"), Cell::new(key.as_str())])
        .add_row(vec![Cell::new("Available"), availability_cell(section.is_available())])
        .add_row(vec![
            Cell::new("Records"),
            Cell::new(section.raw_records().len().to_string()),
        ]);

    println!("{table}\n");
    println!("{}", section.rendered_text());
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefing_pipeline::ComponentKind;

    #[test]
    fn test_status_table_lists_every_row() {
        let rows = vec![
            StatusRow {
                kind: ComponentKind::Source,
                name: "OpenDART (disclosures)".to_string(),
                available: false,
                detail: "DART_API_KEY is not set".to_string(),
            },
            StatusRow {
                kind: ComponentKind::Credential,
                name: "FRED_API_KEY".to_string(),
                available: true,
                detail: "set".to_string(),
            },
        ];

        let rendered = status_table(&rows).to_string();
        assert!(rendered.contains("OpenDART (disclosures)"));
        assert!(rendered.contains("DART_API_KEY is not set"));
        assert!(rendered.contains("FRED_API_KEY"));
    }
}
