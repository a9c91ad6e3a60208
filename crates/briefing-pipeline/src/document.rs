//! Structural model of a composed briefing
//!
//! A document is an ordered list of named sections. Markdown is produced only
//! by [`Document::render`], so later steps edit the structure rather than the
//! rendered text.

use serde::Serialize;

pub const HEADER: &str = "header";
pub const NARRATIVE: &str = "narrative";
pub const DISCLAIMER: &str = "disclaimer";

const SEPARATOR: &str = "\n\n---\n\n";

/// One named block of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    /// Rendered as a `##` heading above the body
    pub heading: Option<String>,
    pub body: String,
}

impl Section {
    pub fn new(
        name: impl Into<String>,
        heading: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            heading: Some(heading.into()),
            body: body.into(),
        }
    }

    /// Section rendered without a heading
    pub fn plain(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            heading: None,
            body: body.into(),
        }
    }

    fn render(&self) -> String {
        let body = self.body.trim_end();
        match &self.heading {
            Some(heading) => format!("## {heading}\n\n{body}"),
            None => body.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    /// Insert `section` right before the section named `anchor`, or append it
    ///
    /// Returns whether the anchor was found.
    pub fn insert_before(&mut self, anchor: &str, section: Section) -> bool {
        match self.position(anchor) {
            Some(index) => {
                self.sections.insert(index, section);
                true
            }
            None => {
                self.sections.push(section);
                false
            }
        }
    }

    /// Markdown text of the document
    pub fn render(&self) -> String {
        let mut out = self
            .sections
            .iter()
            .map(Section::render)
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        out.push('\n');
        out
    }
}
