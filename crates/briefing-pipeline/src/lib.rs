//! Orchestration for market briefings and research digests
//!
//! A briefing run flows through four steps, each in its own module:
//! [`Aggregator`] collects a snapshot, [`compose`] turns it into a
//! [`Document`], [`NarrativeInjector`] optionally adds LLM prose, and
//! [`Publisher`] writes the markdown file. [`BriefingService`] ties them
//! together for one variant. The research path lives in [`research`], and
//! [`scheduler`] drives both from the daemon.

pub mod aggregator;
pub mod composer;
pub mod document;
pub mod injector;
pub mod prompts;
pub mod publisher;
pub mod research;
pub mod scheduler;
pub mod service;
pub mod status;

#[cfg(test)]
mod fakes;

pub use aggregator::Aggregator;
pub use composer::compose;
pub use document::{Document, Section};
pub use injector::NarrativeInjector;
pub use publisher::{Publisher, briefing_file_name};
pub use research::{DownloadLedger, ResearchOptions, ResearchOutcome, ResearchPipeline, Stage};
pub use scheduler::{JobRunner, Schedule, ScheduledEntry, run_daemon};
pub use service::{BriefingService, RunOutcome};
pub use status::{ComponentKind, StatusInputs, StatusRow, status};
