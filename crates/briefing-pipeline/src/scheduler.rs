//! Daily wall-clock schedule for the daemon

use async_trait::async_trait;
use briefing_core::{BriefingError, Result, ScheduleSpec, ScheduledJob};
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

/// A parsed schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEntry {
    pub at: NaiveTime,
    pub job: ScheduledJob,
    /// Request a narrative for briefing jobs
    pub narrative: bool,
}

/// Entries sorted by time of day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    entries: Vec<ScheduledEntry>,
}

impl Schedule {
    pub fn from_specs(specs: &[ScheduleSpec]) -> Result<Self> {
        let mut entries = specs
            .iter()
            .map(|spec| {
                Ok(ScheduledEntry {
                    at: spec.time()?,
                    job: spec.job,
                    narrative: spec.narrative,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        // Stable, so jobs sharing a time keep their configured order
        entries.sort_by_key(|entry| entry.at);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next trigger strictly after `now`, with every entry due at that moment
    ///
    /// Wraps to the first entry of the following day once today's are past.
    pub fn next_after(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, &[ScheduledEntry])> {
        let first = self.entries.first()?;
        let today = now.time();

        let (date, at) = match self.entries.iter().find(|entry| entry.at > today) {
            Some(entry) => (now.date(), entry.at),
            None => (now.date() + Duration::days(1), first.at),
        };

        let start = self.entries.iter().position(|entry| entry.at == at)?;
        let len = self.entries[start..]
            .iter()
            .take_while(|entry| entry.at == at)
            .count();
        Some((date.and_time(at), &self.entries[start..start + len]))
    }
}

/// Executes one scheduled job
///
/// Implementations handle their own failures; the daemon keeps going
/// regardless of how a job ends.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run_job(&self, entry: &ScheduledEntry);
}

/// Sleep until each trigger and run its jobs one after another, forever
pub async fn run_daemon(schedule: &Schedule, runner: &dyn JobRunner) -> Result<()> {
    if schedule.is_empty() {
        return Err(BriefingError::Config("schedule has no entries".to_string()));
    }

    for entry in schedule.entries() {
        info!("Scheduled {} at {}", entry.job, entry.at.format("%H:%M"));
    }

    let mut last_trigger: Option<NaiveDateTime> = None;
    loop {
        let now = Local::now().naive_local();
        let from = last_trigger.map_or(now, |last| last.max(now));
        let Some((at, entries)) = schedule.next_after(from) else {
            return Err(BriefingError::Config("schedule has no entries".to_string()));
        };

        let wait = (at - now).to_std().unwrap_or_default();
        info!(
            "Next run at {} ({} job(s)), sleeping {}s",
            at.format("%Y-%m-%d %H:%M"),
            entries.len(),
            wait.as_secs()
        );
        tokio::time::sleep(wait).await;

        for entry in entries {
            info!("Starting scheduled {}", entry.job);
            runner.run_job(entry).await;
        }

        let finished = Local::now().naive_local();
        let overrun = schedule
            .next_after(at)
            .map(|(next, _)| next)
            .filter(|next| finished > *next);
        if let Some(next) = overrun {
            warn!("Jobs ran past the {} trigger, it will be skipped", next.format("%H:%M"));
        }
        last_trigger = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefing_core::ReportVariant;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn default_schedule() -> Schedule {
        Schedule::from_specs(&briefing_core::BriefingConfig::default().schedule).unwrap()
    }

    #[test]
    fn test_next_later_today() {
        let schedule = default_schedule();
        let (when, entries) = schedule.next_after(at(3, 9, 0)).unwrap();
        assert_eq!(when, at(3, 12, 30));
        assert_eq!(entries[0].job, ScheduledJob::Briefing(ReportVariant::Intraday));
    }

    #[test]
    fn test_exact_trigger_time_moves_on() {
        let schedule = default_schedule();
        let (when, _) = schedule.next_after(at(3, 8, 0)).unwrap();
        assert_eq!(when, at(3, 12, 30));
    }

    #[test]
    fn test_wraps_to_tomorrow() {
        let schedule = default_schedule();
        let (when, entries) = schedule.next_after(at(3, 18, 30)).unwrap();
        assert_eq!(when, at(4, 7, 30));
        assert_eq!(entries[0].job, ScheduledJob::Research);
    }

    #[test]
    fn test_shared_time_returns_all_jobs_in_order() {
        let schedule = Schedule::from_specs(&[
            ScheduleSpec::new("18:00", ScheduledJob::Briefing(ReportVariant::PostClose), true),
            ScheduleSpec::new("07:00", ScheduledJob::Research, false),
            ScheduleSpec::new("18:00", ScheduledJob::Research, false),
        ])
        .unwrap();

        let (when, entries) = schedule.next_after(at(3, 12, 0)).unwrap();
        assert_eq!(when, at(3, 18, 0));
        let jobs: Vec<_> = entries.iter().map(|e| e.job).collect();
        assert_eq!(
            jobs,
            vec![ScheduledJob::Briefing(ReportVariant::PostClose), ScheduledJob::Research]
        );
    }

    #[test]
    fn test_invalid_time_is_config_error() {
        let result =
            Schedule::from_specs(&[ScheduleSpec::new("25:00", ScheduledJob::Research, false)]);
        assert!(matches!(result, Err(BriefingError::Config(_))));
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = Schedule::from_specs(&[]).unwrap();
        assert!(schedule.next_after(at(3, 9, 0)).is_none());
    }

    #[tokio::test]
    async fn test_daemon_rejects_empty_schedule() {
        struct Noop;

        #[async_trait]
        impl JobRunner for Noop {
            async fn run_job(&self, _entry: &ScheduledEntry) {}
        }

        let result = run_daemon(&Schedule::default(), &Noop).await;
        assert!(matches!(result, Err(BriefingError::Config(_))));
    }
}
