use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::acquisition::{AcquisitionOutcome, AcquisitionStatus};

/// Outcome counts for one acquisition run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub queued: usize,
    pub dry_run: usize,
    pub episode_not_found: usize,
    pub studio_missing: usize,
    pub skipped_no_studio: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.queued
            + self.dry_run
            + self.episode_not_found
            + self.studio_missing
            + self.skipped_no_studio
            + self.failed
    }
}

/// Collects one acquisition run and appends it to `readable.log`.
#[derive(Debug)]
pub struct RunLog {
    performer_id: String,
    dry_run: bool,
    cutoff: Option<DateTime<Utc>>,
    total_missing: usize,
    skipped_old: usize,
    entries: Vec<AcquisitionOutcome>,
}

impl RunLog {
    pub fn new(performer_id: &str, dry_run: bool) -> Self {
        Self {
            performer_id: performer_id.to_string(),
            dry_run,
            cutoff: None,
            total_missing: 0,
            skipped_old: 0,
            entries: Vec::new(),
        }
    }

    /// Record how the candidate set was derived.
    pub fn set_selection(
        &mut self,
        cutoff: Option<DateTime<Utc>>,
        total_missing: usize,
        skipped_old: usize,
    ) {
        self.cutoff = cutoff;
        self.total_missing = total_missing;
        self.skipped_old = skipped_old;
    }

    pub fn add(&mut self, outcome: AcquisitionOutcome) {
        self.entries.push(outcome);
    }

    pub fn entries(&self) -> &[AcquisitionOutcome] {
        &self.entries
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for entry in &self.entries {
            match entry.status {
                AcquisitionStatus::QueuedEpisodeSearch => summary.queued += 1,
                AcquisitionStatus::DryRunWouldQueueSearch => summary.dry_run += 1,
                AcquisitionStatus::EpisodeNotFound => summary.episode_not_found += 1,
                AcquisitionStatus::StudioMissingInLibrary => summary.studio_missing += 1,
                AcquisitionStatus::SkippedNoStudio => summary.skipped_no_studio += 1,
                AcquisitionStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Append this run to the log at `path`. Earlier runs are kept.
    pub fn append_to_file(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        self.write_to(&mut file)
    }

    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        let summary = self.summary();

        writeln!(out, "=== Acquisition Run ===")?;
        writeln!(
            out,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out, "Performer: {}", self.performer_id)?;
        writeln!(out, "Dry run: {}", self.dry_run)?;
        match self.cutoff {
            Some(cutoff) => writeln!(out, "Cutoff: {}", cutoff.format("%Y-%m-%dT%H:%M:%SZ"))?,
            None => writeln!(out, "Cutoff: none")?,
        }
        writeln!(
            out,
            "Selected: {} of {} missing (skipped by cutoff: {})",
            self.entries.len(),
            self.total_missing,
            self.skipped_old
        )?;
        writeln!(out)?;
        writeln!(out, "--- Summary ---")?;
        writeln!(out, "Searches queued: {}", summary.queued)?;
        writeln!(out, "Dry-run matches: {}", summary.dry_run)?;
        writeln!(out, "Episode not found: {}", summary.episode_not_found)?;
        writeln!(out, "Studio not in library: {}", summary.studio_missing)?;
        writeln!(out, "No studio: {}", summary.skipped_no_studio)?;
        writeln!(out, "Failed: {}", summary.failed)?;
        writeln!(out)?;
        writeln!(out, "--- Details ---")?;

        for entry in &self.entries {
            let tag = match entry.status {
                AcquisitionStatus::QueuedEpisodeSearch => "QUEUED",
                AcquisitionStatus::DryRunWouldQueueSearch => "DRY-RUN",
                AcquisitionStatus::EpisodeNotFound => "NO-EPISODE",
                AcquisitionStatus::StudioMissingInLibrary => "NO-SERIES",
                AcquisitionStatus::SkippedNoStudio => "SKIPPED",
                AcquisitionStatus::Failed => "FAILED",
            };
            writeln!(
                out,
                "[{}] '{}' | date={} | studio='{}'",
                tag,
                entry.title,
                entry.date.as_deref().unwrap_or("unknown"),
                if entry.studio.is_empty() { "UNKNOWN" } else { &entry.studio }
            )?;
            writeln!(out, "     {}", entry.describe())?;
        }
        writeln!(out)?;

        Ok(())
    }
}
