//! Matching missing scenes to acquisition units and queueing searches.
//!
//! Each missing scene walks a small state machine: studio → series (via an
//! index built once per run) → episode (episode lists cached per series) →
//! search command. Every walk ends in exactly one [`AcquisitionStatus`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scenekeeper_core::{LeafUnit, SeriesUnit, fold_title, parse_date};

use crate::diff::MissingScene;
use crate::progress::AcquisitionProgress;
use crate::source::{AcquisitionSystem, SourceError};
use crate::state::MatchState;

// ── Status ──────────────────────────────────────────────────────────────────

/// Terminal status of one missing scene in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStatus {
    SkippedNoStudio,
    StudioMissingInLibrary,
    EpisodeNotFound,
    DryRunWouldQueueSearch,
    QueuedEpisodeSearch,
    /// A request concerning this scene alone was refused.
    Failed,
}

impl AcquisitionStatus {
    pub const ALL: [AcquisitionStatus; 6] = [
        Self::SkippedNoStudio,
        Self::StudioMissingInLibrary,
        Self::EpisodeNotFound,
        Self::DryRunWouldQueueSearch,
        Self::QueuedEpisodeSearch,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkippedNoStudio => "skipped_no_studio",
            Self::StudioMissingInLibrary => "studio_missing_in_library",
            Self::EpisodeNotFound => "episode_not_found",
            Self::DryRunWouldQueueSearch => "dry_run_would_queue_search",
            Self::QueuedEpisodeSearch => "queued_episode_search",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AcquisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which episode pass produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchPass {
    TitleAndDate,
    TitleOnly,
    /// Release date only, title ignored. Can pick an unrelated episode that
    /// shares the date.
    DateOnly,
}

impl fmt::Display for MatchPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleAndDate => write!(f, "title+date"),
            Self::TitleOnly => write!(f, "title"),
            Self::DateOnly => write!(f, "date"),
        }
    }
}

// ── Outcome ─────────────────────────────────────────────────────────────────

/// Result of processing one missing scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionOutcome {
    pub external_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub studio: String,
    pub status: AcquisitionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchPass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AcquisitionOutcome {
    fn new(scene: &MissingScene, status: AcquisitionStatus) -> Self {
        Self {
            external_id: scene.external_id.clone(),
            title: scene.title.trim().to_string(),
            date: scene.date_str().map(str::to_string),
            studio: scene.studio_name().to_string(),
            status,
            series_id: None,
            episode_id: None,
            matched_by: None,
            command_id: None,
            error: None,
        }
    }

    fn in_series(mut self, series_id: i64) -> Self {
        self.series_id = Some(series_id);
        self
    }

    fn failed(mut self, err: &SourceError) -> Self {
        self.status = AcquisitionStatus::Failed;
        self.error = Some(err.to_string());
        self
    }

    /// One-line human description, used for logs.
    pub fn describe(&self) -> String {
        match self.status {
            AcquisitionStatus::SkippedNoStudio => "Skipped: no studio".to_string(),
            AcquisitionStatus::StudioMissingInLibrary => {
                format!("Studio series not found: '{}'", self.studio)
            }
            AcquisitionStatus::EpisodeNotFound => {
                "Episode not found in studio series (title/date mismatch)".to_string()
            }
            AcquisitionStatus::DryRunWouldQueueSearch => format!(
                "Dry run: would queue EpisodeSearch for episode {}",
                self.episode_id.unwrap_or_default()
            ),
            AcquisitionStatus::QueuedEpisodeSearch => match self.command_id {
                Some(id) => format!("EpisodeSearch queued (commandId={})", id),
                None => "EpisodeSearch queued".to_string(),
            },
            AcquisitionStatus::Failed => format!(
                "Failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

// ── Series index ────────────────────────────────────────────────────────────

/// Series looked up by folded title.
#[derive(Debug, Default)]
pub struct SeriesIndex {
    by_title: HashMap<String, SeriesUnit>,
    series_count: usize,
}

impl SeriesIndex {
    /// Index `series` by [`fold_title`]. Untitled series are skipped; when
    /// two titles fold to the same key the later series wins.
    pub fn build(series: Vec<SeriesUnit>) -> Self {
        let series_count = series.len();
        let mut by_title = HashMap::new();
        for unit in series {
            let key = fold_title(&unit.title);
            if !key.is_empty() {
                by_title.insert(key, unit);
            }
        }
        Self {
            by_title,
            series_count,
        }
    }

    pub fn get(&self, studio: &str) -> Option<&SeriesUnit> {
        self.by_title.get(&fold_title(studio))
    }

    /// Number of indexed (titled, deduplicated) series.
    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }

    /// Number of series the index was built from.
    pub fn series_count(&self) -> usize {
        self.series_count
    }
}

/// Find the episode for `title`/`date` in one series.
///
/// Passes, in order: folded title and release date both equal; folded
/// title equal; release date equal (only when `date` parses). Within a pass
/// the first episode in list order wins.
pub fn match_episode<'a>(
    episodes: &'a [LeafUnit],
    title: &str,
    date: Option<&str>,
) -> Option<(&'a LeafUnit, MatchPass)> {
    let wanted_title = fold_title(title);
    let wanted_date = date.and_then(parse_date);
    let same_date = |e: &LeafUnit| {
        wanted_date.is_some() && e.release_date.as_deref().and_then(parse_date) == wanted_date
    };
    let same_title = |e: &LeafUnit| fold_title(&e.title) == wanted_title;

    if let Some(e) = episodes.iter().find(|&e| same_title(e) && same_date(e)) {
        return Some((e, MatchPass::TitleAndDate));
    }
    if let Some(e) = episodes.iter().find(|&e| same_title(e)) {
        return Some((e, MatchPass::TitleOnly));
    }
    episodes
        .iter()
        .find(|&e| same_date(e))
        .map(|e| (e, MatchPass::DateOnly))
}

// ── Matcher ─────────────────────────────────────────────────────────────────

/// Per-run matcher holding the series index and the episode cache.
pub struct AcquisitionMatcher<'a, S: AcquisitionSystem + ?Sized> {
    system: &'a S,
    index: SeriesIndex,
    episodes: HashMap<i64, Vec<LeafUnit>>,
    dry_run: bool,
}

impl<'a, S: AcquisitionSystem + ?Sized> AcquisitionMatcher<'a, S> {
    /// Fetch the series list and build the index.
    pub fn new(system: &'a S, dry_run: bool) -> Result<Self, SourceError> {
        let index = SeriesIndex::build(system.series_list()?);
        log::info!(
            "Series cached: {} ({} indexed)",
            index.series_count(),
            index.len()
        );
        Ok(Self {
            system,
            index,
            episodes: HashMap::new(),
            dry_run,
        })
    }

    /// Walk one missing scene to its terminal status.
    ///
    /// Record-scoped failures become [`AcquisitionStatus::Failed`]; any other
    /// collaborator error is returned and should abort the run.
    pub fn process(&mut self, scene: &MissingScene) -> Result<AcquisitionOutcome, SourceError> {
        let outcome = AcquisitionOutcome::new(scene, AcquisitionStatus::SkippedNoStudio);
        if outcome.studio.is_empty() {
            return Ok(outcome);
        }

        let Some(series_id) = self.index.get(&outcome.studio).map(|s| s.id) else {
            return Ok(AcquisitionOutcome {
                status: AcquisitionStatus::StudioMissingInLibrary,
                ..outcome
            });
        };
        let outcome = outcome.in_series(series_id);

        let episodes = match self.episodes_for(series_id) {
            Ok(episodes) => episodes,
            Err(e) if e.is_record_scoped() => return Ok(outcome.failed(&e)),
            Err(e) => return Err(e),
        };

        let matched = match_episode(episodes, &outcome.title, scene.date_str())
            .map(|(episode, pass)| (episode.id, pass));
        let Some((episode_id, pass)) = matched else {
            return Ok(AcquisitionOutcome {
                status: AcquisitionStatus::EpisodeNotFound,
                ..outcome
            });
        };
        let mut outcome = AcquisitionOutcome {
            episode_id: Some(episode_id),
            matched_by: Some(pass),
            ..outcome
        };
        log::debug!(
            "Matched episode {} in series {} by {}",
            episode_id,
            series_id,
            pass
        );

        if self.dry_run {
            outcome.status = AcquisitionStatus::DryRunWouldQueueSearch;
            return Ok(outcome);
        }

        match self.system.queue_episode_search(episode_id) {
            Ok(command_id) => {
                outcome.status = AcquisitionStatus::QueuedEpisodeSearch;
                outcome.command_id = command_id;
                Ok(outcome)
            }
            Err(e) if e.is_record_scoped() => Ok(outcome.failed(&e)),
            Err(e) => Err(e),
        }
    }

    fn episodes_for(&mut self, series_id: i64) -> Result<&[LeafUnit], SourceError> {
        if !self.episodes.contains_key(&series_id) {
            let fetched = self.system.episodes(series_id)?;
            log::debug!("Episodes cached for series {}: {}", series_id, fetched.len());
            self.episodes.insert(series_id, fetched);
        }
        Ok(self
            .episodes
            .get(&series_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

/// Process `candidates` in order and record every outcome in `state`.
///
/// `clock` supplies the attempt timestamps and the final run timestamp.
/// On error the run is abandoned and `state` must not be persisted.
pub fn run_acquisition<S>(
    system: &S,
    candidates: &[MissingScene],
    state: &mut MatchState,
    clock: &dyn Fn() -> DateTime<Utc>,
    dry_run: bool,
    progress: &dyn AcquisitionProgress,
) -> Result<Vec<AcquisitionOutcome>, SourceError>
where
    S: AcquisitionSystem + ?Sized,
{
    let mut outcomes = Vec::with_capacity(candidates.len());

    if !candidates.is_empty() {
        progress.on_phase("Fetching acquisition series list");
        let mut matcher = AcquisitionMatcher::new(system, dry_run)?;
        let total = candidates.len();

        for (i, scene) in candidates.iter().enumerate() {
            let outcome = matcher.process(scene)?;
            if outcome.external_id.trim().is_empty() {
                log::warn!("Scene '{}' has no canonical id; not recorded", outcome.title);
            } else {
                state.record_attempt(&outcome.external_id, outcome.status, clock());
            }
            progress.on_outcome(i + 1, total, &outcome);
            outcomes.push(outcome);
        }
    }

    state.finish_run(clock());
    progress.on_complete(&format!("Processed {} scenes", outcomes.len()));
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(id: i64, title: &str, date: Option<&str>) -> LeafUnit {
        LeafUnit {
            id,
            title: title.to_string(),
            release_date: date.map(str::to_string),
        }
    }

    fn series(id: i64, title: &str) -> SeriesUnit {
        SeriesUnit {
            id,
            title: title.to_string(),
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        for status in AcquisitionStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn index_is_case_insensitive_whole_title() {
        let index = SeriesIndex::build(vec![series(1, "Acme Studios"), series(2, "")]);
        assert_eq!(index.get("  acme studios ").map(|s| s.id), Some(1));
        assert!(index.get("Acme").is_none());
        assert_eq!(index.len(), 1);
        assert_eq!(index.series_count(), 2);
    }

    #[test]
    fn index_later_series_wins_on_clash() {
        let index = SeriesIndex::build(vec![series(1, "Acme"), series(2, "ACME")]);
        assert_eq!(index.get("acme").map(|s| s.id), Some(2));
    }

    #[test]
    fn pass_one_prefers_title_and_date() {
        let eps = vec![
            ep(1, "Scene", Some("2023-01-01")),
            ep(2, "Scene", Some("2024-01-01")),
        ];
        let (e, pass) = match_episode(&eps, "scene", Some("2024-01-01")).unwrap();
        assert_eq!((e.id, pass), (2, MatchPass::TitleAndDate));
    }

    #[test]
    fn pass_two_title_only() {
        let eps = vec![ep(1, "Other", Some("2024-01-01")), ep(2, "Scene", None)];
        let (e, pass) = match_episode(&eps, "Scene", Some("2024-01-01")).unwrap();
        assert_eq!((e.id, pass), (2, MatchPass::TitleOnly));
    }

    #[test]
    fn pass_three_date_only_is_loose() {
        let eps = vec![ep(7, "Unrelated", Some("2024-01-01"))];
        let (e, pass) = match_episode(&eps, "Scene", Some("2024-01-01")).unwrap();
        assert_eq!((e.id, pass), (7, MatchPass::DateOnly));
    }

    #[test]
    fn no_date_skips_date_passes() {
        let eps = vec![ep(7, "Unrelated", None)];
        assert!(match_episode(&eps, "Scene", None).is_none());
        assert!(match_episode(&eps, "Scene", Some("not a date")).is_none());
    }

    #[test]
    fn title_fold_keeps_punctuation() {
        let eps = vec![ep(1, "Scene One!", None)];
        assert!(match_episode(&eps, "scene one", None).is_none());
        assert!(match_episode(&eps, " SCENE ONE! ", None).is_some());
    }
}
