//! Duplicate scene detection within a single catalog scope.
//!
//! Detection is pure: [`find_duplicates`] compares every same-studio pair and
//! resolves each surviving pair to (keep, duplicate) by file quality. Tagging
//! the duplicates is a separate two-phase step: [`plan_tag_updates`] decides
//! which tags each scene gains, [`apply_tag_updates`] writes them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scenekeeper_core::{
    DEFAULT_DATE_WINDOW_DAYS, Scene, date_match, normalize_text, numbers_compatible,
    title_similarity,
};

use crate::source::{SourceError, TagWriter};

/// Tag applied to the lower-quality member of each pair.
pub const DUPLICATE_TAG: &str = "_DuplicateMarkForDeletion";

/// Tag that shields a scene from cleanup; spread to both members of a pair.
pub const PROTECT_TAG: &str = "_Protected";

/// Thresholds for pairwise comparison.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateOptions {
    /// Minimum normalized title similarity, in `[0, 1]`.
    pub similarity_threshold: f64,
    /// Maximum distance in days between two known dates.
    pub date_window_days: i64,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            date_window_days: DEFAULT_DATE_WINDOW_DAYS,
        }
    }
}

/// A resolved duplicate pair.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateCandidate<'a> {
    pub keep: &'a Scene,
    pub duplicate: &'a Scene,
    pub similarity: f64,
}

struct NormalizedScene<'a> {
    scene: &'a Scene,
    title: String,
    studio: String,
}

/// Find all duplicate pairs among `scenes`.
///
/// Pairs are only compared within the same normalized studio. A pair
/// survives when the titles carry the same numbers, the dates fall inside
/// the window (unknown dates match anything) and the title similarity
/// reaches the threshold. A scene may appear in several pairs; pairs are
/// returned in input order of their first member.
pub fn find_duplicates<'a>(
    scenes: &'a [Scene],
    options: &DuplicateOptions,
) -> Vec<DuplicateCandidate<'a>> {
    let normalized: Vec<NormalizedScene<'a>> = scenes
        .iter()
        .map(|scene| NormalizedScene {
            scene,
            title: normalize_text(&scene.title),
            studio: normalize_text(scene.studio_name().unwrap_or_default()),
        })
        .collect();

    let mut pairs = Vec::new();
    for (i, a) in normalized.iter().enumerate() {
        for b in &normalized[i + 1..] {
            if a.studio != b.studio {
                continue;
            }
            if !numbers_compatible(&a.title, &b.title) {
                continue;
            }
            if !date_match(a.scene.date_str(), b.scene.date_str(), options.date_window_days) {
                continue;
            }
            let similarity = title_similarity(&a.title, &b.title);
            if similarity < options.similarity_threshold {
                continue;
            }
            let (keep, duplicate) = pick_duplicate(a.scene, b.scene);
            pairs.push(DuplicateCandidate {
                keep,
                duplicate,
                similarity,
            });
        }
    }
    pairs
}

/// Decide which of two scenes is the duplicate. Returns `(keep, duplicate)`.
///
/// Lower best resolution loses, then lower best file size. On a full tie the
/// scene whose id sorts greater is the duplicate, which makes the result
/// independent of argument order.
pub fn pick_duplicate<'a>(a: &'a Scene, b: &'a Scene) -> (&'a Scene, &'a Scene) {
    let qa = a.quality();
    let qb = b.quality();
    if qa.resolution != qb.resolution {
        return if qa.resolution < qb.resolution { (b, a) } else { (a, b) };
    }
    if qa.size != qb.size {
        return if qa.size < qb.size { (b, a) } else { (a, b) };
    }
    if a.id > b.id { (b, a) } else { (a, b) }
}

// ── Report ──────────────────────────────────────────────────────────────────

/// Id and title of one side of a reported pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRef {
    pub id: String,
    pub title: String,
}

impl From<&Scene> for SceneRef {
    fn from(scene: &Scene) -> Self {
        Self {
            id: scene.id.clone(),
            title: scene.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePairEntry {
    pub keep: SceneRef,
    pub duplicate: SceneRef,
    pub similarity: f64,
}

/// The duplicate-pairs report artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub generated_at: DateTime<Utc>,
    pub pairs: Vec<DuplicatePairEntry>,
}

impl DuplicateReport {
    pub fn new(generated_at: DateTime<Utc>, candidates: &[DuplicateCandidate<'_>]) -> Self {
        Self {
            generated_at,
            pairs: candidates
                .iter()
                .map(|c| DuplicatePairEntry {
                    keep: c.keep.into(),
                    duplicate: c.duplicate.into(),
                    similarity: c.similarity,
                })
                .collect(),
        }
    }
}

// ── Tag application ─────────────────────────────────────────────────────────

/// Tags one scene gains from duplicate resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUpdate {
    pub scene_id: String,
    /// Tag ids the scene already had when it was fetched.
    pub existing_tag_ids: Vec<String>,
    /// Tag names to add, in the order they were decided.
    pub add: Vec<String>,
}

impl TagUpdate {
    fn push(&mut self, name: &str) {
        if !self.add.iter().any(|n| n == name) {
            self.add.push(name.to_string());
        }
    }
}

/// Statistics from applying tag updates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyStats {
    pub scenes_updated: usize,
    pub duplicates_tagged: usize,
    pub protection_added: usize,
}

/// Work out which tags each scene needs.
///
/// Every duplicate gains `duplicate_tag` unless it already carries it. If
/// either member of a pair is protected (already tagged, or gaining the tag
/// from an earlier pair in this plan) both members gain `protect_tag`, so
/// that tagging a duplicate never strips its protection. Scenes that need
/// nothing new are left out of the plan.
pub fn plan_tag_updates(
    candidates: &[DuplicateCandidate<'_>],
    duplicate_tag: &str,
    protect_tag: &str,
) -> Vec<TagUpdate> {
    let mut updates: Vec<TagUpdate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let keep_slot = update_slot(&mut updates, &mut index, candidate.keep);
        let dup_slot = update_slot(&mut updates, &mut index, candidate.duplicate);

        let is_protected = |scene: &Scene, at: usize, updates: &[TagUpdate]| {
            scene.has_tag_named(protect_tag) || updates[at].add.iter().any(|n| n == protect_tag)
        };
        let keep_protected = is_protected(candidate.keep, keep_slot, &updates);
        let dup_protected = is_protected(candidate.duplicate, dup_slot, &updates);

        if !candidate.duplicate.has_tag_named(duplicate_tag) {
            updates[dup_slot].push(duplicate_tag);
        }
        if keep_protected || dup_protected {
            if !keep_protected {
                updates[keep_slot].push(protect_tag);
            }
            if !dup_protected {
                updates[dup_slot].push(protect_tag);
            }
        }
    }

    updates.retain(|u| !u.add.is_empty());
    updates
}

fn update_slot(
    updates: &mut Vec<TagUpdate>,
    index: &mut HashMap<String, usize>,
    scene: &Scene,
) -> usize {
    if let Some(&at) = index.get(&scene.id) {
        return at;
    }
    updates.push(TagUpdate {
        scene_id: scene.id.clone(),
        existing_tag_ids: scene.tags.iter().map(|t| t.id.clone()).collect(),
        add: Vec::new(),
    });
    index.insert(scene.id.clone(), updates.len() - 1);
    updates.len() - 1
}

/// Write planned tag updates through `writer`.
///
/// Tag names are resolved to ids once each. Every write sends the union of
/// the scene's existing tags and the new ones, so no tag is ever removed.
pub fn apply_tag_updates<W>(
    writer: &W,
    updates: &[TagUpdate],
    duplicate_tag: &str,
    protect_tag: &str,
) -> Result<ApplyStats, SourceError>
where
    W: TagWriter + ?Sized,
{
    let mut stats = ApplyStats::default();
    let mut tag_ids: HashMap<String, String> = HashMap::new();

    for update in updates {
        let mut ids = update.existing_tag_ids.clone();
        for name in &update.add {
            let id = match tag_ids.get(name) {
                Some(id) => id.clone(),
                None => {
                    let id = writer.find_or_create_tag(name)?;
                    tag_ids.insert(name.clone(), id.clone());
                    id
                }
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        writer.set_scene_tags(&update.scene_id, &ids)?;
        stats.scenes_updated += 1;
        if update.add.iter().any(|n| n == duplicate_tag) {
            stats.duplicates_tagged += 1;
        }
        if update.add.iter().any(|n| n == protect_tag) {
            stats.protection_added += 1;
        }
        log::debug!("Tagged scene {} with {:?}", update.scene_id, update.add);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn acme(id: &str, title: &str) -> Scene {
        Scene::new(id, title).with_studio("s1", "Acme")
    }

    #[test]
    fn scenario_a_same_studio_pair_keeps_higher_resolution() {
        let scenes = vec![
            acme("1", "Scene One").with_date("2024-03-01").with_file(1920, 1080, 100),
            acme("2", "scene one!").with_date("2024-03-01").with_file(1280, 720, 100),
        ];
        let pairs = find_duplicates(&scenes, &DuplicateOptions::default());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].keep.id, "1");
        assert_eq!(pairs[0].duplicate.id, "2");
        assert_eq!(pairs[0].similarity, 1.0);
    }

    #[test]
    fn never_pairs_across_studios() {
        let scenes = vec![
            acme("1", "Identical Title"),
            Scene::new("2", "Identical Title").with_studio("s2", "Other Studio"),
            Scene::new("3", "Identical Title"),
        ];
        assert!(find_duplicates(&scenes, &DuplicateOptions::default()).is_empty());
    }

    #[test]
    fn studio_comparison_is_normalized() {
        let scenes = vec![
            acme("1", "Title"),
            Scene::new("2", "Title").with_studio("s9", "  ACME! "),
        ];
        assert_eq!(find_duplicates(&scenes, &DuplicateOptions::default()).len(), 1);
    }

    #[test]
    fn number_mismatch_blocks_pair() {
        let scenes = vec![acme("1", "Road Trip Part 1"), acme("2", "Road Trip Part 2")];
        assert!(find_duplicates(&scenes, &DuplicateOptions::default()).is_empty());
    }

    #[test]
    fn dates_outside_window_block_pair() {
        let scenes = vec![
            acme("1", "Title").with_date("2024-01-01"),
            acme("2", "Title").with_date("2024-01-20"),
        ];
        assert!(find_duplicates(&scenes, &DuplicateOptions::default()).is_empty());

        let wide = DuplicateOptions {
            date_window_days: 30,
            ..Default::default()
        };
        assert_eq!(find_duplicates(&scenes, &wide).len(), 1);
    }

    #[test]
    fn unknown_date_is_wildcard() {
        let scenes = vec![acme("1", "Title").with_date("2024-01-01"), acme("2", "Title")];
        assert_eq!(find_duplicates(&scenes, &DuplicateOptions::default()).len(), 1);
    }

    #[test]
    fn low_similarity_is_rejected() {
        let scenes = vec![acme("1", "Morning Session"), acme("2", "Evening Session")];
        assert!(find_duplicates(&scenes, &DuplicateOptions::default()).is_empty());
    }

    #[test]
    fn empty_titles_pair_with_each_other_only() {
        let scenes = vec![acme("1", ""), acme("2", "?!"), acme("3", "Something")];
        let pairs = find_duplicates(&scenes, &DuplicateOptions::default());
        assert_eq!(pairs.len(), 1);
        let ids = [pairs[0].keep.id.as_str(), pairs[0].duplicate.id.as_str()];
        assert!(ids.contains(&"1") && ids.contains(&"2"));
    }

    #[test]
    fn one_scene_may_appear_in_several_pairs() {
        let scenes = vec![acme("1", "Title"), acme("2", "Title"), acme("3", "Title")];
        assert_eq!(find_duplicates(&scenes, &DuplicateOptions::default()).len(), 3);
    }

    #[test]
    fn pick_duplicate_prefers_size_when_resolution_ties() {
        let big = acme("1", "t").with_file(1920, 1080, 9_000);
        let small = acme("2", "t").with_file(1920, 1080, 1_000);
        let (keep, dup) = pick_duplicate(&big, &small);
        assert_eq!((keep.id.as_str(), dup.id.as_str()), ("1", "2"));
    }

    #[test]
    fn pick_duplicate_is_order_independent() {
        let cases = vec![
            (acme("a", "t").with_file(640, 480, 1), acme("b", "t").with_file(1280, 720, 1)),
            (acme("a", "t").with_file(640, 480, 5), acme("b", "t").with_file(640, 480, 1)),
            (acme("10", "t"), acme("9", "t")),
            (acme("x", "t").with_file(1, 1, 1), acme("y", "t").with_file(1, 1, 1)),
        ];
        for (a, b) in &cases {
            let (k1, d1) = pick_duplicate(a, b);
            let (k2, d2) = pick_duplicate(b, a);
            assert_eq!(k1.id, k2.id);
            assert_eq!(d1.id, d2.id);
        }
    }

    #[test]
    fn pick_duplicate_tie_break_marks_greater_id() {
        let a = acme("10", "t");
        let b = acme("9", "t");
        // "9" > "10" lexicographically
        let (keep, dup) = pick_duplicate(&a, &b);
        assert_eq!(keep.id, "10");
        assert_eq!(dup.id, "9");
    }

    #[test]
    fn no_files_lose_to_any_file() {
        let empty = acme("1", "t");
        let tiny = acme("2", "t").with_file(1, 1, 1);
        let (keep, dup) = pick_duplicate(&empty, &tiny);
        assert_eq!(keep.id, "2");
        assert_eq!(dup.id, "1");
    }

    #[test]
    fn plan_tags_duplicate_only() {
        let scenes = vec![
            acme("1", "Title").with_file(1920, 1080, 1),
            acme("2", "Title").with_file(1280, 720, 1).with_tag("t5", "Favorite"),
        ];
        let pairs = find_duplicates(&scenes, &DuplicateOptions::default());
        let plan = plan_tag_updates(&pairs, DUPLICATE_TAG, PROTECT_TAG);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].scene_id, "2");
        assert_eq!(plan[0].existing_tag_ids, vec!["t5".to_string()]);
        assert_eq!(plan[0].add, vec![DUPLICATE_TAG.to_string()]);
    }

    #[test]
    fn plan_propagates_protection_to_both_members() {
        let scenes = vec![
            acme("1", "Title").with_file(1920, 1080, 1),
            acme("2", "Title").with_file(1280, 720, 1).with_tag("p", PROTECT_TAG),
        ];
        let pairs = find_duplicates(&scenes, &DuplicateOptions::default());
        let plan = plan_tag_updates(&pairs, DUPLICATE_TAG, PROTECT_TAG);
        let keep = plan.iter().find(|u| u.scene_id == "1").unwrap();
        let dup = plan.iter().find(|u| u.scene_id == "2").unwrap();
        assert_eq!(keep.add, vec![PROTECT_TAG.to_string()]);
        assert_eq!(dup.add, vec![DUPLICATE_TAG.to_string()]);
    }

    #[test]
    fn plan_skips_already_tagged_duplicate() {
        let scenes = vec![
            acme("1", "Title").with_file(1920, 1080, 1),
            acme("2", "Title").with_file(1280, 720, 1).with_tag("d", DUPLICATE_TAG),
        ];
        let pairs = find_duplicates(&scenes, &DuplicateOptions::default());
        assert!(plan_tag_updates(&pairs, DUPLICATE_TAG, PROTECT_TAG).is_empty());
    }

    #[derive(Default)]
    struct RecordingWriter {
        created: RefCell<Vec<String>>,
        writes: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl TagWriter for RecordingWriter {
        fn find_or_create_tag(&self, name: &str) -> Result<String, SourceError> {
            self.created.borrow_mut().push(name.to_string());
            Ok(format!("id-{name}"))
        }

        fn set_scene_tags(&self, scene_id: &str, tag_ids: &[String]) -> Result<(), SourceError> {
            self.writes
                .borrow_mut()
                .push((scene_id.to_string(), tag_ids.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn apply_keeps_existing_tags_and_resolves_names_once() {
        let updates = vec![
            TagUpdate {
                scene_id: "2".into(),
                existing_tag_ids: vec!["t5".into()],
                add: vec![DUPLICATE_TAG.into()],
            },
            TagUpdate {
                scene_id: "3".into(),
                existing_tag_ids: vec![],
                add: vec![DUPLICATE_TAG.into(), PROTECT_TAG.into()],
            },
        ];
        let writer = RecordingWriter::default();
        let stats = apply_tag_updates(&writer, &updates, DUPLICATE_TAG, PROTECT_TAG).unwrap();

        assert_eq!(
            stats,
            ApplyStats {
                scenes_updated: 2,
                duplicates_tagged: 2,
                protection_added: 1,
            }
        );
        assert_eq!(writer.created.borrow().len(), 2);
        let writes = writer.writes.borrow();
        assert_eq!(
            writes[0],
            ("2".to_string(), vec!["t5".to_string(), format!("id-{DUPLICATE_TAG}")])
        );
        assert_eq!(writes[1].1.len(), 2);
    }
}
