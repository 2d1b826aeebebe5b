//! Reconciliation logic between the local library, the canonical metadata
//! catalog and the acquisition system.
//!
//! This crate owns every non-trivial decision in the pipeline: resolving
//! cross-catalog identities, detecting duplicate scenes, diffing the local
//! library against the canonical catalog, matching missing scenes to
//! acquisition units and keeping the incremental attempt ledger. All I/O
//! with the outside world goes through the traits in [`source`]; the only
//! files touched here are the JSON run artifacts.

pub mod acquisition;
pub mod artifacts;
pub mod diff;
pub mod duplicates;
pub mod error;
pub mod history;
pub mod identity;
pub mod progress;
pub mod run_log;
pub mod selection;
pub mod source;
pub mod state;
pub mod studios;

pub use acquisition::{
    AcquisitionMatcher, AcquisitionOutcome, AcquisitionStatus, MatchPass, SeriesIndex,
    match_episode, run_acquisition,
};
pub use artifacts::{
    AcquisitionActionsDoc, CanonicalPerformerDoc, LocalScenesDoc, MissingDoc, RunLayout,
    read_artifact, write_artifact,
};
pub use diff::{CatalogDiff, DiffStats, MissingScene, compute_missing};
pub use duplicates::{
    ApplyStats, DUPLICATE_TAG, DuplicateCandidate, DuplicateOptions, DuplicatePairEntry,
    DuplicateReport, PROTECT_TAG, SceneRef, TagUpdate, apply_tag_updates, find_duplicates,
    pick_duplicate, plan_tag_updates,
};
pub use error::ReconcileError;
pub use history::{FavoritePerformers, HistoryDoc, favorite_performers};
pub use identity::{ResolvedPerformer, find_performer_by_external_id, resolve_local_performer};
pub use progress::{AcquisitionProgress, SilentProgress};
pub use run_log::{RunLog, RunSummary};
pub use selection::Selection;
pub use source::{
    AcquisitionSystem, AddSeries, CanonicalCatalog, LocalCatalog, Page, SourceError, TagWriter,
    collect_pages,
};
pub use state::{
    CutoffResult, DEFAULT_LOOKBACK_DAYS, JsonStateStore, MatchState, SceneAttempt, StateStore,
    apply_cutoff,
};
pub use studios::{
    StudioSyncEntry, StudioSyncOptions, StudioSyncPlan, StudioSyncReport, plan_studio_sync,
    series_path, sync_studios,
};

/// System tag identifying the canonical catalog in `ExternalId::endpoint`.
pub const CANONICAL_SYSTEM: &str = "stashdb";
