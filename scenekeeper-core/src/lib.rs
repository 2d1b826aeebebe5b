//! Core data model and text/date normalization shared by every scenekeeper crate.
//!
//! Nothing in here talks to the network or the filesystem. Scenes, performers
//! and acquisition units are plain snapshots; the normalization helpers are
//! pure functions used by duplicate detection, catalog diffing and the
//! acquisition matcher.

pub mod model;
pub mod normalize;

pub use model::{
    ExternalId, FileMetrics, LeafUnit, Performer, PerformerMeta, Quality, Scene, SeriesUnit,
    Studio, Tag,
};
pub use normalize::{
    DEFAULT_DATE_WINDOW_DAYS, date_match, fold_title, looks_like_uuid, normalize_name_loose,
    normalize_text, number_tokens, numbers_compatible, parse_date, title_similarity,
};
