//! Mirroring local studios into the acquisition system as unmonitored series.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use scenekeeper_core::{SeriesUnit, Studio, normalize_name_loose};

use crate::source::{AcquisitionSystem, AddSeries, LocalCatalog, SourceError, collect_pages};

/// Local studios split into those with a series and those without.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudioSyncPlan {
    pub matched: usize,
    /// Unmatched studios, in catalog order.
    pub missing: Vec<Studio>,
}

/// Match studios to series by loose name. Studios whose name normalizes to
/// nothing are neither matched nor missing.
pub fn plan_studio_sync(studios: &[Studio], series: &[SeriesUnit]) -> StudioSyncPlan {
    let known: HashSet<String> = series
        .iter()
        .map(|s| normalize_name_loose(&s.title))
        .filter(|n| !n.is_empty())
        .collect();

    let mut plan = StudioSyncPlan::default();
    for studio in studios {
        let key = normalize_name_loose(&studio.name);
        if key.is_empty() {
            continue;
        }
        if known.contains(&key) {
            plan.matched += 1;
        } else {
            plan.missing.push(studio.clone());
        }
    }
    plan
}

/// Folder for a new series: `root/<name>` with every run of characters
/// other than word characters and `-` replaced by `_`.
pub fn series_path(root_folder_path: &str, studio_name: &str) -> String {
    let mut component = String::new();
    let mut in_run = false;
    for c in studio_name.trim().chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            component.push(c);
            in_run = false;
        } else if !in_run {
            component.push('_');
            in_run = true;
        }
    }
    if component.is_empty() {
        component.push_str("studio");
    }
    format!("{}/{}", root_folder_path.trim_end_matches('/'), component)
}

/// Settings for creating series.
#[derive(Debug, Clone)]
pub struct StudioSyncOptions {
    pub root_folder_path: String,
    pub quality_profile_id: i64,
    pub language_profile_id: Option<i64>,
    pub dry_run: bool,
    /// Only create the first N missing studios.
    pub limit_missing: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioSyncEntry {
    pub local_studio_id: String,
    pub studio_name: String,
    pub path: String,
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<i64>,
}

/// The `sync_studios_result.json` artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioSyncReport {
    pub local_total_studios: usize,
    pub acquisition_total_series: usize,
    pub matched_studios: usize,
    pub missing_studios_found: usize,
    pub missing_studios_processed: usize,
    pub created_series: usize,
    pub dry_run: bool,
    pub limit_missing: Option<usize>,
    pub results: Vec<StudioSyncEntry>,
}

/// Fetch studios and series, then create a series for each unmatched studio.
///
/// Series are created unmonitored and without a search. Under `dry_run`
/// nothing is created but every entry is still reported.
pub fn sync_studios<C, A>(
    catalog: &C,
    system: &A,
    options: &StudioSyncOptions,
) -> Result<StudioSyncReport, SourceError>
where
    C: LocalCatalog + ?Sized,
    A: AcquisitionSystem + ?Sized,
{
    let studios = collect_pages(|page| catalog.studios(page))?;
    let series = system.series_list()?;
    let plan = plan_studio_sync(&studios, &series);
    let missing_found = plan.missing.len();

    let to_process: Vec<Studio> = match options.limit_missing {
        Some(limit) => plan.missing.into_iter().take(limit).collect(),
        None => plan.missing,
    };
    log::info!(
        "Studios: {} local, {} series, {} matched, {} missing ({} to process)",
        studios.len(),
        series.len(),
        plan.matched,
        missing_found,
        to_process.len(),
    );

    let mut results = Vec::with_capacity(to_process.len());
    let mut created = 0;
    for (i, studio) in to_process.iter().enumerate() {
        let path = series_path(&options.root_folder_path, &studio.name);
        log::info!("  [{}/{}] {} -> {}", i + 1, to_process.len(), studio.name, path);

        let series_id = if options.dry_run {
            None
        } else {
            let id = system.add_series(&AddSeries {
                title: studio.name.clone(),
                root_folder_path: options.root_folder_path.clone(),
                path: path.clone(),
                quality_profile_id: options.quality_profile_id,
                language_profile_id: options.language_profile_id,
            })?;
            created += 1;
            id
        };

        results.push(StudioSyncEntry {
            local_studio_id: studio.id.clone(),
            studio_name: studio.name.clone(),
            path,
            dry_run: options.dry_run,
            series_id,
        });
    }

    Ok(StudioSyncReport {
        local_total_studios: studios.len(),
        acquisition_total_series: series.len(),
        matched_studios: plan.matched,
        missing_studios_found: missing_found,
        missing_studios_processed: results.len(),
        created_series: created,
        dry_run: options.dry_run,
        limit_missing: options.limit_missing,
        results,
    })
}
