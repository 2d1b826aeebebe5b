//! Cross-catalog identity resolution.
//!
//! Local performers carry a list of external identifiers. Resolving a
//! canonical id to a local performer is a linear scan over the catalog in
//! its native page order; the first performer linked to the target wins.
//! More than one performer linked to the same id is not an error.

use scenekeeper_core::{Performer, Scene, looks_like_uuid};

use crate::source::{LocalCatalog, SourceError};

/// Find the first local performer linked to `target` in `system`.
///
/// Pages are fetched lazily and the scan stops at the first match.
pub fn find_performer_by_external_id<C>(
    catalog: &C,
    system: &str,
    target: &str,
) -> Result<Option<Performer>, SourceError>
where
    C: LocalCatalog + ?Sized,
{
    let target = target.trim();
    let mut seen = 0;
    let mut page = 1;

    loop {
        let listing = catalog.performers(page)?;
        let returned = listing.items.len();
        seen += returned;

        for performer in listing.items {
            let linked = performer
                .external_ids
                .iter()
                .any(|eid| eid.matches_system(system) && eid.id == target);
            if linked {
                log::debug!(
                    "Mapped {} id {} to local performer {} ({})",
                    system,
                    target,
                    performer.id,
                    performer.name,
                );
                return Ok(Some(performer));
            }
        }

        if returned == 0 || seen >= listing.total {
            break;
        }
        page += 1;
    }

    log::debug!("No local performer linked to {} id {}", system, target);
    Ok(None)
}

/// How a CLI performer argument was mapped onto the local catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPerformer {
    /// The id as given by the user.
    pub input_id: String,
    /// The local catalog id whose scenes were fetched.
    pub local_id: String,
    /// Local performer name, known only when the id had to be mapped.
    pub local_name: Option<String>,
}

/// Fetch a performer's local scenes, accepting either a local id or a
/// canonical id.
///
/// The input is first tried as a local id. If that yields no scenes and the
/// input has the shape of a canonical UUID, the canonical link is resolved
/// and the mapped performer's scenes are fetched instead. An unmapped UUID
/// yields an empty scene list.
pub fn resolve_local_performer<C>(
    catalog: &C,
    system: &str,
    input_id: &str,
) -> Result<(ResolvedPerformer, Vec<Scene>), SourceError>
where
    C: LocalCatalog + ?Sized,
{
    let scenes = catalog.all_performer_scenes(input_id)?;
    let unresolved = ResolvedPerformer {
        input_id: input_id.to_string(),
        local_id: input_id.to_string(),
        local_name: None,
    };

    if !scenes.is_empty() || !looks_like_uuid(input_id) {
        return Ok((unresolved, scenes));
    }

    log::info!("Trying {} as a {} performer id", input_id, system);
    match find_performer_by_external_id(catalog, system, input_id)? {
        Some(performer) => {
            let scenes = catalog.all_performer_scenes(&performer.id)?;
            Ok((
                ResolvedPerformer {
                    input_id: input_id.to_string(),
                    local_id: performer.id,
                    local_name: Some(performer.name),
                },
                scenes,
            ))
        }
        None => {
            log::warn!("No local performer is linked to {} id {}", system, input_id);
            Ok((unresolved, Vec::new()))
        }
    }
}
