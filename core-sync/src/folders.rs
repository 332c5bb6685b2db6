//! Folder Path Resolution
//!
//! Maps a relative directory path to a remote container ID, creating
//! containers on demand. Resolution is lazy: it runs only when a file
//! actually needs a destination, never for bare directory events.

use bridge_traits::remote::RemoteStore;
use bridge_traits::Result;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Resolve `rel_dir` to a container ID, walking segments left to right.
///
/// For each cumulative prefix: a cached entry in `folders` wins; otherwise
/// the remote store is queried for an existing child container of that name
/// (protecting against duplicate creation after state loss or partial prior
/// runs) before a new one is created. Every resolved segment is recorded.
pub async fn resolve_folder(
    remote: &dyn RemoteStore,
    root_id: &str,
    folders: &mut BTreeMap<String, String>,
    rel_dir: &str,
) -> Result<String> {
    if rel_dir.is_empty() {
        return Ok(root_id.to_string());
    }

    let mut parent_id = root_id.to_string();
    let mut prefix = String::new();

    for segment in rel_dir.split('/') {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);

        if let Some(id) = folders.get(&prefix) {
            parent_id = id.clone();
            continue;
        }

        let id = match remote.find_folder(segment, &parent_id).await? {
            Some(existing) => {
                debug!(path = %prefix, id = %existing, "Found existing remote folder");
                existing
            }
            None => {
                let created = remote.create_folder(segment, &parent_id).await?;
                info!(path = %prefix, id = %created, "Created remote folder");
                created
            }
        };

        folders.insert(prefix.clone(), id.clone());
        parent_id = id;
    }

    Ok(parent_id)
}
