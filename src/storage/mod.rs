//! Snapshot persistence module

use crate::cluster::{Cluster, ClusterLink};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Totals reported at the top of a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub pages: usize,
    pub links: usize,
    pub clusters: usize,
}

/// Clustered view of the link graph consumed by the visualization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    pub clusters: Vec<Cluster>,
    pub links: Vec<ClusterLink>,
}

impl Snapshot {
    /// Snapshot of a graph with no pages
    pub fn empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            totals: Totals::default(),
            clusters: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Pretty-printed JSON form, as written to disk
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Failures while persisting a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("replace {path}: {source}")]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write a snapshot as JSON, replacing any existing file.
///
/// The parent directory is created if needed. Content goes to a sibling
/// temporary file first and is then renamed over the destination, so readers
/// never observe a partially written snapshot.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), SnapshotError> {
    log::info!(
        "Saving {} clusters and {} cluster links to {}",
        snapshot.clusters.len(),
        snapshot.links.len(),
        path.display()
    );

    let data = snapshot.to_json()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SnapshotError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = temporary_path(path);
    fs::write(&tmp_path, data.as_bytes()).map_err(|source| SnapshotError::Write {
        path: tmp_path.clone(),
        source,
    })?;

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        SnapshotError::Rename {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::info!("Snapshot saved successfully");

    Ok(())
}

/// Read a previously written snapshot
pub fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    use anyhow::Context;

    let raw = fs::read_to_string(path)
        .with_context(|| format!("read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse snapshot {}", path.display()))
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterMember;
    use chrono::TimeZone;

    fn sample_snapshot() -> Snapshot {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        Snapshot {
            generated_at: Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap(),
            totals: Totals { pages: 2, links: 1, clusters: 1 },
            clusters: vec![Cluster {
                id: 0,
                size: 2,
                sample: vec![ClusterMember {
                    slug: "rust".to_string(),
                    outbound: 1,
                    created_at: Some(created),
                }],
                internal_links: 1,
                external_links: 0,
                oldest_created_at: Some(created),
                newest_created_at: None,
            }],
            links: Vec::new(),
        }
    }

    #[test]
    fn writes_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static").join("constellation.json");

        save_snapshot(&sample_snapshot(), &path).unwrap();

        assert_eq!(load_snapshot(&path).unwrap(), sample_snapshot());
        assert!(!dir.path().join("static").join("constellation.json.tmp").exists());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constellation.json");
        fs::write(&path, "stale content that is longer than nothing").unwrap();

        let empty = Snapshot::empty(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        save_snapshot(&empty, &path).unwrap();

        assert_eq!(load_snapshot(&path).unwrap(), empty);
    }

    #[test]
    fn json_uses_snapshot_field_names() {
        let value: serde_json::Value =
            serde_json::from_str(&sample_snapshot().to_json().unwrap()).unwrap();

        assert_eq!(value["totals"]["pages"], 2);
        assert_eq!(value["clusters"][0]["internal_links"], 1);
        assert_eq!(value["clusters"][0]["sample"][0]["slug"], "rust");
        assert!(value["clusters"][0]["newest_created_at"].is_null());
        assert_eq!(value["generated_at"], "2025-03-02T00:00:00Z");
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let err = save_snapshot(&sample_snapshot(), &blocker.join("out.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::CreateDir { .. }));
    }
}
