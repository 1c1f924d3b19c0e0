use std::collections::HashMap;

use serde::Serialize;

use crate::consts::{DATASET_SEP, SNAPSHOT_SEP};

/// Point-in-time snapshot of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// `dataset@label`
    pub name: String,
    pub guid: String,
    /// `createtxg`: orders snapshots inside one dataset.
    pub creation_order: u64,
}

impl Snapshot {
    /// Dataset part of the name.
    pub fn dataset_name(&self) -> &str {
        dataset_of(&self.name).unwrap_or(&self.name)
    }

    /// Label part of the name (after '@').
    pub fn label(&self) -> &str {
        self.name
            .split_once(SNAPSHOT_SEP)
            .map(|(_, l)| l)
            .unwrap_or("")
    }
}

/// `pool/fs@snap` -> `pool/fs`; None without '@'.
pub fn dataset_of(snapshot_name: &str) -> Option<&str> {
    snapshot_name.split_once(SNAPSHOT_SEP).map(|(fs, _)| fs)
}

/// Last path component of a dataset name.
pub fn basename(dataset: &str) -> &str {
    dataset.rsplit(DATASET_SEP).next().unwrap_or(dataset)
}

/// Dataset name without its last component; None for pool roots.
pub fn dirname(dataset: &str) -> Option<&str> {
    dataset.rsplit_once(DATASET_SEP).map(|(d, _)| d)
}

/// Filesystem with its ordered snapshot history.
///
/// Снапшоты хранятся в Vec, отсортированном по creation_order один раз при
/// построении каталога; индекс guid -> позиция.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub name: String,
    /// Snapshot this dataset was cloned from (may belong to another dataset).
    pub origin: Option<String>,
    pub mountpoint: Option<String>,
    /// Dataset owning `origin`, if it is part of the same catalog.
    pub parent: Option<String>,
    pub(crate) snapshots: Vec<Snapshot>,
    #[serde(skip)]
    pub(crate) by_guid: HashMap<String, usize>,
}

impl Dataset {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: None,
            mountpoint: None,
            parent: None,
            snapshots: Vec::new(),
            by_guid: HashMap::new(),
        }
    }

    /// Sort by creation order and rebuild the guid index.
    pub(crate) fn seal(&mut self) {
        self.snapshots.sort_by(|a, b| {
            a.creation_order
                .cmp(&b.creation_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        self.by_guid = self
            .snapshots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.guid.clone(), i))
            .collect();
    }

    /// Snapshots in creation order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn snapshot_by_guid(&self, guid: &str) -> Option<&Snapshot> {
        self.by_guid.get(guid).map(|&i| &self.snapshots[i])
    }

    /// Position in creation order.
    pub fn position_of(&self, guid: &str) -> Option<usize> {
        self.by_guid.get(guid).copied()
    }

    /// Find a snapshot by name, newest first. With `fuzzy` a substring match
    /// is accepted too (`20150529` finds `pool/fs@pool-fs-20150529-Initial`).
    pub fn find_snapshot(&self, name: &str, fuzzy: bool) -> Option<&Snapshot> {
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.name == name || s.label() == name || (fuzzy && s.name.contains(name)))
    }

    /// Name of the dataset owning the origin snapshot.
    pub fn origin_dataset(&self) -> Option<&str> {
        self.origin.as_deref().and_then(dataset_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_helpers() {
        assert_eq!(dataset_of("pool/vm/Root2@zfs-vm:foo:6"), Some("pool/vm/Root2"));
        assert_eq!(dataset_of("pool/vm/Root2"), None);
        assert_eq!(basename("pool/vm/Root2"), "Root2");
        assert_eq!(basename("pool"), "pool");
        assert_eq!(dirname("pool/vm/Root2"), Some("pool/vm"));
        assert_eq!(dirname("pool"), None);
    }

    #[test]
    fn find_snapshot_prefers_newest() {
        let mut ds = Dataset::new("pool/fs");
        for (i, label) in ["a-20150529", "b-20150529", "c"].iter().enumerate() {
            ds.snapshots.push(Snapshot {
                name: format!("pool/fs@{label}"),
                guid: format!("{}", 100 + i),
                creation_order: i as u64,
            });
        }
        ds.seal();
        assert_eq!(ds.find_snapshot("c", false).map(|s| s.guid.as_str()), Some("102"));
        assert_eq!(
            ds.find_snapshot("20150529", true).map(|s| s.guid.as_str()),
            Some("101")
        );
        assert!(ds.find_snapshot("20150529", false).is_none());
    }
}
