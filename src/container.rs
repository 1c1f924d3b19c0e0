//! Container storage lookup by mountpoint.
//!
//! A container keeps its root in a private directory (`/vz/private/<ctid>`),
//! which is the mountpoint of a dataset. Sibling datasets (e.g. `Dump`) may
//! hang off the dataset mounted at the parent directory; snapshots are then
//! taken on that parent so the whole group stays consistent.
//!
//! Only the lookup lives here: container state (start/stop/suspend) belongs to
//! the caller.

use std::path::Path;

use serde::Serialize;

use crate::catalog::{Catalog, Dataset};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContainerStorage<'a> {
    /// Dataset mounted at the private path.
    pub private: Option<&'a Dataset>,
    /// Dataset mounted at the parent directory of the private path.
    pub parent: Option<&'a Dataset>,
}

impl<'a> ContainerStorage<'a> {
    pub fn locate(catalog: &'a Catalog, private_path: &str) -> Self {
        let private = catalog.dataset_by_mountpoint(private_path);
        let parent = Path::new(private_path.trim_end_matches('/'))
            .parent()
            .and_then(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .and_then(|p| catalog.dataset_by_mountpoint(p));
        Self { private, parent }
    }

    /// Dataset to snapshot: the parent group if any, else the private one.
    /// None if the private path is not a dataset.
    pub fn snapshot_dataset(&self) -> Option<&'a Dataset> {
        self.private?;
        self.parent.or(self.private)
    }
}
