//! Catalog: datasets, snapshots and origin links of one host.
//!
//! - dataset.rs: Dataset / Snapshot and name helpers (dataset_of, basename, dirname).
//! - builder.rs: CatalogBuilder (records -> Catalog, MalformedRecord handling).
//!
//! Каталог неизменяем после построения: планировщик хранит свой visited-set
//! отдельно, поэтому один Catalog можно читать из нескольких потоков.

mod builder;
mod dataset;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::consts::LOCAL_HOST;

pub use builder::{BuildOutput, CatalogBuilder};
pub use dataset::{basename, dataset_of, dirname, Dataset, Snapshot};

/// Where a catalog was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Host {
    Local,
    Remote(String),
}

impl Host {
    /// "local" (or empty) -> Local, anything else is an ssh destination.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == LOCAL_HOST {
            Host::Local
        } else {
            Host::Remote(s.to_string())
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Host::Local)
    }

    /// ssh destination, None for the local host.
    pub fn ssh_target(&self) -> Option<&str> {
        match self {
            Host::Local => None,
            Host::Remote(h) => Some(h.as_str()),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Local => f.write_str(LOCAL_HOST),
            Host::Remote(h) => f.write_str(h),
        }
    }
}

/// All datasets and snapshots of one host as of one observation.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    host: Host,
    datasets: BTreeMap<String, Dataset>,
    #[serde(skip)]
    by_guid: HashMap<String, String>,
    #[serde(skip)]
    by_mountpoint: HashMap<String, String>,
}

impl Catalog {
    /// Empty catalog (nothing received yet).
    pub fn empty(host: Host) -> Self {
        Self {
            host,
            datasets: BTreeMap::new(),
            by_guid: HashMap::new(),
            by_mountpoint: HashMap::new(),
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn snapshot_count(&self) -> usize {
        self.by_guid.len()
    }

    /// Datasets sorted by name.
    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.values()
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    /// Parent (origin owner) of `ds`, if it lives in this catalog.
    pub fn parent_of(&self, ds: &Dataset) -> Option<&Dataset> {
        ds.parent.as_deref().and_then(|p| self.datasets.get(p))
    }

    pub fn contains_guid(&self, guid: &str) -> bool {
        self.by_guid.contains_key(guid)
    }

    /// Dataset owning the snapshot with this guid.
    pub fn dataset_for_guid(&self, guid: &str) -> Option<&Dataset> {
        self.by_guid.get(guid).and_then(|n| self.datasets.get(n))
    }

    pub fn snapshot_by_guid(&self, guid: &str) -> Option<&Snapshot> {
        self.dataset_for_guid(guid).and_then(|ds| ds.snapshot_by_guid(guid))
    }

    /// Same snapshot (by guid) as seen on this side.
    pub fn find_snapshot(&self, snap: &Snapshot) -> Option<&Snapshot> {
        self.snapshot_by_guid(&snap.guid)
    }

    pub fn dataset_by_mountpoint(&self, mountpoint: &str) -> Option<&Dataset> {
        let key = normalize_mountpoint(mountpoint);
        self.by_mountpoint
            .get(key)
            .and_then(|n| self.datasets.get(n))
    }

    /// Origin chain of `name`, root-most ancestor first, `name` last.
    /// Stops at datasets outside the catalog and at cycles.
    pub fn origin_chain(&self, name: &str) -> Vec<&Dataset> {
        let mut chain: Vec<&Dataset> = Vec::new();
        let mut cur = self.datasets.get(name);
        while let Some(ds) = cur {
            if chain.iter().any(|d| d.name == ds.name) {
                break;
            }
            chain.push(ds);
            cur = self.parent_of(ds);
        }
        chain.reverse();
        chain
    }
}

pub(crate) fn normalize_mountpoint(p: &str) -> &str {
    if p.len() > 1 {
        p.trim_end_matches('/')
    } else {
        p
    }
}
