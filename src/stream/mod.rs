//! Streamlines: one numbered version sequence spread over several datasets.
//!
//! A streamline version is a snapshot whose label is
//! `[<prefix>:]<stream>:<version>`, e.g. `pool/vm/Root2@zfs-vm:foo:6`.
//! When a container is cloned or rebased the numbering continues in the new
//! dataset, so consecutive versions may live in different backing datasets.
//!
//! - iter.rs: BoundaryIter (checkpoints for piecewise incremental transfer).

mod iter;

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;

use crate::catalog::{Catalog, Snapshot};
use crate::consts::STREAM_SEP;
use crate::error::RecordError;

pub use iter::BoundaryIter;

/// One version of a streamline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamVersion {
    /// Backing dataset.
    pub dataset: String,
    pub guid: String,
    pub snapshot: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Streamline {
    pub name: String,
    pub versions: BTreeMap<u64, StreamVersion>,
}

/// Parsed streamline label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLabel<'a> {
    pub stream: &'a str,
    pub version: u64,
}

/// Parse a snapshot label. `Ok(None)` for ordinary (non-stream) labels.
pub fn parse_stream_label<'a>(
    snapshot: &str,
    label: &'a str,
    prefix: &str,
) -> Result<Option<StreamLabel<'a>>, RecordError> {
    if !label.contains(STREAM_SEP) {
        return Ok(None);
    }
    let bad = |reason: &str| RecordError::InvalidStreamLabel {
        name: snapshot.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = label.rsplitn(3, STREAM_SEP);
    let version = parts.next().unwrap_or("");
    let stream = parts.next().unwrap_or("");
    if let Some(p) = parts.next() {
        if p != prefix {
            return Err(bad(&format!("prefix '{p}' != '{prefix}'")));
        }
    }
    if stream.is_empty() {
        return Err(bad("empty stream name"));
    }
    let version = version
        .parse::<u64>()
        .map_err(|_| bad(&format!("version '{version}' is not a number")))?;
    Ok(Some(StreamLabel { stream, version }))
}

impl Streamline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: BTreeMap::new(),
        }
    }

    /// Build from `(version, dataset)` pairs; guid/snapshot are synthesized.
    pub fn from_datasets<I, S>(name: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        let mut s = Self::new(name);
        for (v, ds) in pairs {
            let dataset: String = ds.into();
            s.versions.insert(
                v,
                StreamVersion {
                    snapshot: format!("{dataset}@{name}:{v}"),
                    guid: format!("{name}-{v}"),
                    dataset,
                },
            );
        }
        s
    }

    pub fn first_version(&self) -> Option<u64> {
        self.versions.keys().next().copied()
    }

    pub fn last_version(&self) -> Option<u64> {
        self.versions.keys().next_back().copied()
    }

    pub fn get(&self, version: u64) -> Option<&StreamVersion> {
        self.versions.get(&version)
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Number of distinct consecutive backing-dataset runs from `start` on.
    pub fn runs_from(&self, start: u64) -> usize {
        let mut runs = 0;
        let mut prev: Option<&str> = None;
        for sv in self.versions.range(start..).map(|(_, sv)| sv) {
            if prev != Some(sv.dataset.as_str()) {
                runs += 1;
                prev = Some(sv.dataset.as_str());
            }
        }
        runs
    }

    /// True if versions `start..` live in more than one backing dataset.
    pub fn spans_datasets_from(&self, start: u64) -> bool {
        self.runs_from(start) > 1
    }

    /// Newest version whose snapshot guid is present in `other`.
    pub fn common_version(&self, other: &Catalog) -> Option<u64> {
        self.versions
            .iter()
            .rev()
            .find(|(_, sv)| other.contains_guid(&sv.guid))
            .map(|(v, _)| *v)
    }

    /// Iterate checkpoints after `start`.
    pub fn boundaries(&self, start: u64) -> crate::error::PlanResult<BoundaryIter<'_>> {
        BoundaryIter::new(self, start)
    }
}

/// Collect streamlines from a catalog, keyed by stream name.
///
/// Битые метки пропускаются с предупреждением (они всё ещё обычные снапшоты).
pub fn collect_streamlines(
    catalog: &Catalog,
    prefix: &str,
) -> (BTreeMap<String, Streamline>, Vec<RecordError>) {
    let mut out: BTreeMap<String, Streamline> = BTreeMap::new();
    let mut warnings = Vec::new();

    for ds in catalog.datasets() {
        for snap in ds.snapshots() {
            match parse_stream_label(&snap.name, snap.label(), prefix) {
                Ok(None) => {}
                Ok(Some(l)) => add_version(&mut out, &mut warnings, l, snap),
                Err(e) => {
                    warn!("skip streamline snapshot: {e}");
                    warnings.push(e);
                }
            }
        }
    }

    debug!(
        "catalog {}: {} streamline(s)",
        catalog.host(),
        out.len()
    );
    (out, warnings)
}

fn add_version(
    out: &mut BTreeMap<String, Streamline>,
    warnings: &mut Vec<RecordError>,
    l: StreamLabel<'_>,
    snap: &Snapshot,
) {
    let s = out
        .entry(l.stream.to_string())
        .or_insert_with(|| Streamline::new(l.stream));
    if let Some(existing) = s.versions.get(&l.version) {
        let e = RecordError::InvalidStreamLabel {
            name: snap.name.clone(),
            reason: format!("version {} already taken by {}", l.version, existing.snapshot),
        };
        warn!("skip streamline snapshot: {e}");
        warnings.push(e);
        return;
    }
    s.versions.insert(
        l.version,
        StreamVersion {
            dataset: snap.dataset_name().to_string(),
            guid: snap.guid.clone(),
            snapshot: snap.name.clone(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        let l = parse_stream_label("p/a@zfs-vm:foo:6", "zfs-vm:foo:6", "zfs-vm")
            .expect("ok")
            .expect("stream");
        assert_eq!(l, StreamLabel { stream: "foo", version: 6 });

        let l = parse_stream_label("p/a@foo:7", "foo:7", "zfs-vm")
            .expect("ok")
            .expect("stream");
        assert_eq!(l.version, 7);

        assert_eq!(
            parse_stream_label("p/a@daily", "daily", "zfs-vm").expect("ok"),
            None
        );
        assert!(parse_stream_label("p/a@foo:x", "foo:x", "zfs-vm").is_err());
        assert!(parse_stream_label("p/a@other:foo:1", "other:foo:1", "zfs-vm").is_err());
        assert!(parse_stream_label("p/a@:1", ":1", "zfs-vm").is_err());
    }

    #[test]
    fn runs() {
        let s = Streamline::from_datasets("foo", [(1, "fs1"), (2, "fs1"), (3, "fs2"), (4, "fs2")]);
        assert_eq!(s.runs_from(1), 2);
        assert_eq!(s.runs_from(3), 1);
        assert!(s.spans_datasets_from(2));
        assert!(!s.spans_datasets_from(3));
        assert_eq!(s.first_version(), Some(1));
        assert_eq!(s.last_version(), Some(4));
    }
}
