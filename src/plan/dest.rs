//! Destination path resolution for sync steps.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::SnapshotRef;
use crate::catalog::{basename, dirname, Catalog};

/// Naming mode used when no relocation path is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DestinationMode {
    Mirror,
    FollowReceiver,
}

impl FromStr for DestinationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mirror" => Ok(DestinationMode::Mirror),
            "follow" | "follow-receiver" => Ok(DestinationMode::FollowReceiver),
            other => Err(format!("unknown destination policy '{other}' (mirror|follow)")),
        }
    }
}

impl fmt::Display for DestinationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationMode::Mirror => f.write_str("mirror"),
            DestinationMode::FollowReceiver => f.write_str("follow"),
        }
    }
}

/// Where the receiving side puts each step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DestinationPolicy {
    /// Same name as the source dataset.
    Mirror,
    /// Keep incrementals in the receiver dataset that already holds the base
    /// snapshot; put other datasets next to it.
    FollowReceiver,
    /// `<path>/<basename of source dataset>` for every step.
    Relocate(String),
}

impl Default for DestinationPolicy {
    fn default() -> Self {
        DestinationPolicy::FollowReceiver
    }
}

impl DestinationPolicy {
    /// Target dataset for a `from -> to` step.
    ///
    /// `placed` maps source datasets sent earlier in this pass to their target
    /// path; it is consulted before the receiver catalog.
    pub fn resolve(
        &self,
        dest: &Catalog,
        placed: &HashMap<String, String>,
        from: Option<&SnapshotRef>,
        to: &SnapshotRef,
    ) -> String {
        let to_ds = to.dataset();
        match self {
            DestinationPolicy::Relocate(root) => format!("{}/{}", root, basename(to_ds)),
            DestinationPolicy::Mirror => to_ds.to_string(),
            DestinationPolicy::FollowReceiver => {
                let from_place = from.and_then(|f| {
                    placed
                        .get(f.dataset())
                        .map(String::as_str)
                        .or_else(|| dest.dataset_for_guid(&f.guid).map(|d| d.name.as_str()))
                        .map(|p| (f.dataset(), p))
                });
                match from_place {
                    Some((from_ds, p)) if from_ds == to_ds => p.to_string(),
                    Some((_, p)) => match dirname(p) {
                        Some(dir) => format!("{}/{}", dir, basename(to_ds)),
                        None => to_ds.to_string(),
                    },
                    None => to_ds.to_string(),
                }
            }
        }
    }
}
