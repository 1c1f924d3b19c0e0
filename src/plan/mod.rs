//! Replication planner: source catalog + destination catalog -> ordered sync steps.
//!
//! - dest.rs: DestinationPolicy (mirror / follow receiver / relocate).
//!
//! Правила:
//! - origin (родитель клона) планируется раньше клона; обход цепочки origin
//!   идёт явным списком, без рекурсии, с visited-set на один проход;
//! - если у получателя нет ни одного общего guid: базовая (full) отправка
//!   первого снапшота, затем инкремент first -> last; у клона база
//!   первого шага: последний снапшот родителя (CloneBase::Origin: origin);
//! - иначе инкремент от самого нового общего снапшота;
//! - streamline на нескольких датасетах режется на шаги через BoundaryIter.

mod dest;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use serde::Serialize;

use crate::catalog::{dataset_of, Catalog, Dataset, Snapshot};
use crate::consts::DEFAULT_STREAM_PREFIX;
use crate::error::{PlanError, PlanResult};
use crate::metrics::{record_plan_failed, record_plan_steps, record_plan_up_to_date};
use crate::stream::{collect_streamlines, BoundaryIter, StreamVersion, Streamline};

pub use dest::{DestinationMode, DestinationPolicy};

/// Reference into a catalog (name + guid); never owns catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRef {
    pub name: String,
    pub guid: String,
}

impl SnapshotRef {
    /// Source dataset of the snapshot.
    pub fn dataset(&self) -> &str {
        dataset_of(&self.name).unwrap_or(&self.name)
    }
}

impl From<&Snapshot> for SnapshotRef {
    fn from(s: &Snapshot) -> Self {
        Self {
            name: s.name.clone(),
            guid: s.guid.clone(),
        }
    }
}

impl From<&StreamVersion> for SnapshotRef {
    fn from(v: &StreamVersion) -> Self {
        Self {
            name: v.snapshot.clone(),
            guid: v.guid.clone(),
        }
    }
}

/// One planned transfer: full when `from` is None, incremental otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStep {
    pub from: Option<SnapshotRef>,
    pub to: SnapshotRef,
    /// Target dataset on the receiving side.
    pub destination: String,
}

impl SyncStep {
    pub fn is_full(&self) -> bool {
        self.from.is_none()
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            None => write!(f, "full {} -> {}", self.to.name, self.destination),
            Some(from) => write!(
                f,
                "incr {} .. {} -> {}",
                from.name, self.to.name, self.destination
            ),
        }
    }
}

/// Result of planning one dataset or streamline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PlanOutcome {
    /// Receiver already has the latest snapshot.
    UpToDate,
    Steps(Vec<SyncStep>),
}

impl PlanOutcome {
    fn from_steps(steps: Vec<SyncStep>) -> Self {
        if steps.is_empty() {
            record_plan_up_to_date();
            PlanOutcome::UpToDate
        } else {
            let full = steps.iter().filter(|s| s.is_full()).count();
            record_plan_steps(full, steps.len() - full);
            PlanOutcome::Steps(steps)
        }
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, PlanOutcome::UpToDate)
    }

    pub fn steps(&self) -> &[SyncStep] {
        match self {
            PlanOutcome::UpToDate => &[],
            PlanOutcome::Steps(s) => s,
        }
    }

    pub fn into_steps(self) -> Vec<SyncStep> {
        match self {
            PlanOutcome::UpToDate => Vec::new(),
            PlanOutcome::Steps(s) => s,
        }
    }
}

/// Incremental base for the first snapshot of a clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CloneBase {
    /// Last snapshot of the parent dataset.
    #[default]
    ParentLast,
    /// The clone's origin snapshot; parent's last if it is gone.
    Origin,
}

impl FromStr for CloneBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "parent-last" => Ok(CloneBase::ParentLast),
            "origin" => Ok(CloneBase::Origin),
            other => Err(format!("unknown clone base '{other}' (last|origin)")),
        }
    }
}

impl fmt::Display for CloneBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneBase::ParentLast => f.write_str("last"),
            CloneBase::Origin => f.write_str("origin"),
        }
    }
}

/// Per-dataset result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub dataset: String,
    pub outcome: Result<PlanOutcome, PlanError>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchPlan {
    pub entries: Vec<BatchEntry>,
}

impl BatchPlan {
    /// All steps in emission order.
    pub fn steps(&self) -> impl Iterator<Item = &SyncStep> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok())
            .flat_map(|o| o.steps().iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &PlanError)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().err().map(|err| (e.dataset.as_str(), err)))
    }

    pub fn is_ok(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Planning pass over one (source, destination) catalog pair.
///
/// Visited/failed sets live here, not in the catalogs; `reset()` starts a new
/// pass. Catalogs must outlive the planner and its steps' execution.
pub struct Planner<'a> {
    source: &'a Catalog,
    dest: &'a Catalog,
    policy: DestinationPolicy,
    stream_prefix: String,
    clone_base: CloneBase,
    visited: HashSet<String>,
    /// dataset -> error it failed with in this pass.
    failed: HashMap<String, PlanError>,
    /// source dataset -> destination path for steps emitted in this pass.
    placed: HashMap<String, String>,
}

impl<'a> Planner<'a> {
    pub fn new(source: &'a Catalog, dest: &'a Catalog, policy: DestinationPolicy) -> Self {
        Self {
            source,
            dest,
            policy,
            stream_prefix: DEFAULT_STREAM_PREFIX.to_string(),
            clone_base: CloneBase::default(),
            visited: HashSet::new(),
            failed: HashMap::new(),
            placed: HashMap::new(),
        }
    }

    pub fn with_stream_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.stream_prefix = prefix.into();
        self
    }

    pub fn with_clone_base(mut self, base: CloneBase) -> Self {
        self.clone_base = base;
        self
    }

    pub fn policy(&self) -> &DestinationPolicy {
        &self.policy
    }

    /// Forget everything planned so far.
    pub fn reset(&mut self) {
        self.visited.clear();
        self.failed.clear();
        self.placed.clear();
    }

    /// True if `name` was already handled in this pass.
    pub fn is_processed(&self, name: &str) -> bool {
        self.visited.contains(name)
    }

    // ---------------- datasets ----------------

    /// Plan one dataset, preceded by any origin datasets not yet planned in
    /// this pass. A dataset that already failed in this pass fails again with
    /// the same error.
    pub fn plan_dataset(&mut self, name: &str) -> PlanResult<PlanOutcome> {
        match self.plan_dataset_steps(name) {
            Ok(steps) => Ok(PlanOutcome::from_steps(steps)),
            Err(e) => {
                record_plan_failed();
                Err(e)
            }
        }
    }

    fn plan_dataset_steps(&mut self, name: &str) -> PlanResult<Vec<SyncStep>> {
        let source = self.source;
        if source.dataset(name).is_none() {
            return Err(PlanError::UnknownDataset {
                name: name.to_string(),
            });
        }
        if let Some(e) = self.failed.get(name) {
            debug!("dataset {name} already failed in this pass: {e}");
            return Err(e.clone());
        }
        if self.visited.contains(name) {
            debug!("dataset {name} already planned in this pass, skipping");
            return Ok(Vec::new());
        }

        let chain = source.origin_chain(name);
        let mut steps = match self.sync_ancestors(name, &chain[..chain.len() - 1]) {
            Ok(s) => s,
            Err(e) => {
                self.failed.insert(name.to_string(), e.clone());
                return Err(e);
            }
        };

        let ds = chain[chain.len() - 1];
        match self.sync_dataset(ds) {
            Ok(s) => steps.extend(s),
            Err(e) => {
                self.failed.insert(ds.name.clone(), e.clone());
                return Err(e);
            }
        }
        Ok(steps)
    }

    /// Plan every source dataset (or only `filter`) parents first. A failure
    /// is recorded for its dataset and the run continues.
    pub fn plan_all(&mut self, filter: Option<&str>) -> BatchPlan {
        let source = self.source;
        let mut order: Vec<(usize, &Dataset)> = source
            .datasets()
            .filter(|d| filter.map_or(true, |f| d.name == f))
            .map(|d| (source.origin_chain(&d.name).len(), d))
            .collect();
        order.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));

        let mut batch = BatchPlan::default();
        for (_, ds) in order {
            if self.visited.contains(&ds.name) {
                continue;
            }
            let outcome = self.plan_dataset(&ds.name);
            if let Err(e) = &outcome {
                warn!("{}: {}", ds.name, e);
            }
            batch.entries.push(BatchEntry {
                dataset: ds.name.clone(),
                outcome,
            });
        }
        info!(
            "plan: {} dataset(s), {} step(s), {} failure(s)",
            batch.entries.len(),
            batch.steps().count(),
            batch.failures().count()
        );
        batch
    }

    fn sync_ancestors(
        &mut self,
        name: &str,
        ancestors: &[&'a Dataset],
    ) -> PlanResult<Vec<SyncStep>> {
        let mut steps = Vec::new();
        for anc in ancestors {
            if self.failed.contains_key(&anc.name) {
                return Err(PlanError::AncestorFailed {
                    name: name.to_string(),
                    ancestor: anc.name.clone(),
                });
            }
            if self.visited.contains(&anc.name) {
                continue;
            }
            match self.sync_dataset(anc) {
                Ok(s) => steps.extend(s),
                Err(e) => {
                    warn!("{}: origin {} failed: {}", name, anc.name, e);
                    self.failed.insert(anc.name.clone(), e);
                    return Err(PlanError::AncestorFailed {
                        name: name.to_string(),
                        ancestor: anc.name.clone(),
                    });
                }
            }
        }
        Ok(steps)
    }

    /// Steps for a single dataset, assuming its origin is already handled.
    fn sync_dataset(&mut self, ds: &'a Dataset) -> PlanResult<Vec<SyncStep>> {
        self.visited.insert(ds.name.clone());

        let (first, last) = match (ds.first_snapshot(), ds.last_snapshot()) {
            (Some(f), Some(l)) => (f, l),
            _ => {
                debug!("{}: empty snapshot list", ds.name);
                return Ok(Vec::new());
            }
        };

        if self.dest.contains_guid(&last.guid) {
            debug!("{}: up to date at {}", ds.name, last.name);
            return Ok(Vec::new());
        }

        // Самый новый снапшот, который уже есть у получателя.
        let common = ds
            .snapshots()
            .iter()
            .rev()
            .find(|s| self.dest.contains_guid(&s.guid));

        if let Some(c) = common {
            debug!(
                "{}: common snapshot {} (guid {}), sending up to {}",
                ds.name, c.name, c.guid, last.name
            );
            return Ok(vec![self.step(Some(&SnapshotRef::from(c)), &SnapshotRef::from(last))]);
        }

        debug!(
            "{}: first snapshot {} (guid {}) does not exist on receiver",
            ds.name, first.name, first.guid
        );
        let base = self.clone_base(ds).map(SnapshotRef::from);
        let first_ref = SnapshotRef::from(first);
        self.ensure_fresh_target(&ds.name, base.as_ref(), &first_ref)?;

        let mut steps = vec![self.step(base.as_ref(), &first_ref)];
        if last.guid != first.guid {
            steps.push(self.step(Some(&first_ref), &SnapshotRef::from(last)));
        }
        Ok(steps)
    }

    /// Incremental base for the first snapshot of a clone. None for a
    /// dataset without a parent in the source catalog.
    fn clone_base(&self, ds: &'a Dataset) -> Option<&'a Snapshot> {
        let parent = self.source.parent_of(ds)?;
        match (self.clone_base, ds.origin.as_deref()) {
            (CloneBase::Origin, Some(origin)) => parent
                .find_snapshot(origin, false)
                .or_else(|| parent.last_snapshot()),
            _ => parent.last_snapshot(),
        }
    }

    /// Full/base send into a receiver dataset that already has history of its
    /// own would need a common snapshot.
    fn ensure_fresh_target(
        &self,
        name: &str,
        from: Option<&SnapshotRef>,
        to: &SnapshotRef,
    ) -> PlanResult<()> {
        let target = self.policy.resolve(self.dest, &self.placed, from, to);
        match self.dest.dataset(&target) {
            Some(d) if !d.is_empty() => {
                warn!(
                    "{}: receiver {} has {} snapshot(s), none in common",
                    name,
                    target,
                    d.snapshots().len()
                );
                Err(PlanError::NoCommonAncestor {
                    name: name.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn step(&mut self, from: Option<&SnapshotRef>, to: &SnapshotRef) -> SyncStep {
        let destination = self.policy.resolve(self.dest, &self.placed, from, to);
        self.placed
            .insert(to.dataset().to_string(), destination.clone());
        let step = SyncStep {
            from: from.cloned(),
            to: to.clone(),
            destination,
        };
        debug!("step: {step}");
        step
    }

    // ---------------- streamlines ----------------

    /// Plan one streamline (versions possibly spread over several datasets).
    pub fn plan_stream(&mut self, name: &str) -> PlanResult<PlanOutcome> {
        match self.plan_stream_steps(name) {
            Ok(steps) => Ok(PlanOutcome::from_steps(steps)),
            Err(e) => {
                record_plan_failed();
                Err(e)
            }
        }
    }

    fn plan_stream_steps(&mut self, name: &str) -> PlanResult<Vec<SyncStep>> {
        let (src_streams, _) = collect_streamlines(self.source, &self.stream_prefix);
        let stream = src_streams
            .get(name)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PlanError::UnknownStream {
                name: name.to_string(),
            })?;
        let (first, latest) = match (stream.first_version(), stream.last_version()) {
            (Some(f), Some(l)) => (f, l),
            _ => {
                return Err(PlanError::UnknownStream {
                    name: name.to_string(),
                })
            }
        };

        if let Some(common) = stream.common_version(self.dest) {
            if common == latest {
                debug!("streamline {name}: up to date at version {latest}");
                return Ok(Vec::new());
            }
            debug!("streamline {name}: common version {common}, latest {latest}");
            return self.stream_steps(stream, common);
        }

        let (dst_streams, _) = collect_streamlines(self.dest, &self.stream_prefix);
        if dst_streams.get(name).map_or(false, |s| !s.is_empty()) {
            return Err(PlanError::NoCommonAncestor {
                name: name.to_string(),
            });
        }

        // База: первая версия (и origin её датасета, если он есть в каталоге).
        let source = self.source;
        let first_sv = stream.get(first).ok_or_else(|| PlanError::VersionNotFound {
            stream: name.to_string(),
            version: first,
        })?;
        let mut steps = Vec::new();
        let base = match source.dataset(&first_sv.dataset) {
            Some(ds) => {
                let chain = source.origin_chain(&ds.name);
                steps.extend(self.sync_ancestors(name, &chain[..chain.len() - 1])?);
                self.clone_base(ds).map(SnapshotRef::from)
            }
            None => None,
        };
        let first_ref = SnapshotRef::from(first_sv);
        self.ensure_fresh_target(name, base.as_ref(), &first_ref)?;
        steps.push(self.step(base.as_ref(), &first_ref));
        steps.extend(self.stream_steps(stream, first)?);
        Ok(steps)
    }

    /// Steps from version `start` (present on both sides) to the latest one.
    fn stream_steps(&mut self, stream: &Streamline, start: u64) -> PlanResult<Vec<SyncStep>> {
        let version_ref = |v: u64| -> PlanResult<SnapshotRef> {
            stream
                .get(v)
                .map(SnapshotRef::from)
                .ok_or_else(|| PlanError::VersionNotFound {
                    stream: stream.name.clone(),
                    version: v,
                })
        };

        let mut steps = Vec::new();
        if !stream.spans_datasets_from(start) {
            match stream.last_version() {
                Some(last) if last != start => {
                    let from = version_ref(start)?;
                    let to = version_ref(last)?;
                    steps.push(self.step(Some(&from), &to));
                }
                _ => {}
            }
            return Ok(steps);
        }

        debug!(
            "streamline {}: {} backing dataset run(s) from version {}",
            stream.name,
            stream.runs_from(start),
            start
        );
        let mut prev = version_ref(start)?;
        for v in BoundaryIter::new(stream, start)? {
            let to = version_ref(v)?;
            steps.push(self.step(Some(&prev), &to));
            prev = to;
        }
        Ok(steps)
    }
}
