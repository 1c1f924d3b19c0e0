//! Lightweight global metrics for SnapLine.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Record ingestion
//! - Catalog builder
//! - Planner (plans, steps, boundary checkpoints)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Records -----
static RECORDS_INGESTED: AtomicU64 = AtomicU64::new(0);
static RECORDS_SKIPPED: AtomicU64 = AtomicU64::new(0);

// ----- Catalogs -----
static CATALOGS_BUILT: AtomicU64 = AtomicU64::new(0);
static CATALOG_DATASETS: AtomicU64 = AtomicU64::new(0);
static CATALOG_SNAPSHOTS: AtomicU64 = AtomicU64::new(0);

// ----- Planner -----
static PLANS_WITH_STEPS: AtomicU64 = AtomicU64::new(0);
static PLANS_UP_TO_DATE: AtomicU64 = AtomicU64::new(0);
static PLANS_FAILED: AtomicU64 = AtomicU64::new(0);
static STEPS_FULL: AtomicU64 = AtomicU64::new(0);
static STEPS_INCREMENTAL: AtomicU64 = AtomicU64::new(0);
static BOUNDARY_CHECKPOINTS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Records
    pub records_ingested: u64,
    pub records_skipped: u64,

    // Catalogs
    pub catalogs_built: u64,
    pub catalog_datasets: u64,
    pub catalog_snapshots: u64,

    // Planner
    pub plans_with_steps: u64,
    pub plans_up_to_date: u64,
    pub plans_failed: u64,
    pub steps_full: u64,
    pub steps_incremental: u64,
    pub boundary_checkpoints: u64,
}

impl MetricsSnapshot {
    pub fn steps_total(&self) -> u64 {
        self.steps_full + self.steps_incremental
    }

    pub fn skip_ratio(&self) -> f64 {
        let total = self.records_ingested + self.records_skipped;
        if total == 0 {
            0.0
        } else {
            self.records_skipped as f64 / total as f64
        }
    }
}

// ----- Recorders (Records) -----
pub fn record_records_ingested(n: u64) {
    RECORDS_INGESTED.fetch_add(n, Ordering::Relaxed);
}

pub fn record_records_skipped(n: u64) {
    RECORDS_SKIPPED.fetch_add(n, Ordering::Relaxed);
}

// ----- Recorders (Catalogs) -----
pub fn record_catalog_built(datasets: usize, snapshots: usize) {
    CATALOGS_BUILT.fetch_add(1, Ordering::Relaxed);
    CATALOG_DATASETS.fetch_add(datasets as u64, Ordering::Relaxed);
    CATALOG_SNAPSHOTS.fetch_add(snapshots as u64, Ordering::Relaxed);
}

// ----- Recorders (Planner) -----
pub fn record_plan_steps(full: usize, incremental: usize) {
    PLANS_WITH_STEPS.fetch_add(1, Ordering::Relaxed);
    STEPS_FULL.fetch_add(full as u64, Ordering::Relaxed);
    STEPS_INCREMENTAL.fetch_add(incremental as u64, Ordering::Relaxed);
}

pub fn record_plan_up_to_date() {
    PLANS_UP_TO_DATE.fetch_add(1, Ordering::Relaxed);
}

pub fn record_plan_failed() {
    PLANS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_boundary_checkpoint() {
    BOUNDARY_CHECKPOINTS.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        records_ingested: RECORDS_INGESTED.load(Ordering::Relaxed),
        records_skipped: RECORDS_SKIPPED.load(Ordering::Relaxed),

        catalogs_built: CATALOGS_BUILT.load(Ordering::Relaxed),
        catalog_datasets: CATALOG_DATASETS.load(Ordering::Relaxed),
        catalog_snapshots: CATALOG_SNAPSHOTS.load(Ordering::Relaxed),

        plans_with_steps: PLANS_WITH_STEPS.load(Ordering::Relaxed),
        plans_up_to_date: PLANS_UP_TO_DATE.load(Ordering::Relaxed),
        plans_failed: PLANS_FAILED.load(Ordering::Relaxed),
        steps_full: STEPS_FULL.load(Ordering::Relaxed),
        steps_incremental: STEPS_INCREMENTAL.load(Ordering::Relaxed),
        boundary_checkpoints: BOUNDARY_CHECKPOINTS.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    RECORDS_INGESTED.store(0, Ordering::Relaxed);
    RECORDS_SKIPPED.store(0, Ordering::Relaxed);

    CATALOGS_BUILT.store(0, Ordering::Relaxed);
    CATALOG_DATASETS.store(0, Ordering::Relaxed);
    CATALOG_SNAPSHOTS.store(0, Ordering::Relaxed);

    PLANS_WITH_STEPS.store(0, Ordering::Relaxed);
    PLANS_UP_TO_DATE.store(0, Ordering::Relaxed);
    PLANS_FAILED.store(0, Ordering::Relaxed);
    STEPS_FULL.store(0, Ordering::Relaxed);
    STEPS_INCREMENTAL.store(0, Ordering::Relaxed);
    BOUNDARY_CHECKPOINTS.store(0, Ordering::Relaxed);
}
