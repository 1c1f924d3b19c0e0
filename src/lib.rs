#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod error;
pub mod config;
pub mod metrics;

// Входные записи `zfs get -H`
pub mod record;

// Каталог датасетов/снапшотов (src/catalog/{mod,dataset,builder}.rs)
pub mod catalog;

// Streamlines + BoundaryIter (src/stream/{mod,iter}.rs)
pub mod stream;

// Планировщик репликации (src/plan/{mod,dest}.rs)
pub mod plan;

// Рендер шагов в команды send/recv
pub mod transfer;

// Поиск датасетов контейнера по mountpoint
pub mod container;

// Удобные реэкспорты
pub use catalog::{BuildOutput, Catalog, CatalogBuilder, Dataset, Host, Snapshot};
pub use config::SnapConfig;
pub use error::{PlanError, PlanResult, RecordError};
pub use plan::{
    BatchEntry, BatchPlan, CloneBase, DestinationMode, DestinationPolicy, PlanOutcome, Planner,
    SnapshotRef, SyncStep,
};
pub use record::{parse_dump, split_records, PropertyRecord};
pub use stream::{collect_streamlines, BoundaryIter, StreamVersion, Streamline};
pub use transfer::{execute_plan, PrintExecutor, TransferCommand, TransferExecutor};

/// Parse a `zfs get -H -p -o name,property,value` dump (filesystems and
/// snapshots mixed) and build a catalog. Warnings cover both stages.
pub fn catalog_from_dump(host: Host, text: &str) -> BuildOutput {
    let (records, mut warnings) = parse_dump(text);
    let (datasets, snapshots) = split_records(records);
    let mut out = Catalog::build(host, &datasets, &snapshots);
    warnings.append(&mut out.warnings);
    out.warnings = warnings;
    out
}
