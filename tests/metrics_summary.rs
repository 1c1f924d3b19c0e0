// tests/metrics_summary.rs
//
// Счётчики глобальные, поэтому в этом бинаре ровно один тест:
// reset -> каталог -> план -> snapshot.
//
// Запуск:
//   cargo test --test metrics_summary -- --nocapture

use anyhow::Result;

use SnapLine::metrics;
use SnapLine::{catalog_from_dump, Catalog, DestinationPolicy, Host, Planner};

#[test]
fn counters_follow_catalog_and_plan() -> Result<()> {
    metrics::reset();

    let text = "\
pool/a\torigin\t-
pool/a\tbogus
pool/a@s1\tguid\t1
pool/a@s1\tcreatetxg\t1
pool/a@s2\tguid\t2
pool/a@s2\tcreatetxg\t2
pool/b@x\tguid\t3
pool/b@x\tcreatetxg\t3
";
    let out = catalog_from_dump(Host::Local, text);
    assert_eq!(out.warnings.len(), 1);

    let dst = Catalog::empty(Host::Remote("backup".into()));
    let mut planner = Planner::new(&out.catalog, &dst, DestinationPolicy::Mirror);
    let batch = planner.plan_all(None);
    assert!(batch.is_ok());
    // второй вызов в том же проходе ничего не добавляет
    assert!(planner.plan_dataset("pool/b")?.is_up_to_date());

    let m = metrics::snapshot();
    assert_eq!(m.records_ingested, 7);
    assert_eq!(m.records_skipped, 1);
    assert_eq!(m.catalogs_built, 1);
    assert_eq!(m.catalog_datasets, 2);
    assert_eq!(m.catalog_snapshots, 3);
    assert_eq!(m.steps_full, 2);
    assert_eq!(m.steps_incremental, 1);
    assert_eq!(m.steps_total(), 3);
    assert_eq!(m.plans_with_steps, 2);
    assert_eq!(m.plans_up_to_date, 1);
    assert_eq!(m.plans_failed, 0);

    metrics::reset();
    assert_eq!(metrics::snapshot().steps_total(), 0);
    Ok(())
}
