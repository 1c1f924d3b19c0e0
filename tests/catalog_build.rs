// tests/catalog_build.rs
//
// Покрываем:
// - построение каталога из дампа `zfs get -H -p -o name,property,value`;
// - свойства одного снапшота приходят разными строками и сливаются;
// - история сортируется по createtxg, а не по порядку строк;
// - guid-индекс согласован со списками снапшотов;
// - битые записи пропускаются (warning), остальное строится;
// - parent/origin_chain, origin вне каталога;
// - mountpoint-индекс и поиск контейнера.
//
// Запуск:
//   cargo test --test catalog_build -- --nocapture

use anyhow::{anyhow, Result};

use SnapLine::container::ContainerStorage;
use SnapLine::{catalog_from_dump, Catalog, CatalogBuilder, Host, PropertyRecord, RecordError};

fn dump(lines: &[&str]) -> String {
    let mut s = lines.join("\n");
    s.push('\n');
    s
}

fn fixture() -> String {
    dump(&[
        "pool/vm\torigin\t-",
        "pool/vm\tmountpoint\t/vz/private",
        "pool/vm/Root1\torigin\t-",
        "pool/vm/Root1\tmountpoint\t/vz/private/100/",
        "pool/vm/Root2\torigin\tpool/vm/Root1@s2",
        "pool/vm/Root2\tmountpoint\t/vz/private/101",
        "pool/vm/Root3\torigin\tpool/vm/Root2@t1",
        "pool/vm/Root3\tmountpoint\tnone",
        "pool/vm/Ext\torigin\tother/base@gold",
        "pool/vm/Ext\tmountpoint\tlegacy",
        // Root1: строки нарочно не по порядку createtxg
        "pool/vm/Root1@s3\tguid\t1003",
        "pool/vm/Root1@s3\tcreatetxg\t300",
        "pool/vm/Root1@s1\tguid\t1001",
        "pool/vm/Root1@s1\tcreatetxg\t100",
        "pool/vm/Root1@s2\tcreatetxg\t200",
        "pool/vm/Root1@s2\tguid\t1002",
        "pool/vm/Root2@t1\tguid\t2001",
        "pool/vm/Root2@t1\tcreatetxg\t250",
        "pool/vm/Root2@t2\tguid\t2002",
        "pool/vm/Root2@t2\tcreatetxg\t400",
        "pool/vm/Root3@u1\tguid\t3001",
        "pool/vm/Root3@u1\tcreatetxg\t500",
        "pool/vm/Ext@e1\tguid\t4001",
        "pool/vm/Ext@e1\tcreatetxg\t600",
    ])
}

fn build(text: &str) -> (Catalog, Vec<RecordError>) {
    let out = catalog_from_dump(Host::Local, text);
    (out.catalog, out.warnings)
}

#[test]
fn history_is_sorted_and_indexed() -> Result<()> {
    let (cat, warnings) = build(&fixture());
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(cat.len(), 5);
    assert_eq!(cat.snapshot_count(), 7);

    let root1 = cat.dataset("pool/vm/Root1").ok_or_else(|| anyhow!("Root1"))?;
    let names: Vec<&str> = root1.snapshots().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["pool/vm/Root1@s1", "pool/vm/Root1@s2", "pool/vm/Root1@s3"]
    );
    assert_eq!(root1.first_snapshot().map(|s| s.guid.as_str()), Some("1001"));
    assert_eq!(root1.last_snapshot().map(|s| s.guid.as_str()), Some("1003"));
    assert_eq!(root1.position_of("1002"), Some(1));

    // Каждый снапшот находится по guid и указывает на свой датасет.
    for ds in cat.datasets() {
        for snap in ds.snapshots() {
            let owner = cat
                .dataset_for_guid(&snap.guid)
                .ok_or_else(|| anyhow!("guid {} not indexed", snap.guid))?;
            assert_eq!(owner.name, ds.name);
            assert_eq!(cat.snapshot_by_guid(&snap.guid), Some(snap));
            assert_eq!(cat.find_snapshot(snap), Some(snap));
        }
    }
    assert!(!cat.contains_guid("9999"));
    Ok(())
}

#[test]
fn parents_and_origin_chain() -> Result<()> {
    let (cat, _) = build(&fixture());

    let root3 = cat.dataset("pool/vm/Root3").ok_or_else(|| anyhow!("Root3"))?;
    assert_eq!(root3.parent.as_deref(), Some("pool/vm/Root2"));
    assert_eq!(cat.parent_of(root3).map(|d| d.name.as_str()), Some("pool/vm/Root2"));

    let chain: Vec<&str> = cat
        .origin_chain("pool/vm/Root3")
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(chain, vec!["pool/vm/Root1", "pool/vm/Root2", "pool/vm/Root3"]);

    // origin есть, но его датасета нет в каталоге
    let ext = cat.dataset("pool/vm/Ext").ok_or_else(|| anyhow!("Ext"))?;
    assert_eq!(ext.origin.as_deref(), Some("other/base@gold"));
    assert_eq!(ext.origin_dataset(), Some("other/base"));
    assert!(ext.parent.is_none());
    assert_eq!(cat.origin_chain("pool/vm/Ext").len(), 1);

    assert!(cat.origin_chain("pool/vm/Missing").is_empty());
    Ok(())
}

#[test]
fn origin_cycle_terminates() -> Result<()> {
    let text = dump(&[
        "pool/a\torigin\tpool/b@x",
        "pool/b\torigin\tpool/a@y",
        "pool/a@y\tguid\t1",
        "pool/a@y\tcreatetxg\t1",
        "pool/b@x\tguid\t2",
        "pool/b@x\tcreatetxg\t2",
    ]);
    let (cat, _) = build(&text);
    let chain: Vec<&str> = cat.origin_chain("pool/a").iter().map(|d| d.name.as_str()).collect();
    assert_eq!(chain, vec!["pool/b", "pool/a"]);
    Ok(())
}

#[test]
fn malformed_records_are_skipped() -> Result<()> {
    let text = dump(&[
        "pool/a\torigin\t-",
        "pool/a\tcompression",                // короткая строка
        "pool/a\tcompression\tlz4",           // неизвестное свойство
        "pool/b\torigin\tnot-a-snapshot",     // origin без '@'
        "pool/a@s1\tguid\t1",
        "pool/a@s1\tcreatetxg\t10",
        "pool/a@s2\tguid\t2",
        "pool/a@s2\tcreatetxg\tabc",          // не число
        "pool/a@s3\tguid\t3",                 // нет createtxg
        "pool/a@s4\tguid\t1",                 // guid уже у s1
        "pool/a@s4\tcreatetxg\t40",
        "pool/a@s5\tguid\t5",
        "pool/a@s5\tcreatetxg\t50",
    ]);
    let (cat, warnings) = build(&text);

    let has = |pred: &dyn Fn(&RecordError) -> bool| warnings.iter().any(pred);

    assert!(warnings.contains(&RecordError::ShortLine { line: 2, fields: 2 }));
    assert!(has(&|w| matches!(
        w,
        RecordError::UnknownProperty { property, .. } if property == "compression"
    )));
    assert!(has(&|w| matches!(
        w,
        RecordError::InvalidValue { value, .. } if value == "not-a-snapshot"
    )));
    assert!(has(&|w| matches!(
        w,
        RecordError::InvalidValue { value, .. } if value == "abc"
    )));
    assert!(has(&|w| matches!(
        w,
        RecordError::Incomplete { name, property }
            if name == "pool/a@s2" && property == "createtxg"
    )));
    assert!(has(&|w| matches!(
        w,
        RecordError::Incomplete { name, .. } if name == "pool/a@s3"
    )));
    assert!(has(&|w| matches!(
        w,
        RecordError::DuplicateGuid { name, owner, .. }
            if name == "pool/a@s4" && owner == "pool/a@s1"
    )));

    let a = cat.dataset("pool/a").ok_or_else(|| anyhow!("pool/a"))?;
    let names: Vec<&str> = a.snapshots().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["pool/a@s1", "pool/a@s5"]);
    Ok(())
}

#[test]
fn builder_rejects_wrong_kind() -> Result<()> {
    let mut b = CatalogBuilder::new(Host::Remote("root@backup".into()));
    assert_eq!(
        b.dataset_record(&PropertyRecord::new("pool/a@s1", "origin", "-")),
        Err(RecordError::UnexpectedSeparator { name: "pool/a@s1".into() })
    );
    assert_eq!(
        b.snapshot_record(&PropertyRecord::new("pool/a", "guid", "1")),
        Err(RecordError::MissingSeparator { name: "pool/a".into() })
    );
    // Датасет, известный только по снапшоту, создаётся неявно.
    b.snapshot_record(&PropertyRecord::new("pool/c@x", "guid", "7"))?;
    b.snapshot_record(&PropertyRecord::new("pool/c@x", "creation_order", "3"))?;
    let out = b.finish();
    assert!(out.warnings.is_empty());
    assert_eq!(out.catalog.host(), &Host::Remote("root@backup".into()));
    let c = out.catalog.dataset("pool/c").ok_or_else(|| anyhow!("pool/c"))?;
    assert_eq!(c.snapshots().len(), 1);
    assert_eq!(c.snapshots()[0].creation_order, 3);
    Ok(())
}

#[test]
fn fuzzy_snapshot_lookup() -> Result<()> {
    let text = dump(&[
        "pool/fs@pool-fs-20150529-Initial\tguid\t1",
        "pool/fs@pool-fs-20150529-Initial\tcreatetxg\t1",
        "pool/fs@pool-fs-20150601\tguid\t2",
        "pool/fs@pool-fs-20150601\tcreatetxg\t2",
    ]);
    let (cat, _) = build(&text);
    let fs = cat.dataset("pool/fs").ok_or_else(|| anyhow!("pool/fs"))?;

    assert!(fs.find_snapshot("20150529", false).is_none());
    assert_eq!(
        fs.find_snapshot("20150529", true).map(|s| s.guid.as_str()),
        Some("1")
    );
    assert_eq!(
        fs.find_snapshot("pool-fs-20150601", false).map(|s| s.guid.as_str()),
        Some("2")
    );
    // Несколько совпадений: берётся самый новый.
    assert_eq!(fs.find_snapshot("2015", true).map(|s| s.guid.as_str()), Some("2"));
    Ok(())
}

#[test]
fn container_lookup_by_mountpoint() -> Result<()> {
    let (cat, _) = build(&fixture());

    assert_eq!(
        cat.dataset_by_mountpoint("/vz/private/100").map(|d| d.name.as_str()),
        Some("pool/vm/Root1")
    );
    // "none" / "legacy" не индексируются
    assert!(cat.dataset_by_mountpoint("none").is_none());
    assert!(cat.dataset_by_mountpoint("legacy").is_none());

    let st = ContainerStorage::locate(&cat, "/vz/private/101/");
    assert_eq!(st.private.map(|d| d.name.as_str()), Some("pool/vm/Root2"));
    assert_eq!(st.parent.map(|d| d.name.as_str()), Some("pool/vm"));
    assert_eq!(st.snapshot_dataset().map(|d| d.name.as_str()), Some("pool/vm"));

    let missing = ContainerStorage::locate(&cat, "/vz/private/999");
    assert!(missing.private.is_none());
    assert!(missing.snapshot_dataset().is_none());
    Ok(())
}
