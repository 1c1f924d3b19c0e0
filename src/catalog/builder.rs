//! CatalogBuilder: flat property records -> Catalog.
//!
//! Порядок:
//! 1) записи датасетов (origin, mountpoint) создают/обновляют Dataset;
//! 2) записи снапшотов (guid, createtxg) сливаются по имени снапшота: свойства
//!    одного снапшота приходят разными строками;
//! 3) finish(): снапшоты раскладываются по датасетам по guid, резолвится parent,
//!    строятся индексы guid/mountpoint, история сортируется по createtxg.
//!
//! Битая запись (MalformedRecord) не валит построение: она пропускается,
//! пишется warn! и возвращается в BuildOutput::warnings.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use super::dataset::{dataset_of, Dataset, Snapshot};
use super::{normalize_mountpoint, Catalog, Host};
use crate::consts::{
    PROP_CREATETXG, PROP_CREATION_ORDER, PROP_GUID, PROP_MOUNTPOINT, PROP_ORIGIN, SNAPSHOT_SEP,
};
use crate::error::RecordError;
use crate::metrics::{record_catalog_built, record_records_skipped};
use crate::record::PropertyRecord;

/// Result of a build: the catalog plus every skipped record.
#[derive(Debug)]
pub struct BuildOutput {
    pub catalog: Catalog,
    pub warnings: Vec<RecordError>,
}

#[derive(Debug, Default)]
struct PendingSnapshot {
    guid: Option<String>,
    creation_order: Option<u64>,
}

#[derive(Debug)]
pub struct CatalogBuilder {
    host: Host,
    datasets: BTreeMap<String, Dataset>,
    pending: BTreeMap<String, PendingSnapshot>,
    warnings: Vec<RecordError>,
}

impl CatalogBuilder {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            datasets: BTreeMap::new(),
            pending: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    fn dataset_entry(&mut self, name: &str) -> &mut Dataset {
        self.datasets
            .entry(name.to_string())
            .or_insert_with(|| Dataset::new(name))
    }

    /// Apply one dataset record (`origin` / `mountpoint`).
    pub fn dataset_record(&mut self, r: &PropertyRecord) -> Result<(), RecordError> {
        if r.name.contains(SNAPSHOT_SEP) {
            return Err(RecordError::UnexpectedSeparator {
                name: r.name.clone(),
            });
        }
        match r.property.as_str() {
            PROP_ORIGIN => {
                let value = r.value.clone();
                if let Some(origin) = value.as_deref() {
                    if dataset_of(origin).is_none() {
                        return Err(RecordError::InvalidValue {
                            name: r.name.clone(),
                            property: r.property.clone(),
                            value: origin.to_string(),
                        });
                    }
                }
                self.dataset_entry(&r.name).origin = value;
            }
            PROP_MOUNTPOINT => {
                let value = r.value.clone();
                self.dataset_entry(&r.name).mountpoint = value;
            }
            _ => {
                return Err(RecordError::UnknownProperty {
                    name: r.name.clone(),
                    property: r.property.clone(),
                })
            }
        }
        Ok(())
    }

    /// Apply one snapshot record (`guid` / `createtxg`).
    pub fn snapshot_record(&mut self, r: &PropertyRecord) -> Result<(), RecordError> {
        let fs = dataset_of(&r.name).ok_or_else(|| RecordError::MissingSeparator {
            name: r.name.clone(),
        })?;

        let creation_order = match r.property.as_str() {
            PROP_GUID => None,
            PROP_CREATETXG | PROP_CREATION_ORDER => match r.value.as_deref() {
                None => None,
                Some(v) => Some(v.trim().parse::<u64>().map_err(|_| {
                    RecordError::InvalidValue {
                        name: r.name.clone(),
                        property: r.property.clone(),
                        value: v.to_string(),
                    }
                })?),
            },
            _ => {
                return Err(RecordError::UnknownProperty {
                    name: r.name.clone(),
                    property: r.property.clone(),
                })
            }
        };

        // Датасет мог не попасть в выборку filesystem-свойств: создаём неявно.
        if !self.datasets.contains_key(fs) {
            debug!("dataset {fs} known only from snapshot {}", r.name);
            self.dataset_entry(fs);
        }

        let p = self.pending.entry(r.name.clone()).or_default();
        if r.property == PROP_GUID {
            if let Some(g) = r.value.as_deref() {
                p.guid = Some(g.to_string());
            }
        } else if creation_order.is_some() {
            p.creation_order = creation_order;
        }
        Ok(())
    }

    fn skip(&mut self, e: RecordError) {
        warn!("skip record: {e}");
        record_records_skipped(1);
        self.warnings.push(e);
    }

    pub fn add_dataset_records<'r, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'r PropertyRecord>,
    {
        for r in records {
            if let Err(e) = self.dataset_record(r) {
                self.skip(e);
            }
        }
    }

    pub fn add_snapshot_records<'r, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'r PropertyRecord>,
    {
        for r in records {
            if let Err(e) = self.snapshot_record(r) {
                self.skip(e);
            }
        }
    }

    /// Resolve snapshots, parents and indices.
    pub fn finish(mut self) -> BuildOutput {
        let pending = std::mem::take(&mut self.pending);
        let mut owners: HashMap<String, String> = HashMap::new();

        for (name, p) in pending {
            let guid = match p.guid {
                Some(g) => g,
                None => {
                    self.skip(RecordError::Incomplete {
                        name,
                        property: PROP_GUID.to_string(),
                    });
                    continue;
                }
            };
            let creation_order = match p.creation_order {
                Some(o) => o,
                None => {
                    self.skip(RecordError::Incomplete {
                        name,
                        property: PROP_CREATETXG.to_string(),
                    });
                    continue;
                }
            };
            if let Some(owner) = owners.get(&guid) {
                let e = RecordError::DuplicateGuid {
                    name,
                    guid,
                    owner: owner.clone(),
                };
                self.skip(e);
                continue;
            }

            let fs = match dataset_of(&name) {
                Some(fs) => fs.to_string(),
                None => continue,
            };
            owners.insert(guid.clone(), name.clone());
            self.dataset_entry(&fs).snapshots.push(Snapshot {
                name,
                guid,
                creation_order,
            });
        }

        let names: Vec<String> = self.datasets.keys().cloned().collect();
        let mut by_guid = HashMap::new();
        let mut by_mountpoint = HashMap::new();

        for name in &names {
            let parent = self.datasets.get(name).and_then(|ds| {
                ds.origin_dataset()
                    .filter(|p| *p != ds.name.as_str() && self.datasets.contains_key(*p))
                    .map(str::to_string)
            });

            if let Some(ds) = self.datasets.get_mut(name) {
                if ds.origin.is_some() && parent.is_none() {
                    debug!(
                        "{}: origin {} is outside this catalog",
                        ds.name,
                        ds.origin.as_deref().unwrap_or("")
                    );
                }
                ds.parent = parent;
                ds.seal();

                for s in &ds.snapshots {
                    by_guid.insert(s.guid.clone(), ds.name.clone());
                }
                // "none" / "legacy": не пути
                if let Some(mp) = ds.mountpoint.as_deref().filter(|m| m.starts_with('/')) {
                    by_mountpoint.insert(normalize_mountpoint(mp).to_string(), ds.name.clone());
                }
            }
        }

        let catalog = Catalog {
            host: self.host,
            datasets: self.datasets,
            by_guid,
            by_mountpoint,
        };
        record_catalog_built(catalog.len(), catalog.snapshot_count());
        debug!(
            "catalog {}: {} dataset(s), {} snapshot(s), {} warning(s)",
            catalog.host,
            catalog.len(),
            catalog.snapshot_count(),
            self.warnings.len()
        );

        BuildOutput {
            catalog,
            warnings: self.warnings,
        }
    }
}

impl Catalog {
    /// Build a catalog from dataset and snapshot property records.
    pub fn build(
        host: Host,
        dataset_records: &[PropertyRecord],
        snapshot_records: &[PropertyRecord],
    ) -> BuildOutput {
        let mut b = CatalogBuilder::new(host);
        b.add_dataset_records(dataset_records);
        b.add_snapshot_records(snapshot_records);
        b.finish()
    }
}
