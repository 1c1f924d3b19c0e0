use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::path::PathBuf;

use SnapLine::{Catalog, Dataset, Host};

use crate::util::{load_catalog, print_json};

/// Список датасетов (с родителями по --parents) и их снапшотов.
pub fn exec(
    catalog: PathBuf,
    name: Option<String>,
    parents: bool,
    details: bool,
    json: bool,
) -> Result<()> {
    let out = load_catalog(&catalog, Host::Local)?;
    let cat = &out.catalog;

    if let Some(n) = name.as_deref() {
        if cat.dataset(n).is_none() {
            return Err(anyhow!("dataset {} not found in {}", n, catalog.display()));
        }
    }

    // Порядок печати: родитель (если просили) перед клоном, каждый один раз.
    let mut printed: HashSet<&str> = HashSet::new();
    let mut order: Vec<&Dataset> = Vec::new();
    for ds in cat.datasets() {
        if name.as_deref().map_or(false, |n| ds.name != n) {
            continue;
        }
        let chain = if parents {
            cat.origin_chain(&ds.name)
        } else {
            vec![ds]
        };
        for d in chain {
            if printed.insert(d.name.as_str()) {
                order.push(d);
            }
        }
    }

    if json {
        return print_json(&order);
    }
    if order.is_empty() {
        println!("(no datasets)");
        return Ok(());
    }
    for ds in order {
        print_dataset(cat, ds, details);
    }
    Ok(())
}

fn print_dataset(cat: &Catalog, ds: &Dataset, details: bool) {
    let mut l = ds.name.clone();
    if let Some(origin) = ds.origin.as_deref() {
        l.push_str(&format!(" (origin: {})", origin));
        if cat.parent_of(ds).is_none() {
            l.push_str(" [outside catalog]");
        }
    }
    println!("{l}");

    for snap in ds.snapshots() {
        if details {
            println!(
                "\t{} (createtxg: {}, guid: {})",
                snap.name, snap.creation_order, snap.guid
            );
        } else {
            println!("\t{}", snap.name);
        }
    }
}
