use anyhow::{anyhow, Result};
use std::path::PathBuf;

use SnapLine::container::ContainerStorage;
use SnapLine::Host;

use crate::util::{load_catalog, print_json};

pub fn exec(catalog: PathBuf, path: String, json: bool) -> Result<()> {
    let out = load_catalog(&catalog, Host::Local)?;
    let storage = ContainerStorage::locate(&out.catalog, &path);
    if storage.private.is_none() {
        return Err(anyhow!("no dataset is mounted at {}", path));
    }

    if json {
        return print_json(&storage);
    }

    let name = |d: Option<&SnapLine::Dataset>| {
        d.map(|d| d.name.clone())
            .unwrap_or_else(|| "(none)".into())
    };
    println!("private  = {}", name(storage.private));
    println!("parent   = {}", name(storage.parent));
    println!("snapshot = {}", name(storage.snapshot_dataset()));
    Ok(())
}
