use anyhow::{anyhow, Result};
use std::path::PathBuf;

use SnapLine::{collect_streamlines, Host, SnapConfig, Streamline};

use crate::util::{load_catalog, print_json};

/// Список streamline-версий: `<name>:<version>`.
pub fn exec(
    catalog: PathBuf,
    name: Option<String>,
    details: bool,
    json: bool,
    cfg: &SnapConfig,
) -> Result<()> {
    let out = load_catalog(&catalog, Host::Local)?;
    let (streams, _) = collect_streamlines(&out.catalog, &cfg.stream_prefix);

    let selected: Vec<&Streamline> = match name.as_deref() {
        Some(n) => vec![streams
            .get(n)
            .ok_or_else(|| anyhow!("streamline {} not found in {}", n, catalog.display()))?],
        None => streams.values().collect(),
    };

    if json {
        return print_json(&selected);
    }
    if selected.is_empty() {
        println!("(no streamlines)");
        return Ok(());
    }
    for s in selected {
        for (v, sv) in &s.versions {
            if details {
                println!("{}:{}\t{}", s.name, v, sv.dataset);
            } else {
                println!("{}:{}", s.name, v);
            }
        }
    }
    Ok(())
}
