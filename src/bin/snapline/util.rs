use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::Read;
use std::path::Path;

use SnapLine::{catalog_from_dump, BuildOutput, Host};

/// Read a whole text file; "-" reads stdin.
pub fn read_text(p: &Path) -> Result<String> {
    if p.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(p).with_context(|| format!("read {}", p.display()))
}

/// Load a catalog dump; skipped records are logged, not fatal.
pub fn load_catalog(p: &Path, host: Host) -> Result<BuildOutput> {
    let text = read_text(p)?;
    let out = catalog_from_dump(host, &text);
    if !out.warnings.is_empty() {
        warn!(
            "{}: {} record(s) skipped",
            p.display(),
            out.warnings.len()
        );
    }
    info!(
        "catalog {} ({}): {} dataset(s), {} snapshot(s)",
        out.catalog.host(),
        p.display(),
        out.catalog.len(),
        out.catalog.snapshot_count()
    );
    Ok(out)
}

pub fn print_json<T: serde::Serialize>(v: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    println!("{s}");
    Ok(())
}
