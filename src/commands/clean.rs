//! Clean the JSON output directory

use anyhow::{bail, Result};
use std::fs;

use crate::Site;

/// Delete the JSON output directory
pub fn run(site: &Site) -> Result<()> {
    if site.json_dir == site.base_dir || !site.json_dir.starts_with(&site.base_dir) {
        bail!(
            "Refusing to delete {:?}: not inside {:?}",
            site.json_dir,
            site.base_dir
        );
    }

    if site.json_dir.exists() {
        fs::remove_dir_all(&site.json_dir)?;
        tracing::info!("Deleted: {:?}", site.json_dir);
    } else {
        tracing::debug!("Nothing to clean at {:?}", site.json_dir);
    }

    Ok(())
}
