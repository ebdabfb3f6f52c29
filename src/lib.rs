//! mf2-export: export blog posts as microformats2 h-entry JSON
//!
//! Every post under `_posts/` is rendered from markdown to HTML, wrapped in
//! an `h-entry` container, parsed into a microformats2 document and written
//! to `json/<slug>/<slug>.json`.

pub mod commands;
pub mod config;
pub mod content;
pub mod export;
pub mod mf2;

use anyhow::Result;
use std::path::Path;

/// A site to export
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Posts directory
    pub posts_dir: std::path::PathBuf,
    /// JSON output directory
    pub json_dir: std::path::PathBuf,
}

impl Site {
    /// Open a site from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.validate()?;

        let posts_dir = base_dir.join(&config.posts_dir);
        let json_dir = base_dir.join(&config.json_dir);

        Ok(Self {
            config,
            base_dir,
            posts_dir,
            json_dir,
        })
    }

    /// Export every post as microformats2 JSON
    pub fn export(&self) -> Result<export::ExportReport> {
        commands::export::run(self)
    }

    /// Delete the JSON output directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_site_defaults() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.posts_dir, dir.path().join("_posts"));
        assert_eq!(site.json_dir, dir.path().join("json"));
    }

    #[test]
    fn test_site_reads_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "posts_dir: content/posts\njson_dir: public/mf2\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.posts_dir, dir.path().join("content/posts"));
        assert_eq!(site.json_dir, dir.path().join("public/mf2"));
    }

    #[test]
    fn test_site_rejects_json_dir_outside_site() {
        for json_dir in ["''", "'.'", "/", "../out"] {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("_posts")).unwrap();
            fs::write(dir.path().join("_posts/a.md"), "a\n").unwrap();
            fs::write(
                dir.path().join("_config.yml"),
                format!("json_dir: {}\n", json_dir),
            )
            .unwrap();

            assert!(Site::new(dir.path()).is_err(), "{} accepted", json_dir);
            assert!(dir.path().join("_posts/a.md").exists());
        }
    }

    #[test]
    fn test_export_then_clean() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("_posts")).unwrap();
        fs::write(dir.path().join("_posts/one.md"), "---\ntitle: One\n---\nText\n").unwrap();

        let site = Site::new(dir.path()).unwrap();
        site.export().unwrap();
        assert!(dir.path().join("json/one/one.json").exists());

        site.clean().unwrap();
        assert!(!site.json_dir.exists());
    }
}
