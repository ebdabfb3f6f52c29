//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    /// Base URL, used to resolve relative `u-*` values
    pub url: String,

    // Directory
    pub posts_dir: String,
    pub json_dir: String,

    // Writing
    pub render_drafts: bool,
    #[serde(default)]
    pub markdown: MarkdownConfig,

    // Export
    #[serde(default)]
    pub export: ExportConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),

            posts_dir: "_posts".to_string(),
            json_dir: "json".to_string(),

            render_drafts: false,
            markdown: MarkdownConfig::default(),

            export: ExportConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Reject directory settings that would reach outside the site.
    ///
    /// `json_dir` is written to by `export` and deleted by `clean`, so it
    /// must be a non-empty relative path made of plain names only.
    pub fn validate(&self) -> Result<()> {
        let json_dir = Path::new(&self.json_dir);
        if self.json_dir.trim().is_empty() {
            bail!("json_dir must not be empty");
        }
        if !json_dir
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            bail!(
                "json_dir {:?} must be a relative path without `.` or `..`",
                self.json_dir
            );
        }
        Ok(())
    }

    /// Base URL for the mf2 parser, if one is configured
    pub fn base_url(&self) -> Option<&str> {
        let url = self.url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

/// Markdown rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub smart_punctuation: bool,
    pub highlight: bool,
    pub theme: String,
    pub line_numbers: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            smart_punctuation: true,
            highlight: true,
            theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
        }
    }
}

/// What to do when a post fails to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing post
    #[default]
    Abort,
    /// Export every post that can be exported and report the rest
    Continue,
}

/// JSON export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub on_error: FailurePolicy,
    /// Nest output under the post's category directories
    pub category_dirs: bool,
    /// Pretty-print the JSON documents
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            on_error: FailurePolicy::Abort,
            category_dirs: false,
            pretty: false,
        }
    }
}
