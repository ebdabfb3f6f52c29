//! Post to microformats2 JSON export
//!
//! [`export_posts`] is the pure half: it renders every post, wraps the HTML
//! in an `h-entry`, parses it into a microformats2 document and returns the
//! `(path, content)` pairs. [`ExportReport::write_to`] puts them on disk.

mod slug;

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{FailurePolicy, SiteConfig};
use crate::content::{Post, Render};
use crate::mf2::{self, ParseError};

pub use self::slug::{category_segments, output_path, slugify_title, wrap_h_entry};

/// Why a post could not be exported
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Render error: {0}")]
    Render(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Export settings
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Output root, relative to the site base directory
    pub json_dir: String,
    /// Base URL for resolving relative URLs in the documents
    pub base_url: Option<String>,
    pub category_dirs: bool,
    pub on_error: FailurePolicy,
    pub pretty: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            json_dir: "json".to_string(),
            base_url: None,
            category_dirs: false,
            on_error: FailurePolicy::Abort,
            pretty: false,
        }
    }
}

impl ExportOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            json_dir: config.json_dir.clone(),
            base_url: config.base_url().map(str::to_string),
            category_dirs: config.export.category_dirs,
            on_error: config.export.on_error,
            pretty: config.export.pretty,
        }
    }
}

/// One post's JSON document and where it goes
#[derive(Debug, Clone)]
pub struct ExportedFile {
    /// Source of the post, relative to the site
    pub source: String,
    /// Source file on disk
    pub full_source: PathBuf,
    pub title: String,
    pub slug: String,
    /// Output path, relative to the site base directory
    pub path: PathBuf,
    /// JSON text, newline terminated
    pub content: String,
}

/// A post that failed to export
#[derive(Debug)]
pub struct ExportFailure {
    pub source: String,
    pub full_source: PathBuf,
    pub title: String,
    pub error: ExportError,
}

/// Outcome of an export run
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Successfully built documents, in post order
    pub files: Vec<ExportedFile>,
    pub failures: Vec<ExportFailure>,
    /// Posts never attempted because an earlier one failed
    pub skipped: usize,
    /// Files written by [`ExportReport::write_to`]
    pub written: usize,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Output paths claimed by more than one post, with the sources claiming
    /// them in write order. The last source wins on disk.
    pub fn collisions(&self) -> Vec<(&Path, Vec<&str>)> {
        let mut by_path: IndexMap<&Path, Vec<&str>> = IndexMap::new();
        for file in &self.files {
            by_path
                .entry(file.path.as_path())
                .or_default()
                .push(file.source.as_str());
        }
        by_path
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .collect()
    }

    /// Write every exported file below `base_dir`.
    ///
    /// Existing files are truncated. Write failures are added to
    /// `failures`; under [`FailurePolicy::Abort`] the remaining files are
    /// counted as skipped.
    pub fn write_to(&mut self, base_dir: &Path, policy: FailurePolicy) {
        let mut failures = Vec::new();

        for (i, file) in self.files.iter().enumerate() {
            match write_file(base_dir, file) {
                Ok(target) => {
                    tracing::debug!("Wrote {:?}", target);
                    self.written += 1;
                }
                Err(error) => {
                    tracing::error!("Failed to write {}: {}", file.source, error);
                    failures.push(ExportFailure {
                        source: file.source.clone(),
                        full_source: file.full_source.clone(),
                        title: file.title.clone(),
                        error,
                    });
                    if policy == FailurePolicy::Abort {
                        self.skipped += self.files.len() - i - 1;
                        break;
                    }
                }
            }
        }

        self.failures.extend(failures);
    }
}

/// Build the JSON documents for `posts`, in order, without touching the disk.
///
/// Only a bad base URL fails the whole call; per-post failures land in the
/// report.
pub fn export_posts<R>(
    posts: &[Post],
    renderer: &R,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError>
where
    R: Render + ?Sized,
{
    let parser = mf2::Parser::new(options.base_url.as_deref())?;
    let mut report = ExportReport::default();

    for (i, post) in posts.iter().enumerate() {
        match export_post(post, renderer, &parser, options) {
            Ok(file) => {
                tracing::debug!("Exported {} -> {:?}", post.source, file.path);
                report.files.push(file);
            }
            Err(error) => {
                tracing::error!("Failed to export {}: {}", post.source, error);
                report.failures.push(ExportFailure {
                    source: post.source.clone(),
                    full_source: post.full_source.clone(),
                    title: post.title.clone(),
                    error,
                });
                if options.on_error == FailurePolicy::Abort {
                    report.skipped = posts.len() - i - 1;
                    break;
                }
            }
        }
    }

    Ok(report)
}

/// Render, wrap, parse and serialize a single post
pub fn export_post<R>(
    post: &Post,
    renderer: &R,
    parser: &mf2::Parser,
    options: &ExportOptions,
) -> Result<ExportedFile, ExportError>
where
    R: Render + ?Sized,
{
    let html = renderer
        .render(&post.raw)
        .map_err(|e| ExportError::Render(format!("{:#}", e)))?;

    let slug = slugify_title(&post.title);
    let categories: &[String] = if options.category_dirs {
        &post.categories
    } else {
        &[]
    };
    let path = output_path(&options.json_dir, &slug, categories);

    let document = parser.parse(&wrap_h_entry(&html));
    let mut content = if options.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    content.push('\n');

    Ok(ExportedFile {
        source: post.source.clone(),
        full_source: post.full_source.clone(),
        title: post.title.clone(),
        slug,
        path,
        content,
    })
}

/// Create the file's directory if needed and write the file
pub fn write_file(base_dir: &Path, file: &ExportedFile) -> Result<PathBuf, ExportError> {
    let target = base_dir.join(&file.path);

    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target, &file.content).map_err(|source| ExportError::Io {
        path: target.clone(),
        source,
    })?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use chrono::Local;
    use std::cell::RefCell;
    use tempfile::TempDir;

    use crate::content::MarkdownRenderer;
    use crate::mf2::Document;

    fn post(title: &str, raw: &str) -> Post {
        Post::new(title.to_string(), Local::now(), format!("_posts/{}.md", title)).with_raw(raw)
    }

    fn identity(markdown: &str) -> Result<String> {
        Ok(markdown.to_string())
    }

    #[test]
    fn test_export_single_post() {
        let posts = vec![post("Hello World!", "# Hi")];
        let report = export_posts(&posts, &MarkdownRenderer::new(), &ExportOptions::default())
            .unwrap();

        assert!(report.is_success());
        let file = &report.files[0];
        assert_eq!(file.slug, "hello-world");
        assert_eq!(file.path, PathBuf::from("json/hello-world/hello-world.json"));
        assert!(file.content.ends_with("}\n"));

        let document = Document::from_json(&file.content).unwrap();
        let entry = document.items_of_type("h-entry").next().unwrap();
        assert_eq!(entry.first_str("name"), Some("Hi"));
    }

    #[test]
    fn test_rendering_happens_before_wrapping() {
        let seen = RefCell::new(Vec::new());
        let recording = |markdown: &str| -> Result<String> {
            seen.borrow_mut().push(markdown.to_string());
            Ok(markdown.to_string())
        };

        let report = export_posts(&[post("Hi", "# Hi")], &recording, &ExportOptions::default())
            .unwrap();

        // The renderer sees the bare body; the parser sees the wrapped output
        assert_eq!(*seen.borrow(), vec!["# Hi".to_string()]);
        let expected = mf2::parse("<div class='h-entry'># Hi</div>", None).unwrap();
        let written = Document::from_json(&report.files[0].content).unwrap();
        assert_eq!(written, expected);
    }

    #[test]
    fn test_json_round_trip_matches_parser_output() {
        let options = ExportOptions {
            base_url: Some("https://example.com/".to_string()),
            pretty: true,
            ..Default::default()
        };
        let markdown = "Some *text* with [a link](/about) and ![me](me.png)\n";
        let report = export_posts(&[post("Round Trip", markdown)], &MarkdownRenderer::new(), &options)
            .unwrap();

        let html = MarkdownRenderer::new().render(markdown).unwrap();
        let direct = mf2::parse(&wrap_h_entry(&html), Some("https://example.com/")).unwrap();
        let written = Document::from_json(&report.files[0].content).unwrap();
        assert_eq!(written, direct);
        assert!(report.files[0].content.contains("\n  \"items\""));
    }

    #[test]
    fn test_abort_policy_stops_at_first_failure() {
        let failing = |markdown: &str| -> Result<String> {
            if markdown == "boom" {
                Err(anyhow!("renderer exploded"))
            } else {
                Ok(markdown.to_string())
            }
        };
        let posts = vec![post("One", "1"), post("Two", "boom"), post("Three", "3")];

        let report = export_posts(&posts, &failing, &ExportOptions::default()).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures[0].title, "Two");
        assert_eq!(report.failures[0].full_source, PathBuf::from("_posts/Two.md"));
        assert!(matches!(report.failures[0].error, ExportError::Render(ref msg) if msg.contains("exploded")));
    }

    #[test]
    fn test_continue_policy_reports_every_failure() {
        let failing = |markdown: &str| -> Result<String> {
            if markdown.starts_with("bad") {
                Err(anyhow!("cannot render"))
            } else {
                Ok(markdown.to_string())
            }
        };
        let posts = vec![post("A", "bad 1"), post("B", "fine"), post("C", "bad 2")];
        let options = ExportOptions {
            on_error: FailurePolicy::Continue,
            ..Default::default()
        };

        let report = export_posts(&posts, &failing, &options).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].title, "B");
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.skipped, 0);
        assert!(!report.is_success());
    }

    #[test]
    fn test_invalid_base_url_fails_the_run() {
        let options = ExportOptions {
            base_url: Some("::".to_string()),
            ..Default::default()
        };
        let result = export_posts(&[post("A", "a")], &identity, &options);
        assert!(matches!(result, Err(ExportError::Parse(_))));
    }

    #[test]
    fn test_category_dirs() {
        let categories_post = post("Nested", "x").with_categories(["Web Dev"]);
        let flat = export_posts(
            std::slice::from_ref(&categories_post),
            &identity,
            &ExportOptions::default(),
        )
        .unwrap();
        assert_eq!(flat.files[0].path, PathBuf::from("json/nested/nested.json"));

        let options = ExportOptions {
            category_dirs: true,
            ..Default::default()
        };
        let nested = export_posts(&[categories_post], &identity, &options).unwrap();
        assert_eq!(
            nested.files[0].path,
            PathBuf::from("json/web/dev/nested/nested.json")
        );
    }

    #[test]
    fn test_colliding_slugs_overwrite_in_order() {
        let dir = TempDir::new().unwrap();
        let posts = vec![post("Hello World", "first"), post("Hello World!", "second")];

        let mut report = export_posts(&posts, &identity, &ExportOptions::default()).unwrap();
        let collisions = report.collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].0, Path::new("json/hello-world/hello-world.json"));
        assert_eq!(collisions[0].1, vec!["_posts/Hello World.md", "_posts/Hello World!.md"]);

        report.write_to(dir.path(), FailurePolicy::Abort);
        assert_eq!(report.written, 2);

        let written =
            fs::read_to_string(dir.path().join("json/hello-world/hello-world.json")).unwrap();
        let document = Document::from_json(&written).unwrap();
        assert_eq!(document.items[0].first_str("name"), Some("second"));
    }

    #[test]
    fn test_writing_twice_is_fine() {
        let dir = TempDir::new().unwrap();
        let posts = vec![post("Again", "body")];

        for _ in 0..2 {
            let mut report = export_posts(&posts, &identity, &ExportOptions::default()).unwrap();
            report.write_to(dir.path(), FailurePolicy::Abort);
            assert!(report.is_success());
            assert_eq!(report.written, 1);
        }

        let path = dir.path().join("json/again/again.json");
        assert!(fs::read_to_string(path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        // A file where the json directory should be
        fs::write(dir.path().join("json"), "not a directory").unwrap();

        let posts = vec![post("One", "1"), post("Two", "2")];
        let mut report = export_posts(&posts, &identity, &ExportOptions::default()).unwrap();
        report.write_to(dir.path(), FailurePolicy::Abort);

        assert_eq!(report.written, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.skipped, 1);
        assert!(matches!(report.failures[0].error, ExportError::Io { .. }));
    }

    #[test]
    fn test_continue_policy_keeps_writing() {
        let dir = TempDir::new().unwrap();
        // A file where the second post's directory should be
        fs::create_dir_all(dir.path().join("json")).unwrap();
        fs::write(dir.path().join("json/two"), "not a directory").unwrap();

        let mut two = post("Two", "2");
        two.full_source = dir.path().join("_posts/two.md");
        let posts = vec![post("One", "1"), two, post("Three", "3")];
        let mut report = export_posts(&posts, &identity, &ExportOptions::default()).unwrap();
        report.write_to(dir.path(), FailurePolicy::Continue);

        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].title, "Two");
        assert_eq!(report.failures[0].full_source, dir.path().join("_posts/two.md"));
        assert!(matches!(report.failures[0].error, ExportError::Io { .. }));
        assert!(dir.path().join("json/one/one.json").exists());
        assert!(dir.path().join("json/three/three.json").exists());
    }
}
