//! Export posts as microformats2 JSON

use anyhow::{bail, Result};
use std::path::Component;

use crate::content::loader::ContentLoader;
use crate::content::MarkdownRenderer;
use crate::export::{self, ExportOptions, ExportReport};
use crate::Site;

/// Export every post of the site to `<json_dir>/<slug>/<slug>.json`
pub fn run(site: &Site) -> Result<ExportReport> {
    let start = std::time::Instant::now();

    let loader = ContentLoader::new(site);
    let posts = loader.load_posts()?;
    tracing::info!("Loaded {} posts", posts.len());

    let renderer = MarkdownRenderer::with_config(&site.config.markdown)?;
    let options = ExportOptions::from_config(&site.config);

    let mut report = export::export_posts(&posts, &renderer, &options)?;

    for file in &report.files {
        if file
            .path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            tracing::warn!(
                "Output path {:?} of {} leaves the JSON directory",
                file.path,
                file.source
            );
        }
    }

    for (path, sources) in report.collisions() {
        tracing::warn!(
            "{} posts share {:?}, the last one wins: {}",
            sources.len(),
            path,
            sources.join(", ")
        );
    }

    report.write_to(&site.base_dir, options.on_error);

    let duration = start.elapsed();
    if !report.is_success() {
        for failure in &report.failures {
            tracing::error!(
                "{} ({}): {}",
                failure.title,
                failure.full_source.display(),
                failure.error
            );
        }
        bail!(
            "{} of {} posts failed to export, {} skipped, {} written",
            report.failures.len(),
            posts.len(),
            report.skipped,
            report.written
        );
    }

    tracing::info!(
        "Exported {} posts in {:.2}s",
        report.written,
        duration.as_secs_f64()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mf2::Document;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(base: &Path, relative: &str, content: &str) {
        let path = base.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_export_site() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_config.yml", "url: https://blog.example\n");
        write(
            dir.path(),
            "_posts/2024-01-01-hello.md",
            "---\ntitle: Hello World!\ncategories: notes\n---\n# Hi\n\n[home](/)\n",
        );
        write(
            dir.path(),
            "_posts/2024-01-02-rust.md",
            "---\ntitle: Rust's Great\n---\n```rust\nfn main() {}\n```\n",
        );

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();
        assert_eq!(report.written, 2);

        let hello = fs::read_to_string(dir.path().join("json/hello-world/hello-world.json"))
            .unwrap();
        assert!(hello.ends_with('\n'));
        let document = Document::from_json(&hello).unwrap();
        let entry = &document.items[0];
        assert_eq!(entry.kinds, vec!["h-entry"]);
        assert_eq!(entry.first_str("name"), Some("Hi\nhome"));

        assert!(dir.path().join("json/rusts-great/rusts-great.json").exists());

        // Second run overwrites without complaint
        assert_eq!(run(&site).unwrap().written, 2);
    }

    #[test]
    fn test_export_with_category_dirs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_config.yml", "export:\n  category_dirs: true\n");
        write(
            dir.path(),
            "_posts/post.md",
            "---\ntitle: Post\ncategories: [Web Dev]\n---\nbody\n",
        );

        let site = Site::new(dir.path()).unwrap();
        run(&site).unwrap();
        assert!(dir.path().join("json/web/dev/post/post.json").exists());
    }

    #[test]
    fn test_export_fails_on_write_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_posts/a.md", "---\ntitle: A\n---\na\n");
        write(dir.path(), "json", "in the way");

        let site = Site::new(dir.path()).unwrap();
        let err = run(&site).unwrap_err();
        assert!(err.to_string().contains("1 of 1 posts failed"));
    }
}
