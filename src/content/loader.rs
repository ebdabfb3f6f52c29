//! Content loader - loads posts from the posts directory

use anyhow::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::frontmatter::parse_date_string;
use super::{FrontMatter, Post};
use crate::Site;

/// Loads posts from the site's posts directory
pub struct ContentLoader<'a> {
    site: &'a Site,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Load all posts, newest first
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let posts_dir = &self.site.posts_dir;
        if !posts_dir.exists() {
            tracing::warn!("Posts directory {:?} does not exist", posts_dir);
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();

        for entry in WalkDir::new(posts_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }
            match self.load_post(path) {
                Ok(post) if post.published || self.site.config.render_drafts => posts.push(post),
                Ok(post) => tracing::debug!("Skipping unpublished post {}", post.source),
                Err(e) => tracing::warn!("Failed to load post {:?}: {}", path, e),
            }
        }

        // Ties keep a fixed order so colliding slugs overwrite predictably
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.source.cmp(&b.source)));

        Ok(posts)
    }

    /// Load a single post from a file
    fn load_post(&self, path: &Path) -> Result<Post> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&content)?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");
        let (stem_date, stem_slug) = split_date_prefix(stem);

        let date = match fm.parse_date().or(stem_date) {
            Some(date) => date,
            None => fs::metadata(path)?
                .modified()
                .map(DateTime::<Local>::from)
                .unwrap_or_else(|_| Local::now()),
        };

        let title = fm
            .title
            .clone()
            .unwrap_or_else(|| titleize_slug(stem_slug));

        let source = path
            .strip_prefix(&self.site.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let mut post = Post::new(title, date, source)
            .with_raw(body)
            .with_categories(fm.all_categories());
        post.full_source = path.to_path_buf();
        post.published = fm.published;
        post.extra = fm.extra;

        Ok(post)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

/// Split a `YYYY-MM-DD-` prefix off a post file stem
fn split_date_prefix(stem: &str) -> (Option<DateTime<Local>>, &str) {
    if let (Some(prefix), Some(rest)) = (stem.get(..10), stem.get(10..)) {
        if let Some(rest) = rest.strip_prefix('-') {
            if let Some(date) = parse_date_string(prefix) {
                return (Some(date), rest);
            }
        }
    }
    (None, stem)
}

/// `hello-world` -> `Hello World`
fn titleize_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
