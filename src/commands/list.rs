//! List posts and where their JSON goes

use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::content::loader::ContentLoader;
use crate::content::Post;
use crate::export::{output_path, slugify_title};
use crate::Site;

/// A post with its computed output location
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub title: String,
    pub source: String,
    pub slug: String,
    pub path: PathBuf,
    /// Another post maps to the same path
    pub collides: bool,
}

/// Compute the listing for a set of posts
pub fn entries(site: &Site, posts: &[Post]) -> Vec<ListEntry> {
    let mut entries: Vec<ListEntry> = posts
        .iter()
        .map(|post| {
            let slug = slugify_title(&post.title);
            let categories: &[String] = if site.config.export.category_dirs {
                &post.categories
            } else {
                &[]
            };
            ListEntry {
                title: post.title.clone(),
                source: post.source.clone(),
                path: output_path(&site.config.json_dir, &slug, categories),
                slug,
                collides: false,
            }
        })
        .collect();

    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for entry in &entries {
        *counts.entry(entry.path.clone()).or_insert(0) += 1;
    }
    for entry in &mut entries {
        entry.collides = counts.get(&entry.path).copied().unwrap_or(0) > 1;
    }

    entries
}

/// Print every post with its slug and output path
pub fn run(site: &Site) -> Result<()> {
    let loader = ContentLoader::new(site);
    let posts = loader.load_posts()?;
    let entries = entries(site, &posts);

    println!("Posts ({}):", entries.len());
    for entry in &entries {
        println!(
            "  {} [{}] -> {}{}",
            entry.title,
            entry.source,
            entry.path.display(),
            if entry.collides { " (collision)" } else { "" }
        );
    }

    let collisions = entries.iter().filter(|e| e.collides).count();
    if collisions > 0 {
        tracing::warn!("{} posts share an output path with another post", collisions);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::TempDir;

    #[test]
    fn test_entries_flag_collisions() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let posts = vec![
            Post::new("It's Here".to_string(), Local::now(), "a.md".to_string()),
            Post::new("Its Here!".to_string(), Local::now(), "b.md".to_string()),
            Post::new("Other".to_string(), Local::now(), "c.md".to_string()),
        ];

        let entries = entries(&site, &posts);
        assert_eq!(entries[0].slug, "its-here");
        assert_eq!(entries[0].path, PathBuf::from("json/its-here/its-here.json"));
        assert!(entries[0].collides);
        assert!(entries[1].collides);
        assert!(!entries[2].collides);
    }
}
