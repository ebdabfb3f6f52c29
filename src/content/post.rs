//! Post model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Post title
    pub title: String,

    /// Publication date
    pub date: DateTime<Local>,

    /// Raw markdown content
    pub raw: String,

    /// Post categories, outermost first
    pub categories: Vec<String>,

    /// Source file path (relative to the site)
    pub source: String,

    /// Full source file path
    pub full_source: PathBuf,

    /// Whether the post is published
    pub published: bool,

    /// Custom front-matter fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Post {
    /// Create a new post with minimal required fields
    pub fn new(title: String, date: DateTime<Local>, source: String) -> Self {
        Self {
            title,
            date,
            raw: String::new(),
            categories: Vec::new(),
            source: source.clone(),
            full_source: PathBuf::from(&source),
            published: true,
            extra: HashMap::new(),
        }
    }

    /// Set the markdown body
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Set the categories
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let post = Post::new("Hello".to_string(), Local::now(), "_posts/hello.md".to_string())
            .with_raw("# Hi")
            .with_categories(["rust", "web dev"]);
        assert_eq!(post.raw, "# Hi");
        assert_eq!(post.categories, vec!["rust", "web dev"]);
        assert!(post.published);
        assert_eq!(post.full_source, PathBuf::from("_posts/hello.md"));
    }
}
