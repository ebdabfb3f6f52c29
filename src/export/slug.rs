//! Title slugs, output paths and the h-entry wrapper

use std::path::PathBuf;

/// Turn a post title into its output slug.
///
/// Lowercases, turns spaces into hyphens and drops apostrophes and
/// exclamation marks. Nothing else is escaped, so other punctuation, path
/// separators and non-ASCII characters reach the filesystem as they are.
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| !matches!(c, '\'' | '!'))
        .collect()
}

/// Directory segments for a post's categories, outermost first.
///
/// A category containing spaces nests one directory per word.
pub fn category_segments(categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .flat_map(|category| category.split_whitespace())
        .map(::slug::slugify)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// `<json_dir>/[<categories>/]<slug>/<slug>.json`
///
/// The slug part is appended as text, so a slug starting with `/` stays
/// below `json_dir`.
pub fn output_path(json_dir: &str, slug: &str, categories: &[String]) -> PathBuf {
    let mut dir = PathBuf::from(json_dir);
    for segment in category_segments(categories) {
        dir.push(segment);
    }
    let file = format!("{}/{}.json", slug, slug);
    dir.join(file.trim_start_matches('/'))
}

/// Wrap rendered post HTML in an h-entry container
pub fn wrap_h_entry(html: &str) -> String {
    format!("<div class='h-entry'>{}</div>", html)
}
