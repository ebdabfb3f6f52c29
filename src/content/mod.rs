//! Content module - handles posts, front-matter and markdown rendering

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::FrontMatter;
pub use markdown::{MarkdownRenderer, Render};
pub use post::Post;
