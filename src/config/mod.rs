//! Configuration module

mod site;

pub use site::ExportConfig;
pub use site::FailurePolicy;
pub use site::MarkdownConfig;
pub use site::SiteConfig;
