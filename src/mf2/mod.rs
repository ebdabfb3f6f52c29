//! microformats2 parsing
//!
//! Turns HTML into the canonical microformats2 JSON object model
//! (`items`, `rels`, `rel-urls`).

mod document;
mod parser;

use thiserror::Error;

pub use document::{Document, Fragment, Image, Item, PropertyValue, RelUrl};
pub use parser::Parser;

/// microformats2 parsing errors
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Parse an HTML fragment, resolving relative URLs against `base_url`
pub fn parse(html: &str, base_url: Option<&str>) -> Result<Document, ParseError> {
    Ok(Parser::new(base_url)?.parse(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_h_entry_round_trips_through_json() {
        let html = "<div class='h-entry'><h1>Hi</h1>\n<p><a href=\"/about\">About</a></p></div>";
        let document = parse(html, Some("https://example.com")).unwrap();

        let json = serde_json::to_string(&document).unwrap();
        let back = Document::from_json(&json).unwrap();
        assert_eq!(back, document);

        let entry = document.items_of_type("h-entry").next().unwrap();
        assert_eq!(entry.first_str("name"), Some("Hi\nAbout"));
    }
}
