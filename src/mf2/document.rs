//! microformats2 document model
//!
//! Mirrors the canonical mf2 JSON shape:
//!
//! ```json
//! {"items": [{"type": ["h-entry"], "properties": {"name": ["Hi"]}}],
//!  "rels": {}, "rel-urls": {}}
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A parsed microformats2 document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Top-level items, in document order
    pub items: Vec<Item>,

    /// rel value -> URLs carrying that rel
    #[serde(default)]
    pub rels: IndexMap<String, Vec<String>>,

    /// URL -> details of the links pointing at it
    #[serde(default, rename = "rel-urls")]
    pub rel_urls: IndexMap<String, RelUrl>,
}

impl Document {
    /// Parse a document back from its JSON form
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Top-level items having the given root class, e.g. `h-entry`
    pub fn items_of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.iter().filter(move |item| item.has_type(kind))
    }
}

/// A microformat item (`h-*` element)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Sorted, de-duplicated root class names
    #[serde(rename = "type")]
    pub kinds: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub properties: IndexMap<String, Vec<PropertyValue>>,

    /// Nested items that are not property values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Item>,

    /// Plain value when the item is itself a property value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Inner HTML when the item is an `e-*` property value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl Item {
    pub fn new(kinds: Vec<String>) -> Self {
        Self {
            kinds,
            ..Default::default()
        }
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    /// Append a value to a property, creating it if needed
    pub fn add_property(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.entry(name.into()).or_default().push(value);
    }

    /// All values of a property
    pub fn property(&self, name: &str) -> &[PropertyValue] {
        self.properties.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The plain string of the first value of a property
    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.property(name).first().map(PropertyValue::as_str)
    }
}

/// One value of a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Item(Box<Item>),
    Fragment(Fragment),
    Image(Image),
}

impl PropertyValue {
    /// Plain-text view of the value
    pub fn as_str(&self) -> &str {
        match self {
            PropertyValue::Text(text) => text,
            PropertyValue::Item(item) => item.value.as_deref().unwrap_or_default(),
            PropertyValue::Fragment(fragment) => &fragment.value,
            PropertyValue::Image(image) => &image.value,
        }
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        PropertyValue::Text(text)
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        PropertyValue::Text(text.to_string())
    }
}

/// Value of an `e-*` property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub html: String,
    pub value: String,
}

/// An image URL with its alternative text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub value: String,
    pub alt: String,
}

/// Details about a URL referenced with `rel`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelUrl {
    pub rels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}
