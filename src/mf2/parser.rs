//! HTML to microformats2 parser
//!
//! Walks a scraper DOM and applies the microformats2 parsing rules: root
//! classes (`h-*`) start items, property classes (`p-*`, `u-*`, `dt-*`,
//! `e-*`) fill them, and `name`, `photo` and `url` are implied when an item
//! has no explicit property of that kind.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::collections::BTreeSet;
use url::Url;

use super::document::{Document, Fragment, Image, Item, PropertyValue, RelUrl};
use super::ParseError;

lazy_static! {
    static ref ROOT_CLASS: Regex =
        Regex::new(r"^h-(?:[a-z0-9]+-)?[a-z]+(?:-[a-z]+)*$").expect("valid root class regex");
    static ref PROPERTY_CLASS: Regex =
        Regex::new(r"^(p|u|dt|e)-((?:[a-z0-9]+-)?[a-z]+(?:-[a-z]+)*)$")
            .expect("valid property class regex");
}

/// Property class prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    P,
    U,
    Dt,
    E,
}

impl Prefix {
    fn from_class_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "p" => Some(Prefix::P),
            "u" => Some(Prefix::U),
            "dt" => Some(Prefix::Dt),
            "e" => Some(Prefix::E),
            _ => None,
        }
    }
}

/// Which kinds of explicit properties an item has seen, for implication
#[derive(Debug, Default)]
struct Seen {
    text: bool,
    url: bool,
    nested: bool,
}

impl Seen {
    fn mark(&mut self, prefix: Prefix) {
        match prefix {
            Prefix::P | Prefix::E => self.text = true,
            Prefix::U => self.url = true,
            Prefix::Dt => {}
        }
    }
}

/// Reusable microformats2 parser
#[derive(Debug, Clone, Default)]
pub struct Parser {
    base_url: Option<Url>,
}

impl Parser {
    /// Create a parser resolving relative URLs against `base_url`
    pub fn new(base_url: Option<&str>) -> Result<Self, ParseError> {
        let base_url = base_url
            .map(|url| {
                Url::parse(url).map_err(|source| ParseError::InvalidBaseUrl {
                    url: url.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Self { base_url })
    }

    /// Parse an HTML fragment into a document
    pub fn parse(&self, html: &str) -> Document {
        let fragment = Html::parse_fragment(html);
        let root = fragment.root_element();

        let mut document = Document::default();
        self.find_items(root, &mut document.items);
        self.collect_rels(root, &mut document);
        document
    }

    fn find_items(&self, element: ElementRef<'_>, items: &mut Vec<Item>) {
        for child in child_elements(element) {
            if root_classes(child).is_empty() {
                self.find_items(child, items);
            } else {
                items.push(self.parse_item(child));
            }
        }
    }

    fn parse_item(&self, element: ElementRef<'_>) -> Item {
        let mut item = Item::new(root_classes(element));
        item.id = element.value().id().map(str::to_string);

        let mut seen = Seen::default();
        self.parse_properties(element, &mut item, &mut seen);

        if !seen.nested {
            if !seen.text && !item.properties.contains_key("name") {
                item.add_property("name", self.implied_name(element).into());
            }
            if !seen.url && !item.properties.contains_key("photo") {
                if let Some(photo) = self.implied_photo(element) {
                    item.add_property("photo", photo);
                }
            }
            if !seen.url && !item.properties.contains_key("url") {
                if let Some(url) = self.implied_url(element) {
                    item.add_property("url", url.into());
                }
            }
        }

        item
    }

    fn parse_properties(&self, element: ElementRef<'_>, item: &mut Item, seen: &mut Seen) {
        for child in child_elements(element) {
            let properties = property_classes(child);

            if root_classes(child).is_empty() {
                for (prefix, name) in properties {
                    seen.mark(prefix);
                    let value = self.property_value(prefix, child);
                    item.add_property(name, value);
                }
                self.parse_properties(child, item, seen);
                continue;
            }

            seen.nested = true;
            let nested = self.parse_item(child);
            if properties.is_empty() {
                item.children.push(nested);
                continue;
            }

            for (prefix, name) in properties {
                seen.mark(prefix);
                let mut value = nested.clone();
                match prefix {
                    Prefix::P => {
                        value.value = Some(match nested.first_str("name") {
                            Some(name) => name.to_string(),
                            None => self.text_content(child),
                        });
                    }
                    Prefix::U => {
                        value.value = Some(match nested.first_str("url") {
                            Some(url) => url.to_string(),
                            None => self.u_value(child),
                        });
                    }
                    Prefix::Dt => value.value = Some(self.dt_value(child)),
                    Prefix::E => {
                        value.html = Some(child.inner_html().trim().to_string());
                        value.value = Some(self.text_content(child));
                    }
                }
                item.add_property(name, PropertyValue::Item(Box::new(value)));
            }
        }
    }

    fn property_value(&self, prefix: Prefix, element: ElementRef<'_>) -> PropertyValue {
        match prefix {
            Prefix::P => self.p_value(element).into(),
            Prefix::Dt => self.dt_value(element).into(),
            Prefix::E => PropertyValue::Fragment(Fragment {
                html: element.inner_html().trim().to_string(),
                value: self.text_content(element),
            }),
            Prefix::U => {
                let url = self.u_value(element);
                match element.value().attr("alt") {
                    Some(alt) if element.value().name() == "img" => {
                        PropertyValue::Image(Image {
                            value: url,
                            alt: alt.to_string(),
                        })
                    }
                    _ => url.into(),
                }
            }
        }
    }

    fn p_value(&self, element: ElementRef<'_>) -> String {
        if let Some(values) = self.value_class(element) {
            return values.concat();
        }

        let el = element.value();
        let attr = match el.name() {
            "abbr" | "link" => el.attr("title"),
            "data" | "input" => el.attr("value"),
            "img" | "area" => el.attr("alt"),
            _ => None,
        };
        match attr {
            Some(value) => value.to_string(),
            None => self.text_content(element),
        }
    }

    fn u_value(&self, element: ElementRef<'_>) -> String {
        let el = element.value();
        let attr = match el.name() {
            "a" | "area" | "link" => el.attr("href"),
            "img" | "audio" | "source" | "iframe" => el.attr("src"),
            "video" => el.attr("src").or_else(|| el.attr("poster")),
            "object" => el.attr("data"),
            _ => None,
        };
        if let Some(url) = attr {
            return self.resolve(url);
        }

        if let Some(values) = self.value_class(element) {
            return self.resolve(&values.concat());
        }

        let attr = match el.name() {
            "abbr" => el.attr("title"),
            "data" | "input" => el.attr("value"),
            _ => None,
        };
        match attr {
            Some(value) => self.resolve(value),
            None => self.resolve(&self.text_content(element)),
        }
    }

    fn dt_value(&self, element: ElementRef<'_>) -> String {
        if let Some(values) = self.value_class(element) {
            return values.join(" ");
        }

        let el = element.value();
        let attr = match el.name() {
            "time" | "ins" | "del" => el.attr("datetime"),
            "abbr" => el.attr("title"),
            "data" | "input" => el.attr("value"),
            _ => None,
        };
        match attr {
            Some(value) => value.trim().to_string(),
            None => self.text_content(element),
        }
    }

    /// Values of the `value` / `value-title` descendants, if there are any
    fn value_class(&self, element: ElementRef<'_>) -> Option<Vec<String>> {
        let mut values = Vec::new();
        self.collect_values(element, &mut values);
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    fn collect_values(&self, element: ElementRef<'_>, values: &mut Vec<String>) {
        for child in child_elements(element) {
            if !root_classes(child).is_empty() || !property_classes(child).is_empty() {
                continue;
            }

            let el = child.value();
            if el.has_class("value-title", scraper::CaseSensitivity::CaseSensitive) {
                values.push(el.attr("title").unwrap_or_default().to_string());
            } else if el.has_class("value", scraper::CaseSensitivity::CaseSensitive) {
                let attr = match el.name() {
                    "img" | "area" => el.attr("alt"),
                    "data" => el.attr("value"),
                    "abbr" => el.attr("title"),
                    _ => None,
                };
                values.push(match attr {
                    Some(value) => value.to_string(),
                    None => self.text_content(child),
                });
            } else {
                self.collect_values(child, values);
            }
        }
    }

    fn implied_name(&self, element: ElementRef<'_>) -> String {
        if let Some(name) = alt_or_title(element) {
            return name;
        }

        if let Some(only) = only_child(element).filter(|c| root_classes(*c).is_empty()) {
            if let Some(name) = alt_or_title(only) {
                return name;
            }
            if let Some(name) = only_child(only)
                .filter(|c| root_classes(*c).is_empty())
                .and_then(alt_or_title)
            {
                return name;
            }
        }

        self.text_content(element)
    }

    fn implied_photo(&self, element: ElementRef<'_>) -> Option<PropertyValue> {
        let candidate = photo_source(element)
            .map(|_| element)
            .or_else(|| only_of_type_photo(element))
            .or_else(|| {
                only_child(element)
                    .filter(|c| root_classes(*c).is_empty())
                    .and_then(only_of_type_photo)
            })?;

        let el = candidate.value();
        let src = self.resolve(photo_source(candidate)?);
        Some(match el.attr("alt") {
            Some(alt) if el.name() == "img" => PropertyValue::Image(Image {
                value: src,
                alt: alt.to_string(),
            }),
            _ => src.into(),
        })
    }

    fn implied_url(&self, element: ElementRef<'_>) -> Option<String> {
        let href = link_target(element)
            .or_else(|| only_of_type_link(element).and_then(link_target))
            .or_else(|| {
                only_child(element)
                    .filter(|c| root_classes(*c).is_empty())
                    .and_then(only_of_type_link)
                    .and_then(link_target)
            })?;
        Some(self.resolve(href))
    }

    fn collect_rels(&self, root: ElementRef<'_>, document: &mut Document) {
        for element in root.descendants().filter_map(ElementRef::wrap) {
            let el = element.value();
            if !matches!(el.name(), "a" | "link" | "area") {
                continue;
            }
            let (Some(rel), Some(href)) = (el.attr("rel"), el.attr("href")) else {
                continue;
            };

            let url = self.resolve(href);
            let rels: Vec<&str> = rel.split_whitespace().collect();
            for rel in &rels {
                let urls = document.rels.entry(rel.to_string()).or_default();
                if !urls.contains(&url) {
                    urls.push(url.clone());
                }
            }

            let entry = document.rel_urls.entry(url).or_insert_with(|| RelUrl {
                text: Some(self.text_content(element)).filter(|t| !t.is_empty()),
                title: el.attr("title").map(str::to_string),
                media: el.attr("media").map(str::to_string),
                hreflang: el.attr("hreflang").map(str::to_string),
                media_type: el.attr("type").map(str::to_string),
                ..Default::default()
            });
            for rel in rels {
                if !entry.rels.iter().any(|r| r == rel) {
                    entry.rels.push(rel.to_string());
                }
            }
        }
    }

    /// Text content without scripts and styles, images replaced by their alt text
    fn text_content(&self, element: ElementRef<'_>) -> String {
        let mut text = String::new();
        self.push_text(element, &mut text);
        text.trim().to_string()
    }

    fn push_text(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => match el.name() {
                    "script" | "style" | "template" => {}
                    "img" => match (el.attr("alt"), el.attr("src")) {
                        (Some(alt), _) => out.push_str(alt),
                        (None, Some(src)) => {
                            out.push(' ');
                            out.push_str(&self.resolve(src));
                            out.push(' ');
                        }
                        (None, None) => {}
                    },
                    _ => {
                        if let Some(child) = ElementRef::wrap(child) {
                            self.push_text(child, out);
                        }
                    }
                },
                _ => {}
            }
        }
    }

    /// Resolve a possibly relative URL against the base URL
    fn resolve(&self, url: &str) -> String {
        let url = url.trim();
        match &self.base_url {
            Some(base) if !url.is_empty() => base
                .join(url)
                .map(String::from)
                .unwrap_or_else(|_| url.to_string()),
            _ => url.to_string(),
        }
    }
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

/// Sorted, unique `h-*` classes of an element
fn root_classes(element: ElementRef<'_>) -> Vec<String> {
    element
        .value()
        .classes()
        .filter(|class| ROOT_CLASS.is_match(class))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Unique property classes of an element, in class attribute order
fn property_classes(element: ElementRef<'_>) -> Vec<(Prefix, String)> {
    let mut properties: Vec<(Prefix, String)> = Vec::new();
    for class in element.value().classes() {
        let Some(caps) = PROPERTY_CLASS.captures(class) else {
            continue;
        };
        let Some(prefix) = Prefix::from_class_prefix(&caps[1]) else {
            continue;
        };
        let name = caps[2].to_string();
        if !properties.iter().any(|(p, n)| *p == prefix && *n == name) {
            properties.push((prefix, name));
        }
    }
    properties
}

/// The single element child, if there is exactly one
fn only_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut children = child_elements(element);
    let only = children.next()?;
    if children.next().is_some() {
        None
    } else {
        Some(only)
    }
}

/// The single child element with the given tag name, if it is not an item
fn only_of_type<'a>(element: ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
    let mut found = None;
    for name in names {
        let mut matches = child_elements(element).filter(|c| c.value().name() == *name);
        if let Some(candidate) = matches.next() {
            if matches.next().is_none() && root_classes(candidate).is_empty() {
                found = found.or(Some(candidate));
            }
        }
    }
    found
}

fn only_of_type_photo(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    only_of_type(element, &["img", "object"]).filter(|c| photo_source(*c).is_some())
}

fn only_of_type_link(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    only_of_type(element, &["a", "area"]).filter(|c| link_target(*c).is_some())
}

fn photo_source(element: ElementRef<'_>) -> Option<&str> {
    let el = element.value();
    match el.name() {
        "img" => el.attr("src"),
        "object" => el.attr("data"),
        _ => None,
    }
}

fn link_target(element: ElementRef<'_>) -> Option<&str> {
    let el = element.value();
    match el.name() {
        "a" | "area" => el.attr("href"),
        _ => None,
    }
}

fn alt_or_title(element: ElementRef<'_>) -> Option<String> {
    let el = element.value();
    let value = match el.name() {
        "img" | "area" => el.attr("alt"),
        "abbr" => el.attr("title"),
        _ => None,
    }?;
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
