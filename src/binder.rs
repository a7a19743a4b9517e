//! Template binder: embeds the page's style and script, applies binding
//! records by element id and serializes the result.
//!
//! The binder owns the parsed document for the duration of one call and only
//! hands back the serialized markup. Data-quality problems (unknown ids,
//! incomplete records) are skipped rather than reported, so a page assembled
//! from many optional fields still renders when some of them are absent.

use crate::record::BindingRecord;
use crate::{Error, Result};
use ego_tree::{NodeId, NodeMut};
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use log::{debug, trace};
use scraper::node::{Element, Node, Text};
use scraper::{ElementRef, Html, Selector};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Flag attribute marking elements whose text is replaced by the record value
pub const DISPLAY_MARKER: &str = "data-display";

/// Which attribute a record writes for a given tag, and with which value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRule {
    /// Attribute name to set
    pub attribute: &'static str,
    /// Use the raw record value and ignore the link
    pub raw_value: bool,
}

const SRC_RULE: AttributeRule = AttributeRule {
    attribute: "src",
    raw_value: true,
};

const HREF_RULE: AttributeRule = AttributeRule {
    attribute: "href",
    raw_value: false,
};

static ATTRIBUTE_TABLE: &[(&str, AttributeRule)] = &[
    ("img", SRC_RULE),
    ("video", SRC_RULE),
    ("audio", SRC_RULE),
    ("source", SRC_RULE),
    ("track", SRC_RULE),
    ("iframe", SRC_RULE),
    ("embed", SRC_RULE),
    ("script", SRC_RULE),
    ("a", HREF_RULE),
    ("link", HREF_RULE),
];

/// Look up the attribute rule for a tag name. Unlisted tags get `href`.
pub fn attribute_rule(tag: &str) -> AttributeRule {
    let tag = tag.to_ascii_lowercase();
    ATTRIBUTE_TABLE
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, rule)| *rule)
        .unwrap_or(HREF_RULE)
}

/// Bind `records` into `document` and return the serialized page.
///
/// The stylesheet is appended to `<head>` as an inline `<style>` and the
/// script to the end of `<body>` as `<script type="module">`, then every
/// applicable record is applied in order. Only a document without `<head>`
/// or `<body>` is rejected.
///
/// The returned markup is the whole document, starting with its doctype
/// (`<!DOCTYPE html>`) when the template declares one.
///
/// ```
/// use sitebind::{bind_markup, BindingRecord};
///
/// let html = r#"<html><head></head><body><a id="home">Home</a></body></html>"#;
/// let records = vec![BindingRecord::new("home", "ada", Some("https://example.com/"))];
/// let out = bind_markup(html, "", "", &records).unwrap();
/// assert!(out.contains(r#"href="https://example.com/ada""#));
/// ```
pub fn bind(
    mut document: Html,
    stylesheet: &str,
    script: &str,
    records: &[BindingRecord],
) -> Result<String> {
    let head = first_element(&document, "head")?;
    let body = first_element(&document, "body")?;

    append_element(&mut document, head, "style", &[], stylesheet)?;
    append_element(&mut document, body, "script", &[("type", "module")], script)?;

    for record in records {
        apply_record(&mut document, record);
    }

    serialize_document(&document)
}

/// Parse `template` as a full HTML document, then [`bind`] it.
pub fn bind_markup(
    template: &str,
    stylesheet: &str,
    script: &str,
    records: &[BindingRecord],
) -> Result<String> {
    bind(Html::parse_document(template), stylesheet, script, records)
}

fn first_element(document: &Html, tag: &str) -> Result<NodeId> {
    let selector = Selector::parse(tag)
        .map_err(|e| Error::Other(format!("Invalid selector '{}': {:?}", tag, e)))?;
    document
        .select(&selector)
        .next()
        .map(|el| el.id())
        .ok_or_else(|| Error::InvalidTemplate(format!("document has no <{}> element", tag)))
}

// First element in document order carrying `id`; detached nodes are not reachable.
fn element_by_id(document: &Html, id: &str) -> Option<NodeId> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().id() == Some(id))
        .map(|el| el.id())
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

fn append_element(
    document: &mut Html,
    parent: NodeId,
    tag: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    let name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag));
    let attrs = attrs
        .iter()
        .map(|(k, v)| Attribute {
            name: attribute_name(k),
            value: (*v).into(),
        })
        .collect();

    let mut parent = document
        .tree
        .get_mut(parent)
        .ok_or_else(|| Error::InvalidTemplate(format!("<{}> parent vanished from the tree", tag)))?;
    let mut element = parent.append(Node::Element(Element::new(name, attrs)));
    if !text.is_empty() {
        element.append(Node::Text(Text { text: text.into() }));
    }
    Ok(())
}

fn apply_record(document: &mut Html, record: &BindingRecord) {
    let (selector, value) = match (record.selector(), record.value()) {
        (Some(selector), Some(value)) => (selector, value),
        _ => {
            debug!("Skipping incomplete binding record {:?}", record);
            return;
        }
    };

    let id = match element_by_id(document, selector) {
        Some(id) => id,
        None => {
            debug!("No element with id '{}', skipping", selector);
            return;
        }
    };

    let mut node = match document.tree.get_mut(id) {
        Some(node) => node,
        None => return,
    };
    let element = match node.value() {
        Node::Element(element) => element,
        _ => return,
    };

    let rule = attribute_rule(element.name());
    let attr_value = if rule.raw_value {
        value.to_string()
    } else {
        record.target_url().unwrap_or_default()
    };
    trace!("#{}: {}=\"{}\"", selector, rule.attribute, attr_value);
    set_attribute(element, rule.attribute, &attr_value);

    if record.needs_hiding() {
        hide(element);
    }

    if element.attr(DISPLAY_MARKER) == Some("true") {
        replace_children_with_text(&mut node, value);
    }
}

// Existing attributes keep their position; new ones are appended. Only the
// plain, un-namespaced attribute is touched (`xlink:href` is not `href`).
fn set_attribute(element: &mut Element, name: &str, value: &str) {
    element.attrs.insert(attribute_name(name), value.into());
}

fn hide(element: &mut Element) {
    let existing = element.attr("style").unwrap_or("").trim();
    let style = if existing.is_empty() {
        "display: none;".to_string()
    } else if existing.ends_with(';') {
        format!("{} display: none;", existing)
    } else {
        format!("{}; display: none;", existing)
    };
    set_attribute(element, "style", &style);
}

fn replace_children_with_text(node: &mut NodeMut<'_, Node>, text: &str) {
    while let Some(mut child) = node.first_child() {
        child.detach();
    }
    node.append(Node::Text(Text { text: text.into() }));
}

fn serialize_document(document: &Html) -> Result<String> {
    let mut buf = Vec::new();
    serialize(&mut buf, document, SerializeOpts::default())
        .map_err(|e| Error::Other(format!("Serialization failed: {}", e)))?;
    String::from_utf8(buf).map_err(|e| Error::Other(format!("Serialized markup is not UTF-8: {}", e)))
}
