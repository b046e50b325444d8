//! Content tree parsing and plain-text flattening.
//!
//! The editor stores post bodies as a JSON document (an array of element
//! and text nodes). [`ContentTree::from_json`] turns that into the closed
//! [`ContentNode`] type; everything downstream matches on it exhaustively
//! and never inspects raw JSON again.

use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;
use tracing::trace;

use crate::defaults::EXCERPT_LENGTH;
use crate::models::{ComponentField, ComponentNode, Container, ContentNode, ContentTree, TextLeaf};

/// Element type the editor uses for custom component blocks.
const COMPONENT_BLOCK_TYPE: &str = "component-block";

/// Element types carrying a child field of a component block.
const COMPONENT_PROP_TYPES: &[&str] = &["component-block-prop", "component-inline-prop"];

/// Container kind used when an element has no `type`.
const DEFAULT_CONTAINER_KIND: &str = "paragraph";

impl ContentTree {
    /// Parse editor JSON into a content tree.
    ///
    /// Shapes that are not recognized are skipped, so a malformed document
    /// yields a smaller (possibly empty) tree rather than an error.
    ///
    /// ```
    /// use serde_json::json;
    /// use solmi_core::ContentTree;
    ///
    /// let tree = ContentTree::from_json(&json!([
    ///     { "type": "paragraph", "children": [{ "text": "hello", "bold": true }] }
    /// ]));
    /// assert_eq!(tree.nodes.len(), 1);
    /// ```
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => Self::new(parse_nodes(items)),
            _ => Self::default(),
        }
    }
}

fn parse_nodes(items: &[JsonValue]) -> Vec<ContentNode> {
    items.iter().filter_map(parse_node).collect()
}

fn parse_node(value: &JsonValue) -> Option<ContentNode> {
    let Some(obj) = value.as_object() else {
        trace!(node = %value, "Skipping non-object content node");
        return None;
    };

    if let Some(text) = obj.get("text").and_then(JsonValue::as_str) {
        return Some(ContentNode::Text(parse_text_leaf(text, obj)));
    }

    let kind = obj.get("type").and_then(JsonValue::as_str);
    if kind == Some(COMPONENT_BLOCK_TYPE) {
        return parse_component(obj).map(ContentNode::Component);
    }

    match obj.get("children") {
        Some(JsonValue::Array(children)) => Some(ContentNode::Container(Container {
            kind: kind.unwrap_or(DEFAULT_CONTAINER_KIND).to_string(),
            children: parse_nodes(children),
        })),
        _ => {
            trace!(node = %value, "Skipping unrecognized content node");
            None
        }
    }
}

fn parse_text_leaf(text: &str, obj: &Map<String, JsonValue>) -> TextLeaf {
    let marks: BTreeSet<String> = obj
        .iter()
        .filter(|(key, value)| key.as_str() != "text" && value.as_bool() == Some(true))
        .map(|(key, _)| key.clone())
        .collect();

    TextLeaf {
        text: text.to_string(),
        marks,
    }
}

fn parse_component(obj: &Map<String, JsonValue>) -> Option<ComponentNode> {
    let component = obj.get("component").and_then(JsonValue::as_str)?;
    let mut node = ContentNode::component(component);

    if let Some(JsonValue::Object(props)) = obj.get("props") {
        for (name, value) in props {
            node.fields
                .insert(name.clone(), ComponentField::Scalar(value.clone()));
        }
    }

    // Child fields arrive as prop elements addressed by `propPath`.
    if let Some(JsonValue::Array(children)) = obj.get("children") {
        for child in children {
            let Some(child) = child.as_object() else {
                continue;
            };
            let is_prop = child
                .get("type")
                .and_then(JsonValue::as_str)
                .is_some_and(|t| COMPONENT_PROP_TYPES.contains(&t));
            let name = child
                .get("propPath")
                .and_then(JsonValue::as_array)
                .and_then(|path| path.first())
                .and_then(JsonValue::as_str);

            if let (true, Some(name)) = (is_prop, name) {
                let nodes = match child.get("children") {
                    Some(JsonValue::Array(items)) => parse_nodes(items),
                    _ => Vec::new(),
                };
                node.fields
                    .insert(name.to_string(), ComponentField::Nodes(nodes));
            }
        }
    }

    Some(node)
}

/// Flatten a content tree into plain text.
///
/// Every text leaf contributes its text followed by a single space, in
/// document order. Containers contribute their children only. Component
/// nodes are opaque and contribute nothing.
///
/// ```
/// use solmi_core::{content::flatten, ContentNode, ContentTree};
///
/// let tree = ContentTree::new(vec![ContentNode::paragraph(vec![
///     ContentNode::text("고양이"),
///     ContentNode::text("좋아"),
/// ])]);
/// assert_eq!(flatten(&tree), "고양이 좋아 ");
/// ```
pub fn flatten(tree: &ContentTree) -> String {
    let mut out = String::new();
    flatten_into(&tree.nodes, &mut out);
    out
}

fn flatten_into(nodes: &[ContentNode], out: &mut String) {
    for node in nodes {
        match node {
            ContentNode::Text(leaf) => {
                out.push_str(&leaf.text);
                out.push(' ');
            }
            ContentNode::Container(container) => flatten_into(&container.children, out),
            ContentNode::Component(_) => {}
        }
    }
}

/// Short plain-text preview of a post.
///
/// Returns the flattened text when it fits in `length` characters,
/// otherwise its first `length - 3` characters followed by `...`.
pub fn excerpt(tree: &ContentTree, length: usize) -> String {
    let plain = flatten(tree);
    if plain.chars().count() <= length {
        return plain;
    }

    let mut cut: String = plain.chars().take(length.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// [`excerpt`] with the default length.
pub fn default_excerpt(tree: &ContentTree) -> String {
    excerpt(tree, EXCERPT_LENGTH)
}
