//! Core data models for the solmi indexer.
//!
//! These types are shared across all solmi crates and represent the
//! posts, content trees, and keywords the indexing pipeline works on.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// POST TYPES
// =============================================================================

/// Opaque identifier of a post, as assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PostId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Both directions of a post's internal link graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLinks {
    /// Posts this post links to.
    pub outbound: BTreeSet<PostId>,
    /// Posts that link to this post (inverse of `outbound` across all posts).
    pub inbound: BTreeSet<PostId>,
}

// =============================================================================
// CONTENT TREE TYPES
// =============================================================================

/// Structured rich-text content of a post: an ordered sequence of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTree {
    pub nodes: Vec<ContentNode>,
}

impl ContentTree {
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A single node of a content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ContentNode {
    /// Leaf carrying text and its inline marks.
    Text(TextLeaf),
    /// Block or inline element with ordered children (paragraph, heading, layout...).
    Container(Container),
    /// Typed custom block (internal link, code block, carousel...).
    Component(ComponentNode),
}

impl ContentNode {
    /// Plain text leaf without marks.
    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text(TextLeaf {
            text: text.into(),
            marks: BTreeSet::new(),
        })
    }

    /// Container of the given kind.
    pub fn container(kind: impl Into<String>, children: Vec<ContentNode>) -> Self {
        ContentNode::Container(Container {
            kind: kind.into(),
            children,
        })
    }

    /// `paragraph` container.
    pub fn paragraph(children: Vec<ContentNode>) -> Self {
        Self::container("paragraph", children)
    }

    /// Component node of the given kind with no fields.
    pub fn component(component: impl Into<String>) -> ComponentNode {
        ComponentNode {
            component: component.into(),
            fields: BTreeMap::new(),
        }
    }
}

/// Text leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLeaf {
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub marks: BTreeSet<String>,
}

/// Container node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Element type as reported by the editor (`paragraph`, `heading`, `layout-area`...).
    pub kind: String,
    pub children: Vec<ContentNode>,
}

/// Component node: a kind tag plus named sub-fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub component: String,
    #[serde(default)]
    pub fields: BTreeMap<String, ComponentField>,
}

impl ComponentNode {
    /// Add a scalar sub-field.
    pub fn with_scalar(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.fields
            .insert(name.into(), ComponentField::Scalar(value));
        self
    }

    /// Add a sub-field holding further nodes.
    pub fn with_nodes(mut self, name: impl Into<String>, nodes: Vec<ContentNode>) -> Self {
        self.fields.insert(name.into(), ComponentField::Nodes(nodes));
        self
    }

    pub fn field(&self, name: &str) -> Option<&ComponentField> {
        self.fields.get(name)
    }
}

impl From<ComponentNode> for ContentNode {
    fn from(node: ComponentNode) -> Self {
        ContentNode::Component(node)
    }
}

/// Value of a component sub-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ComponentField {
    /// Nested rich text (e.g. a caption or the body of a quote).
    Nodes(Vec<ContentNode>),
    /// Scalar or structured prop value (e.g. a relationship `{ "id": ... }`).
    Scalar(JsonValue),
}

// =============================================================================
// KEYWORD TYPES
// =============================================================================

/// A persisted keyword.
///
/// `value` is the normalized token and is unique across all keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: Uuid,
    pub value: String,
}

/// A normalized token and its occurrence count, produced during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCandidate {
    pub token: String,
    pub count: usize,
}
