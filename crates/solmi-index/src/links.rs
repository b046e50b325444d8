//! Internal link graph rebuilding.

use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

use solmi_core::defaults::{INTERNAL_LINK_COMPONENT, INTERNAL_LINK_TARGET_FIELD};
use solmi_core::{
    ComponentField, ComponentNode, ContentNode, ContentTree, PostId, PostRepository, Result,
};

/// Collect the ids of all posts referenced by internal link components.
///
/// Descends into containers and component node fields. Duplicates collapse.
pub fn collect_internal_links(tree: &ContentTree) -> BTreeSet<PostId> {
    let mut targets = BTreeSet::new();
    collect_from(&tree.nodes, &mut targets);
    targets
}

fn collect_from(nodes: &[ContentNode], targets: &mut BTreeSet<PostId>) {
    for node in nodes {
        match node {
            ContentNode::Text(_) => {}
            ContentNode::Container(container) => collect_from(&container.children, targets),
            ContentNode::Component(component) => {
                if component.component == INTERNAL_LINK_COMPONENT {
                    match link_target(component) {
                        Some(target) => {
                            targets.insert(target);
                        }
                        None => trace!("Internal link without a target, skipping"),
                    }
                }
                for field in component.fields.values() {
                    if let ComponentField::Nodes(children) = field {
                        collect_from(children, targets);
                    }
                }
            }
        }
    }
}

/// Target of an internal link: either a relationship object with an `id`
/// or a bare id string. Empty ids do not count.
fn link_target(component: &ComponentNode) -> Option<PostId> {
    let id = match component.field(INTERNAL_LINK_TARGET_FIELD)? {
        ComponentField::Scalar(JsonValue::Object(relation)) => {
            relation.get("id").and_then(JsonValue::as_str)?
        }
        ComponentField::Scalar(JsonValue::String(id)) => id.as_str(),
        _ => return None,
    };

    (!id.is_empty()).then(|| PostId::from(id))
}

/// Rewrites a post's outbound links from its content tree.
pub struct LinkGraphRebuilder {
    posts: Arc<dyn PostRepository>,
    allow_self_links: bool,
}

impl LinkGraphRebuilder {
    pub fn new(posts: Arc<dyn PostRepository>, allow_self_links: bool) -> Self {
        Self {
            posts,
            allow_self_links,
        }
    }

    /// Replace the post's outbound links with the targets found in `tree`.
    ///
    /// Issues exactly one set-replace write. Returns the written set, which
    /// leaves out targets that no longer exist.
    pub async fn rebuild(&self, post_id: &PostId, tree: &ContentTree) -> Result<BTreeSet<PostId>> {
        let mut targets = collect_internal_links(tree);
        if !self.allow_self_links && targets.remove(post_id) {
            debug!(post_id = %post_id, "Dropped self link");
        }

        let written = self.posts.replace_outbound_links(post_id, &targets).await?;

        debug!(
            subsystem = "index",
            component = "links",
            post_id = %post_id,
            link_count = written.len(),
            skipped_count = targets.len().saturating_sub(written.len()),
            "Outbound links replaced"
        );
        Ok(written)
    }
}
