//! The reduction pass: one recursive walk, top-down classification and
//! identifier assignment, bottom-up aggregation, flattening and pruning.

use std::mem;

use serde::Serialize;
use tracing::trace;

use super::output::{OutputChild, OutputNode, PageContent, PRESERVE_TAGS};
use super::registry::{slug, IdRegistry};
use super::snapshot::{SourceChild, SourceNode};
use super::{
    ATTR_CAN_EDIT, ATTR_CLICKABLE, ATTR_INPUT_DISABLED, ATTR_IS_FOCUSED, ATTR_MAYBE_HOVERABLE,
    ATTR_NODE_HANDLE, ATTR_NUMERIC_VALUE, ATTR_POINTER_EVENTS, ATTR_SELECTED_INDEX,
    ATTR_SELECTED_VALUES, ATTR_SELECTION_END, ATTR_SELECTION_START, ATTR_SEMANTIC_ID,
};

/// Tags dropped outright, along with their subtrees.
const TAG_BLACKLIST: &[&str] = &[
    "script", "style", "link", "meta", "noscript", "template", "iframe", "svg", "canvas",
    "picture", "video", "audio", "object", "embed",
];

/// Non-semantic wrapper tags eligible for single-child collapsing. A generic
/// wrapper around a semantic child yields the child's tag, so only tags that
/// must never win that contest belong here.
const GENERIC_TAGS: &[&str] = &["div"];

/// Attributes copied verbatim from source to output.
const ALLOWED_ATTRS: &[&str] = &[
    "id",
    "href",
    "src",
    "type",
    "name",
    "value",
    "placeholder",
    "checked",
    "disabled",
    "readonly",
    "required",
    "maxlength",
    "min",
    "max",
    "step",
    "role",
    "tabindex",
    "alt",
    "title",
    "for",
    "action",
    "method",
    "contenteditable",
    "selected",
    "multiple",
    "autocomplete",
];

/// Reducer-owned attributes. Stale copies from a previous traversal are not
/// projected; each traversal re-derives them from scratch.
const INTERNAL_ATTRS: &[&str] = &[
    ATTR_NODE_HANDLE,
    ATTR_SEMANTIC_ID,
    ATTR_CLICKABLE,
    ATTR_INPUT_DISABLED,
    ATTR_CAN_EDIT,
    ATTR_IS_FOCUSED,
    ATTR_POINTER_EVENTS,
    ATTR_NUMERIC_VALUE,
    ATTR_SELECTION_START,
    ATTR_SELECTION_END,
    ATTR_SELECTED_INDEX,
    ATTR_SELECTED_VALUES,
];

/// One identifier to mirror onto the live page.
#[derive(Debug, Clone, Serialize)]
pub struct Stamp {
    /// Capture handle (`data-wg-node` value) of the live element.
    pub node: String,
    pub id: String,
    pub clickable: bool,
    pub hoverable: bool,
}

/// Result of reducing one document.
#[derive(Debug, Default)]
pub struct ReducedPage {
    pub content: PageContent,
    pub stamps: Vec<Stamp>,
}

/// Reduce a captured document. The snapshot is mutated only to record
/// assigned identifiers on its nodes.
pub fn reduce_document(root: &mut SourceNode) -> ReducedPage {
    let mut reducer = Reducer::new();
    let content = reducer
        .reduce(root, "", false, false)
        .map(|tree| PageContent::collect(&tree))
        .unwrap_or_default();
    trace!(
        identifiers = reducer.registry.len(),
        stamps = reducer.stamps.len(),
        "reduced document"
    );
    ReducedPage {
        content,
        stamps: reducer.stamps,
    }
}

/// Traversal state: the identifier registry plus the stamp sheet, both owned
/// by a single invocation.
#[derive(Debug, Default)]
pub struct Reducer {
    registry: IdRegistry,
    stamps: Vec<Stamp>,
}

impl Reducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce one subtree. `parent_id` is the nearest ancestor identifier
    /// (possibly empty), `parent_clickable`/`parent_hoverable` carry ancestor
    /// classification. Returns `None` when the node is excluded; exclusion is
    /// always local and never aborts the surrounding traversal.
    pub fn reduce(
        &mut self,
        source: &mut SourceNode,
        parent_id: &str,
        parent_clickable: bool,
        parent_hoverable: bool,
    ) -> Option<OutputNode> {
        let tag = source.tag.to_ascii_lowercase();
        if TAG_BLACKLIST.contains(&tag.as_str()) {
            return None;
        }
        if !is_visible(source) {
            return None;
        }

        let mut clone = OutputNode::new(&tag);
        for (name, value) in &source.attrs {
            if is_projected(name) {
                clone.set_attr(name, value);
            }
        }

        if source.style.pointer_events != "auto" {
            clone.set_attr(ATTR_POINTER_EVENTS, &source.style.pointer_events);
        }
        if source.focused {
            clone.set_attr(ATTR_IS_FOCUSED, "true");
        }
        // The live checked property wins over the markup attribute.
        match source.checked {
            Some(true) => clone.set_attr("checked", "true"),
            Some(false) => {
                clone.attrs.remove("checked");
            }
            None => {}
        }

        let disabled = source.disabled
            || source.attrs.contains_key("disabled")
            || source.style.pointer_events == "none";
        let clickable = !parent_clickable && is_click_candidate(&tag, source) && !disabled;

        let mut id: Option<String> = None;
        if clickable {
            let base = base_name(
                &[
                    Some(source.visible_text()),
                    source.attrs.get("title").cloned(),
                    source.attrs.get("placeholder").cloned(),
                ],
                &tag,
            );
            let assigned = self.registry.assign(parent_id, &base);
            clone.set_attr(ATTR_CLICKABLE, "true");
            id = Some(assigned);
        }

        let hoverable = parent_hoverable || source.attrs.contains_key(ATTR_MAYBE_HOVERABLE);
        if hoverable {
            clone.set_attr(ATTR_MAYBE_HOVERABLE, "true");
            source
                .attrs
                .insert(ATTR_MAYBE_HOVERABLE.into(), "true".into());
        }

        let editable = matches!(tag.as_str(), "input" | "textarea")
            || source.attrs.contains_key("contenteditable");
        if editable {
            let readonly = source.read_only || source.attrs.contains_key("readonly");
            if !disabled && !readonly && id.is_none() {
                let base = base_name(
                    &[
                        source.attrs.get("placeholder").cloned(),
                        source.attrs.get("name").cloned(),
                        source.value.clone(),
                    ],
                    &tag,
                );
                id = Some(self.registry.assign(parent_id, &base));
            }
            if id.is_some() {
                if let Some(value) = &source.value {
                    clone.set_attr("value", value);
                }
                clone.set_attr(ATTR_INPUT_DISABLED, "false");
                clone.set_attr(ATTR_CAN_EDIT, if readonly { "false" } else { "true" });
                if clone.attr("type") == Some("number") {
                    let parsed = source
                        .value
                        .as_deref()
                        .and_then(|v| v.trim().parse::<f64>().ok());
                    if let Some(number) = parsed {
                        clone.set_attr(ATTR_NUMERIC_VALUE, &number.to_string());
                    }
                }
                if let (Some(start), Some(end)) = (source.selection_start, source.selection_end) {
                    clone.set_attr(ATTR_SELECTION_START, &start.to_string());
                    clone.set_attr(ATTR_SELECTION_END, &end.to_string());
                }
            }
        }

        let mut select_expanded = false;
        if tag == "select" && !disabled {
            let select_id = match &id {
                Some(existing) => existing.clone(),
                None => {
                    let base = base_name(
                        &[
                            source.attrs.get("placeholder").cloned(),
                            source.attrs.get("name").cloned(),
                            source.value.clone(),
                        ],
                        &tag,
                    );
                    let assigned = self.registry.assign(parent_id, &base);
                    id = Some(assigned.clone());
                    assigned
                }
            };
            if let Some(value) = &source.value {
                clone.set_attr("value", value);
            }
            if let Some(index) = source.selected_index {
                clone.set_attr(ATTR_SELECTED_INDEX, &index.to_string());
            }
            if source.multiple {
                clone.set_attr("multiple", "true");
            }
            let mut selected_values = Vec::new();
            for child in &mut source.children {
                let SourceChild::Element(option) = child else {
                    continue;
                };
                if !option.tag.eq_ignore_ascii_case("option") {
                    continue;
                }
                let text = option.visible_text();
                let value = option
                    .attrs
                    .get("value")
                    .cloned()
                    .unwrap_or_else(|| text.clone());
                let is_selected =
                    option.selected.unwrap_or(false) || option.attrs.contains_key("selected");
                if is_selected {
                    selected_values.push(value.clone());
                }
                let option_base = {
                    let s = slug(&text);
                    if s.is_empty() {
                        "option".to_string()
                    } else {
                        s
                    }
                };
                let option_id = self.registry.unique(&format!("{select_id}.{option_base}"));
                let mut out_option = OutputNode::new("option");
                out_option.set_attr("value", &value);
                if is_selected {
                    out_option.set_attr("selected", "true");
                }
                out_option.set_attr(ATTR_SEMANTIC_ID, &option_id);
                if !text.is_empty() {
                    out_option.push_text(&text);
                }
                self.stamp(option, &option_id, false, hoverable);
                option.semantic_id = Some(option_id);
                clone.push_element(out_option);
            }
            clone.set_attr(ATTR_SELECTED_VALUES, &selected_values.join(","));
            select_expanded = true;
        }

        if let Some(assigned) = &id {
            clone.set_attr(ATTR_SEMANTIC_ID, assigned);
            self.stamp(source, assigned, clickable, hoverable);
            source.semantic_id = Some(assigned.clone());
        }

        // Recurse and inline text in document order.
        let child_parent = id.as_deref().unwrap_or(parent_id).to_string();
        let child_clickable = parent_clickable || clickable;
        for child in &mut source.children {
            match child {
                SourceChild::Text { text } => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        clone.push_text(trimmed);
                    }
                }
                SourceChild::Element(element) => {
                    if select_expanded && element.tag.eq_ignore_ascii_case("option") {
                        continue;
                    }
                    if let Some(reduced) =
                        self.reduce(element, &child_parent, child_clickable, hoverable)
                    {
                        if !reduced.is_empty() || PRESERVE_TAGS.contains(&reduced.tag.as_str()) {
                            clone.push_element(reduced);
                        }
                    }
                }
            }
        }

        let mut clone = flatten(clone);

        clone.children.retain(|child| match child {
            OutputChild::Text(text) => !text.trim().is_empty(),
            OutputChild::Element(element) => {
                !element.is_empty() || PRESERVE_TAGS.contains(&element.tag.as_str())
            }
        });

        Some(clone)
    }

    fn stamp(&mut self, source: &SourceNode, id: &str, clickable: bool, hoverable: bool) {
        if let Some(handle) = source.attrs.get(ATTR_NODE_HANDLE) {
            self.stamps.push(Stamp {
                node: handle.clone(),
                id: id.to_string(),
                clickable,
                hoverable,
            });
        }
    }
}

fn is_visible(source: &SourceNode) -> bool {
    if source.style.display == "none" || source.style.visibility == "hidden" {
        return false;
    }
    if let Ok(opacity) = source.style.opacity.trim().parse::<f64>() {
        if opacity.abs() < 1e-6 {
            return false;
        }
    }
    !(source.width == 0.0 && source.height == 0.0)
}

fn is_projected(name: &str) -> bool {
    if INTERNAL_ATTRS.contains(&name) {
        return false;
    }
    ALLOWED_ATTRS.contains(&name) || name.starts_with("aria-") || name.starts_with("data-")
}

fn is_click_candidate(tag: &str, source: &SourceNode) -> bool {
    matches!(tag, "button" | "select" | "summary" | "area" | "input")
        || (tag == "a" && source.attrs.contains_key("href"))
        || source.attrs.contains_key("onclick")
        || matches!(
            source.attrs.get("role").map(String::as_str),
            Some("button") | Some("link")
        )
        || source.style.cursor == "pointer"
}

/// First candidate that slugs to something non-empty, else the tag name.
fn base_name(candidates: &[Option<String>], tag: &str) -> String {
    for candidate in candidates.iter().flatten() {
        let slugged = slug(candidate);
        if !slugged.is_empty() {
            return slugged;
        }
    }
    let fallback = slug(tag);
    if fallback.is_empty() {
        "node".to_string()
    } else {
        fallback
    }
}

/// Collapse single-child generic-wrapper chains to a fixpoint. When the
/// wrapper is generic and the child is not, the child's tag survives; the
/// child's attributes override the wrapper's on conflict.
fn flatten(mut node: OutputNode) -> OutputNode {
    loop {
        if node.children.len() != 1 {
            return node;
        }
        let child_generic = match &node.children[0] {
            OutputChild::Element(element) => GENERIC_TAGS.contains(&element.tag.as_str()),
            OutputChild::Text(_) => return node,
        };
        let node_generic = GENERIC_TAGS.contains(&node.tag.as_str());
        if !node_generic && !child_generic {
            return node;
        }
        let Some(OutputChild::Element(child)) = node.children.pop() else {
            return node;
        };
        if node_generic && !child_generic {
            let mut merged = mem::take(&mut node.attrs);
            merged.extend(child.attrs);
            node = OutputNode {
                tag: child.tag,
                attrs: merged,
                children: child.children,
            };
        } else {
            node.attrs.extend(child.attrs);
            node.children = child.children;
        }
    }
}
