//! Output tree and observation records.
//!
//! The reducer builds a detached [`OutputNode`] tree; identifiers and derived
//! flags live in the attribute map so flattening merges them uniformly. After
//! the traversal the tree is serialized to markup and walked once more to
//! collect the element lists and form-state records the agent consumes.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    ATTR_CAN_EDIT, ATTR_CLICKABLE, ATTR_INPUT_DISABLED, ATTR_IS_FOCUSED, ATTR_MAYBE_HOVERABLE,
    ATTR_SELECTED_INDEX, ATTR_SELECTED_VALUES, ATTR_SEMANTIC_ID,
};

/// Tags exempt from emptiness-based pruning.
pub(crate) const PRESERVE_TAGS: &[&str] =
    &["input", "select", "textarea", "button", "img", "head", "title"];

/// Tags rendered without a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A reduced, detached DOM element.
#[derive(Debug, Clone, Default)]
pub struct OutputNode {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<OutputChild>,
}

#[derive(Debug, Clone)]
pub enum OutputChild {
    Element(OutputNode),
    Text(String),
}

impl OutputNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn semantic_id(&self) -> Option<&str> {
        self.attr(ATTR_SEMANTIC_ID)
    }

    pub fn push_element(&mut self, child: OutputNode) {
        self.children.push(OutputChild::Element(child));
    }

    pub fn push_text(&mut self, text: &str) {
        self.children.push(OutputChild::Text(text.into()));
    }

    /// Recursive emptiness: a node is empty iff every text child is
    /// whitespace-only and every element child is empty. Preserved tags are
    /// never empty.
    pub fn is_empty(&self) -> bool {
        if PRESERVE_TAGS.contains(&self.tag.as_str()) {
            return false;
        }
        self.children.iter().all(|child| match child {
            OutputChild::Text(t) => t.trim().is_empty(),
            OutputChild::Element(el) => el.is_empty(),
        })
    }

    /// Serialize the subtree to markup. Attribute order is the map's sorted
    /// order, so equal trees serialize identically.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if VOID_TAGS.contains(&self.tag.as_str()) && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                OutputChild::Element(el) => el.write_html(out),
                OutputChild::Text(t) => out.push_str(&escape_text(t)),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Form state of one identifier-bearing editable element.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    pub id: String,
    pub disabled: bool,
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub value: Option<String>,
    pub can_edit: bool,
    pub is_focused: bool,
}

/// Selection state of one identifier-bearing select element.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectRecord {
    pub id: String,
    pub value: Option<String>,
    pub selected_index: Option<i64>,
    pub multiple: bool,
    pub selected_values: Vec<String>,
}

/// Everything the agent sees about one page, collected from the output tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageContent {
    pub html: String,
    pub clickable_elements: Vec<String>,
    pub hoverable_elements: Vec<String>,
    pub input_elements: Vec<InputRecord>,
    pub select_elements: Vec<SelectRecord>,
}

impl PageContent {
    /// Serialize and walk the tree in document order.
    pub fn collect(root: &OutputNode) -> Self {
        let mut content = Self {
            html: root.to_html(),
            ..Self::default()
        };
        content.visit(root);
        content
    }

    fn visit(&mut self, node: &OutputNode) {
        if let Some(id) = node.semantic_id() {
            if node.attr(ATTR_CLICKABLE) == Some("true") {
                self.clickable_elements.push(id.to_string());
            }
            if node.attr(ATTR_MAYBE_HOVERABLE).is_some() {
                self.hoverable_elements.push(id.to_string());
            }
            let editable = matches!(node.tag.as_str(), "input" | "textarea")
                || node.attr("contenteditable").is_some();
            if editable {
                self.input_elements.push(InputRecord {
                    id: id.to_string(),
                    disabled: node.attr(ATTR_INPUT_DISABLED) == Some("true"),
                    input_type: node.attr("type").map(str::to_string),
                    value: node.attr("value").map(str::to_string),
                    can_edit: node.attr(ATTR_CAN_EDIT) == Some("true"),
                    is_focused: node.attr(ATTR_IS_FOCUSED) == Some("true"),
                });
            }
            if node.tag == "select" {
                self.select_elements.push(SelectRecord {
                    id: id.to_string(),
                    value: node.attr("value").map(str::to_string),
                    selected_index: node.attr(ATTR_SELECTED_INDEX).and_then(|v| v.parse().ok()),
                    multiple: node.attr("multiple").is_some(),
                    selected_values: node
                        .attr(ATTR_SELECTED_VALUES)
                        .map(|v| {
                            v.split(',')
                                .filter(|s| !s.is_empty())
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                });
            }
        }
        for child in &node.children {
            if let OutputChild::Element(el) = child {
                self.visit(el);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_escaping() {
        let mut node = OutputNode::new("a");
        node.set_attr("href", "/q?a=1&b=\"2\"");
        node.push_text("5 < 6 & 7 > 4");
        assert_eq!(
            node.to_html(),
            "<a href=\"/q?a=1&amp;b=&quot;2&quot;\">5 &lt; 6 &amp; 7 &gt; 4</a>"
        );
    }

    #[test]
    fn void_tags_self_close() {
        let mut node = OutputNode::new("input");
        node.set_attr("type", "text");
        assert_eq!(node.to_html(), "<input type=\"text\"/>");
    }

    #[test]
    fn emptiness_is_recursive() {
        let mut inner = OutputNode::new("span");
        inner.push_text("   ");
        let mut outer = OutputNode::new("div");
        outer.push_element(inner);
        assert!(outer.is_empty());

        let mut with_text = OutputNode::new("div");
        with_text.push_text("x");
        assert!(!with_text.is_empty());
    }

    #[test]
    fn preserved_tags_are_never_empty() {
        assert!(!OutputNode::new("input").is_empty());
        assert!(!OutputNode::new("img").is_empty());
        assert!(OutputNode::new("div").is_empty());
    }

    #[test]
    fn collects_records_in_document_order() {
        let mut first = OutputNode::new("button");
        first.set_attr(ATTR_SEMANTIC_ID, "save");
        first.set_attr(ATTR_CLICKABLE, "true");
        let mut second = OutputNode::new("a");
        second.set_attr(ATTR_SEMANTIC_ID, "home");
        second.set_attr(ATTR_CLICKABLE, "true");
        second.set_attr(ATTR_MAYBE_HOVERABLE, "true");
        let mut root = OutputNode::new("body");
        root.push_element(first);
        root.push_element(second);

        let content = PageContent::collect(&root);
        assert_eq!(content.clickable_elements, vec!["save", "home"]);
        assert_eq!(content.hoverable_elements, vec!["home"]);
        assert!(content.input_elements.is_empty());
    }

    #[test]
    fn input_record_reads_stamped_state() {
        let mut input = OutputNode::new("input");
        input.set_attr(ATTR_SEMANTIC_ID, "email");
        input.set_attr("type", "email");
        input.set_attr("value", "a@b.c");
        input.set_attr(ATTR_INPUT_DISABLED, "false");
        input.set_attr(ATTR_CAN_EDIT, "true");
        input.set_attr(ATTR_IS_FOCUSED, "true");
        let content = PageContent::collect(&input);
        assert_eq!(
            content.input_elements,
            vec![InputRecord {
                id: "email".into(),
                disabled: false,
                input_type: Some("email".into()),
                value: Some("a@b.c".into()),
                can_edit: true,
                is_focused: true,
            }]
        );
    }

    #[test]
    fn select_record_splits_values() {
        let mut select = OutputNode::new("select");
        select.set_attr(ATTR_SEMANTIC_ID, "tags");
        select.set_attr("value", "b");
        select.set_attr(ATTR_SELECTED_INDEX, "1");
        select.set_attr("multiple", "true");
        select.set_attr(ATTR_SELECTED_VALUES, "a,b");
        let content = PageContent::collect(&select);
        assert_eq!(content.select_elements.len(), 1);
        let rec = &content.select_elements[0];
        assert_eq!(rec.selected_index, Some(1));
        assert!(rec.multiple);
        assert_eq!(rec.selected_values, vec!["a", "b"]);
    }

    #[test]
    fn record_serialization_uses_wire_names() {
        let rec = InputRecord {
            id: "q".into(),
            disabled: false,
            input_type: Some("text".into()),
            value: None,
            can_edit: true,
            is_focused: false,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("canEdit").is_some());
        assert!(json.get("isFocused").is_some());
        assert!(json.get("type").is_some());
    }
}
